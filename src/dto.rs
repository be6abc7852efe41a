use serde::Serialize;
use utoipa::ToSchema;

/// `{ "message": ... }` body for deletions and other body-less outcomes.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
