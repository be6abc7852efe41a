use axum::extract::{FromRequest, FromRequestParts};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;

/// `Json` whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections use the API error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// A body field that keeps the raw JSON when it has the wrong type, so the
/// mismatch is reported next to the other violations instead of rejecting
/// the whole body.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Loose<T> {
    Typed(T),
    Mistyped(Value),
}

impl<T> Loose<T> {
    pub fn typed(self) -> Option<T> {
        match self {
            Loose::Typed(value) => Some(value),
            Loose::Mistyped(_) => None,
        }
    }
}

/// Collects every violated rule of a payload before failing.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Unwraps an optional field. A mistyped value records `message` and
    /// reads as absent.
    pub fn typed<T>(&mut self, field: Option<Loose<T>>, message: &str) -> Option<T> {
        match field? {
            Loose::Typed(value) => Some(value),
            Loose::Mistyped(_) => {
                self.push(message);
                None
            }
        }
    }

    /// `Ok(value)` when nothing was recorded, otherwise one aggregated error.
    pub fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(AppError::ValidationFailed(self.0))
        }
    }
}

/// Trimmed non-blank strings of a list. `None` when the list or any element
/// has the wrong type.
pub fn text_list(list: Option<Loose<Vec<Loose<String>>>>) -> Option<Vec<String>> {
    let mut out = Vec::new();
    for item in list.map_or(Some(Vec::new()), Loose::typed)? {
        let text = item.typed()?;
        let text = text.trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
    Some(out)
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Length in characters, not bytes.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Path ids are parsed by hand so a malformed id reads as a validation error.
pub fn path_id(raw: &str) -> Result<Uuid, AppError> {
    parse_id(raw).ok_or_else(|| AppError::ValidationFailed(vec!["Invalid id".into()]))
}
