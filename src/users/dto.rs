use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::{
    users::repo_types::User,
    validation::{char_len, is_valid_email, Loose, Violations},
};

/// Public part of the user returned to clients. Never carries credentials.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub google_linked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            google_linked: u.google_id.is_some(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Body of `PUT /users/:id`; absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(value_type = Option<String>)]
    pub username: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub email: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Loose<String>>,
}

/// Profile update after validation. `password` is still plaintext here.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

const USERNAME_RULE: &str = "Username must be between 3 and 30 characters";
const EMAIL_RULE: &str = "Must be a valid email address";
const PASSWORD_RULE: &str = "Password must be at least 6 characters long";

pub(crate) fn check_username(v: &mut Violations, username: &str) {
    let len = char_len(username);
    v.check((3..=30).contains(&len), USERNAME_RULE);
}

pub(crate) fn check_email(v: &mut Violations, email: &str) {
    v.check(is_valid_email(email), EMAIL_RULE);
}

pub(crate) fn check_password(v: &mut Violations, password: &str) {
    v.check(char_len(password) >= 6, PASSWORD_RULE);
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<ValidProfileUpdate, crate::error::AppError> {
        let mut v = Violations::new();
        let username = v
            .typed(self.username, USERNAME_RULE)
            .map(|u| u.trim().to_string());
        let email = v
            .typed(self.email, EMAIL_RULE)
            .map(|e| normalize_email(&e));
        let password = v.typed(self.password, PASSWORD_RULE);
        if let Some(u) = &username {
            check_username(&mut v, u);
        }
        if let Some(e) = &email {
            check_email(&mut v, e);
        }
        if let Some(p) = &password {
            check_password(&mut v, p);
        }
        v.finish(ValidProfileUpdate {
            username,
            email,
            password,
        })
    }
}
