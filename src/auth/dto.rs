use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    users::dto::{check_email, check_password, check_username, normalize_email, PublicUser},
    validation::{Loose, Violations},
};

/// Request body for user registration. A non-string value reads as missing.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(value_type = Option<String>)]
    pub username: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub email: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Loose<String>>,
}

#[derive(Debug)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<ValidRegistration, AppError> {
        let mut v = Violations::new();
        let username = text(self.username).trim().to_string();
        let email = normalize_email(&text(self.email));
        let password = text(self.password);

        if username.is_empty() {
            v.push("Username is required");
        } else {
            check_username(&mut v, &username);
        }
        if email.is_empty() {
            v.push("Email is required");
        } else {
            check_email(&mut v, &email);
        }
        if password.is_empty() {
            v.push("Password is required");
        } else {
            check_password(&mut v, &password);
        }

        v.finish(ValidRegistration {
            username,
            email,
            password,
        })
    }
}

fn text(field: Option<Loose<String>>) -> String {
    field.and_then(Loose::typed).unwrap_or_default()
}

/// Request body for login.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(value_type = Option<String>)]
    pub email: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Loose<String>>,
}

impl LoginRequest {
    /// Returns the normalised email and the password.
    pub fn validate(self) -> Result<(String, String), AppError> {
        let mut v = Violations::new();
        let email = normalize_email(&text(self.email));
        let password = text(self.password);
        v.check(!email.is_empty(), "Email is required");
        v.check(!password.is_empty(), "Password is required");
        v.finish((email, password))
    }
}

/// Response returned after login or register.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// Query string Google appends to the callback URL.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
