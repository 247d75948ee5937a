use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    auth::repo_types::User,
    extract::{Checks, FieldErrors, Validate},
    formats::{iso_millis, utc},
};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 50;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let first_name = self.first_name.trim();
        let last_name_len = self.last_name.as_deref().map(|n| n.trim().chars().count());
        Checks::new()
            .check(!first_name.is_empty(), "firstName", "First name is required")
            .check(
                first_name.chars().count() <= MAX_NAME_LEN,
                "firstName",
                "First name must be at most 50 characters",
            )
            .check(
                last_name_len.map_or(true, |n| n <= MAX_NAME_LEN),
                "lastName",
                "Last name must be at most 50 characters",
            )
            .check(!self.email.trim().is_empty(), "email", "Email is required")
            .check(
                is_valid_email(&self.email.trim().to_lowercase()),
                "email",
                "Email should be valid",
            )
            .check(
                self.password.chars().count() >= MIN_PASSWORD_LEN,
                "password",
                "Password must be at least 8 characters",
            )
            .finish()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        Checks::new()
            .check(!self.email.trim().is_empty(), "email", "Email is required")
            .check(!self.password.is_empty(), "password", "Password is required")
            .finish()
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    #[serde(with = "iso_millis")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            created_at: utc(u.created_at),
        }
    }
}

/// Response returned after signup or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
