pub mod about;
pub mod admin;
pub mod assets;
pub mod auth;
pub mod errors;
pub mod follow;
pub mod home;
pub mod posts;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;

/// Data every page hands to `base.html`.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub title: String,
    pub authenticated: bool,
    pub username: String,
    pub is_admin: bool,
}

impl Layout {
    pub fn new(title: impl Into<String>, user: Option<&CurrentUser>) -> Self {
        Self {
            title: title.into(),
            authenticated: user.is_some(),
            username: user.map(|u| u.username.clone()).unwrap_or_default(),
            is_admin: user.map(|u| u.is_admin).unwrap_or(false),
        }
    }
}

/// Plain 302 redirect.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

/// Numeric ids from the path; anything else is a missing page.
pub fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>().map_err(|_| AppError::NotFound)
}
