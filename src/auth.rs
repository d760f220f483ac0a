// Admin authentication: a shared password checked via request header.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::config::Config;

/// Extractor that gates a handler behind the admin password.
///
/// The password travels in the `x-admin-password` header and is compared
/// against `Config::admin_password`. The config is pulled from request
/// extensions, injected by middleware in `main.rs`.
///
/// Usage: add `AdminAuth` as a handler parameter.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

fn unauthorized() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": "Unauthorized"})),
    )
}

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let config = parts
            .extensions
            .get::<Arc<Config>>()
            .ok_or_else(unauthorized)?;

        let given = parts
            .headers
            .get("x-admin-password")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;

        if given != config.admin_password {
            return Err(unauthorized());
        }

        Ok(AdminAuth)
    }
}
