//! Unified authorization.
//!
//! One capability model for every protected surface: a bearer token resolves
//! to `Admin` (admin API key) or `Service` (shared secret for the bot and
//! cron callers); customers are identified by the `x-user-id` header and
//! authorized per resource (chat ownership checks).

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Admin,
    Service,
    Customer(String),
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub fn identify(parts: &Parts, config: &Config) -> Result<Identity, AppError> {
    if let Some(token) = bearer_token(parts) {
        if token == config.admin_api_key {
            return Ok(Identity::Admin);
        }
        if token == config.service_secret {
            return Ok(Identity::Service);
        }
        return Err(AppError::Unauthorized);
    }
    if let Some(user_id) = parts.headers.get("x-user-id").and_then(|v| v.to_str().ok()) {
        if !user_id.trim().is_empty() {
            return Ok(Identity::Customer(user_id.to_string()));
        }
    }
    Err(AppError::Unauthorized)
}

/// Admits only the admin API key.
pub struct RequireAdmin;

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match identify(parts, &state.config)? {
            Identity::Admin => Ok(RequireAdmin),
            _ => Err(AppError::Forbidden),
        }
    }
}

/// Admits the service secret or the admin key.
pub struct RequireService;

#[async_trait]
impl FromRequestParts<AppState> for RequireService {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match identify(parts, &state.config)? {
            Identity::Admin | Identity::Service => Ok(RequireService),
            _ => Err(AppError::Forbidden),
        }
    }
}

/// Extracts the caller's customer id from `x-user-id`.
pub struct CustomerId(pub String);

#[async_trait]
impl FromRequestParts<AppState> for CustomerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match identify(parts, &state.config)? {
            Identity::Customer(id) => Ok(CustomerId(id)),
            _ => Err(AppError::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/test".into(),
            port: 8083,
            admin_api_key: "admin-key".into(),
            service_secret: "service-secret".into(),
            bot_base_url: None,
            bot_token: None,
            ipaymu: Default::default(),
            pakasir: Default::default(),
            tokopay: Default::default(),
        }
    }

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn admin_key_resolves_to_admin() {
        let parts = parts_with(&[("authorization", "Bearer admin-key")]);
        assert_eq!(identify(&parts, &test_config()).unwrap(), Identity::Admin);
    }

    #[test]
    fn service_secret_resolves_to_service() {
        let parts = parts_with(&[("authorization", "Bearer service-secret")]);
        assert_eq!(identify(&parts, &test_config()).unwrap(), Identity::Service);
    }

    #[test]
    fn unknown_bearer_is_unauthorized() {
        let parts = parts_with(&[("authorization", "Bearer nope")]);
        assert!(identify(&parts, &test_config()).is_err());
    }

    #[test]
    fn user_header_resolves_to_customer() {
        let parts = parts_with(&[("x-user-id", "user-42")]);
        assert_eq!(
            identify(&parts, &test_config()).unwrap(),
            Identity::Customer("user-42".into())
        );
    }

    #[test]
    fn missing_credentials_rejected() {
        let parts = parts_with(&[]);
        assert!(identify(&parts, &test_config()).is_err());
        let parts = parts_with(&[("x-user-id", "   ")]);
        assert!(identify(&parts, &test_config()).is_err());
    }
}
