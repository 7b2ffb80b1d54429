//! HTTP surface of the registration service.
//!
//! - `registration`: public account request workflow, under `/registration`.
//! - `admin`: bearer-token protected administration, under `/api/admin`.

pub mod admin;
pub mod registration;

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest};

use crate::config::Settings;
use crate::db::Database;
use crate::error::{RegistrationError, Result};
use crate::notifications::Mailer;

/// Shared handles injected into every handler as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub mailer: Arc<dyn Mailer>,
    pub settings: Arc<Settings>,
}

/// Run storage work on the blocking thread pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| RegistrationError::Model(format!("Blocking task failed: {}", e)))?
}

/// Check the `Authorization: Bearer <token>` header of an admin request.
pub(crate) fn require_admin(req: &HttpRequest, settings: &Settings) -> Result<()> {
    let Some(expected) = settings.admin_token.as_deref().filter(|t| !t.is_empty()) else {
        return Err(RegistrationError::AccessControl(
            "The administration API is disabled.".to_string(),
        ));
    };
    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);
    match provided {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(RegistrationError::AccessControl("Invalid admin token.".to_string())),
        None => Err(RegistrationError::AccessControl(
            "Missing admin token.".to_string(),
        )),
    }
}
