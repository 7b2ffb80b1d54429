//! Error type shared by the storage components and the HTTP handlers.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{0}")]
    DoesNotExist(String),

    #[error("{0}")]
    NotUnique(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("{0}")]
    Api(String),

    #[error("XSD error: {0}")]
    Xsd(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Access denied: {0}")]
    AccessControl(String),

    #[error("The following error(s) occurred during validation")]
    Validation(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    fn code(&self) -> &'static str {
        match self {
            RegistrationError::DoesNotExist(_) => "does_not_exist",
            RegistrationError::NotUnique(_) => "not_unique",
            RegistrationError::Model(_) => "model_error",
            RegistrationError::Api(_) => "api_error",
            RegistrationError::Xsd(_) => "xsd_error",
            RegistrationError::Xml(_) => "xml_error",
            RegistrationError::AccessControl(_) => "access_control",
            RegistrationError::Validation(_) => "validation_error",
            RegistrationError::Config(_) => "config_error",
            RegistrationError::Unavailable(_) => "unavailable",
        }
    }
}

impl From<rusqlite::Error> for RegistrationError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                RegistrationError::DoesNotExist("Object does not exist".to_string())
            }
            rusqlite::Error::SqliteFailure(ref failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                RegistrationError::NotUnique("Unable to save the document: not unique.".to_string())
            }
            other => RegistrationError::Model(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RegistrationError {
    fn from(err: serde_json::Error) -> Self {
        RegistrationError::Model(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [String]>,
}

impl ResponseError for RegistrationError {
    fn status_code(&self) -> StatusCode {
        match self {
            RegistrationError::DoesNotExist(_) => StatusCode::NOT_FOUND,
            RegistrationError::NotUnique(_) => StatusCode::CONFLICT,
            RegistrationError::Model(_) | RegistrationError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RegistrationError::Api(_)
            | RegistrationError::Xsd(_)
            | RegistrationError::Xml(_)
            | RegistrationError::Validation(_) => StatusCode::BAD_REQUEST,
            RegistrationError::AccessControl(_) => StatusCode::FORBIDDEN,
            RegistrationError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        let errors = match self {
            RegistrationError::Validation(errors) => Some(errors.as_slice()),
            _ => None,
        };
        HttpResponse::build(status).json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
            errors,
        })
    }
}
