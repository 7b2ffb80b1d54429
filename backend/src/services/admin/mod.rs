//! # Admin Service Module
//!
//! Administration endpoints under `/api/admin`. Every handler first checks the
//! bearer token configured with `--admin-token`.
//!
//! ## Sub-modules:
//! - `requests`: pending account requests, accepted or denied from here.
//! - `metadata`: finalized registration data.
//! - `templates`: global registration templates and their versions.
//! - `upload`: multipart uploads of new templates and template versions.
//! - `data_structures`: unfinished registration forms.
//! - `jobs`: on-demand cleanup sweeps and their status.

mod data_structures;
mod jobs;
mod metadata;
mod requests;
mod templates;
mod upload;

use actix_web::web::{get, post, scope};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Scope};
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::services::{blocking, require_admin, AppState};

/// The base path for all administration endpoints.
const API_PATH: &str = "/api/admin";

/// Check the admin token, then run `f` against the database off the async runtime.
async fn run_admin<F, T>(req: &HttpRequest, state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    require_admin(req, &state.settings)?;
    let db = state.db.clone();
    blocking(move || f(&db)).await
}

fn json_response<T: Serialize>(result: Result<T>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => e.error_response(),
    }
}

/// Configures and returns the Actix `Scope` for the administration routes.
///
/// # Registered Routes:
///
/// *   **`GET /requests`**, **`POST /requests/{id}/accept`**, **`POST /requests/{id}/deny`**:
///     - **Handlers**: `requests::list`, `requests::accept`, `requests::deny`
///     - **Description**: Lists pending account requests. Accepting activates the account,
///       denying removes it (an optional `{reason}` is mailed to the requester).
///
/// *   **`GET /metadata/{id}`**:
///     - **Handler**: `metadata::view`
///     - **Description**: Returns one finalized registration document.
///
/// *   **`GET /templates`**, **`POST /templates/upload`**:
///     - **Handlers**: `templates::list`, `upload::upload_template`
///     - **Description**: Lists available and disabled global templates, or creates a new
///       one from a multipart form with a `name` field and an `upload_file` XSD file.
///
/// *   **`GET /templates/{vm}/versions`**, **`POST /templates/{vm}/versions/upload`**:
///     - **Handlers**: `templates::versions`, `upload::upload_version`
///     - **Description**: Lists the versions of a template, or adds a version from the
///       multipart `xsd_file` field.
///
/// *   **`POST /templates/{vm}/disable|restore|edit`**, **`POST /templates/set-default?id=`**:
///     - **Description**: Status, title and default flag of a template.
///
/// *   **`POST /templates/versions/{id}/current|disable|restore`**:
///     - **Description**: Status of a single template version.
///
/// *   **`GET /data-structures`**, **`POST /data-structures/{id}/owner`**:
///     - **Handlers**: `data_structures::list`, `data_structures::change_owner`
///
/// *   **`POST /jobs/cleanup`**, **`GET /jobs/{job_id}`**:
///     - **Handlers**: `jobs::start_cleanup`, `jobs::status`
///     - **Description**: Starts a cleanup sweep in the background and returns its job id,
///       then reports the job status.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/requests", get().to(requests::list))
        .route("/requests/{id}/accept", post().to(requests::accept))
        .route("/requests/{id}/deny", post().to(requests::deny))
        .route("/metadata/{id}", get().to(metadata::view))
        .route("/templates", get().to(templates::list))
        .route("/templates/upload", post().to(upload::upload_template))
        .route("/templates/set-default", post().to(templates::set_default))
        .route("/templates/versions/{id}/current", post().to(templates::set_current_version))
        .route("/templates/versions/{id}/disable", post().to(templates::disable_version))
        .route("/templates/versions/{id}/restore", post().to(templates::restore_version))
        .route("/templates/{vm}/versions", get().to(templates::versions))
        .route("/templates/{vm}/versions/upload", post().to(upload::upload_version))
        .route("/templates/{vm}/disable", post().to(templates::disable))
        .route("/templates/{vm}/restore", post().to(templates::restore))
        .route("/templates/{vm}/edit", post().to(templates::edit_title))
        .route("/data-structures", get().to(data_structures::list))
        .route("/data-structures/{id}/owner", post().to(data_structures::change_owner))
        .route("/jobs/cleanup", post().to(jobs::start_cleanup))
        .route("/jobs/{job_id}", get().to(jobs::status))
}
