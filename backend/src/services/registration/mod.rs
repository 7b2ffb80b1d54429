//! # Registration Service Module
//!
//! Public endpoints of the self-service account workflow, under `/registration`.
//!
//! ## Sub-modules:
//! - `request_account`: records an account request and prepares the registration form.
//! - `account_creation`: returns the registration form of a pending request.
//! - `element_value`: reads and edits single values of the form.
//! - `save_data`: validates the filled-in form and attaches it to the request.

mod account_creation;
mod element_value;
pub(crate) mod request_account;
mod save_data;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for all registration endpoints.
const API_PATH: &str = "/registration";

/// Configures and returns the Actix `Scope` for the registration routes.
///
/// # Registered Routes:
///
/// *   **`POST /account-request`**:
///     - **Handler**: `request_account::process`
///     - **Description**: Creates an inactive user and its account request from a
///       `RequestAccountForm`, generates an empty registration form from the default
///       template and notifies the administrators. Answers `201` with the ids to continue.
///
/// *   **`GET|POST /request-metadata/data-structure-element/value`**:
///     - **Handlers**: `element_value::get_value`, `element_value::set_value`
///     - **Description**: Read (`?id=`) or replace (`{id, value}`) the value of one
///       form element. Registered before the form route, whose two path segments
///       would otherwise match it.
///
/// *   **`GET /request-metadata/{data_structure_id}/{account_request_id}`**:
///     - **Handler**: `account_creation::process`
///     - **Description**: Rebuilds the registration form from its last rendering and
///       returns it with the scratch document it belongs to.
///
/// *   **`POST /save-data`**:
///     - **Handler**: `save_data::process`
///     - **Description**: Renders the form to XML, validates it against the template and,
///       when valid, stores it as finalized metadata linked to the account request.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/account-request", post().to(request_account::process))
        .route(
            "/request-metadata/data-structure-element/value",
            get().to(element_value::get_value),
        )
        .route(
            "/request-metadata/data-structure-element/value",
            post().to(element_value::set_value),
        )
        .route(
            "/request-metadata/{data_structure_id}/{account_request_id}",
            get().to(account_creation::process),
        )
        .route("/save-data", post().to(save_data::process))
}
