use serde::{Deserialize, Serialize};

/// A pending self-registration request.
///
/// Created when a visitor submits the account request form. The matching
/// user account stays inactive until an administrator accepts the request.
/// `metadata_id` points at the finalized `UserMetadata` once the visitor has
/// submitted a schema-valid registration form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRequest {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// RFC 3339 timestamp of the request.
    pub date: String,
    pub metadata_id: Option<String>,
}
