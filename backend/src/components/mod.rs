//! Storage-backed components of the registration service.
//!
//! Every operation takes a `&Connection`, so the caller decides whether it
//! runs on its own or as part of a larger transaction.

pub mod account_request_metadata;
pub mod data_structure_element;
pub mod template;
pub mod user;
pub mod user_data_structure;
pub mod user_metadata;
pub mod user_template_version_manager;
pub mod workspace;

/// `?, ?, ...` with `count` placeholders, for `IN` clauses.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
