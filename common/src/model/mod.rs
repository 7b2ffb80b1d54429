pub mod account_request;
pub mod data_structure;
pub mod form;
pub mod template;
pub mod user_metadata;
