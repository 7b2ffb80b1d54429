//! XML Schema support for registration templates.

pub mod form;
pub mod schema;
pub mod tree;
pub mod validate;

pub use form::{generate_form, render_xml};
pub use schema::{get_hash, is_schema_valid, Schema};
pub use validate::{check_xml_against_schema, validate_xml_data};
