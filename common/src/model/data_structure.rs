use serde::{Deserialize, Serialize};

/// Scratch document holding the in-progress registration form of a user.
///
/// `form_string` is the last XML rendering of the form (not validated) and
/// `data_structure_element_root` the id of the root of the editable element
/// tree. The document is removed once its content is promoted to
/// `UserMetadata`, or by the cleanup sweep once it is too old.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDataStructure {
    pub id: String,
    pub user: String,
    pub template_id: String,
    pub name: String,
    pub form_string: Option<String>,
    pub data_structure_element_root: Option<String>,
    pub data_id: Option<String>,
    pub creation_date: String,
    pub last_modification_date: String,
}
