use serde::{Deserialize, Serialize};

/// A versioned XML Schema used to render registration forms.
///
/// `versions` lists template ids in upload order. Only global managers
/// (owned by no user) are handled by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionManager {
    pub id: String,
    pub title: String,
    pub user: Option<String>,
    pub is_disabled: bool,
    pub is_default: bool,
    pub current_version: Option<String>,
    pub versions: Vec<String>,
    pub disabled_versions: Vec<String>,
    pub creation_date: String,
}

/// One schema revision of a version manager, without its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: String,
    pub version_manager_id: String,
    pub version_number: u32,
    pub filename: String,
    pub display_name: String,
    pub hash: String,
    pub is_current: bool,
    pub is_disabled: bool,
    pub creation_date: String,
}

/// Global version managers split by status, as listed on the admin surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateList {
    pub available: Vec<VersionManager>,
    pub disabled: Vec<VersionManager>,
}

/// Result of uploading a new schema version.
///
/// `from` lists the versions that existed before the upload so a client can
/// offer to migrate data from them to `to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionUpload {
    pub version_manager_id: String,
    pub from: Vec<String>,
    pub to: String,
}
