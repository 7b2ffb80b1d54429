use serde::{Deserialize, Serialize};

/// Finalized registration data, validated against its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    pub id: String,
    pub title: String,
    pub template_id: String,
    pub user_id: String,
    pub workspace_id: Option<String>,
    pub xml_content: String,
    pub creation_date: String,
    pub last_modification_date: String,
}
