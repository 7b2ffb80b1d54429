//! Start-up operations, run without access control.

use std::fs;
use std::path::Path;

use log::{info, warn};
use registration_common::model::template::VersionManager;
use rusqlite::Connection;

use crate::components::user_template_version_manager as vm_api;
use crate::config::Settings;
use crate::db::Database;
use crate::error::{RegistrationError, Result};

/// Store `content` as a new global template and make it the default.
pub fn insert_registry_user_schema(conn: &Connection, filename: &str, content: &str) -> Result<VersionManager> {
    let manager = vm_api::insert(conn, filename, filename, content)?;
    vm_api::set_default_version_manager(conn, &manager.id)
}

/// Load the configured registration schema into an empty database.
///
/// Does nothing when templates already exist.
pub fn init_registration_app(db: &Database, settings: &Settings) -> Result<()> {
    let count = db.with_conn(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM version_managers", [], |row| row.get::<_, i64>(0))?)
    })?;
    if count > 0 {
        warn!("The database is not empty. Skipping the registration schema initialization.");
        return Ok(());
    }

    let (Some(filepath), Some(filename)) = (
        settings.registry_xsd_user_filepath.as_deref(),
        settings.registry_xsd_user_filename.as_deref(),
    ) else {
        return Err(RegistrationError::Config(
            "Please configure REGISTRY_XSD_USER_FILEPATH and REGISTRY_XSD_USER_FILENAME.".to_string(),
        ));
    };

    let path = Path::new(filepath);
    if !path.is_file() {
        return Err(RegistrationError::Config(format!(
            "A file required for loading data was not found: {}",
            filepath
        )));
    }
    let content = fs::read_to_string(path)
        .map_err(|e| RegistrationError::Config(format!("Unable to read {}: {}", filepath, e)))?;

    let manager = db.with_transaction(|conn| insert_registry_user_schema(conn, filename, &content))?;
    info!("Registration schema {} loaded as the default template {}", filename, manager.id);
    Ok(())
}
