//! Schema documents, one row per version.

use registration_common::model::template::TemplateVersion;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db;
use crate::error::{RegistrationError, Result};
use crate::xsd::get_hash;

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: String,
    pub version_manager_id: String,
    pub version_number: u32,
    pub filename: String,
    pub content: String,
    pub hash: String,
    pub display_name: String,
    pub is_disabled: bool,
    pub creation_date: String,
}

impl Template {
    /// A new, unsaved version of `version_manager_id`.
    pub fn new(version_manager_id: &str, version_number: u32, filename: &str, content: &str) -> Self {
        Template {
            id: db::new_id(),
            version_manager_id: version_manager_id.to_string(),
            version_number,
            filename: filename.to_string(),
            content: content.to_string(),
            hash: get_hash(content),
            display_name: String::new(),
            is_disabled: false,
            creation_date: db::now(),
        }
    }

    pub fn to_version(&self, is_current: bool) -> TemplateVersion {
        TemplateVersion {
            id: self.id.clone(),
            version_manager_id: self.version_manager_id.clone(),
            version_number: self.version_number,
            filename: self.filename.clone(),
            display_name: self.display_name.clone(),
            hash: self.hash.clone(),
            is_current,
            is_disabled: self.is_disabled,
            creation_date: self.creation_date.clone(),
        }
    }
}

const COLUMNS: &str = "id, version_manager_id, version_number, filename, content, hash, \
                       display_name, is_disabled, creation_date";

fn from_row(row: &Row) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        version_manager_id: row.get(1)?,
        version_number: row.get(2)?,
        filename: row.get(3)?,
        content: row.get(4)?,
        hash: row.get(5)?,
        display_name: row.get(6)?,
        is_disabled: row.get(7)?,
        creation_date: row.get(8)?,
    })
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<Template> {
    conn.query_row(
        &format!("SELECT {} FROM templates WHERE id = ?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| RegistrationError::DoesNotExist(format!("No template found with id {}.", id)))
}

/// All versions of a version manager, oldest first.
pub fn get_all_by_version_manager(conn: &Connection, version_manager_id: &str) -> Result<Vec<Template>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM templates WHERE version_manager_id = ?1 ORDER BY version_number",
        COLUMNS
    ))?;
    let templates = stmt
        .query_map(params![version_manager_id], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(templates)
}

/// Insert or update a template. The hash is always recomputed from the content.
pub fn upsert(conn: &Connection, template: &mut Template) -> Result<()> {
    template.hash = get_hash(&template.content);
    conn.execute(
        "INSERT INTO templates (id, version_manager_id, version_number, filename, content, hash,
                                display_name, is_disabled, creation_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             filename = excluded.filename,
             content = excluded.content,
             hash = excluded.hash,
             display_name = excluded.display_name,
             is_disabled = excluded.is_disabled",
        params![
            template.id,
            template.version_manager_id,
            template.version_number,
            template.filename,
            template.content,
            template.hash,
            template.display_name,
            template.is_disabled,
            template.creation_date,
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> Result<()> {
    let deleted = conn.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(RegistrationError::DoesNotExist(format!(
            "No template found with id {}.",
            id
        )));
    }
    Ok(())
}

pub fn set_display_name(conn: &Connection, id: &str, display_name: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE templates SET display_name = ?1 WHERE id = ?2",
        params![display_name, id],
    )?;
    if updated == 0 {
        return Err(RegistrationError::DoesNotExist(format!(
            "No template found with id {}.",
            id
        )));
    }
    Ok(())
}

pub(crate) fn set_disabled(conn: &Connection, id: &str, is_disabled: bool) -> Result<()> {
    conn.execute(
        "UPDATE templates SET is_disabled = ?1 WHERE id = ?2",
        params![is_disabled, id],
    )?;
    Ok(())
}
