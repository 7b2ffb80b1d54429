//! Version managers of registration schemas.
//!
//! A version manager groups the successive versions of one schema and
//! designates the current one. At most one global manager is the default:
//! its current version is the form shown to people requesting an account.
//! Write operations only apply to global managers (owned by no user).

use registration_common::model::template::{TemplateList, TemplateVersion, VersionManager, VersionUpload};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::components::template::{self, Template};
use crate::db;
use crate::error::{RegistrationError, Result};
use crate::xsd::is_schema_valid;

const DUPLICATE_TITLE: &str = "A template with the same name already exists. Please choose another name.";

const COLUMNS: &str = "id, title, user, is_disabled, is_default, current_version_id, creation_date";

fn from_row(row: &Row) -> rusqlite::Result<VersionManager> {
    Ok(VersionManager {
        id: row.get(0)?,
        title: row.get(1)?,
        user: row.get(2)?,
        is_disabled: row.get(3)?,
        is_default: row.get(4)?,
        current_version: row.get(5)?,
        versions: Vec::new(),
        disabled_versions: Vec::new(),
        creation_date: row.get(6)?,
    })
}

/// Fill in the version lists of managers loaded from their own table.
fn with_versions(conn: &Connection, mut manager: VersionManager) -> Result<VersionManager> {
    let templates = template::get_all_by_version_manager(conn, &manager.id)?;
    manager.versions = templates.iter().map(|t| t.id.clone()).collect();
    manager.disabled_versions = templates
        .iter()
        .filter(|t| t.is_disabled)
        .map(|t| t.id.clone())
        .collect();
    Ok(manager)
}

fn query(conn: &Connection, filter: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<VersionManager>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM version_managers {} ORDER BY creation_date, title",
        COLUMNS, filter
    ))?;
    let managers = stmt
        .query_map(params, from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    managers
        .into_iter()
        .map(|manager| with_versions(conn, manager))
        .collect()
}

fn check_can_write(manager: &VersionManager) -> Result<()> {
    if manager.user.is_some() {
        return Err(RegistrationError::AccessControl(
            "Only global templates can be changed.".to_string(),
        ));
    }
    Ok(())
}

fn version_name(title: &str, version_number: u32) -> String {
    format!("{} (Version {})", title, version_number)
}

fn title_taken(conn: &Connection, title: &str, except_id: Option<&str>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM version_managers WHERE user IS NULL AND title = ?1 AND id != ?2",
        params![title, except_id.unwrap_or("")],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Create a global version manager whose first version is `content`.
///
/// The first version becomes current. Nothing is stored when the schema is
/// invalid or the title is already used by another global manager.
pub fn insert(conn: &Connection, title: &str, filename: &str, content: &str) -> Result<VersionManager> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RegistrationError::Api("A template name is required.".to_string()));
    }
    is_schema_valid(content)?;
    if title_taken(conn, title, None)? {
        return Err(RegistrationError::NotUnique(DUPLICATE_TITLE.to_string()));
    }

    let manager_id = db::new_id();
    conn.execute(
        "INSERT INTO version_managers (id, title, user, is_disabled, is_default, creation_date)
         VALUES (?1, ?2, NULL, 0, 0, ?3)",
        params![manager_id, title, db::now()],
    )?;
    let mut first = Template::new(&manager_id, 1, filename, content);
    first.display_name = version_name(title, 1);
    template::upsert(conn, &mut first)?;
    conn.execute(
        "UPDATE version_managers SET current_version_id = ?1 WHERE id = ?2",
        params![first.id, manager_id],
    )?;
    get_by_id(conn, &manager_id)
}

/// Append a new version to a manager. The current version is unchanged.
pub fn insert_version(
    conn: &Connection,
    version_manager_id: &str,
    filename: &str,
    content: &str,
) -> Result<VersionUpload> {
    let manager = get_by_id(conn, version_manager_id)?;
    check_can_write(&manager)?;
    is_schema_valid(content)?;

    let last: Option<u32> = conn.query_row(
        "SELECT MAX(version_number) FROM templates WHERE version_manager_id = ?1",
        params![version_manager_id],
        |row| row.get(0),
    )?;
    let number = last.unwrap_or(0) + 1;
    let mut version = Template::new(version_manager_id, number, filename, content);
    version.display_name = version_name(&manager.title, number);
    template::upsert(conn, &mut version)?;
    if manager.current_version.is_none() {
        conn.execute(
            "UPDATE version_managers SET current_version_id = ?1 WHERE id = ?2",
            params![version.id, version_manager_id],
        )?;
    }

    Ok(VersionUpload {
        version_manager_id: manager.id,
        from: manager.versions,
        to: version.id,
    })
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<VersionManager> {
    let manager = conn
        .query_row(
            &format!("SELECT {} FROM version_managers WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?
        .ok_or_else(|| {
            RegistrationError::DoesNotExist(format!("No template found with id {}.", id))
        })?;
    with_versions(conn, manager)
}

/// Managers owned by no user.
pub fn get_global_version_managers(conn: &Connection) -> Result<Vec<VersionManager>> {
    query(conn, "WHERE user IS NULL", &[])
}

/// Global managers split by status.
pub fn get_template_list(conn: &Connection) -> Result<TemplateList> {
    let (disabled, available) = get_global_version_managers(conn)?
        .into_iter()
        .partition(|manager| manager.is_disabled);
    Ok(TemplateList {
        available,
        disabled,
    })
}

pub fn get_all(conn: &Connection) -> Result<Vec<VersionManager>> {
    query(conn, "", &[])
}

pub fn get_default_version_manager(conn: &Connection) -> Result<VersionManager> {
    query(conn, "WHERE is_default = 1", &[])?
        .into_iter()
        .next()
        .ok_or_else(|| {
            RegistrationError::DoesNotExist("No default registration template is set.".to_string())
        })
}

pub fn get_active_global_version_manager_by_title(conn: &Connection, title: &str) -> Result<VersionManager> {
    query(
        conn,
        "WHERE user IS NULL AND is_disabled = 0 AND title = ?1",
        params![title],
    )?
    .into_iter()
    .next()
    .ok_or_else(|| RegistrationError::DoesNotExist(format!("No active template named {}.", title)))
}

/// The manager holding a version.
pub fn get_from_version(conn: &Connection, template_id: &str) -> Result<VersionManager> {
    let manager_id: Option<String> = conn
        .query_row(
            "SELECT version_manager_id FROM templates WHERE id = ?1",
            params![template_id],
            |row| row.get(0),
        )
        .optional()?;
    match manager_id {
        Some(manager_id) => get_by_id(conn, &manager_id),
        None => Err(RegistrationError::Api(
            "No version manager could be found for this version.".to_string(),
        )),
    }
}

pub fn get_versions(conn: &Connection, version_manager_id: &str) -> Result<Vec<TemplateVersion>> {
    let manager = get_by_id(conn, version_manager_id)?;
    let versions = template::get_all_by_version_manager(conn, version_manager_id)?
        .iter()
        .map(|t| t.to_version(manager.current_version.as_deref() == Some(t.id.as_str())))
        .collect();
    Ok(versions)
}

/// The schema currently shown by a manager.
pub fn get_current_template(conn: &Connection, manager: &VersionManager) -> Result<Template> {
    let current = manager.current_version.as_deref().ok_or_else(|| {
        RegistrationError::DoesNotExist(format!("The template {} has no current version.", manager.title))
    })?;
    template::get_by_id(conn, current)
}

pub fn set_current(conn: &Connection, template_id: &str) -> Result<VersionManager> {
    let manager = get_from_version(conn, template_id)?;
    check_can_write(&manager)?;
    if manager.disabled_versions.iter().any(|id| id == template_id) {
        return Err(RegistrationError::Api(
            "Unable to set the current version because it is disabled.".to_string(),
        ));
    }
    conn.execute(
        "UPDATE version_managers SET current_version_id = ?1 WHERE id = ?2",
        params![template_id, manager.id],
    )?;
    get_by_id(conn, &manager.id)
}

/// Make a manager the default one. Every other manager loses the flag.
pub fn set_default_version_manager(conn: &Connection, version_manager_id: &str) -> Result<VersionManager> {
    let manager = get_by_id(conn, version_manager_id)?;
    check_can_write(&manager)?;
    if manager.is_disabled {
        return Err(RegistrationError::Api(
            "Unable to use a disabled template as default.".to_string(),
        ));
    }
    conn.execute("UPDATE version_managers SET is_default = 0 WHERE is_default = 1", [])?;
    conn.execute(
        "UPDATE version_managers SET is_default = 1 WHERE id = ?1",
        params![manager.id],
    )?;
    get_by_id(conn, &manager.id)
}

pub fn disable_version(conn: &Connection, template_id: &str) -> Result<VersionManager> {
    let manager = get_from_version(conn, template_id)?;
    check_can_write(&manager)?;
    if manager.current_version.as_deref() == Some(template_id) {
        return Err(RegistrationError::Api(
            "Unable to disable the current version.".to_string(),
        ));
    }
    template::set_disabled(conn, template_id, true)?;
    get_by_id(conn, &manager.id)
}

pub fn restore_version(conn: &Connection, template_id: &str) -> Result<VersionManager> {
    let manager = get_from_version(conn, template_id)?;
    check_can_write(&manager)?;
    template::set_disabled(conn, template_id, false)?;
    get_by_id(conn, &manager.id)
}

pub fn disable(conn: &Connection, version_manager_id: &str) -> Result<VersionManager> {
    set_manager_disabled(conn, version_manager_id, true)
}

pub fn restore(conn: &Connection, version_manager_id: &str) -> Result<VersionManager> {
    set_manager_disabled(conn, version_manager_id, false)
}

fn set_manager_disabled(conn: &Connection, version_manager_id: &str, is_disabled: bool) -> Result<VersionManager> {
    let manager = get_by_id(conn, version_manager_id)?;
    check_can_write(&manager)?;
    if is_disabled && manager.is_default {
        return Err(RegistrationError::Api(
            "Unable to disable the default template.".to_string(),
        ));
    }
    conn.execute(
        "UPDATE version_managers SET is_disabled = ?1 WHERE id = ?2",
        params![is_disabled, manager.id],
    )?;
    get_by_id(conn, &manager.id)
}

/// Rename a manager and the display names of its versions.
pub fn edit_title(conn: &Connection, version_manager_id: &str, title: &str) -> Result<VersionManager> {
    let manager = get_by_id(conn, version_manager_id)?;
    check_can_write(&manager)?;
    let title = title.trim();
    if title.is_empty() {
        return Err(RegistrationError::Api("A template name is required.".to_string()));
    }
    if title_taken(conn, title, Some(&manager.id))? {
        return Err(RegistrationError::NotUnique(DUPLICATE_TITLE.to_string()));
    }
    conn.execute(
        "UPDATE version_managers SET title = ?1 WHERE id = ?2",
        params![title, manager.id],
    )?;
    for version in template::get_all_by_version_manager(conn, &manager.id)? {
        template::set_display_name(conn, &version.id, &version_name(title, version.version_number))?;
    }
    get_by_id(conn, &manager.id)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Database;

    pub(crate) const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="user"><xs:complexType><xs:sequence>
    <xs:element name="organization" type="xs:string"/>
  </xs:sequence></xs:complexType></xs:element>
</xs:schema>"#;

    #[test]
    fn insert_creates_current_first_version() {
        let db = Database::open_in_memory().unwrap();
        db.with_transaction(|conn| {
            let manager = insert(conn, "Users", "user.xsd", XSD)?;
            assert_eq!(manager.versions.len(), 1);
            assert_eq!(manager.current_version.as_deref(), Some(manager.versions[0].as_str()));
            let versions = get_versions(conn, &manager.id)?;
            assert_eq!(versions[0].display_name, "Users (Version 1)");
            assert!(versions[0].is_current);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn insert_rejects_duplicate_titles_and_bad_schemas() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert(conn, "Users", "user.xsd", XSD)?;
            let err = insert(conn, "Users", "other.xsd", XSD).unwrap_err();
            assert_eq!(err.to_string(), DUPLICATE_TITLE);
            assert!(matches!(
                insert(conn, "Broken", "broken.xsd", "<not-a-schema/>"),
                Err(RegistrationError::Xsd(_))
            ));
            assert_eq!(get_all(conn)?.len(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn new_versions_are_numbered_and_not_current() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let manager = insert(conn, "Users", "user.xsd", XSD)?;
            let upload = insert_version(conn, &manager.id, "user-v2.xsd", XSD)?;
            assert_eq!(upload.from, manager.versions);
            let versions = get_versions(conn, &manager.id)?;
            assert_eq!(versions.len(), 2);
            assert_eq!(versions[1].display_name, "Users (Version 2)");
            assert!(!versions[1].is_current);
            assert_eq!(get_from_version(conn, &upload.to)?.id, manager.id);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn disabled_version_cannot_become_current() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let manager = insert(conn, "Users", "user.xsd", XSD)?;
            let upload = insert_version(conn, &manager.id, "user-v2.xsd", XSD)?;

            let err = disable_version(conn, &manager.versions[0]).unwrap_err();
            assert!(matches!(err, RegistrationError::Api(_)));

            disable_version(conn, &upload.to)?;
            let err = set_current(conn, &upload.to).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Unable to set the current version because it is disabled."
            );

            restore_version(conn, &upload.to)?;
            let manager = set_current(conn, &upload.to)?;
            assert_eq!(manager.current_version.as_deref(), Some(upload.to.as_str()));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn only_one_default_manager() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let first = insert(conn, "First", "a.xsd", XSD)?;
            let second = insert(conn, "Second", "b.xsd", XSD)?;
            set_default_version_manager(conn, &first.id)?;
            set_default_version_manager(conn, &second.id)?;
            let defaults: Vec<_> = get_all(conn)?.into_iter().filter(|m| m.is_default).collect();
            assert_eq!(defaults.len(), 1);
            assert_eq!(get_default_version_manager(conn)?.id, second.id);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn disable_restore_and_rename() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let users = insert(conn, "Users", "user.xsd", XSD)?;
            insert(conn, "Other", "other.xsd", XSD)?;

            disable(conn, &users.id)?;
            let list = get_template_list(conn)?;
            assert_eq!(list.disabled.len(), 1);
            assert_eq!(list.available.len(), 1);
            assert!(get_active_global_version_manager_by_title(conn, "Users").is_err());
            restore(conn, &users.id)?;
            assert_eq!(get_active_global_version_manager_by_title(conn, "Users")?.id, users.id);
            set_default_version_manager(conn, &users.id)?;
            assert!(matches!(disable(conn, &users.id), Err(RegistrationError::Api(_))));

            assert!(matches!(
                edit_title(conn, &users.id, "Other"),
                Err(RegistrationError::NotUnique(_))
            ));
            edit_title(conn, &users.id, "Members")?;
            let versions = get_versions(conn, &users.id)?;
            assert_eq!(versions[0].display_name, "Members (Version 1)");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn user_owned_managers_are_read_only() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let manager = insert(conn, "Users", "user.xsd", XSD)?;
            conn.execute("UPDATE version_managers SET user = 'bob' WHERE id = ?1", params![manager.id])?;
            assert!(matches!(
                disable(conn, &manager.id),
                Err(RegistrationError::AccessControl(_))
            ));
            assert!(get_global_version_managers(conn)?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn unknown_version_has_no_manager() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let err = get_from_version(conn, "missing").unwrap_err();
            assert_eq!(err.to_string(), "No version manager could be found for this version.");
            Ok(())
        })
        .unwrap();
    }
}
