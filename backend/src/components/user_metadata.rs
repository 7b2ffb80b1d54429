//! Finalized registration data.
//!
//! Content is validated against its template on every save, so a stored
//! document always matched its schema when it was written.

use registration_common::model::user_metadata::UserMetadata;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};

use crate::components::{placeholders, template};
use crate::db;
use crate::error::{RegistrationError, Result};
use crate::xsd::check_xml_against_schema;

const COLUMNS: &str = "id, title, template_id, user_id, workspace_id, xml_content, \
                       creation_date, last_modification_date";

fn from_row(row: &Row) -> rusqlite::Result<UserMetadata> {
    Ok(UserMetadata {
        id: row.get(0)?,
        title: row.get(1)?,
        template_id: row.get(2)?,
        user_id: row.get(3)?,
        workspace_id: row.get(4)?,
        xml_content: row.get(5)?,
        creation_date: row.get(6)?,
        last_modification_date: row.get(7)?,
    })
}

/// Translate sort keys (`title`, `-creation_date`, ...) into an ORDER BY clause.
fn order_clause(order_by: &[&str]) -> Result<String> {
    if order_by.is_empty() {
        return Ok("ORDER BY title".to_string());
    }
    let mut terms = Vec::with_capacity(order_by.len());
    for key in order_by {
        let (field, direction) = match key.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (*key, "ASC"),
        };
        let column = match field {
            "title" => "title",
            "creation_date" => "creation_date",
            "last_modification_date" => "last_modification_date",
            "template" => "template_id",
            "user_id" => "user_id",
            other => {
                return Err(RegistrationError::Api(format!("Unable to sort data by '{}'.", other)))
            }
        };
        terms.push(format!("{} {}", column, direction));
    }
    Ok(format!("ORDER BY {}", terms.join(", ")))
}

fn query(conn: &Connection, filter: &str, order_by: &[&str], values: Vec<&dyn ToSql>) -> Result<Vec<UserMetadata>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM user_metadata {} {}",
        COLUMNS,
        filter,
        order_clause(order_by)?
    ))?;
    let documents = stmt
        .query_map(params_from_iter(values), from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(documents)
}

/// A new, unsaved document.
pub fn new(id: &str, title: &str, template_id: &str, user_id: &str, workspace_id: Option<&str>, xml_content: String) -> UserMetadata {
    let now = db::now();
    UserMetadata {
        id: id.to_string(),
        title: title.to_string(),
        template_id: template_id.to_string(),
        user_id: user_id.to_string(),
        workspace_id: workspace_id.map(str::to_string),
        xml_content,
        creation_date: now.clone(),
        last_modification_date: now,
    }
}

/// Check the content of a document against the schema of its template.
pub fn check_xml_file_is_valid(conn: &Connection, metadata: &UserMetadata) -> Result<()> {
    let template = template::get_by_id(conn, &metadata.template_id)?;
    check_xml_against_schema(&template.content, &metadata.xml_content)
}

/// Validate and store a document.
pub fn upsert(conn: &Connection, metadata: &mut UserMetadata) -> Result<()> {
    if metadata.xml_content.trim().is_empty() {
        return Err(RegistrationError::Api(
            "Unable to save data: xml_content field is not set.".to_string(),
        ));
    }
    check_xml_file_is_valid(conn, metadata)?;
    metadata.last_modification_date = db::now();
    conn.execute(
        "INSERT INTO user_metadata (id, title, template_id, user_id, workspace_id, xml_content,
                                    creation_date, last_modification_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             template_id = excluded.template_id,
             user_id = excluded.user_id,
             workspace_id = excluded.workspace_id,
             xml_content = excluded.xml_content,
             last_modification_date = excluded.last_modification_date",
        params![
            metadata.id,
            metadata.title,
            metadata.template_id,
            metadata.user_id,
            metadata.workspace_id,
            metadata.xml_content,
            metadata.creation_date,
            metadata.last_modification_date,
        ],
    )?;
    Ok(())
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<UserMetadata> {
    conn.query_row(
        &format!("SELECT {} FROM user_metadata WHERE id = ?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| RegistrationError::DoesNotExist(format!("No data found with id {}.", id)))
}

pub fn get_all(conn: &Connection, order_by: &[&str]) -> Result<Vec<UserMetadata>> {
    query(conn, "", order_by, Vec::new())
}

pub fn get_all_except(conn: &Connection, order_by: &[&str], ids: &[String]) -> Result<Vec<UserMetadata>> {
    if ids.is_empty() {
        return get_all(conn, order_by);
    }
    let filter = format!("WHERE id NOT IN ({})", placeholders(ids.len()));
    query(conn, &filter, order_by, ids.iter().map(|id| id as &dyn ToSql).collect())
}

pub fn get_all_by_user_id(conn: &Connection, user_id: &str, order_by: &[&str]) -> Result<Vec<UserMetadata>> {
    query(conn, "WHERE user_id = ?", order_by, vec![&user_id as &dyn ToSql])
}

pub fn get_all_except_user_id(conn: &Connection, user_id: &str, order_by: &[&str]) -> Result<Vec<UserMetadata>> {
    query(conn, "WHERE user_id != ?", order_by, vec![&user_id as &dyn ToSql])
}

pub fn get_all_by_id_list(conn: &Connection, ids: &[String], order_by: &[&str]) -> Result<Vec<UserMetadata>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = format!("WHERE id IN ({})", placeholders(ids.len()));
    query(conn, &filter, order_by, ids.iter().map(|id| id as &dyn ToSql).collect())
}

/// Documents of a workspace. `None` selects documents in no workspace.
pub fn get_all_by_workspace(conn: &Connection, workspace_id: Option<&str>, order_by: &[&str]) -> Result<Vec<UserMetadata>> {
    match workspace_id {
        Some(workspace_id) => query(conn, "WHERE workspace_id = ?", order_by, vec![&workspace_id as &dyn ToSql]),
        None => query(conn, "WHERE workspace_id IS NULL", order_by, Vec::new()),
    }
}

pub fn get_all_by_list_workspace(conn: &Connection, workspace_ids: &[String], order_by: &[&str]) -> Result<Vec<UserMetadata>> {
    if workspace_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = format!("WHERE workspace_id IN ({})", placeholders(workspace_ids.len()));
    query(conn, &filter, order_by, workspace_ids.iter().map(|id| id as &dyn ToSql).collect())
}

pub fn get_all_by_list_template(conn: &Connection, template_ids: &[String], order_by: &[&str]) -> Result<Vec<UserMetadata>> {
    if template_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = format!("WHERE template_id IN ({})", placeholders(template_ids.len()));
    query(conn, &filter, order_by, template_ids.iter().map(|id| id as &dyn ToSql).collect())
}

pub fn get_all_by_user_and_workspace(
    conn: &Connection,
    user_id: &str,
    workspace_id: &str,
    order_by: &[&str],
) -> Result<Vec<UserMetadata>> {
    query(
        conn,
        "WHERE user_id = ? AND workspace_id = ?",
        order_by,
        vec![&user_id as &dyn ToSql, &workspace_id as &dyn ToSql],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::user_data_structure::tests::template_id;
    use crate::db::schema::GLOBAL_WORKSPACE_ID;
    use crate::db::Database;

    const VALID: &str = "<user><organization>NIST</organization></user>";

    fn save(conn: &Connection, id: &str, title: &str, user: &str, workspace: Option<&str>) -> UserMetadata {
        let mut metadata = new(id, title, &template_id(conn), user, workspace, VALID.to_string());
        upsert(conn, &mut metadata).unwrap();
        metadata
    }

    #[test]
    fn upsert_requires_valid_content() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let template = template_id(conn);
            let mut empty = new("a", "empty", &template, "ada", None, String::new());
            let err = upsert(conn, &mut empty).unwrap_err();
            assert_eq!(err.to_string(), "Unable to save data: xml_content field is not set.");

            let mut invalid = new("b", "invalid", &template, "ada", None, "<user/>".to_string());
            assert!(matches!(upsert(conn, &mut invalid), Err(RegistrationError::Xml(_))));
            assert!(get_by_id(conn, "b").is_err());

            let mut valid = new("c", "valid", &template, "ada", None, VALID.to_string());
            upsert(conn, &mut valid)?;
            assert_eq!(get_by_id(conn, "c")?.xml_content, VALID);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn queries_filter_and_sort() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            save(conn, "1", "b", "ada", Some(GLOBAL_WORKSPACE_ID));
            save(conn, "2", "a", "bob", Some(GLOBAL_WORKSPACE_ID));
            save(conn, "3", "c", "ada", None);

            let titles = |docs: Vec<UserMetadata>| docs.into_iter().map(|d| d.title).collect::<Vec<_>>();
            assert_eq!(titles(get_all(conn, &[])?), vec!["a", "b", "c"]);
            assert_eq!(titles(get_all(conn, &["-title"])?), vec!["c", "b", "a"]);
            assert_eq!(titles(get_all_except(conn, &[], &["1".to_string()])?), vec!["a", "c"]);
            assert_eq!(titles(get_all_by_user_id(conn, "ada", &[])?), vec!["b", "c"]);
            assert_eq!(titles(get_all_except_user_id(conn, "ada", &[])?), vec!["a"]);
            assert_eq!(
                titles(get_all_by_id_list(conn, &["3".to_string(), "2".to_string()], &["title"])?),
                vec!["a", "c"]
            );
            assert_eq!(titles(get_all_by_workspace(conn, None, &[])?), vec!["c"]);
            assert_eq!(
                titles(get_all_by_list_workspace(conn, &[GLOBAL_WORKSPACE_ID.to_string()], &[])?),
                vec!["a", "b"]
            );
            assert_eq!(get_all_by_list_template(conn, &[template_id(conn)], &[])?.len(), 3);
            assert_eq!(
                titles(get_all_by_user_and_workspace(conn, "ada", GLOBAL_WORKSPACE_ID, &[])?),
                vec!["b"]
            );
            assert!(get_all_by_id_list(conn, &[], &[])?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn unknown_sort_keys_are_rejected() {
        assert!(order_clause(&["title; DROP TABLE users"]).is_err());
        assert_eq!(
            order_clause(&["template", "-last_modification_date"]).unwrap(),
            "ORDER BY template_id ASC, last_modification_date DESC"
        );
    }
}
