//! Scratch documents holding registration forms being filled in.
//!
//! A document is unique per (user, template, name). It is deleted exactly
//! once: when its content is promoted to finalized metadata, or by the
//! cleanup sweep when it gets too old.

use registration_common::model::data_structure::UserDataStructure;
use registration_common::model::form::FormElement;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use crate::components::data_structure_element;
use crate::db;
use crate::error::{RegistrationError, Result};

const COLUMNS: &str = "id, user, template_id, name, form_string, data_structure_element_root_id, \
                       data_id, creation_date, last_modification_date";

fn from_row(row: &Row) -> rusqlite::Result<UserDataStructure> {
    Ok(UserDataStructure {
        id: row.get(0)?,
        user: row.get(1)?,
        template_id: row.get(2)?,
        name: row.get(3)?,
        form_string: row.get(4)?,
        data_structure_element_root: row.get(5)?,
        data_id: row.get(6)?,
        creation_date: row.get(7)?,
        last_modification_date: row.get(8)?,
    })
}

fn query(conn: &Connection, filter: &str, params: &[&dyn ToSql]) -> Result<Vec<UserDataStructure>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM user_data_structures {} ORDER BY creation_date",
        COLUMNS, filter
    ))?;
    let documents = stmt
        .query_map(params, from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(documents)
}

fn not_found(id: &str) -> RegistrationError {
    RegistrationError::DoesNotExist(format!("No data structure found with id {}.", id))
}

/// A new, unsaved document.
pub fn new(user: &str, template_id: &str, name: &str) -> UserDataStructure {
    let now = db::now();
    UserDataStructure {
        id: db::new_id(),
        user: user.to_string(),
        template_id: template_id.to_string(),
        name: name.to_string(),
        form_string: None,
        data_structure_element_root: None,
        data_id: None,
        creation_date: now.clone(),
        last_modification_date: now,
    }
}

/// Insert or update a document.
///
/// Fails with `NotUnique` when another document has the same user,
/// template and name.
pub fn upsert(conn: &Connection, data_structure: &mut UserDataStructure) -> Result<()> {
    if data_structure.name.trim().is_empty() {
        return Err(RegistrationError::Api("A data structure needs a name.".to_string()));
    }
    data_structure.last_modification_date = db::now();
    conn.execute(
        "INSERT INTO user_data_structures (id, user, template_id, name, form_string,
                                           data_structure_element_root_id, data_id,
                                           creation_date, last_modification_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             user = excluded.user,
             template_id = excluded.template_id,
             name = excluded.name,
             form_string = excluded.form_string,
             data_structure_element_root_id = excluded.data_structure_element_root_id,
             data_id = excluded.data_id,
             last_modification_date = excluded.last_modification_date",
        params![
            data_structure.id,
            data_structure.user,
            data_structure.template_id,
            data_structure.name,
            data_structure.form_string,
            data_structure.data_structure_element_root,
            data_structure.data_id,
            data_structure.creation_date,
            data_structure.last_modification_date,
        ],
    )?;
    Ok(())
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<UserDataStructure> {
    conn.query_row(
        &format!("SELECT {} FROM user_data_structures WHERE id = ?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| not_found(id))
}

pub fn get_all(conn: &Connection) -> Result<Vec<UserDataStructure>> {
    query(conn, "", &[])
}

/// Delete a document and its element tree.
///
/// Fails with `DoesNotExist` when the document is already gone, so that a
/// caller running in a transaction rolls back instead of deleting twice.
pub fn delete(conn: &Connection, id: &str) -> Result<()> {
    let deleted = conn.execute("DELETE FROM user_data_structures WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub fn get_by_data_id(conn: &Connection, data_id: &str) -> Result<UserDataStructure> {
    query(conn, "WHERE data_id = ?1", params![data_id])?
        .into_iter()
        .next()
        .ok_or_else(|| {
            RegistrationError::DoesNotExist(format!("No data structure is linked to data {}.", data_id))
        })
}

/// Replace the element tree of a document with `root`. Returns the new root id.
pub fn update_data_structure_root(conn: &Connection, id: &str, root: &FormElement) -> Result<String> {
    let mut data_structure = get_by_id(conn, id)?;
    data_structure_element::delete_for_data_structure(conn, id)?;
    let root_id = data_structure_element::save_tree(conn, id, root)?;
    data_structure.data_structure_element_root = Some(root_id.clone());
    upsert(conn, &mut data_structure)?;
    Ok(root_id)
}

pub fn get_by_data_structure_element_root_id(conn: &Connection, root_id: &str) -> Result<UserDataStructure> {
    query(conn, "WHERE data_structure_element_root_id = ?1", params![root_id])?
        .into_iter()
        .next()
        .ok_or_else(|| {
            RegistrationError::DoesNotExist(format!("No data structure has the root element {}.", root_id))
        })
}

pub fn change_owner(conn: &Connection, id: &str, new_user: &str) -> Result<UserDataStructure> {
    if new_user.trim().is_empty() {
        return Err(RegistrationError::Api("The new owner cannot be empty.".to_string()));
    }
    let mut data_structure = get_by_id(conn, id)?;
    data_structure.user = new_user.to_string();
    upsert(conn, &mut data_structure)?;
    Ok(data_structure)
}

pub fn get_all_by_user_id_and_template_id(conn: &Connection, user: &str, template_id: &str) -> Result<Vec<UserDataStructure>> {
    query(conn, "WHERE user = ?1 AND template_id = ?2", params![user, template_id])
}

pub fn get_by_user_id_and_template_id_and_name(
    conn: &Connection,
    user: &str,
    template_id: &str,
    name: &str,
) -> Result<UserDataStructure> {
    query(
        conn,
        "WHERE user = ?1 AND template_id = ?2 AND name = ?3",
        params![user, template_id, name],
    )?
    .into_iter()
    .next()
    .ok_or_else(|| RegistrationError::DoesNotExist(format!("No data structure named {}.", name)))
}

pub fn get_all_by_user(conn: &Connection, user: &str) -> Result<Vec<UserDataStructure>> {
    query(conn, "WHERE user = ?1", params![user])
}

pub fn get_all_with_no_data(conn: &Connection) -> Result<Vec<UserDataStructure>> {
    query(conn, "WHERE data_id IS NULL", &[])
}

pub fn get_all_by_user_id_with_no_data(conn: &Connection, user: &str) -> Result<Vec<UserDataStructure>> {
    query(conn, "WHERE user = ?1 AND data_id IS NULL", params![user])
}

pub fn get_all_except_user_id_with_no_data(conn: &Connection, user: &str) -> Result<Vec<UserDataStructure>> {
    query(conn, "WHERE user != ?1 AND data_id IS NULL", params![user])
}

pub fn get_all_by_user_id_and_template_id_with_no_data(
    conn: &Connection,
    user: &str,
    template_id: &str,
) -> Result<Vec<UserDataStructure>> {
    query(
        conn,
        "WHERE user = ?1 AND template_id = ?2 AND data_id IS NULL",
        params![user, template_id],
    )
}

/// Delete every document last modified before `cutoff`. Returns how many went.
///
/// Saving the document, replacing its tree or editing one of its values all
/// move `last_modification_date`, so forms in use are kept.
pub fn delete_older_than(conn: &Connection, cutoff: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM user_data_structures WHERE last_modification_date < ?1",
        params![cutoff],
    )?)
}

/// Delete the documents of a user.
pub fn delete_all_by_user(conn: &Connection, user: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM user_data_structures WHERE user = ?1", params![user])?)
}
