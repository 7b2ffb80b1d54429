//! Persisted form trees of scratch documents.
//!
//! Each node of a [`FormElement`] tree is one row; `parent_id` and
//! `position` keep the shape and the order of the children.

use std::collections::HashMap;

use registration_common::model::form::{FormElement, FormTag};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};

use crate::db;
use crate::error::{RegistrationError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct DataStructureElement {
    pub id: String,
    pub data_structure_id: String,
    pub parent_id: Option<String>,
    pub position: u32,
    pub tag: FormTag,
    pub value: Option<String>,
    pub options: Map<String, Value>,
}

const COLUMNS: &str = "id, data_structure_id, parent_id, position, tag, value, options";

fn from_row(row: &Row) -> rusqlite::Result<(DataStructureElement, String, String)> {
    // tag and options are decoded outside of the row mapper to report errors as model errors
    let tag: String = row.get(4)?;
    let options: String = row.get(6)?;
    Ok((
        DataStructureElement {
            id: row.get(0)?,
            data_structure_id: row.get(1)?,
            parent_id: row.get(2)?,
            position: row.get(3)?,
            tag: FormTag::Element,
            value: row.get(5)?,
            options: Map::new(),
        },
        tag,
        options,
    ))
}

fn decode((mut element, tag, options): (DataStructureElement, String, String)) -> Result<DataStructureElement> {
    element.tag = FormTag::parse(&tag)
        .ok_or_else(|| RegistrationError::Model(format!("unknown element tag '{}'", tag)))?;
    element.options = serde_json::from_str(&options)?;
    Ok(element)
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<DataStructureElement> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM data_structure_elements WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?
        .ok_or_else(|| {
            RegistrationError::DoesNotExist(format!("No data structure element found with id {}.", id))
        })?;
    decode(raw)
}

/// Store `root` and its descendants for a data structure. Returns the root id.
///
/// Ids already present on the nodes are ignored; every node gets a new one.
pub fn save_tree(conn: &Connection, data_structure_id: &str, root: &FormElement) -> Result<String> {
    let mut stmt = conn.prepare(
        "INSERT INTO data_structure_elements
             (id, data_structure_id, parent_id, position, tag, value, options, creation_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let creation_date = db::now();
    let root_id = db::new_id();
    let mut pending: Vec<(&FormElement, String, Option<String>, u32)> = vec![(root, root_id.clone(), None, 0)];
    while let Some((node, id, parent_id, position)) = pending.pop() {
        stmt.execute(params![
            id,
            data_structure_id,
            parent_id,
            position,
            node.tag.as_str(),
            node.value,
            serde_json::to_string(&node.options)?,
            creation_date,
        ])?;
        for (index, child) in node.children.iter().enumerate() {
            pending.push((child, db::new_id(), Some(id.clone()), index as u32));
        }
    }
    Ok(root_id)
}

/// Load the tree rooted at `root_id`, with storage ids set on every node.
pub fn load_tree(conn: &Connection, root_id: &str) -> Result<FormElement> {
    let root = get_by_id(conn, root_id)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM data_structure_elements
         WHERE data_structure_id = ?1 AND parent_id IS NOT NULL
         ORDER BY position",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![root.data_structure_id], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut children: HashMap<String, Vec<DataStructureElement>> = HashMap::new();
    for raw in rows {
        let element = decode(raw)?;
        if let Some(parent_id) = element.parent_id.clone() {
            children.entry(parent_id).or_default().push(element);
        }
    }
    Ok(build(root, &mut children))
}

fn build(element: DataStructureElement, children: &mut HashMap<String, Vec<DataStructureElement>>) -> FormElement {
    let nodes = children.remove(&element.id).unwrap_or_default();
    FormElement {
        id: Some(element.id),
        tag: element.tag,
        value: element.value,
        options: element.options,
        children: nodes.into_iter().map(|child| build(child, children)).collect(),
    }
}

/// Change the value of an editable element and return the value it replaced.
pub fn set_value(conn: &Connection, id: &str, value: &str) -> Result<Option<String>> {
    let element = get_by_id(conn, id)?;
    if !element.tag.is_editable() {
        return Err(RegistrationError::Api(format!(
            "An element of type {} cannot be edited.",
            element.tag.as_str()
        )));
    }
    if element.tag == FormTag::Choice {
        let selected: usize = value
            .parse()
            .map_err(|_| RegistrationError::Api(format!("'{}' is not a choice index.", value)))?;
        let branches: i64 = conn.query_row(
            "SELECT COUNT(*) FROM data_structure_elements WHERE parent_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if selected as i64 >= branches {
            return Err(RegistrationError::Api(format!("The choice has no branch {}.", selected)));
        }
    }
    conn.execute(
        "UPDATE data_structure_elements SET value = ?1 WHERE id = ?2",
        params![value, id],
    )?;
    conn.execute(
        "UPDATE user_data_structures SET last_modification_date = ?1 WHERE id = ?2",
        params![db::now(), element.data_structure_id],
    )?;
    Ok(element.value)
}

pub fn delete_for_data_structure(conn: &Connection, data_structure_id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM data_structure_elements WHERE data_structure_id = ?1",
        params![data_structure_id],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::user_data_structure::tests::scratch;
    use crate::db::Database;
    use serde_json::json;

    fn leaf(tag: FormTag, value: Option<&str>) -> FormElement {
        FormElement {
            id: None,
            tag,
            value: value.map(str::to_string),
            options: Map::new(),
            children: Vec::new(),
        }
    }

    fn sample() -> FormElement {
        let mut name = leaf(FormTag::Element, Some("name"));
        name.children.push(leaf(FormTag::Input, None));
        let mut choice = leaf(FormTag::Choice, Some("0"));
        choice.children.push(leaf(FormTag::Sequence, None));
        choice.children.push(leaf(FormTag::Sequence, None));
        let mut sequence = leaf(FormTag::Sequence, None);
        sequence.children.push(name);
        sequence.children.push(choice);
        let mut root = leaf(FormTag::Element, Some("user"));
        root.options.insert("min_occurs".to_string(), json!(1));
        root.children.push(sequence);
        root
    }

    fn strip_ids(mut form: FormElement) -> FormElement {
        form.id = None;
        form.children = form.children.into_iter().map(strip_ids).collect();
        form
    }

    #[test]
    fn tree_survives_a_round_trip_with_ids() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let data_structure = scratch(conn, "ada");
            let root_id = save_tree(conn, &data_structure.id, &sample())?;
            let loaded = load_tree(conn, &root_id)?;
            assert_eq!(loaded.id.as_deref(), Some(root_id.as_str()));
            assert!(loaded.children[0].children[0].id.is_some());
            assert_eq!(strip_ids(loaded), sample());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn only_editable_elements_accept_values() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let data_structure = scratch(conn, "ada");
            let root_id = save_tree(conn, &data_structure.id, &sample())?;
            let tree = load_tree(conn, &root_id)?;
            let input = tree.children[0].children[0].children[0].id.clone().unwrap();
            let choice = tree.children[0].children[1].id.clone().unwrap();

            assert_eq!(set_value(conn, &input, "Ada")?, None);
            assert_eq!(set_value(conn, &input, "Ada L.")?, Some("Ada".to_string()));
            assert_eq!(set_value(conn, &choice, "1")?, Some("0".to_string()));
            assert!(matches!(set_value(conn, &choice, "2"), Err(RegistrationError::Api(_))));
            assert!(matches!(set_value(conn, &root_id, "x"), Err(RegistrationError::Api(_))));
            assert!(matches!(get_by_id(conn, "missing"), Err(RegistrationError::DoesNotExist(_))));

            assert_eq!(delete_for_data_structure(conn, &data_structure.id)?, 7);
            Ok(())
        })
        .unwrap();
    }
}
