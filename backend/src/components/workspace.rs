use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::db::schema::GLOBAL_WORKSPACE_ID;
use crate::error::{RegistrationError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workspace {
    pub id: String,
    pub title: String,
    pub owner: Option<String>,
    pub is_public: bool,
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<Workspace> {
    conn.query_row(
        "SELECT id, title, owner, is_public FROM workspaces WHERE id = ?1",
        params![id],
        |row| {
            Ok(Workspace {
                id: row.get(0)?,
                title: row.get(1)?,
                owner: row.get(2)?,
                is_public: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| RegistrationError::DoesNotExist(format!("No workspace found with id {}.", id)))
}

/// The public workspace finalized registration data is published into.
pub fn get_global_workspace(conn: &Connection) -> Result<Workspace> {
    get_by_id(conn, GLOBAL_WORKSPACE_ID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn global_workspace_exists_and_is_public() {
        let db = Database::open_in_memory().unwrap();
        let workspace = db.with_conn(get_global_workspace).unwrap();
        assert!(workspace.is_public);
        assert!(workspace.owner.is_none());
    }
}
