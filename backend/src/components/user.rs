//! Local user accounts created by account requests.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::db;
use crate::error::{RegistrationError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub date_joined: String,
}

/// An account to create. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

fn from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        is_active: row.get(5)?,
        date_joined: row.get(6)?,
    })
}

pub fn get_by_username(conn: &Connection, username: &str) -> Result<User> {
    conn.query_row(
        "SELECT id, username, first_name, last_name, email, is_active, date_joined
         FROM users WHERE username = ?1",
        params![username],
        from_row,
    )
    .optional()?
    .ok_or_else(|| RegistrationError::DoesNotExist(format!("No user named {}.", username)))
}

pub fn exists(conn: &Connection, username: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Store a new inactive account.
pub fn insert_inactive(conn: &Connection, user: &NewUser) -> Result<User> {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO users (id, username, first_name, last_name, email, password, is_active, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            id,
            user.username,
            user.first_name,
            user.last_name,
            user.email,
            user.password,
            db::now()
        ],
    )?;
    get_by_username(conn, &user.username)
}

pub fn activate(conn: &Connection, username: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE users SET is_active = 1 WHERE username = ?1",
        params![username],
    )?;
    if updated == 0 {
        return Err(RegistrationError::DoesNotExist(format!("No user named {}.", username)));
    }
    Ok(())
}

/// Remove an account that was never activated. Active accounts are kept.
pub fn delete_inactive(conn: &Connection, username: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM users WHERE username = ?1 AND is_active = 0",
        params![username],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Database;

    pub(crate) fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: format!("{}@example.org", username),
            password: "$argon2id$placeholder".to_string(),
        }
    }

    #[test]
    fn new_accounts_start_inactive() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let user = insert_inactive(conn, &new_user("ada"))?;
            assert!(!user.is_active);
            assert!(exists(conn, "ada")?);
            assert!(matches!(
                insert_inactive(conn, &new_user("ada")),
                Err(RegistrationError::NotUnique(_))
            ));
            activate(conn, "ada")?;
            assert!(get_by_username(conn, "ada")?.is_active);
            assert!(!delete_inactive(conn, "ada")?);
            Ok(())
        })
        .unwrap();
    }
}
