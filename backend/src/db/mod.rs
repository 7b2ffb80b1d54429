//! SQLite storage for the registration service.
//!
//! A single connection is shared behind a mutex. Components take a
//! `&Connection` so that callers can compose several of them inside one
//! transaction through [`Database::with_transaction`].

pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::Connection;

use crate::error::{RegistrationError, Result};

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening SQLite database at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory SQLite database");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with shared access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RegistrationError::Model(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Run `f` inside a transaction, committed only when `f` succeeds.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RegistrationError::Model(format!("Lock poisoned: {}", e)))?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Current time in the storage format.
pub fn now() -> String {
    timestamp(Utc::now())
}

/// Fixed-width RFC 3339 UTC timestamp, so that string order is time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
