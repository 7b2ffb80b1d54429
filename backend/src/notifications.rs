//! Outgoing mail.
//!
//! Delivery is outside of this service: messages are written to the
//! `mail_outbox` table, where a mail relay picks them up.

use std::sync::Arc;

use log::{info, warn};
use rusqlite::params;
use serde::Serialize;

use crate::db::{self, Database};
use crate::error::Result;

pub trait Mailer: Send + Sync {
    fn send_mail(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;

    fn send_mail_to_administrators(&self, subject: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxMessage {
    pub id: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub creation_date: String,
}

pub struct OutboxMailer {
    db: Arc<Database>,
    administrators: Vec<String>,
}

impl OutboxMailer {
    pub fn new(db: Arc<Database>, administrators: Vec<String>) -> Self {
        OutboxMailer { db, administrators }
    }
}

impl Mailer for OutboxMailer {
    fn send_mail(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        if recipients.is_empty() {
            warn!("Mail '{}' has no recipient, dropping it", subject);
            return Ok(());
        }
        let recipients_json = serde_json::to_string(recipients)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO mail_outbox (id, recipients, subject, body, creation_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![db::new_id(), recipients_json, subject, body, db::now()],
            )?;
            Ok(())
        })?;
        info!("Queued mail '{}' for {}", subject, recipients.join(", "));
        Ok(())
    }

    fn send_mail_to_administrators(&self, subject: &str, body: &str) -> Result<()> {
        self.send_mail(&self.administrators, subject, body)
    }
}

/// Queued messages, oldest first.
pub fn get_outbox(db: &Database) -> Result<Vec<OutboxMessage>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, recipients, subject, body, creation_date FROM mail_outbox
             ORDER BY creation_date, rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(id, recipients, subject, body, creation_date)| -> Result<OutboxMessage> {
                Ok(OutboxMessage {
                    id,
                    recipients: serde_json::from_str(&recipients)?,
                    subject,
                    body,
                    creation_date,
                })
            })
            .collect()
    })
}

pub fn new_account_request_body(username: &str, server_uri: &str) -> String {
    format!(
        "A new account has been requested by {}.\n\nReview the pending requests at {}/api/admin/requests.\n",
        username, server_uri
    )
}

pub fn account_accepted_body(first_name: &str, server_uri: &str) -> String {
    format!(
        "Dear {},\n\nYour account request has been accepted. You can now sign in at {}.\n",
        first_name, server_uri
    )
}

pub fn account_denied_body(first_name: &str, reason: Option<&str>) -> String {
    let mut body = format!("Dear {},\n\nYour account request has been denied.\n", first_name);
    if let Some(reason) = reason.filter(|reason| !reason.trim().is_empty()) {
        body.push_str(&format!("\nReason: {}\n", reason.trim()));
    }
    body
}
