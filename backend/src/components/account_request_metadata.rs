//! Account requests awaiting an administrator decision.

use log::{error, info};
use registration_common::model::account_request::AccountRequest;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::components::user::{self, NewUser};
use crate::components::user_data_structure;
use crate::db::{self, Database};
use crate::error::{RegistrationError, Result};
use crate::notifications::{self, Mailer};

const COLUMNS: &str = "id, username, first_name, last_name, email, date, metadata_id";

fn from_row(row: &Row) -> rusqlite::Result<AccountRequest> {
    Ok(AccountRequest {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        date: row.get(5)?,
        metadata_id: row.get(6)?,
    })
}

/// Open requests, oldest first.
pub fn get_all(conn: &Connection) -> Result<Vec<AccountRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM account_requests ORDER BY date",
        COLUMNS
    ))?;
    let requests = stmt
        .query_map([], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(requests)
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<AccountRequest> {
    conn.query_row(
        &format!("SELECT {} FROM account_requests WHERE id = ?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| RegistrationError::DoesNotExist(format!("No account request found with id {}.", id)))
}

/// Attach finalized registration data to a request.
pub fn insert_metadata(conn: &Connection, account_id: &str, metadata_id: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE account_requests SET metadata_id = ?1 WHERE id = ?2",
        params![metadata_id, account_id],
    )?;
    if updated == 0 {
        return Err(RegistrationError::DoesNotExist(format!(
            "No account request found with id {}.",
            account_id
        )));
    }
    Ok(())
}

/// Store an inactive account and the request asking to activate it.
pub fn create_account_request(conn: &Connection, new_user: &NewUser) -> Result<AccountRequest> {
    if user::exists(conn, &new_user.username)? {
        return Err(RegistrationError::Api(
            "A user with the same username already exists.".to_string(),
        ));
    }
    user::insert_inactive(conn, new_user)?;

    let request = AccountRequest {
        id: db::new_id(),
        username: new_user.username.clone(),
        first_name: new_user.first_name.clone(),
        last_name: new_user.last_name.clone(),
        email: new_user.email.clone(),
        date: db::now(),
        metadata_id: None,
    };
    conn.execute(
        "INSERT INTO account_requests (id, username, first_name, last_name, email, date, metadata_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
        params![
            request.id,
            request.username,
            request.first_name,
            request.last_name,
            request.email,
            request.date
        ],
    )?;
    Ok(request)
}

fn delete(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM account_requests WHERE id = ?1", params![id])?;
    Ok(())
}

/// Tell administrators about a new request. Failures are logged only.
pub fn notify_administrators(mailer: &dyn Mailer, request: &AccountRequest, server_uri: &str) {
    let body = notifications::new_account_request_body(&request.username, server_uri);
    if let Err(e) = mailer.send_mail_to_administrators("New Account Request", &body) {
        error!("Unable to notify administrators of request {}: {}", request.id, e);
    }
}

/// Activate the requested account and close the request.
pub fn accept(db: &Database, mailer: &dyn Mailer, request_id: &str, server_uri: &str) -> Result<AccountRequest> {
    let request = db.with_transaction(|conn| {
        let request = get_by_id(conn, request_id)?;
        user::activate(conn, &request.username)?;
        delete(conn, &request.id)?;
        Ok(request)
    })?;
    info!("Account request {} accepted for {}", request.id, request.username);

    let body = notifications::account_accepted_body(&request.first_name, server_uri);
    if let Err(e) = mailer.send_mail(&[request.email.clone()], "Account approved", &body) {
        error!("Unable to notify {} of the approval: {}", request.username, e);
    }
    Ok(request)
}

/// Close a request without activating the account.
///
/// The inactive account and the requester's unfinished forms are removed.
/// Finalized registration data is kept.
pub fn deny(db: &Database, mailer: &dyn Mailer, request_id: &str, reason: Option<&str>) -> Result<AccountRequest> {
    let request = db.with_transaction(|conn| {
        let request = get_by_id(conn, request_id)?;
        user::delete_inactive(conn, &request.username)?;
        user_data_structure::delete_all_by_user(conn, &request.username)?;
        delete(conn, &request.id)?;
        Ok(request)
    })?;
    info!("Account request {} denied for {}", request.id, request.username);

    let body = notifications::account_denied_body(&request.first_name, reason);
    if let Err(e) = mailer.send_mail(&[request.email.clone()], "Account request denied", &body) {
        error!("Unable to notify {} of the denial: {}", request.username, e);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::user::tests::new_user;
    use crate::components::user_data_structure::tests::scratch;
    use crate::notifications::{get_outbox, OutboxMailer};
    use std::sync::Arc;

    fn setup() -> (Arc<Database>, OutboxMailer) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mailer = OutboxMailer::new(db.clone(), vec!["admin@example.org".to_string()]);
        (db, mailer)
    }

    #[test]
    fn duplicate_usernames_are_refused() {
        let (db, _) = setup();
        db.with_conn(|conn| {
            create_account_request(conn, &new_user("ada"))?;
            let err = create_account_request(conn, &new_user("ada")).unwrap_err();
            assert_eq!(err.to_string(), "A user with the same username already exists.");
            assert_eq!(get_all(conn)?.len(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn accept_activates_and_mails_the_user() {
        let (db, mailer) = setup();
        let request = db
            .with_conn(|conn| create_account_request(conn, &new_user("ada")))
            .unwrap();
        notify_administrators(&mailer, &request, "http://localhost");

        accept(&db, &mailer, &request.id, "http://localhost").unwrap();
        db.with_conn(|conn| {
            assert!(user::get_by_username(conn, "ada")?.is_active);
            assert!(get_all(conn)?.is_empty());
            Ok(())
        })
        .unwrap();

        let outbox = get_outbox(&db).unwrap();
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox[0].subject, "New Account Request");
        assert_eq!(outbox[1].recipients, vec!["ada@example.org".to_string()]);
        assert!(matches!(
            accept(&db, &mailer, &request.id, "http://localhost"),
            Err(RegistrationError::DoesNotExist(_))
        ));
    }

    #[test]
    fn deny_removes_account_and_forms() {
        let (db, mailer) = setup();
        let request = db
            .with_conn(|conn| {
                scratch(conn, "ada");
                create_account_request(conn, &new_user("ada"))
            })
            .unwrap();

        deny(&db, &mailer, &request.id, Some("incomplete")).unwrap();
        db.with_conn(|conn| {
            assert!(!user::exists(conn, "ada")?);
            assert!(user_data_structure::get_all_by_user(conn, "ada")?.is_empty());
            assert!(get_all(conn)?.is_empty());
            Ok(())
        })
        .unwrap();
        let outbox = get_outbox(&db).unwrap();
        assert!(outbox[0].body.contains("Reason: incomplete"));
    }

    #[test]
    fn metadata_can_be_attached() {
        let (db, _) = setup();
        db.with_conn(|conn| {
            let request = create_account_request(conn, &new_user("ada"))?;
            assert!(matches!(
                insert_metadata(conn, "missing", "x"),
                Err(RegistrationError::DoesNotExist(_))
            ));
            let template_id = crate::components::user_data_structure::tests::template_id(conn);
            conn.execute(
                "INSERT INTO user_metadata (id, title, template_id, user_id, workspace_id, xml_content,
                                            creation_date, last_modification_date)
                 VALUES ('data', 'ada', ?1, 'ada', NULL, '<user/>', ?2, ?2)",
                params![template_id, db::now()],
            )?;
            insert_metadata(conn, &request.id, "data")?;
            assert_eq!(get_by_id(conn, &request.id)?.metadata_id.as_deref(), Some("data"));

            // Removing the data leaves the request pending, unlinked.
            conn.execute("DELETE FROM user_metadata WHERE id = 'data'", [])?;
            assert_eq!(get_by_id(conn, &request.id)?.metadata_id, None);
            Ok(())
        })
        .unwrap();
    }
}
