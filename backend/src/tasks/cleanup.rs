//! Sweep of abandoned registration forms.
//!
//! Scratch documents left untouched for longer than the configured threshold
//! are deleted along with their element trees. The sweep runs on a fixed interval and can also
//! be started from the admin API.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info};

use crate::components::user_data_structure;
use crate::db::{self, Database};
use crate::error::{RegistrationError, Result};

/// Delete the scratch documents not modified in the `hours_threshold` hours before `now`.
pub fn delete_user_data_structure(db: &Database, hours_threshold: u64, now: DateTime<Utc>) -> Result<usize> {
    info!("Checking Old UserDataStructures");
    let cutoff = i64::try_from(hours_threshold)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .and_then(|age| now.checked_sub_signed(age))
        .map(db::timestamp)
        .ok_or_else(|| {
            RegistrationError::Config(format!("Invalid hours threshold {}", hours_threshold))
        })?;
    let deleted = db.with_transaction(|conn| user_data_structure::delete_older_than(conn, &cutoff))?;
    if deleted > 0 {
        info!("Deleted {} UserDataStructure(s) idle since {}", deleted, cutoff);
    }
    info!("FINISH");
    Ok(deleted)
}

/// Run the sweep every `period`, forever. Failures are logged and the loop goes on.
pub async fn run_periodic(db: Arc<Database>, hours_threshold: u64, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let db = db.clone();
        let handle = tokio::task::spawn_blocking(move || {
            delete_user_data_structure(&db, hours_threshold, Utc::now())
        });
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => error!("Cleanup of old UserDataStructures failed: {}", e),
            Err(join_err) => error!("Cleanup task join error: {}", join_err),
        }
    }
}
