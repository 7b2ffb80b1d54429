//! State of background jobs started from the admin API.
//!
//! Jobs report their progress as [`JobUpdate`] messages on an MPSC channel;
//! [`start_job_updater`] applies them to the shared map that the status
//! endpoint reads.

use registration_common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Shared job table, injected into the actix application as `web::Data`.
#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest status.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender used by running jobs to report progress.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// A fresh job table and the receiver to hand to [`start_job_updater`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Register a new pending job and return its id.
    pub async fn register(&self) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.jobs
            .write()
            .await
            .insert(job_id.clone(), JobStatus::Pending);
        job_id
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Apply job updates until every sender is dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id.clone(), update.status);
    }
}
