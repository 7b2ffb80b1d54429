use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use log::error;
use registration_common::jobs::JobStatus;
use registration_common::requests::JobCreated;

use crate::error::RegistrationError;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::{require_admin, AppState};
use crate::tasks::cleanup::delete_user_data_structure;

/// Start a cleanup sweep in the background and answer with its job id.
pub async fn start_cleanup(
    req: HttpRequest,
    state: web::Data<AppState>,
    jobs_state: web::Data<JobsState>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &state.settings) {
        return e.error_response();
    }
    let job_id = schedule_cleanup_job(&state, jobs_state).await;
    HttpResponse::Accepted().json(JobCreated { job_id })
}

/// Register the job and run the sweep on the blocking pool.
///
/// Every status change goes through the job channel, so the updater applies
/// them in order.
async fn schedule_cleanup_job(state: &AppState, jobs_state: web::Data<JobsState>) -> String {
    let job_id = jobs_state.register().await;
    let tx = jobs_state.tx.clone();
    let value = job_id.clone();
    let db = state.db.clone();
    let hours_threshold = state.settings.user_data_structure_hours_threshold;

    tokio::spawn(async move {
        let started = JobUpdate {
            job_id: value.clone(),
            status: JobStatus::InProgress(0),
        };
        if tx.send(started).await.is_err() {
            error!("The job updater is gone, cleanup job {} runs untracked", value);
        }

        let handle = tokio::task::spawn_blocking(move || {
            delete_user_data_structure(&db, hours_threshold, Utc::now())
        });

        let status = match handle.await {
            Ok(Ok(deleted)) => JobStatus::Completed(format!("{} data structure(s) deleted", deleted)),
            Ok(Err(e)) => JobStatus::Failed(e.to_string()),
            Err(join_err) => JobStatus::Failed(format!("join error: {}", join_err)),
        };
        if tx.send(JobUpdate { job_id: value, status }).await.is_err() {
            error!("The job updater is gone, cleanup job status lost");
        }
    });

    job_id
}

pub async fn status(
    req: HttpRequest,
    state: web::Data<AppState>,
    jobs_state: web::Data<JobsState>,
    job_id: web::Path<String>,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &state.settings) {
        return e.error_response();
    }
    match jobs_state.status(&job_id.into_inner()).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => RegistrationError::DoesNotExist("Job ID not found".to_string()).error_response(),
    }
}
