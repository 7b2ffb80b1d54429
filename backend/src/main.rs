use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use user_registration::config::Settings;
use user_registration::db::Database;
use user_registration::job_controller::state::{start_job_updater, JobsState};
use user_registration::notifications::{Mailer, OutboxMailer};
use user_registration::services::{self, AppState};
use user_registration::system::init_registration_app;
use user_registration::tasks::cleanup;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = Settings::load();
    env_logger::init_from_env(Env::default().default_filter_or(settings.log_level.as_str()));

    let db = Database::open(Path::new(&settings.database))
        .map(Arc::new)
        .map_err(std::io::Error::other)?;

    // Without a registration schema the service still starts; account
    // requests answer 503 until an administrator uploads a default template.
    if let Err(e) = init_registration_app(&db, &settings) {
        error!("Registration schema not loaded: {}", e);
    }

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new(100);
    tokio::spawn(start_job_updater(jobs_state.clone(), rx));

    tokio::spawn(cleanup::run_periodic(
        db.clone(),
        settings.user_data_structure_hours_threshold,
        Duration::from_secs(settings.cleanup_interval_secs.max(1)),
    ));

    let mailer: Arc<dyn Mailer> = Arc::new(OutboxMailer::new(db.clone(), settings.administrators()));
    let host = settings.host.clone();
    let port = settings.port;
    let payload_limit = settings.payload_limit;
    let state = AppState {
        db,
        mailer,
        settings: Arc::new(settings),
    };

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::JsonConfig::default().limit(payload_limit))
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::registration::configure_routes())
            .service(services::admin::configure_routes())
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
