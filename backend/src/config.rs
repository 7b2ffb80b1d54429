//! Service configuration.
//!
//! Every setting can be given as a command line flag or through the
//! environment. A `.env` file in the working directory is loaded first.

use clap::Parser;

/// User registration service.
#[derive(Parser, Debug, Clone)]
#[command(name = "user_registration")]
#[command(about = "Self-service account requests with schema-driven registration forms")]
pub struct Settings {
    /// Host to bind the HTTP server to
    #[arg(long, env = "REGISTRATION_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "REGISTRATION_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path of the SQLite database file
    #[arg(long, env = "REGISTRATION_DATABASE", default_value = "registration.sqlite")]
    pub database: String,

    /// Default log filter (trace, debug, info, warn, error)
    #[arg(long, env = "REGISTRATION_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Public URI of the service, quoted in notification mails
    #[arg(long, env = "SERVER_URI", default_value = "http://127.0.0.1:8080")]
    pub server_uri: String,

    /// Bearer token required on every admin route. Admin routes are closed when unset.
    #[arg(long, env = "REGISTRATION_ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    /// Administrator mail addresses, comma separated
    #[arg(long, env = "REGISTRATION_ADMIN_EMAILS", value_delimiter = ',')]
    pub admin_emails: Vec<String>,

    /// Path of the registration schema loaded into an empty database
    #[arg(long, env = "REGISTRY_XSD_USER_FILEPATH")]
    pub registry_xsd_user_filepath: Option<String>,

    /// Title given to the registration schema loaded into an empty database
    #[arg(long, env = "REGISTRY_XSD_USER_FILENAME")]
    pub registry_xsd_user_filename: Option<String>,

    /// Age in hours after which unfinished registration forms are deleted
    #[arg(long, env = "USER_DATA_STRUCTURE_HOURS_THRESHOLD", default_value_t = 24)]
    pub user_data_structure_hours_threshold: u64,

    /// Seconds between two cleanup sweeps
    #[arg(long, env = "CLEANUP_INTERVAL_SECS", default_value_t = 60)]
    pub cleanup_interval_secs: u64,

    /// Maximum size of JSON and multipart payloads, in bytes
    #[arg(long, env = "REGISTRATION_PAYLOAD_LIMIT", default_value_t = 10 * 1024 * 1024)]
    pub payload_limit: usize,
}

impl Settings {
    /// Parse the settings from the command line and the environment.
    pub fn load() -> Self {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        Settings::parse()
    }

    /// Administrator addresses with blanks removed.
    pub fn administrators(&self) -> Vec<String> {
        self.admin_emails
            .iter()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .collect()
    }
}
