#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
#![warn(clippy::expect_used)]

use dotenvy::dotenv;
use errors::ApplicationError;
use mail::{Mailer, SmtpSettings};
use router::setup_router;
use state::AppState;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod errors;
mod export;
mod jwt;
mod mail;
mod model;
mod router;
mod state;

#[cfg(test)]
mod test;

struct Config {
    host: String,
    port: String,
    jwt_secret: String,
    db_path: PathBuf,
    public_url: String,
    smtp: Option<SmtpSettings>,
}

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    if let Err(e) = run().await {
        // Print the error using Display
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run() -> Result<(), ApplicationError> {
    setup_tracing();

    let config = setup_env()?;

    // Ensure the data directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApplicationError::Internal(format!("Failed to create data directory: {}", e))
        })?;
    }

    let db = memo_core::open_db(&config.db_path)
        .map_err(|e| ApplicationError::Internal(format!("Failed to open database: {}", e)))?;

    let mailer = Mailer::from_settings(config.smtp)?;

    let app_state = AppState::new(db, &config.jwt_secret, &config.public_url, mailer);
    let app = setup_router(app_state);

    let address = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", address);

    let listener = TcpListener::bind(address)
        .await
        .map_err(ApplicationError::from)?;

    info!(
        "Listening on: {}",
        listener.local_addr().map_err(ApplicationError::from)?
    );

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ApplicationError::CannotServe)?;
    Ok(())
}

fn setup_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{crate_name}=debug,tower_http=debug",
                    crate_name = env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn setup_env() -> Result<Config, ApplicationError> {
    dotenv().ok();

    let host = std::env::var("MEMO_HOST")
        .map_err(|e| ApplicationError::EnvError(e, "MEMO_HOST".to_string()))?;
    let port = std::env::var("MEMO_PORT")
        .map_err(|e| ApplicationError::EnvError(e, "MEMO_PORT".to_string()))?;
    let jwt_secret = std::env::var("MEMO_JWT_SECRET")
        .map_err(|e| ApplicationError::EnvError(e, "MEMO_JWT_SECRET".to_string()))?;
    let db_path = std::env::var("MEMO_DB_PATH").unwrap_or_else(|_| "./data/memo.db".to_string());
    let public_url = std::env::var("MEMO_PUBLIC_URL")
        .unwrap_or_else(|_| format!("http://{}:{}", host, port));

    let smtp = match std::env::var("MEMO_SMTP_HOST") {
        Ok(smtp_host) => {
            let smtp_port = std::env::var("MEMO_SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse::<u16>()
                .map_err(|e| {
                    ApplicationError::Internal(format!("Invalid MEMO_SMTP_PORT: {}", e))
                })?;
            let from = std::env::var("MEMO_MAIL_FROM")
                .map_err(|e| ApplicationError::EnvError(e, "MEMO_MAIL_FROM".to_string()))?;

            Some(SmtpSettings {
                host: smtp_host,
                port: smtp_port,
                username: std::env::var("MEMO_SMTP_USER").ok(),
                password: std::env::var("MEMO_SMTP_PASSWORD").ok(),
                from,
            })
        }
        Err(_) => None,
    };

    Ok(Config {
        host,
        port,
        jwt_secret,
        db_path: PathBuf::from(db_path),
        public_url,
        smtp,
    })
}
