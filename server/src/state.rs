use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::RestError;
use crate::mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub jwt_secret: String,
    /// Base URL used when composing verification and reset links
    pub public_url: String,
    pub mailer: Arc<Mailer>,
}

impl AppState {
    pub fn new(db: Connection, jwt_secret: &str, public_url: &str, mailer: Mailer) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            jwt_secret: jwt_secret.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
            mailer: Arc::new(mailer),
        }
    }

    /// Lock the database connection for the duration of a request
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, RestError> {
        self.db
            .lock()
            .map_err(|_| RestError::Internal("database lock poisoned".to_string()))
    }
}
