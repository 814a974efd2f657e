use rusqlite::Connection;
use std::path::Path;

use crate::schema;

pub mod note;
pub mod user;

/// Open or create the application database at the specified path
pub fn open_db(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "foreign_keys", true)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
