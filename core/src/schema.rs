/// SQL schema for the application database: users, their owner records and
/// the notes foreign-keyed to owners.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE,
    is_email_valid INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    due_date TEXT,
    priority TEXT NOT NULL DEFAULT 'M',
    status TEXT NOT NULL DEFAULT 'N',
    category TEXT NOT NULL DEFAULT 'N',
    FOREIGN KEY (owner_id) REFERENCES owners (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_notes_owner_id ON notes(owner_id);
CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at);
CREATE INDEX IF NOT EXISTS idx_notes_due_date ON notes(due_date);

PRAGMA user_version = 1;
"#;

/// Get current schema version from database
pub fn get_schema_version(conn: &rusqlite::Connection) -> Result<i32, rusqlite::Error> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Set schema version in database
pub fn set_schema_version(
    conn: &rusqlite::Connection,
    version: i32,
) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "user_version", version)
}

/// Run migrations to bring database to current schema version
pub fn migrate(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let mut version = get_schema_version(conn)?;

    // Apply migrations sequentially
    if version == 0 {
        // Fresh database - apply v1 schema
        conn.execute_batch(SCHEMA_V1)?;
        version = 1;
    }

    // Version 1 is current
    if version == 1 {
        Ok(())
    } else {
        Err(rusqlite::Error::InvalidQuery)
    }
}
