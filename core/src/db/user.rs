use rusqlite::{params, Connection, Row};

use crate::db::now_millis;
use crate::error::{is_unique_violation, StoreError};
use crate::models::{Owner, User};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn owner_from_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        user_id: row.get(1)?,
        is_email_valid: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Create a new user. The password must already be hashed by the caller.
pub fn create_user(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, StoreError> {
    let now = now_millis();

    conn.execute(
        "INSERT INTO users (first_name, last_name, email, password, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![first_name, last_name, email, password_hash, now, now],
    )
    .map_err(|e| {
        if is_unique_violation(&e, "users.email") {
            StoreError::DuplicateEmail
        } else {
            StoreError::Sqlite(e)
        }
    })?;

    Ok(User {
        id: conn.last_insert_rowid(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        password: password_hash.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve a user by their email address
pub fn user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email, password, created_at, updated_at
         FROM users WHERE email = ?1",
    )?;

    match stmt.query_row(params![email], user_from_row) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Retrieve a user by id
pub fn user_by_id(conn: &Connection, user_id: i64) -> Result<Option<User>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email, password, created_at, updated_at
         FROM users WHERE id = ?1",
    )?;

    match stmt.query_row(params![user_id], user_from_row) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace a user's password hash
pub fn update_password(
    conn: &Connection,
    user_id: i64,
    password_hash: &str,
) -> Result<(), StoreError> {
    let rows = conn.execute(
        "UPDATE users SET password = ?1, updated_at = ?2 WHERE id = ?3",
        params![password_hash, now_millis(), user_id],
    )?;

    if rows == 0 {
        return Err(StoreError::NotFound);
    }

    Ok(())
}

/// Retrieve the owner record for a user, if one exists
pub fn owner_by_user(conn: &Connection, user_id: i64) -> Result<Option<Owner>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, is_email_valid, created_at, updated_at
         FROM owners WHERE user_id = ?1",
    )?;

    match stmt.query_row(params![user_id], owner_from_row) {
        Ok(owner) => Ok(Some(owner)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Get the owner record for a user, creating an unverified one if none
/// exists yet. Idempotent. Callers that pair this with a dependent write
/// must run both inside one transaction.
pub fn get_or_create_owner(conn: &Connection, user_id: i64) -> Result<Owner, StoreError> {
    if let Some(owner) = owner_by_user(conn, user_id)? {
        return Ok(owner);
    }

    let now = now_millis();

    conn.execute(
        "INSERT INTO owners (user_id, is_email_valid, created_at, updated_at)
         VALUES (?1, 0, ?2, ?3)",
        params![user_id, now, now],
    )?;

    Ok(Owner {
        id: conn.last_insert_rowid(),
        user_id,
        is_email_valid: false,
        created_at: now,
        updated_at: now,
    })
}

/// Mark a user's email as verified, creating the owner record if needed.
/// Idempotent on repeat calls.
pub fn mark_email_verified(conn: &mut Connection, user_id: i64) -> Result<Owner, StoreError> {
    let tx = conn.transaction()?;

    let owner = get_or_create_owner(&tx, user_id)?;

    tx.execute(
        "UPDATE owners SET is_email_valid = 1, updated_at = ?1 WHERE id = ?2",
        params![now_millis(), owner.id],
    )?;

    tx.commit()?;

    Ok(Owner {
        is_email_valid: true,
        ..owner
    })
}
