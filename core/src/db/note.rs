use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use crate::db::now_millis;
use crate::db::user::get_or_create_owner;
use crate::error::{is_unique_violation, StoreError};
use crate::models::{Category, Note, NoteDraft, NoteFilter, Priority, Status, StatusKeyword};

const NOTE_COLUMNS: &str =
    "id, owner_id, title, slug, content, created_at, updated_at, due_date, priority, status, category";

fn conversion_failure(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::other(message)),
    )
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let due_date: Option<String> = row.get(7)?;
    let due_date = match due_date {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|e| conversion_failure(7, e.to_string()))?,
        ),
        None => None,
    };

    let priority: String = row.get(8)?;
    let priority = Priority::from_code(&priority)
        .ok_or_else(|| conversion_failure(8, format!("unknown priority code '{priority}'")))?;

    let status: String = row.get(9)?;
    let status = Status::from_code(&status)
        .ok_or_else(|| conversion_failure(9, format!("unknown status code '{status}'")))?;

    let category: String = row.get(10)?;
    let category = Category::from_code(&category)
        .ok_or_else(|| conversion_failure(10, format!("unknown category code '{category}'")))?;

    Ok(Note {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        due_date,
        priority,
        status,
        category,
    })
}

fn map_slug_violation(e: rusqlite::Error) -> StoreError {
    if is_unique_violation(&e, "notes.slug") {
        StoreError::DuplicateSlug
    } else {
        StoreError::Sqlite(e)
    }
}

/// Create a note for a user, lazily creating their owner record when it does
/// not exist yet. Both writes run in one transaction so a failed note insert
/// never leaves an orphaned owner behind.
pub fn create_note(
    conn: &mut Connection,
    user_id: i64,
    draft: &NoteDraft,
) -> Result<Note, StoreError> {
    let tx = conn.transaction()?;

    let owner = get_or_create_owner(&tx, user_id)?;
    let now = now_millis();

    tx.execute(
        "INSERT INTO notes (owner_id, title, slug, content, created_at, updated_at, due_date, priority, status, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            owner.id,
            draft.title,
            draft.slug,
            draft.content,
            now,
            now,
            draft.due_date.map(|d| d.to_string()),
            draft.priority.as_code(),
            draft.status.as_code(),
            draft.category.as_code(),
        ],
    )
    .map_err(map_slug_violation)?;

    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(Note {
        id,
        owner_id: owner.id,
        title: draft.title.clone(),
        slug: draft.slug.clone(),
        content: draft.content.clone(),
        created_at: now,
        updated_at: now,
        due_date: draft.due_date,
        priority: draft.priority,
        status: draft.status,
        category: draft.category,
    })
}

/// List an owner's notes, optionally narrowed or reordered by a single
/// filter. The default ordering is most recently created first.
pub fn list_notes(
    conn: &Connection,
    owner_id: i64,
    filter: Option<&NoteFilter>,
) -> Result<Vec<Note>, StoreError> {
    let mut sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ?1");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id)];

    match filter {
        Some(NoteFilter::Status(keyword)) => {
            match keyword {
                StatusKeyword::Unfinished => sql.push_str(" AND status IN ('N', 'P')"),
                StatusKeyword::Overdue => {
                    sql.push_str(" AND due_date IS NOT NULL AND due_date <= ?2");
                    params.push(Box::new(chrono::Utc::now().date_naive().to_string()));
                }
                StatusKeyword::Done => sql.push_str(" AND status = 'C'"),
            }
            sql.push_str(" ORDER BY created_at DESC");
        }
        Some(NoteFilter::Ordering(order)) => {
            // Column names come from the OrderField whitelist, never from
            // raw user input.
            let direction = if order.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(" ORDER BY {} {}", order.field.column(), direction));
        }
        Some(NoteFilter::Category(category)) => {
            sql.push_str(" AND category = ?2 ORDER BY created_at DESC");
            params.push(Box::new(category.as_code()));
        }
        None => sql.push_str(" ORDER BY created_at DESC"),
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), note_from_row)?;

    let mut notes = Vec::new();
    for note in rows {
        notes.push(note?);
    }

    Ok(notes)
}

/// Get a single note scoped to its owner. Absent notes and notes owned by
/// someone else are indistinguishable to the caller.
pub fn note_by_id(conn: &Connection, owner_id: i64, note_id: i64) -> Result<Note, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND owner_id = ?2"
    ))?;

    match stmt.query_row(params![note_id, owner_id], note_from_row) {
        Ok(note) => Ok(note),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// Fully replace a note's mutable fields
pub fn update_note(
    conn: &Connection,
    owner_id: i64,
    note_id: i64,
    draft: &NoteDraft,
) -> Result<Note, StoreError> {
    let rows = conn
        .execute(
            "UPDATE notes SET title = ?1, slug = ?2, content = ?3, due_date = ?4,
                 priority = ?5, status = ?6, category = ?7, updated_at = ?8
             WHERE id = ?9 AND owner_id = ?10",
            params![
                draft.title,
                draft.slug,
                draft.content,
                draft.due_date.map(|d| d.to_string()),
                draft.priority.as_code(),
                draft.status.as_code(),
                draft.category.as_code(),
                now_millis(),
                note_id,
                owner_id,
            ],
        )
        .map_err(map_slug_violation)?;

    if rows == 0 {
        return Err(StoreError::NotFound);
    }

    note_by_id(conn, owner_id, note_id)
}

/// Hard-delete a note
pub fn delete_note(conn: &Connection, owner_id: i64, note_id: i64) -> Result<(), StoreError> {
    let rows = conn.execute(
        "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
        params![note_id, owner_id],
    )?;

    if rows == 0 {
        return Err(StoreError::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::db::open_db;
    use crate::db::user::{create_user, owner_by_user};
    use crate::models::{OrderBy, OrderField};
    use tempfile::TempDir;

    fn draft(title: &str, slug: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            slug: slug.to_string(),
            content: "content".to_string(),
            due_date: None,
            priority: Priority::Medium,
            status: Status::New,
            category: Category::None,
        }
    }

    fn test_user(conn: &Connection, email: &str) -> i64 {
        create_user(conn, "Kerry", "Hilson", email, "hash")
            .unwrap()
            .id
    }

    #[test]
    fn test_create_note_creates_owner_lazily() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let user_id = test_user(&conn, "kerry@example.com");
        assert!(owner_by_user(&conn, user_id).unwrap().is_none());

        let note = create_note(&mut conn, user_id, &draft("Buy milk", "buy-milk")).unwrap();

        let owner = owner_by_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(note.owner_id, owner.id);
        assert!(!owner.is_email_valid);
    }

    #[test]
    fn test_failed_note_insert_rolls_back_owner() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let first = test_user(&conn, "first@example.com");
        let second = test_user(&conn, "second@example.com");

        create_note(&mut conn, first, &draft("Buy milk", "buy-milk")).unwrap();

        // Second user's note collides on the slug; their lazily created
        // owner row must be rolled back with it.
        let result = create_note(&mut conn, second, &draft("Also milk", "buy-milk"));
        assert!(matches!(result, Err(StoreError::DuplicateSlug)));
        assert!(owner_by_user(&conn, second).unwrap().is_none());
    }

    #[test]
    fn test_list_notes_default_order_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let user_id = test_user(&conn, "kerry@example.com");

        // created_at has millisecond resolution; force distinct timestamps
        let older = create_note(&mut conn, user_id, &draft("Older", "older")).unwrap();
        conn.execute(
            "UPDATE notes SET created_at = created_at - 1000 WHERE id = ?1",
            params![older.id],
        )
        .unwrap();
        let newer = create_note(&mut conn, user_id, &draft("Newer", "newer")).unwrap();

        let owner_id = owner_by_user(&conn, user_id).unwrap().unwrap().id;
        let notes = list_notes(&conn, owner_id, None).unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, newer.id);
        assert_eq!(notes[1].id, older.id);
    }

    #[test]
    fn test_filter_done_scoped_to_owner() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let alice = test_user(&conn, "alice@example.com");
        let bob = test_user(&conn, "bob@example.com");

        let mut done = draft("Done", "alice-done");
        done.status = Status::Completed;
        create_note(&mut conn, alice, &done).unwrap();
        create_note(&mut conn, alice, &draft("Open", "alice-open")).unwrap();

        let mut bob_done = draft("Bob done", "bob-done");
        bob_done.status = Status::Completed;
        create_note(&mut conn, bob, &bob_done).unwrap();

        let alice_owner = owner_by_user(&conn, alice).unwrap().unwrap().id;
        let notes = list_notes(
            &conn,
            alice_owner,
            Some(&NoteFilter::Status(StatusKeyword::Done)),
        )
        .unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].slug, "alice-done");
    }

    #[test]
    fn test_filter_unfinished_and_overdue() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let user_id = test_user(&conn, "kerry@example.com");

        let mut overdue = draft("Overdue", "overdue");
        overdue.due_date = Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        overdue.status = Status::Completed;
        create_note(&mut conn, user_id, &overdue).unwrap();

        let mut wip = draft("Wip", "wip");
        wip.status = Status::InProgress;
        create_note(&mut conn, user_id, &wip).unwrap();

        let owner_id = owner_by_user(&conn, user_id).unwrap().unwrap().id;

        let unfinished = list_notes(
            &conn,
            owner_id,
            Some(&NoteFilter::Status(StatusKeyword::Unfinished)),
        )
        .unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].slug, "wip");

        // Overdue looks at the due date only, not the status
        let late = list_notes(
            &conn,
            owner_id,
            Some(&NoteFilter::Status(StatusKeyword::Overdue)),
        )
        .unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].slug, "overdue");
    }

    #[test]
    fn test_ordering_and_category_filters() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let user_id = test_user(&conn, "kerry@example.com");

        let mut blue = draft("Banana", "banana");
        blue.category = Category::Blue;
        create_note(&mut conn, user_id, &blue).unwrap();
        create_note(&mut conn, user_id, &draft("Apple", "apple")).unwrap();

        let owner_id = owner_by_user(&conn, user_id).unwrap().unwrap().id;

        let by_title = list_notes(
            &conn,
            owner_id,
            Some(&NoteFilter::Ordering(OrderBy {
                field: OrderField::Title,
                descending: false,
            })),
        )
        .unwrap();
        assert_eq!(by_title[0].title, "Apple");
        assert_eq!(by_title[1].title, "Banana");

        let blues = list_notes(
            &conn,
            owner_id,
            Some(&NoteFilter::Category(Category::Blue)),
        )
        .unwrap();
        assert_eq!(blues.len(), 1);
        assert_eq!(blues[0].slug, "banana");
    }

    #[test]
    fn test_note_access_is_owner_scoped() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let alice = test_user(&conn, "alice@example.com");
        let bob = test_user(&conn, "bob@example.com");

        let note = create_note(&mut conn, alice, &draft("Private", "private")).unwrap();
        create_note(&mut conn, bob, &draft("Bob note", "bob-note")).unwrap();

        let bob_owner = owner_by_user(&conn, bob).unwrap().unwrap().id;

        assert!(matches!(
            note_by_id(&conn, bob_owner, note.id),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            update_note(&conn, bob_owner, note.id, &draft("Stolen", "stolen")),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            delete_note(&conn, bob_owner, note.id),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_update_and_delete_note() {
        let dir = TempDir::new().unwrap();
        let mut conn = open_db(&dir.path().join("test.db")).unwrap();

        let user_id = test_user(&conn, "kerry@example.com");
        let note = create_note(&mut conn, user_id, &draft("Buy milk", "buy-milk")).unwrap();
        let owner_id = note.owner_id;

        let mut changed = draft("Buy oat milk", "buy-oat-milk");
        changed.priority = Priority::High;
        let updated = update_note(&conn, owner_id, note.id, &changed).unwrap();

        assert_eq!(updated.title, "Buy oat milk");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.created_at, note.created_at);

        delete_note(&conn, owner_id, note.id).unwrap();
        assert!(matches!(
            note_by_id(&conn, owner_id, note.id),
            Err(StoreError::NotFound)
        ));
    }
}
