#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

pub mod db;
pub mod error;
pub mod models;
pub mod schema;

// Re-export commonly used types
pub use db::note::{create_note, delete_note, list_notes, note_by_id, update_note};
pub use db::open_db;
pub use db::user::{
    create_user, get_or_create_owner, mark_email_verified, owner_by_user, update_password,
    user_by_email, user_by_id,
};
pub use error::StoreError;
pub use models::{
    Category, Note, NoteDraft, NoteFilter, OrderBy, OrderField, Owner, Priority, Status,
    StatusKeyword, User,
};
