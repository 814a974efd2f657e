use chrono::NaiveDate;
use memo_core::{Category, Note, NoteDraft, Priority, Status};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{RestError, RestResult};

/// Note representation returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// Owner record id
    pub owner: i64,
    pub content: String,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    pub due_date: Option<NaiveDate>,
    /// Single-character code: L, M or H
    pub priority: String,
    /// Single-character code: N, P, C or D
    pub status: String,
    /// Single-character code: N, B, G, O, P, R or Y
    pub category: String,
}

impl From<Note> for NoteDto {
    fn from(note: Note) -> Self {
        NoteDto {
            id: note.id,
            title: note.title,
            slug: note.slug,
            owner: note.owner_id,
            content: note.content,
            created_at: note.created_at,
            due_date: note.due_date,
            priority: note.priority.as_code().to_string(),
            status: note.status.as_code().to_string(),
            category: note.category.as_code().to_string(),
        }
    }
}

/// Request body for creating or fully replacing a note
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotePayload {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
}

impl NotePayload {
    pub fn into_draft(self) -> RestResult<NoteDraft> {
        let title = self
            .title
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| RestError::Validation("title is required".to_string()))?;
        let slug = self
            .slug
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| RestError::Validation("slug is required".to_string()))?;
        let content = self
            .content
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| RestError::Validation("content is required".to_string()))?;

        let priority = match self.priority {
            Some(code) => Priority::from_code(&code)
                .ok_or_else(|| RestError::Validation(format!("unknown priority code '{code}'")))?,
            None => Priority::default(),
        };
        let status = match self.status {
            Some(code) => Status::from_code(&code)
                .ok_or_else(|| RestError::Validation(format!("unknown status code '{code}'")))?,
            None => Status::default(),
        };
        let category = match self.category {
            Some(code) => Category::from_code(&code)
                .ok_or_else(|| RestError::Validation(format!("unknown category code '{code}'")))?,
            None => Category::default(),
        };

        Ok(NoteDraft {
            title,
            slug,
            content,
            due_date: self.due_date,
            priority,
            status,
            category,
        })
    }
}

/// Query parameters accepted by the note list endpoint. Only one filter
/// applies per request; precedence is status > ordering > category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoteListQuery {
    pub status: Option<String>,
    pub ordering: Option<String>,
    pub category: Option<String>,
}
