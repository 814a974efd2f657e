use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A registered user. The password field holds the argon2 PHC hash,
/// never the raw password.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    /// Unix timestamp in milliseconds
    pub updated_at: i64,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Note-authorship record, one-to-one with a user. Created lazily the first
/// time a user writes a note, or when their email is verified.
#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    pub id: i64,
    pub user_id: i64,
    pub is_email_valid: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Note priority, stored and serialized as its single-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    High,
}

impl Priority {
    pub fn as_code(self) -> &'static str {
        match self {
            Priority::Low => "L",
            Priority::Medium => "M",
            Priority::High => "H",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Priority::Low),
            "M" => Some(Priority::Medium),
            "H" => Some(Priority::High),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Note lifecycle status. The delete endpoint performs a hard delete; the
/// `Deleted` status exists only as a soft-delete marker a client may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "N")]
    New,
    #[serde(rename = "P")]
    InProgress,
    #[serde(rename = "C")]
    Completed,
    #[serde(rename = "D")]
    Deleted,
}

impl Status {
    pub fn as_code(self) -> &'static str {
        match self {
            Status::New => "N",
            Status::InProgress => "P",
            Status::Completed => "C",
            Status::Deleted => "D",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(Status::New),
            "P" => Some(Status::InProgress),
            "C" => Some(Status::Completed),
            "D" => Some(Status::Deleted),
            _ => None,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::New
    }
}

/// Fixed 7-value colour palette for categorizing notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "N")]
    None,
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "O")]
    Orange,
    #[serde(rename = "P")]
    Purple,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "Y")]
    Yellow,
}

impl Category {
    pub fn as_code(self) -> &'static str {
        match self {
            Category::None => "N",
            Category::Blue => "B",
            Category::Green => "G",
            Category::Orange => "O",
            Category::Purple => "P",
            Category::Red => "R",
            Category::Yellow => "Y",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(Category::None),
            "B" => Some(Category::Blue),
            "G" => Some(Category::Green),
            "O" => Some(Category::Orange),
            "P" => Some(Category::Purple),
            "R" => Some(Category::Red),
            "Y" => Some(Category::Yellow),
            _ => None,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::None
    }
}

/// A note with all metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    /// URL-safe identifier, unique across all users
    pub slug: String,
    pub content: String,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    /// Unix timestamp in milliseconds
    pub updated_at: i64,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    pub category: Category,
}

/// Validated input for creating or fully replacing a note.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    pub category: Category,
}

/// Status keyword filters recognized by the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKeyword {
    /// Notes still open (status new or in progress)
    Unfinished,
    /// Notes whose due date has passed, regardless of status
    Overdue,
    /// Completed notes
    Done,
}

impl StatusKeyword {
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        if value.eq_ignore_ascii_case("unfinished") {
            Ok(StatusKeyword::Unfinished)
        } else if value.eq_ignore_ascii_case("overdue") {
            Ok(StatusKeyword::Overdue)
        } else if value.eq_ignore_ascii_case("done") {
            Ok(StatusKeyword::Done)
        } else {
            Err(StoreError::InvalidFilter(format!(
                "unknown status keyword '{value}', expected one of Unfinished, Overdue, Done"
            )))
        }
    }
}

/// Whitelisted note columns available for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    DueDate,
    Priority,
    CreatedAt,
    UpdatedAt,
    Title,
}

impl OrderField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            OrderField::DueDate => "due_date",
            OrderField::Priority => "priority",
            OrderField::CreatedAt => "created_at",
            OrderField::UpdatedAt => "updated_at",
            OrderField::Title => "title",
        }
    }
}

/// An ordering request, e.g. `due_date` or `-created_at` for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderBy {
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        let (name, descending) = match value.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (value, false),
        };

        let field = match name {
            "due_date" => OrderField::DueDate,
            "priority" => OrderField::Priority,
            "created_at" => OrderField::CreatedAt,
            "updated_at" => OrderField::UpdatedAt,
            "title" => OrderField::Title,
            _ => {
                return Err(StoreError::InvalidFilter(format!(
                    "unknown ordering field '{name}'"
                )))
            }
        };

        Ok(OrderBy { field, descending })
    }
}

/// Explicit filter specification interpreted by a single query-building
/// function. At most one filter applies per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteFilter {
    Status(StatusKeyword),
    Ordering(OrderBy),
    Category(Category),
}

impl NoteFilter {
    /// Build a filter from the raw query parameters. Precedence when several
    /// are supplied: status > ordering > category. Unrecognized values are a
    /// hard error, never a silent empty result.
    pub fn from_query(
        status: Option<&str>,
        ordering: Option<&str>,
        category: Option<&str>,
    ) -> Result<Option<Self>, StoreError> {
        if let Some(value) = status {
            return Ok(Some(NoteFilter::Status(StatusKeyword::parse(value)?)));
        }

        if let Some(value) = ordering {
            return Ok(Some(NoteFilter::Ordering(OrderBy::parse(value)?)));
        }

        if let Some(value) = category {
            let category = Category::from_code(value).ok_or_else(|| {
                StoreError::InvalidFilter(format!("unknown category code '{value}'"))
            })?;
            return Ok(Some(NoteFilter::Category(category)));
        }

        Ok(None)
    }
}
