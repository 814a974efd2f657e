use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tracing::info;

use crate::errors::{RestError, RestResult};
use crate::model::note::{NoteDto, NoteListQuery, NotePayload};
use crate::model::user::User;
use crate::router::auth::require_user;
use crate::state::AppState;

pub fn note_routes(_app_state: AppState) -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route(
            "/notes",
            get_with(list_notes, list_notes_docs).post_with(create_note, create_note_docs),
        )
        .api_route(
            "/notes/:note_id",
            get_with(get_note, get_note_docs)
                .put_with(update_note, update_note_docs)
                .delete_with(delete_note, delete_note_docs),
        )
}

async fn list_notes(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Query(query): Query<NoteListQuery>,
) -> RestResult<Json<Vec<NoteDto>>> {
    let user = require_user(user)?;

    let filter = memo_core::NoteFilter::from_query(
        query.status.as_deref(),
        query.ordering.as_deref(),
        query.category.as_deref(),
    )?;

    let conn = state.db()?;
    let notes = match memo_core::owner_by_user(&conn, user.id)? {
        Some(owner) => memo_core::list_notes(&conn, owner.id, filter.as_ref())?,
        // A user who never wrote a note has no owner record yet
        None => Vec::new(),
    };

    Ok(Json(notes.into_iter().map(NoteDto::from).collect()))
}

fn list_notes_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List the requester's notes")
        .description(
            "Optional query params narrow or reorder the result: `status` \
             (Unfinished, Overdue, Done), `ordering` (a whitelisted field, \
             prefix with '-' for descending) or `category` (one-letter code). \
             Only one filter applies per request, precedence status > \
             ordering > category.",
        )
        .tag("Notes")
        .response::<200, Json<Vec<NoteDto>>>()
        .response_with::<400, (), _>(|res| res.description("Unrecognized filter value"))
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
}

async fn create_note(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Json(payload): Json<NotePayload>,
) -> RestResult<Response> {
    let user = require_user(user)?;
    let draft = payload.into_draft()?;

    let mut conn = state.db()?;
    let note = memo_core::create_note(&mut conn, user.id, &draft)?;

    info!(user_id = user.id, note_id = note.id, "note created");

    Ok((StatusCode::CREATED, Json(NoteDto::from(note))).into_response())
}

fn create_note_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create a note")
        .description("Lazily creates the owner record on the user's first note.")
        .tag("Notes")
        .response::<201, Json<NoteDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing title, slug or content"))
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
        .response_with::<409, (), _>(|res| res.description("Slug already taken"))
}

async fn get_note(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Path(note_id): Path<i64>,
) -> RestResult<Json<NoteDto>> {
    let user = require_user(user)?;

    let conn = state.db()?;
    let owner = memo_core::owner_by_user(&conn, user.id)?.ok_or(RestError::NotFound)?;
    let note = memo_core::note_by_id(&conn, owner.id, note_id)?;

    Ok(Json(note.into()))
}

fn get_note_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get one note by id")
        .tag("Notes")
        .response::<200, Json<NoteDto>>()
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
        .response_with::<404, (), _>(|res| res.description("Absent or owned by another user"))
}

async fn update_note(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Path(note_id): Path<i64>,
    Json(payload): Json<NotePayload>,
) -> RestResult<Json<NoteDto>> {
    let user = require_user(user)?;
    let draft = payload.into_draft()?;

    let conn = state.db()?;
    let owner = memo_core::owner_by_user(&conn, user.id)?.ok_or(RestError::NotFound)?;
    let note = memo_core::update_note(&conn, owner.id, note_id, &draft)?;

    Ok(Json(note.into()))
}

fn update_note_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Fully replace a note's mutable fields")
        .tag("Notes")
        .response::<200, Json<NoteDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing title, slug or content"))
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
        .response_with::<404, (), _>(|res| res.description("Absent or owned by another user"))
        .response_with::<409, (), _>(|res| res.description("Slug already taken"))
}

async fn delete_note(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Path(note_id): Path<i64>,
) -> RestResult<StatusCode> {
    let user = require_user(user)?;

    let conn = state.db()?;
    let owner = memo_core::owner_by_user(&conn, user.id)?.ok_or(RestError::NotFound)?;
    memo_core::delete_note(&conn, owner.id, note_id)?;

    info!(user_id = user.id, note_id, "note deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn delete_note_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Hard-delete a note")
        .tag("Notes")
        .response_with::<204, (), _>(|res| res.description("Deleted"))
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
        .response_with::<404, (), _>(|res| res.description("Absent or owned by another user"))
}
