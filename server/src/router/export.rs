use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json};
use serde_json::json;
use tracing::info;

use crate::errors::{RestError, RestResult};
use crate::export::{render_csv, render_pdf};
use crate::mail::{EmailAttachment, OutgoingEmail};
use crate::model::user::User;
use crate::router::auth::require_user;
use crate::state::AppState;

pub fn export_routes(_app_state: AppState) -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/notes/pdf", get_with(download_pdf, download_pdf_docs))
        .api_route("/notes/csv", get_with(download_csv, download_csv_docs))
        // Multipart uploads are not described by the OpenAPI generator
        .route("/notes/send-attachment", post(send_attachment))
}

/// All notes of the requester in the default (newest first) order
fn user_notes(state: &AppState, user: &User) -> RestResult<Vec<memo_core::Note>> {
    let conn = state.db()?;

    match memo_core::owner_by_user(&conn, user.id)? {
        Some(owner) => Ok(memo_core::list_notes(&conn, owner.id, None)?),
        None => Ok(Vec::new()),
    }
}

fn attachment_headers(
    content_type: &'static str,
    extension: &str,
) -> [(header::HeaderName, String); 2] {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");

    [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=notes-list_{timestamp}.{extension}"),
        ),
    ]
}

async fn download_pdf(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
) -> RestResult<Response> {
    let user = require_user(user)?;
    let notes = user_notes(&state, &user)?;
    let pdf = render_pdf(&notes, &user.display_name())?;

    Ok((attachment_headers("application/pdf", "pdf"), pdf).into_response())
}

fn download_pdf_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Download the note list as a PDF attachment")
        .tag("Export")
        .response_with::<200, (), _>(|res| res.description("PDF file download"))
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
}

async fn download_csv(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
) -> RestResult<Response> {
    let user = require_user(user)?;
    let notes = user_notes(&state, &user)?;
    let csv = render_csv(&notes, &user.display_name())?;

    Ok((attachment_headers("text/csv", "csv"), csv.into_bytes()).into_response())
}

fn download_csv_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Download the note list as a CSV attachment")
        .tag("Export")
        .response_with::<200, (), _>(|res| res.description("CSV file download"))
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
}

/// Email the logged-in user a file they uploaded, typically one of the
/// exports. The multipart field must be named `file`.
async fn send_attachment(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    mut multipart: Multipart,
) -> RestResult<Json<serde_json::Value>> {
    let user = require_user(user)?;

    let mut attachment = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RestError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("attachment").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| RestError::Validation(e.to_string()))?;

        attachment = Some(EmailAttachment {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let attachment = attachment
        .ok_or_else(|| RestError::Validation("file attachment is required".to_string()))?;

    let body = format!(
        "Hi {},\n\n\
         The attached document contains all notes you have saved on our \
         platform.\n\n\
         Look out for the high-priority notes and close them out as soon as \
         possible.\n\n\
         Don't forget to update their status as things change.\n\n\
         Stay safe!\n\n\
         Best regards,\n\
         The Team",
        user.display_name()
    );

    let sent = state
        .mailer
        .send(OutgoingEmail {
            to: user.email.clone(),
            subject: "Memo - Notes Summary".to_string(),
            body,
            attachment: Some(attachment),
        })
        .await?;

    info!(user_id = user.id, "notes summary mailed");

    Ok(Json(json!({ "detail": format!("{sent} mail sent successfully") })))
}
