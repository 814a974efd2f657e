use aide::axum::routing::get_with;
use aide::axum::{ApiRouter, IntoApiResponse};
use aide::transform::TransformOperation;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;

use crate::errors::{AuthError, RestError};
use crate::model::user::User;
use crate::state::AppState;

pub fn health_routes(_app_state: AppState) -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/health/ping", get_with(ping, ping_docs))
        .api_route("/health/auth", get_with(auth_ping, auth_ping_docs))
}

/// Liveness probe, answers as long as the process serves requests
async fn ping() -> impl IntoApiResponse {
    StatusCode::OK
}

fn ping_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Liveness probe")
        .description("Answers 200 whenever the server is up.")
        .tag("Health")
        .response::<200, ()>()
}

/// The same probe behind authentication. Lets a client find out whether a
/// stored token is still usable without touching any real resource.
async fn auth_ping(user: Option<Extension<User>>) -> impl IntoApiResponse {
    match user {
        Some(_) => StatusCode::OK.into_response(),
        None => RestError::Authorization(AuthError::TokenNotFound).into_response(),
    }
}

fn auth_ping_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Authenticated probe")
        .description("Answers 200 when the presented token resolves to a user.")
        .tag("Health")
        .response::<200, ()>()
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
}
