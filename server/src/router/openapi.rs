use std::sync::Arc;

use aide::{
    axum::{routing::get_with, ApiRouter, IntoApiResponse},
    openapi::OpenApi,
    redoc::Redoc,
    transform::TransformOpenApi,
};
use axum::{response::IntoResponse, Extension, Json};

use crate::state::AppState;

pub fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("Memo API")
        .summary("Note-taking backend: accounts, notes and exports")
}

pub fn docs_routes() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route_with(
            "/docs",
            get_with(
                Redoc::new("/docs/private/api.json")
                    .with_title("Memo API")
                    .axum_handler(),
                |op| op.description("This documentation page."),
            ),
            |p| p,
        )
        .route("/docs/private/api.json", axum::routing::get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}
