use aide::{axum::ApiRouter, openapi::OpenApi};
use auth::auth_routes;
use axum::{middleware, Extension, Router};
use export::export_routes;
use health::health_routes;
use note::note_routes;
use openapi::{api_docs, docs_routes};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod export;
pub mod health;
pub mod note;
pub mod openapi;

pub fn setup_router(app_state: AppState) -> Router {
    aide::gen::on_error(|error| {
        println!("{error}");
    });

    aide::gen::extract_schemas(true);
    let mut api = OpenApi::default();

    // Note: Authentication is handled at the endpoint level by checking for
    // Extension<User>. The middleware only resolves the token into a user;
    // public endpoints simply don't require the extension.
    ApiRouter::new()
        .merge(health_routes(app_state.clone()))
        .merge(auth_routes(app_state.clone()))
        .merge(note_routes(app_state.clone()))
        .merge(export_routes(app_state.clone()))
        .merge(docs_routes())
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api)))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
