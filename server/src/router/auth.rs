use aide::axum::routing::{get_with, patch_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Query, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, warn};

use crate::errors::{AuthError, RestError, RestResult};
use crate::jwt::{
    extract_token, hash_password, issue_token, validate_token, verify_password, TOKEN_COOKIE,
};
use crate::mail::OutgoingEmail;
use crate::model::auth::{
    EmailRequest, LoginRequest, LoginResponse, MessageResponse, PasswordUpdateRequest,
    RegisterRequest, VerifyEmailQuery,
};
use crate::model::user::User;
use crate::state::AppState;

pub fn auth_routes(_app_state: AppState) -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route("/register", post_with(register, register_docs))
        .api_route(
            "/send-verification-email",
            post_with(send_verification_email, send_verification_email_docs),
        )
        .api_route("/verify-email", get_with(verify_email, verify_email_docs))
        .api_route(
            "/password-reset",
            post_with(password_reset, password_reset_docs),
        )
        .api_route(
            "/password-update",
            patch_with(password_update, password_update_docs),
        )
        .api_route("/login", post_with(login, login_docs))
        .api_route("/me", get_with(me, me_docs))
        .api_route("/logout", post_with(logout, logout_docs))
}

/// Middleware decoding the bearer token (cookie or Authorization header)
/// and attaching the matching user to the request. Endpoints that require
/// authentication check for the extension and answer 401 when it is absent.
/// Internal failures while resolving the token abort the request instead of
/// degrading it to anonymous.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, &jar, request.headers()) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
        }
        // Absent, expired or malformed tokens leave the request anonymous
        Ok(None) => {}
        Err(e) => return e.into_response(),
    }

    next.run(request).await
}

fn resolve_user(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Option<User>, RestError> {
    let Some(token) = extract_token(jar, headers) else {
        return Ok(None);
    };
    let Ok(claims) = validate_token(&token, &state.jwt_secret) else {
        return Ok(None);
    };

    let conn = state.db()?;
    Ok(memo_core::user_by_id(&conn, claims.id)?.map(User::from))
}

/// Unwrap the authenticated user or reject the request with 401
pub fn require_user(user: Option<Extension<User>>) -> RestResult<User> {
    match user {
        Some(Extension(user)) => Ok(user),
        None => Err(AuthError::TokenNotFound.into()),
    }
}

/// Compose and send the account activation link. Failures are logged, not
/// surfaced: registration itself already succeeded.
async fn send_verification_link(state: &AppState, user: &User) -> RestResult<()> {
    let token = issue_token(user.id, &state.jwt_secret)?;
    let link = format!("{}/verify-email?token={}", state.public_url, token);

    let body = format!(
        "Hi {},\n\n\
         Welcome onboard! In order to activate your account, please verify \
         your email by clicking on the link below:\n\n{}\n\nThank you!",
        user.display_name(),
        link
    );

    let email = OutgoingEmail {
        to: user.email.clone(),
        subject: "Email Verification".to_string(),
        body,
        attachment: None,
    };

    if let Err(e) = state.mailer.send(email).await {
        warn!(user_id = user.id, error = %e, "failed to send verification email");
    }

    Ok(())
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> RestResult<Json<User>> {
    let (first_name, last_name, email, password) = request.validate()?;
    let hash = hash_password(&password)?;

    let user: User = {
        let conn = state.db()?;
        memo_core::create_user(&conn, &first_name, &last_name, &email, &hash)?.into()
    };

    info!(user_id = user.id, "registered new user");
    send_verification_link(&state, &user).await?;

    Ok(Json(user))
}

fn register_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Register a new user")
        .description("Creates an account and sends the email verification link. The response never echoes the password.")
        .tag("Auth")
        .response::<200, Json<User>>()
        .response_with::<400, (), _>(|res| res.description("Missing or blank field"))
        .response_with::<403, (), _>(|res| res.description("Email already registered"))
}

async fn send_verification_email(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> RestResult<Json<MessageResponse>> {
    let email = request.validate()?;

    let user: User = {
        let conn = state.db()?;
        memo_core::user_by_email(&conn, &email)?
            .ok_or(RestError::NotFound)?
            .into()
    };

    let token = issue_token(user.id, &state.jwt_secret)?;
    let link = format!("{}/verify-email?token={}", state.public_url, token);
    let body = format!(
        "Hi {},\n\n\
         Please verify your email by clicking on the link below:\n\n{}\n\nThank you!",
        user.display_name(),
        link
    );

    state
        .mailer
        .send(OutgoingEmail {
            to: user.email,
            subject: "Email Verification".to_string(),
            body,
            attachment: None,
        })
        .await?;

    Ok(Json(MessageResponse::new("Verification email sent.")))
}

fn send_verification_email_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Re-send the verification email")
        .tag("Auth")
        .response::<200, Json<MessageResponse>>()
        .response_with::<404, (), _>(|res| res.description("Unknown email"))
        .response_with::<502, (), _>(|res| res.description("Mail delivery failed"))
}

async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> RestResult<Json<MessageResponse>> {
    let token = query
        .token
        .ok_or_else(|| RestError::Validation("token is required".to_string()))?;

    let claims = validate_token(&token, &state.jwt_secret).map_err(|e| match e {
        AuthError::TokenExpired => RestError::Validation("Activation link expired.".to_string()),
        _ => RestError::Validation("Invalid token, request a new one.".to_string()),
    })?;

    let mut conn = state.db()?;
    memo_core::user_by_id(&conn, claims.id)?.ok_or(RestError::NotFound)?;
    memo_core::mark_email_verified(&mut conn, claims.id)?;

    Ok(Json(MessageResponse::new("Email activated successfully.")))
}

fn verify_email_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Activate an account from the emailed link")
        .description("Idempotent on repeat calls.")
        .tag("Auth")
        .response::<200, Json<MessageResponse>>()
        .response_with::<400, (), _>(|res| res.description("Expired or invalid token"))
        .response_with::<404, (), _>(|res| res.description("Unknown user"))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> RestResult<Response> {
    let (email, password) = request.validate()?;

    let user = {
        let conn = state.db()?;
        memo_core::user_by_email(&conn, &email)?
    }
    .ok_or(RestError::Authorization(AuthError::InvalidCredentials))?;

    if !verify_password(&password, &user.password) {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = issue_token(user.id, &state.jwt_secret)?;
    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .build();

    info!(user_id = user.id, "user logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user: user.display_name(),
            id: user.id,
        }),
    )
        .into_response())
}

fn login_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Log in with email and password")
        .description("Returns the bearer token and also sets it as an httponly cookie.")
        .tag("Auth")
        .response::<200, Json<LoginResponse>>()
        .response_with::<400, (), _>(|res| res.description("Missing credentials"))
        .response_with::<401, (), _>(|res| res.description("Invalid credentials"))
}

async fn logout(user: Option<Extension<User>>, jar: CookieJar) -> RestResult<Response> {
    require_user(user)?;

    // Stateless tokens cannot be revoked server-side, only the cookie is
    // cleared.
    let jar = jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/").build());

    Ok((jar, Json(MessageResponse::new("Logout successful"))).into_response())
}

fn logout_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Log out the current user")
        .tag("Auth")
        .response::<200, Json<MessageResponse>>()
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
}

async fn me(user: Option<Extension<User>>) -> RestResult<Json<User>> {
    Ok(Json(require_user(user)?))
}

fn me_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Profile of the logged-in user")
        .tag("Auth")
        .response::<200, Json<User>>()
        .response_with::<401, (), _>(|res| res.description("Not authenticated"))
}

async fn password_reset(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> RestResult<Json<MessageResponse>> {
    let email = request.validate()?;

    let user: User = {
        let conn = state.db()?;
        memo_core::user_by_email(&conn, &email)?
            .ok_or(RestError::NotFound)?
            .into()
    };

    let token = issue_token(user.id, &state.jwt_secret)?;
    let link = format!("{}/password-update?token={}", state.public_url, token);
    let body = format!(
        "Hi {},\n\n\
         A password reset was requested for your account. Follow the link \
         below to choose a new password:\n\n{}\n\n\
         If you did not request this, you can ignore this message.",
        user.display_name(),
        link
    );

    state
        .mailer
        .send(OutgoingEmail {
            to: user.email,
            subject: "Password Reset".to_string(),
            body,
            attachment: None,
        })
        .await?;

    Ok(Json(MessageResponse::new("Password reset link sent.")))
}

fn password_reset_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Send a password reset link")
        .tag("Auth")
        .response::<200, Json<MessageResponse>>()
        .response_with::<400, (), _>(|res| res.description("Missing email"))
        .response_with::<404, (), _>(|res| res.description("Unknown email"))
        .response_with::<502, (), _>(|res| res.description("Mail delivery failed"))
}

async fn password_update(
    State(state): State<AppState>,
    Json(request): Json<PasswordUpdateRequest>,
) -> RestResult<Json<MessageResponse>> {
    let (email, password) = request.validate()?;
    let hash = hash_password(&password)?;

    let conn = state.db()?;
    let user = memo_core::user_by_email(&conn, &email)?.ok_or(RestError::NotFound)?;
    memo_core::update_password(&conn, user.id, &hash)?;

    info!(user_id = user.id, "password updated");

    Ok(Json(MessageResponse::new("Password updated successfully.")))
}

fn password_update_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update a user's password")
        .tag("Auth")
        .response::<200, Json<MessageResponse>>()
        .response_with::<400, (), _>(|res| res.description("Missing password"))
        .response_with::<404, (), _>(|res| res.description("Unknown email"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::mail::Mailer;
    use axum::http::header::AUTHORIZATION;
    use tempfile::TempDir;

    fn test_state(dir: &TempDir) -> AppState {
        let db = memo_core::open_db(&dir.path().join("test.db")).unwrap();
        AppState::new(db, "test-secret", "http://localhost:8080", Mailer::Log)
    }

    #[test]
    fn test_request_without_token_stays_anonymous() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let resolved = resolve_user(&state, &CookieJar::new(), &HeaderMap::new()).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_poisoned_lock_is_an_internal_error_not_anonymous() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let user = {
            let conn = state.db().unwrap();
            memo_core::create_user(&conn, "Kerry", "Hilson", "kerry@example.com", "hash").unwrap()
        };
        let token = issue_token(user.id, &state.jwt_secret).unwrap();

        let db = state.db.clone();
        let _ = std::thread::spawn(move || {
            let _guard = db.lock().unwrap();
            panic!("poison the connection lock");
        })
        .join();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());

        let result = resolve_user(&state, &CookieJar::new(), &headers);
        assert!(matches!(result, Err(RestError::Internal(_))));
    }
}
