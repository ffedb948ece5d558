//! Account handlers. Successful register, login, and password change all
//! start a session by setting the session cookie.

use actix_web::{HttpResponse, http::StatusCode, web};

use forum_core::domain::User;
use forum_shared::ApiResponse;
use forum_shared::dto::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
};

use super::render::user_response;
use crate::middleware::auth::{OptionalIdentity, removal_cookie, session_cookie};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Respond with `user` and a fresh session cookie for them.
fn with_session(state: &AppState, status: StatusCode, user: User) -> AppResult<HttpResponse> {
    let token = state.tokens.generate_token(user.id, &user.username)?;
    let cookie = session_cookie(&state.session, token, state.tokens.expiration_seconds());

    let viewer = Some(user.id);
    let body = ApiResponse::with_status(
        status.as_u16(),
        user_response(user, viewer),
        status.canonical_reason().unwrap_or("OK"),
    );

    Ok(HttpResponse::build(status).cookie(cookie).json(body))
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await?;

    with_session(&state, StatusCode::CREATED, user)
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .accounts
        .login(&req.username_or_email, &req.password)
        .await?;

    with_session(&state, StatusCode::OK, user)
}

/// POST /api/auth/logout - always succeeds.
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(&state.session))
        .json(ApiResponse::ok(true))
}

/// GET /api/auth/me - null data when not logged in.
pub async fn me(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let caller = identity.user_id();
    let user = state.accounts.me(caller).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(user.map(|u| user_response(u, caller)))))
}

/// POST /api/auth/forgot-password - reports success whether or not the
/// email belongs to an account.
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> AppResult<HttpResponse> {
    state.accounts.forgot_password(&body.email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(true)))
}

/// POST /api/auth/change-password
pub async fn change_password(
    state: web::Data<AppState>,
    body: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .accounts
        .change_password(req.user_id, &req.token, &req.new_password)
        .await?;

    with_session(&state, StatusCode::OK, user)
}
