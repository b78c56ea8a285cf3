use axum::{
    extract::{Json, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, validate_input},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let user = state
        .auth
        .register(&payload.username, &payload.password)
        .await?;
    Ok(created_response(user))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let session = state
        .auth
        .login(&payload.username, &payload.password)
        .await?;
    Ok(success_response(session))
}

async fn logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        state.auth.logout(token.trim());
    }
    Ok(no_content_response())
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
