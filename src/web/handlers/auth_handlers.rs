// src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::{bearer_token, AuthenticatedUser};

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  pub email: String,
  pub password: String,
  pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

// --- Handler Implementations ---

#[instrument(
    name = "handler::signup",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let user = auth_service::register_user(
    &app_state.db_pool,
    &req_payload.email,
    &req_payload.password,
    req_payload.name.as_deref(),
  )
  .await?;

  Ok(HttpResponse::Created().json(json!({
    "message": "User created successfully.",
    "userId": user.id.to_string(),
    "email": user.email,
  })))
}

#[instrument(
    name = "handler::signin",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let (user, session) = auth_service::authenticate(&app_state.db_pool, &req_payload.email, &req_payload.password).await?;

  Ok(HttpResponse::Ok().json(json!({
    "message": "Signin successful.",
    "token": session.token,
    "userId": user.id.to_string(),
    "email": user.email,
    "role": user.role,
  })))
}

#[instrument(name = "handler::signout", skip(app_state, req, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn signout_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  // The extractor already proved the token valid; revoke that same token.
  if let Some(token) = bearer_token(&req) {
    auth_service::revoke_session(&app_state.db_pool, &token).await?;
  }
  info!("User signed out.");
  Ok(HttpResponse::Ok().json(json!({"message": "Signed out."})))
}

#[instrument(name = "handler::me", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let user = auth_service::find_user(&app_state.db_pool, auth_user.user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User no longer exists.".to_string()))?;

  Ok(HttpResponse::Ok().json(json!({"user": user})))
}
