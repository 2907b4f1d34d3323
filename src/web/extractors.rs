// src/web/extractors.rs

//! Request extractors shared by the handlers: the authenticated caller
//! and the admin-gated variant.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::UserRole;
use crate::services::auth_service;
use crate::state::AppState;

/// The caller resolved from the `Authorization: Bearer` token against the
/// sessions table.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: UserRole,
}

pub(crate) fn bearer_token(req: &HttpRequest) -> Option<String> {
  req
    .headers()
    .get(AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(|t| t.trim().to_string())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let req = req.clone();
    Box::pin(async move {
      let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("AppState missing from request data.".to_string()))?
        .clone();

      let token = bearer_token(&req).ok_or_else(|| {
        warn!("Missing or malformed Authorization header on an authenticated route.");
        AppError::Auth("Authentication required.".to_string())
      })?;

      match auth_service::session_user(&state.db_pool, &token).await? {
        Some(session) => Ok(AuthenticatedUser {
          user_id: session.user_id,
          role: session.role,
        }),
        None => Err(AppError::Auth("Session is invalid or expired.".to_string())),
      }
    })
  }
}

/// An authenticated caller that must carry the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let req = req.clone();
    Box::pin(async move {
      let user = AuthenticatedUser::from_request(&req, &mut Payload::None).await?;
      if user.role != UserRole::Admin {
        warn!(user_id = %user.user_id, "Non-admin caller attempted an admin operation.");
        return Err(AppError::Forbidden("Administrator access required.".to_string()));
      }
      Ok(AdminUser(user))
    })
  }
}
