// src/services/auth_service.rs

//! Authentication: argon2 password hashing plus DB-backed bearer
//! sessions. The extractors in `web::extractors` resolve callers through
//! `session_user`.

use argon2::{
  password_hash::{
    rand_core::OsRng, // For generating random salts
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
    SaltString,
  },
  Argon2,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Session, User, UserRole};

pub const SESSION_TTL_DAYS: i64 = 30;

const USER_COLUMNS: &str = "id, email, name, password_hash, role, created_at, updated_at";

/// Hashes a plain-text password using Argon2 with a fresh random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty for hashing.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  let argon2_hasher = Argon2::default();

  match argon2_hasher.hash_password(password.as_bytes(), &salt) {
    Ok(password_hash_obj) => Ok(password_hash_obj.to_string()),
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash. A
/// non-matching password is `Ok(false)`, not an error.
#[instrument(name = "auth_service::verify_password", skip(hashed_password_str, provided_password), err(Display))]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool> {
  if hashed_password_str.is_empty() {
    return Err(AppError::Auth("Invalid stored password format (empty).".to_string()));
  }
  if provided_password.is_empty() {
    return Err(AppError::Auth(
      "Provided password for verification cannot be empty.".to_string(),
    ));
  }

  let parsed_hash = match PasswordHash::new(hashed_password_str) {
    Ok(ph) => ph,
    Err(parse_err) => {
      error!(error = %parse_err, "Failed to parse stored password hash string.");
      return Err(AppError::Internal(format!(
        "Invalid stored password hash format: {}",
        parse_err
      )));
    }
  };

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

// --- Accounts and sessions ---

/// The resolved caller behind a session token.
#[derive(Debug, Clone)]
pub struct SessionUser {
  pub user_id: Uuid,
  pub role: UserRole,
}

/// Registers a new account with the default `user` role.
#[instrument(name = "auth_service::register_user", skip(pool, password))]
pub async fn register_user(pool: &PgPool, email: &str, password: &str, name: Option<&str>) -> Result<User> {
  let email = email.trim().to_lowercase();
  if email.is_empty() || !email.contains('@') {
    return Err(AppError::Validation("A valid email address is required.".to_string()));
  }
  if password.len() < 8 {
    return Err(AppError::Validation(
      "Password must be at least 8 characters.".to_string(),
    ));
  }

  let password_hash = hash_password(password)?;

  let user: User = sqlx::query_as(&format!(
    "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {}",
    USER_COLUMNS
  ))
  .bind(&email)
  .bind(name)
  .bind(&password_hash)
  .fetch_one(pool)
  .await
  .map_err(|e| {
    if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
      AppError::Conflict("An account with this email already exists.".to_string())
    } else {
      AppError::Sqlx(e)
    }
  })?;

  info!(user_id = %user.id, "User registered.");
  Ok(user)
}

/// Checks credentials and opens a session. Unknown email and wrong
/// password produce the same message so the response does not reveal
/// which one failed.
#[instrument(name = "auth_service::authenticate", skip(pool, password))]
pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> Result<(User, Session)> {
  let email = email.trim().to_lowercase();

  let user: Option<User> = sqlx::query_as(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
    .bind(&email)
    .fetch_optional(pool)
    .await?;

  let Some(user) = user else {
    return Err(AppError::Auth("Invalid email or password.".to_string()));
  };

  if !verify_password(&user.password_hash, password)? {
    return Err(AppError::Auth("Invalid email or password.".to_string()));
  }

  let session = create_session(pool, user.id).await?;
  info!(user_id = %user.id, "User signed in.");
  Ok((user, session))
}

pub async fn create_session(pool: &PgPool, user_id: Uuid) -> Result<Session> {
  let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
  let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

  let session: Session = sqlx::query_as(
    "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3) \
     RETURNING token, user_id, created_at, expires_at",
  )
  .bind(&token)
  .bind(user_id)
  .bind(expires_at)
  .fetch_one(pool)
  .await?;

  Ok(session)
}

/// Resolves a bearer token to its user, expiry-checked. `None` for
/// unknown or expired tokens.
pub async fn session_user(pool: &PgPool, token: &str) -> Result<Option<SessionUser>> {
  let row: Option<(Uuid, UserRole)> = sqlx::query_as(
    "SELECT u.id, u.role FROM sessions s JOIN users u ON u.id = s.user_id \
     WHERE s.token = $1 AND s.expires_at > now()",
  )
  .bind(token)
  .fetch_optional(pool)
  .await?;
  Ok(row.map(|(user_id, role)| SessionUser { user_id, role }))
}

pub async fn revoke_session(pool: &PgPool, token: &str) -> Result<()> {
  sqlx::query("DELETE FROM sessions WHERE token = $1")
    .bind(token)
    .execute(pool)
    .await?;
  Ok(())
}

pub async fn find_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
  let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
  Ok(user)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify_round_trips() {
    let hash = hash_password("correct horse battery staple").unwrap();
    assert!(verify_password(&hash, "correct horse battery staple").unwrap());
    assert!(!verify_password(&hash, "wrong password").unwrap());
  }

  #[test]
  fn empty_password_is_rejected() {
    assert!(matches!(hash_password(""), Err(AppError::Validation(_))));
  }

  #[test]
  fn garbage_stored_hash_is_an_internal_error() {
    assert!(matches!(
      verify_password("not-a-phc-string", "whatever"),
      Err(AppError::Internal(_))
    ));
  }
}
