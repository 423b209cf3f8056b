//! HTTP Basic-auth extractor backed by the `users` table.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use fieldtrace_core::{role::User, store::FarmStore};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

/// The user behind a request whose Basic credentials verified.
pub struct CurrentUser(pub User);

/// Split an `Authorization: Basic ...` header into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())?
    .strip_prefix("Basic ")?;

  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (username, password) = creds.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

/// Check `password` against a stored argon2 PHC string. A hash that does not
/// parse never verifies, which is how accounts are locked.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Produce an argon2id PHC string for `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: FarmStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (username, password) =
      basic_credentials(&parts.headers).ok_or(ApiError::Unauthorized)?;

    let (user, password_hash) = state
      .store
      .get_credentials(&username)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&password, &password_hash) {
      return Err(ApiError::Unauthorized);
    }
    Ok(CurrentUser(user))
  }
}
