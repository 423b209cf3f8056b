//! Handlers for `/auth/user` endpoints.

use axum::{Json, extract::State};
use fieldtrace_core::{
  role::{Role, User},
  store::FarmStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{AppJson, AppPath},
  roles::{Authorized, Regulators},
};

/// `GET /auth/user`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdated {
  pub message: &'static str,
  pub user_id: String,
  pub role:    Role,
}

/// `PATCH /auth/user/:id/role`: regulators only.
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Regulators>,
  AppPath(user_id): AppPath<String>,
  AppJson(body): AppJson<RoleBody>,
) -> Result<Json<RoleUpdated>, ApiError>
where
  S: FarmStore + 'static,
{
  let role: Role = body
    .role
    .parse()
    .map_err(|_| ApiError::BadRequest("Invalid role".to_owned()))?;

  let user = state
    .store
    .set_user_role(&user_id, role)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("User"))?;

  tracing::info!(
    target: "audit",
    user = %user.id,
    role = %role,
    by = %auth.user.username,
    "role changed"
  );
  Ok(Json(RoleUpdated {
    message: "Role updated",
    user_id: user.id,
    role:    user.role,
  }))
}
