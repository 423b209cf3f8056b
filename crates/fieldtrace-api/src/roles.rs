//! Role gate: route-declared allow-lists checked before the handler runs.
//!
//! [`Authorized<A>`] authenticates the caller and then admits them only if
//! their role is in `A::ROLES`. Because it extracts from request parts, it
//! always runs before the JSON body is parsed, so a disallowed role gets 403
//! whatever the payload.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use fieldtrace_core::{
  role::{Role, User},
  store::FarmStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError};

pub const INSUFFICIENT_ROLE: &str = "Forbidden: insufficient role";

/// A route's allow-list.
pub trait AllowList: Send + Sync + 'static {
  const ROLES: &'static [Role];
}

pub struct Farmers;

impl AllowList for Farmers {
  const ROLES: &'static [Role] = &[Role::Farmer];
}

/// Roles that may read farm-scoped records.
pub struct FarmReaders;

impl AllowList for FarmReaders {
  const ROLES: &'static [Role] = &[Role::Farmer, Role::Regulator, Role::Processor];
}

/// Roles that hand a batch along the supply chain.
pub struct ChainHandlers;

impl AllowList for ChainHandlers {
  const ROLES: &'static [Role] = &[Role::Farmer, Role::Processor, Role::Retailer];
}

pub struct Regulators;

impl AllowList for Regulators {
  const ROLES: &'static [Role] = &[Role::Regulator];
}

/// Admit `user` only if their role is in `allowed`.
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
  if user.role.is_allowed(allowed) {
    Ok(())
  } else {
    Err(ApiError::Forbidden(INSUFFICIENT_ROLE.to_owned()))
  }
}

/// An authenticated user whose role passed the `A` allow-list.
pub struct Authorized<A: AllowList> {
  pub user: User,
  _allow:   PhantomData<A>,
}

impl<S, A> FromRequestParts<AppState<S>> for Authorized<A>
where
  S: FarmStore + 'static,
  A: AllowList,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    require_role(&user, A::ROLES)?;
    Ok(Self { user, _allow: PhantomData })
  }
}
