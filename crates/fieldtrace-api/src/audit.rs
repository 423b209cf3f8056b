//! Per-request audit trail on the `audit` tracing target.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::auth::basic_credentials;

/// Log who asked for what. The username is the one *claimed* in the Basic
/// header; whether it verified shows up in the status.
pub async fn audit_log(req: Request, next: Next) -> Response {
  let user = basic_credentials(req.headers())
    .map(|(username, _)| username)
    .unwrap_or_else(|| "anonymous".to_owned());
  let method = req.method().clone();
  let uri = req.uri().clone();

  let res = next.run(req).await;
  tracing::info!(
    target: "audit",
    %user,
    %method,
    %uri,
    status = res.status().as_u16(),
    "request"
  );
  res
}
