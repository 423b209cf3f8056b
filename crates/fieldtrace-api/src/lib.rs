//! JSON REST API for fieldtrace.
//!
//! Exposes an axum [`Router`] backed by any [`FarmStore`]. Every route lives
//! under `/api`; all but the public traceability view require HTTP Basic
//! credentials, and most are further gated by role.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = fieldtrace_api::api_router(AppState { store, advisor });
//! axum::serve(listener, app).await?;
//! ```

pub mod activities;
pub mod advisories;
pub mod advisor;
pub mod audit;
pub mod auth;
pub mod crops;
pub mod error;
pub mod extract;
pub mod farms;
pub mod roles;
pub mod traceability;
pub mod users;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, patch, post},
};
use fieldtrace_core::store::FarmStore;
use tower_http::trace::TraceLayer;

pub use advisor::{Advisor, AdvisorError};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub advisor: Arc<dyn Advisor>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      advisor: Arc::clone(&self.advisor),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full `/api` router for `state`.
pub fn api_router<S>(state: AppState<S>) -> Router
where
  S: FarmStore + 'static,
{
  let api = Router::new()
    // Session
    .route("/auth/user", get(users::me))
    .route("/auth/user/{user_id}/role", patch(users::set_role::<S>))
    // Farms
    .route("/farms", get(farms::list::<S>).post(farms::create::<S>))
    .route("/farms/{farm_id}", get(farms::get_one::<S>))
    .route("/farms/{farm_id}/carbon", get(farms::carbon::<S>))
    .route("/farms/{farm_id}/crops", post(crops::create::<S>))
    .route(
      "/farms/{farm_id}/activities",
      get(activities::list::<S>).post(activities::create::<S>),
    )
    .route("/farms/{farm_id}/advisories", get(advisories::list::<S>))
    .route(
      "/farms/{farm_id}/advisories/generate",
      post(advisories::generate::<S>),
    )
    .route("/farms/{farm_id}/batches", post(traceability::create_batch::<S>))
    // Traceability
    .route("/traceability/{batch_identifier}", get(traceability::get::<S>))
    .route(
      "/traceability/{batch_identifier}/events",
      post(traceability::record_event::<S>),
    )
    .route(
      "/traceability/{batch_identifier}/carbon",
      post(traceability::record_carbon::<S>),
    );

  Router::new()
    .nest("/api", api)
    .layer(middleware::from_fn(audit::audit_log))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
  use async_trait::async_trait;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use fieldtrace_core::{
    farm::Farm,
    role::{NewUser, Role},
  };
  use fieldtrace_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  const PASSWORD: &str = "secret";

  /// Returns a fixed completion and counts calls.
  struct StubAdvisor {
    reply: Result<&'static str, ()>,
    calls: Mutex<u32>,
  }

  #[async_trait]
  impl Advisor for StubAdvisor {
    async fn advise(&self, _farm: &Farm) -> Result<String, AdvisorError> {
      *self.calls.lock().unwrap() += 1;
      self
        .reply
        .map(str::to_owned)
        .map_err(|()| AdvisorError::Request("connection refused".into()))
    }
  }

  struct Harness {
    state: AppState<SqliteStore>,
  }

  /// Cheap argon2 parameters so debug-build tests stay fast.
  fn hash(password: &str) -> String {
    let params = Params::new(8, 1, 1, None).unwrap();
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  async fn harness(reply: Result<&'static str, ()>) -> (Harness, Arc<StubAdvisor>) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    for (username, role) in [
      ("fiona", Role::Farmer),
      ("frank", Role::Farmer),
      ("paula", Role::Processor),
      ("rita", Role::Retailer),
      ("reg", Role::Regulator),
      ("carl", Role::Consumer),
    ] {
      store
        .add_user(NewUser {
          id: format!("id-{username}"),
          username: username.into(),
          role,
          password_hash: hash(PASSWORD),
        })
        .await
        .unwrap();
    }
    let advisor = Arc::new(StubAdvisor { reply, calls: Mutex::new(0) });
    let state = AppState { store: Arc::new(store), advisor: advisor.clone() };
    (Harness { state }, advisor)
  }

  impl Harness {
    async fn send(
      &self,
      method: &str,
      uri: &str,
      user: Option<&str>,
      body: Option<&str>,
    ) -> (StatusCode, Value) {
      let mut builder = Request::builder().method(method).uri(uri);
      if let Some(user) = user {
        let creds = B64.encode(format!("{user}:{PASSWORD}"));
        builder = builder.header(header::AUTHORIZATION, format!("Basic {creds}"));
      }
      let body = match body {
        Some(b) => {
          builder = builder.header(header::CONTENT_TYPE, "application/json");
          Body::from(b.to_owned())
        }
        None => Body::empty(),
      };
      let res = api_router(self.state.clone())
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
      let status = res.status();
      let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
      let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
      (status, json)
    }

    async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
      self.send("POST", uri, Some(user), Some(&body.to_string())).await
    }

    async fn get(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
      self.send("GET", uri, user, None).await
    }

    async fn set_role(&self, user: &str, target: &str, role: &str) -> (StatusCode, Value) {
      let body = json!({ "role": role }).to_string();
      self
        .send("PATCH", &format!("/api/auth/user/{target}/role"), Some(user), Some(&body))
        .await
    }

    /// A farm owned by `fiona`, with one crop. Returns (farm id, crop id).
    async fn farm_with_crop(&self) -> (i64, i64) {
      let (status, farm) = self.post("/api/farms", "fiona", farm_body()).await;
      assert_eq!(status, StatusCode::CREATED, "{farm}");
      let farm_id = farm["id"].as_i64().unwrap();
      let (status, crop) = self
        .post(
          &format!("/api/farms/{farm_id}/crops"),
          "fiona",
          json!({ "name": "Heirloom Tomatoes", "variety": "Cherokee Purple" }),
        )
        .await;
      assert_eq!(status, StatusCode::CREATED, "{crop}");
      (farm_id, crop["id"].as_i64().unwrap())
    }

    async fn batch(&self, farm_id: i64, crop_id: i64, ident: &str) -> (StatusCode, Value) {
      self
        .post(
          &format!("/api/farms/{farm_id}/batches"),
          "fiona",
          json!({
            "cropId": crop_id,
            "batchIdentifier": ident,
            "quantity": 500,
            "harvestDate": "2024-07-02T00:00:00Z",
          }),
        )
        .await
    }
  }

  fn farm_body() -> Value {
    json!({
      "name": "Green Valley Organics",
      "location": { "lat": 34.0522, "lng": -118.2437 },
      "size": 50.5,
      "type": "Organic",
    })
  }

  // ── Authentication ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_or_wrong_credentials_are_401() {
    let (h, _) = harness(Ok("")).await;
    let (status, body) = h.get("/api/farms", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let res = api_router(h.state.clone())
      .oneshot(
        Request::builder()
          .uri("/api/auth/user")
          .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("fiona:nope")))
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn current_user_omits_password_hash() {
    let (h, _) = harness(Ok("")).await;
    let (status, body) = h.get("/api/auth/user", Some("fiona")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "id-fiona");
    assert_eq!(body["role"], "farmer");
    assert!(body.get("passwordHash").is_none());
  }

  // ── Role gate ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn role_gate_runs_before_body_parsing() {
    let (h, _) = harness(Ok("")).await;
    let (status, body) = h
      .send("POST", "/api/farms", Some("carl"), Some("{not json"))
      .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], roles::INSUFFICIENT_ROLE);
  }

  #[tokio::test]
  async fn readers_may_list_but_consumers_may_not() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, _) = h.farm_with_crop().await;
    let uri = format!("/api/farms/{farm_id}/activities");
    for user in ["fiona", "reg", "paula"] {
      assert_eq!(h.get(&uri, Some(user)).await.0, StatusCode::OK, "{user}");
    }
    for user in ["rita", "carl"] {
      assert_eq!(h.get(&uri, Some(user)).await.0, StatusCode::FORBIDDEN, "{user}");
    }
  }

  // ── Farms ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn farmer_creates_lists_and_reads_a_farm() {
    let (h, _) = harness(Ok("")).await;
    let (status, farm) = h.post("/api/farms", "fiona", farm_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(farm["userId"], "id-fiona");
    assert_eq!(farm["type"], "Organic");

    let (_, list) = h.get("/api/farms", Some("fiona")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (_, others) = h.get("/api/farms", Some("frank")).await;
    assert_eq!(others, json!([]));

    let (status, details) = h.get(&format!("/api/farms/{}", farm["id"]), Some("fiona")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["name"], "Green Valley Organics");
    assert_eq!(details["crops"], json!([]));
    assert_eq!(details["activities"], json!([]));
  }

  #[tokio::test]
  async fn invalid_farm_body_is_400_with_first_message() {
    let (h, _) = harness(Ok("")).await;
    let mut body = farm_body();
    body["size"] = json!(-3);
    let (status, res) = h.post("/api/farms", "fiona", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["message"], "Farm size must be a positive number of hectares");

    let (status, res) = h.send("POST", "/api/farms", Some("fiona"), Some("{")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["message"].is_string());
  }

  #[tokio::test]
  async fn farm_reads_check_existence_then_ownership() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, _) = h.farm_with_crop().await;

    let (status, body) = h.get(&format!("/api/farms/{farm_id}"), Some("frank")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized");

    let (status, body) = h.get("/api/farms/9999", Some("frank")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Farm not found");

    let (status, _) = h.get("/api/farms/not-a-number", Some("fiona")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn non_owner_cannot_write_to_a_farm() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, _) = h.farm_with_crop().await;
    let (status, _) = h
      .post(
        &format!("/api/farms/{farm_id}/activities"),
        "frank",
        json!({ "type": "irrigation", "date": "2024-05-01T00:00:00Z" }),
      )
      .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn carbon_estimate_follows_the_activity_log() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, _) = h.farm_with_crop().await;
    for kind in ["irrigation", "fertilizer", "harvest", "planting"] {
      let (status, _) = h
        .post(
          &format!("/api/farms/{farm_id}/activities"),
          "fiona",
          json!({ "type": kind, "date": "2024-05-01T00:00:00Z" }),
        )
        .await;
      assert_eq!(status, StatusCode::CREATED);
    }
    let (status, body) = h.get(&format!("/api/farms/{farm_id}/carbon"), Some("reg")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emissions"], 8.0);
    assert_eq!(body["methodology"], "GHG Protocol v1");
  }

  // ── Advisories ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn generated_advisory_is_stored() {
    let (h, advisor) = harness(Ok("Irrigate at dawn.")).await;
    let (farm_id, _) = h.farm_with_crop().await;
    let uri = format!("/api/farms/{farm_id}/advisories/generate");

    let (status, body) = h.send("POST", &uri, Some("fiona"), None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["type"], "AI_GENERATED");
    assert_eq!(body["message"], "Irrigate at dawn.");
    assert_eq!(body["data"], json!({ "generated": true }));
    assert_eq!(body["isRead"], false);
    assert_eq!(*advisor.calls.lock().unwrap(), 1);

    let (_, list) = h
      .get(&format!("/api/farms/{farm_id}/advisories"), Some("paula"))
      .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn empty_completion_gets_placeholder_text() {
    let (h, _) = harness(Ok("  ")).await;
    let (farm_id, _) = h.farm_with_crop().await;
    let (_, body) = h
      .send("POST", &format!("/api/farms/{farm_id}/advisories/generate"), Some("fiona"), None)
      .await;
    assert_eq!(body["message"], advisor::EMPTY_COMPLETION);
  }

  #[tokio::test]
  async fn failed_generation_is_500_and_stores_nothing() {
    let (h, advisor) = harness(Err(())).await;
    let (farm_id, _) = h.farm_with_crop().await;
    let (status, body) = h
      .send("POST", &format!("/api/farms/{farm_id}/advisories/generate"), Some("fiona"), None)
      .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to generate advisory");
    assert_eq!(*advisor.calls.lock().unwrap(), 1);

    let (_, list) = h
      .get(&format!("/api/farms/{farm_id}/advisories"), Some("fiona"))
      .await;
    assert_eq!(list, json!([]));
  }

  #[tokio::test]
  async fn advisor_is_not_called_for_someone_elses_farm() {
    let (h, advisor) = harness(Ok("text")).await;
    let (farm_id, _) = h.farm_with_crop().await;
    let (status, _) = h
      .send("POST", &format!("/api/farms/{farm_id}/advisories/generate"), Some("frank"), None)
      .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(*advisor.calls.lock().unwrap(), 0);
  }

  // ── Traceability ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn public_view_has_ordered_events_and_no_auth() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, crop_id) = h.farm_with_crop().await;
    let (status, _) = h.batch(farm_id, crop_id, "BATCH-2024-GT-001").await;
    assert_eq!(status, StatusCode::CREATED);

    // Recorded out of chronological order, by different chain handlers.
    for (user, stage, ts) in [
      ("paula", "Processing", "2024-07-03T09:00:00Z"),
      ("fiona", "Harvest", "2024-07-02T08:00:00Z"),
      ("rita", "Transport", "2024-07-02T14:00:00Z"),
    ] {
      let (status, body) = h
        .post(
          "/api/traceability/BATCH-2024-GT-001/events",
          user,
          json!({ "stage": stage, "location": "Somewhere", "handler": "Someone", "timestamp": ts }),
        )
        .await;
      assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, view) = h.get("/api/traceability/BATCH-2024-GT-001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["batchIdentifier"], "BATCH-2024-GT-001");
    assert_eq!(view["farm"]["id"], farm_id);
    assert_eq!(view["crop"]["name"], "Heirloom Tomatoes");
    assert!(view["carbon"].is_null());
    let stages: Vec<_> = view["events"]
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["stage"].as_str().unwrap())
      .collect();
    assert_eq!(stages, ["Harvest", "Transport", "Processing"]);
  }

  #[tokio::test]
  async fn unknown_batch_is_404() {
    let (h, _) = harness(Ok("")).await;
    let (status, body) = h.get("/api/traceability/NOPE-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Batch not found");
  }

  #[tokio::test]
  async fn events_for_unknown_batches_are_404() {
    let (h, _) = harness(Ok("")).await;
    let (status, body) = h
      .post(
        "/api/traceability/NOPE-1/events",
        "paula",
        json!({ "stage": "Processing", "location": "Plant", "handler": "Paula" }),
      )
      .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Batch not found");
  }

  #[tokio::test]
  async fn blank_event_stage_is_400() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, crop_id) = h.farm_with_crop().await;
    assert_eq!(h.batch(farm_id, crop_id, "B-1").await.0, StatusCode::CREATED);

    let (status, body) = h
      .post(
        "/api/traceability/B-1/events",
        "paula",
        json!({ "stage": "  ", "location": "Plant", "handler": "Paula" }),
      )
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Event stage is required");
  }

  #[tokio::test]
  async fn out_of_range_timestamps_are_rejected_and_the_view_survives() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, crop_id) = h.farm_with_crop().await;
    assert_eq!(h.batch(farm_id, crop_id, "B-1").await.0, StatusCode::CREATED);

    for ts in ["+10000-01-01T00:00:00Z", "-0001-01-01T00:00:00Z"] {
      let (status, body) = h
        .post(
          "/api/traceability/B-1/events",
          "paula",
          json!({ "stage": "Processing", "location": "Plant", "handler": "Paula", "timestamp": ts }),
        )
        .await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{ts}: {body}");
      assert_eq!(body["message"], "Event timestamp is out of range");
    }

    let (status, view) = h.get("/api/traceability/B-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["events"], json!([]));
  }

  #[tokio::test]
  async fn consumers_cannot_record_events() {
    let (h, _) = harness(Ok("")).await;
    let (status, _) = h
      .post(
        "/api/traceability/ANY/events",
        "carl",
        json!({ "stage": "Retail", "location": "Shop", "handler": "Me" }),
      )
      .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn batch_identifier_and_carbon_record_are_unique() {
    let (h, _) = harness(Ok("")).await;
    let (farm_id, crop_id) = h.farm_with_crop().await;
    assert_eq!(h.batch(farm_id, crop_id, "B-1").await.0, StatusCode::CREATED);
    assert_eq!(h.batch(farm_id, crop_id, "B-1").await.0, StatusCode::CONFLICT);
    assert_eq!(h.batch(farm_id, 9999, "B-2").await.0, StatusCode::NOT_FOUND);

    let carbon = json!({ "emissions": 120.5, "certificateHash": "0xabc123" });
    let (status, _) = h.post("/api/traceability/B-1/carbon", "fiona", carbon.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = h.post("/api/traceability/B-1/carbon", "fiona", carbon.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = h.post("/api/traceability/B-1/carbon", "frank", carbon).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, view) = h.get("/api/traceability/B-1", None).await;
    assert_eq!(view["carbon"]["emissions"], 120.5);
  }

  // ── Roles ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn regulator_changes_roles() {
    let (h, _) = harness(Ok("")).await;
    let (status, body) = h.set_role("reg", "id-carl", "retailer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Role updated", "userId": "id-carl", "role": "retailer" }));
    let (_, me) = h.get("/api/auth/user", Some("carl")).await;
    assert_eq!(me["role"], "retailer");

    assert_eq!(h.set_role("fiona", "id-carl", "farmer").await.0, StatusCode::FORBIDDEN);

    let (status, body) = h.set_role("reg", "id-carl", "wizard").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid role");

    let (status, body) = h.set_role("reg", "id-nobody", "farmer").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
  }
}
