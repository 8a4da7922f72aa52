//! End-to-end router tests: login, sessions, and the mounted API.

use std::sync::{Arc, LazyLock};

use argon2::{Argon2, PasswordHasher as _, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use roster_core::sheet::SheetStore;
use roster_store_sqlite::SqliteSheets;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, ServerConfig, router};

static PASSWORD_HASH: LazyLock<String> = LazyLock::new(|| {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string()
});

fn config() -> ServerConfig {
  let toml = format!(
    r#"
store_path        = ":memory:"
registration_goal = 10

[[operators]]
username      = "fabian"
password_hash = "{hash}"
admin         = true

[[operators]]
username      = "xammy"
password_hash = "{hash}"

[place_synonyms]
"BUGA CITY" = "BUGA"
"#,
    hash = *PASSWORD_HASH
  );
  config::Config::builder()
    .add_source(config::File::from_str(&toml, config::FileFormat::Toml))
    .build()
    .unwrap()
    .try_deserialize()
    .unwrap()
}

async fn app() -> Router {
  let cfg = config();
  let sheets = SqliteSheets::open_in_memory().await.unwrap();
  router(AppState {
    store:     Arc::new(SheetStore::new(sheets, cfg.table_name.clone())),
    auth:      cfg.auth_state().unwrap(),
    reporting: Arc::new(cfg.reporting(None).unwrap()),
  })
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

fn basic(user: &str, password: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{password}")))
}

async fn login(app: &Router, user: &str) -> String {
  let req = Request::post("/session")
    .header(header::AUTHORIZATION, basic(user, "secret"))
    .body(Body::empty())
    .unwrap();
  let (status, value) = send(app, req).await;
  assert_eq!(status, StatusCode::OK);
  value["token"].as_str().unwrap().to_owned()
}

fn authed(method: &str, uri: &str, token: &str, payload: Option<Value>) -> Request<Body> {
  let builder = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::AUTHORIZATION, format!("Bearer {token}"));
  match payload {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

fn registration() -> Value {
  json!({
    "full_name": "ana ruiz",
    "national_id": "1115000111",
    "phone": "3101234567",
    "occupation": "docente",
    "address": "calle 5 # 10-20",
    "neighborhood": "san antonio",
    "city": "buga"
  })
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[test]
fn config_defaults_apply() {
  let cfg = config();
  assert_eq!(cfg.port, 8080);
  assert_eq!(cfg.table_name, "Base_Datos_Ciudadanos");
  assert_eq!(cfg.utc_offset().unwrap().local_minus_utc(), -5 * 3600);
  assert_eq!(cfg.boundary_name_property, "NOM_MPIO");
  assert_eq!(cfg.operators.len(), 2);
  assert_eq!(cfg.normalizer().normalize("Buga City"), "GUADALAJARA DE BUGA");
}

#[test]
fn absurd_offset_is_rejected() {
  let mut cfg = config();
  cfg.utc_offset_hours = 30;
  assert!(cfg.reporting(None).is_err());
}

#[test]
fn session_hours_out_of_range_are_rejected() {
  let mut cfg = config();
  for hours in [0, -3, i64::MAX] {
    cfg.session_hours = hours;
    assert!(cfg.auth_state().is_err(), "{hours}");
  }
  cfg.session_hours = 24;
  assert_eq!(cfg.session_max_age().unwrap(), chrono::Duration::hours(24));
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_session() {
  let app = app().await;
  let (status, _) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_returns_token_and_role() {
  let app = app().await;
  let req = Request::post("/session")
    .header(header::AUTHORIZATION, basic("Fabian", "secret"))
    .body(Body::empty())
    .unwrap();
  let (status, value) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(value["operator"], "fabian");
  assert_eq!(value["role"]["kind"], "admin");
  assert_eq!(value["token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn bad_password_is_challenged() {
  let app = app().await;
  let req = Request::post("/session")
    .header(header::AUTHORIZATION, basic("fabian", "nope"))
    .body(Body::empty())
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn api_requires_a_session() {
  let app = app().await;
  let (status, _) = send(&app, Request::get("/api/records").body(Body::empty()).unwrap()).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) = send(&app, authed("GET", "/api/records", "bogus", None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
  let app = app().await;
  let token = login(&app, "fabian").await;

  let (status, _) = send(&app, authed("DELETE", "/session", &token, None)).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&app, authed("GET", "/api/records", &token, None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Through the API ─────────────────────────────────────────────────────────

#[tokio::test]
async fn operator_registers_and_admin_reads() {
  let app = app().await;
  let operator = login(&app, "xammy").await;
  let admin = login(&app, "fabian").await;

  let (status, created) =
    send(&app, authed("POST", "/api/records", &operator, Some(registration()))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["registered_by"], "xammy");

  let (status, _) = send(&app, authed("GET", "/api/records", &operator, None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, all) = send(&app, authed("GET", "/api/records", &admin, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(all, json!([created]));

  let (_, stats) = send(&app, authed("GET", "/api/stats", &admin, None)).await;
  assert_eq!(stats["total"], 1);
  assert_eq!(stats["progress"], 0.1);
}

#[tokio::test]
async fn guest_registrations_are_credited_to_the_referrer() {
  let app = app().await;
  let req = Request::post("/session/guest")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(json!({ "referrer": "XAMMY" }).to_string()))
    .unwrap();
  let (status, issued) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(issued["role"], json!({ "kind": "guest", "referrer": "xammy" }));
  let guest = issued["token"].as_str().unwrap().to_owned();

  let (status, created) =
    send(&app, authed("POST", "/api/records", &guest, Some(registration()))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["registered_by"], "xammy");

  let (status, _) = send(&app, authed("GET", "/api/search?q=ana", &guest, None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_referrer_is_not_found() {
  let app = app().await;
  let req = Request::post("/session/guest")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(json!({ "referrer": "nobody" }).to_string()))
    .unwrap();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
