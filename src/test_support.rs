use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::SqlitePool;
use time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, security, state::AppState, time::primitive_now_utc};
use crate::repositories;
use crate::services::questions::QuestionBank;
use crate::services::roster::{Role, Roster};
use crate::services::storage::SubmissionStore;

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) root: PathBuf,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

fn set_test_env(root: &Path) {
    std::env::set_var("PROCTOR_ENV", "test");
    std::env::set_var("PROCTOR_STRICT_CONFIG", "0");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var(
        "DATABASE_URL",
        format!("sqlite://{}", root.join("ledger.db").display()),
    );
    std::env::set_var("QUESTIONS_DIR", root.join("questions"));
    std::env::set_var("SUBMISSIONS_DIR", root.join("submissions"));
    std::env::set_var("ROSTER_PATH", root.join("logins.json"));
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("ALLOWED_ANSWER_EXTENSIONS");
    std::env::remove_var("MAX_UPLOAD_SIZE_MB");
    std::env::remove_var("ADMIN_EVENTS_WAIT_SECONDS");
}

async fn write_fixtures(root: &Path) {
    tokio::fs::create_dir_all(root.join("questions")).await.expect("questions dir");
    tokio::fs::create_dir_all(root.join("submissions")).await.expect("submissions dir");

    for index in 1..=5 {
        tokio::fs::write(
            root.join("questions").join(format!("question{index}.txt")),
            format!("Question {index}: sample question text."),
        )
        .await
        .expect("question text");
    }

    let logins = serde_json::json!({
        "students": [
            {"username": "alice", "password": "alice-pass"},
            {"username": "bob", "password": "bob-pass"}
        ],
        "admins": [
            {"username": "admin", "password": "admin-pass"}
        ]
    });
    tokio::fs::write(root.join("logins.json"), serde_json::to_vec_pretty(&logins).unwrap())
        .await
        .expect("roster file");
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;

    let root = std::env::temp_dir().join(format!("proctor-test-{}", Uuid::new_v4()));
    write_fixtures(&root).await;
    set_test_env(&root);

    let settings = Settings::load().expect("settings");
    let db = crate::db::init_pool(&settings).await.expect("db pool");
    crate::db::run_migrations(&db).await.expect("migrations");

    let roster = Roster::load(Path::new(&settings.exam().roster_path)).expect("roster");
    let questions = QuestionBank::from_settings(&settings);
    let store = SubmissionStore::from_settings(&settings);
    store.ensure_root().await.expect("storage root");

    let state = AppState::new(settings, db, roster, questions, store);
    let app = api::router::router(state.clone());

    TestContext { state, app, root, _guard: guard }
}

pub(crate) fn bearer_token(username: &str, role: Role, settings: &Settings) -> String {
    security::create_access_token(username, role, settings, None).expect("token")
}

pub(crate) fn student_token(ctx: &TestContext, username: &str) -> String {
    bearer_token(username, Role::Student, ctx.state.settings())
}

pub(crate) fn admin_token(ctx: &TestContext) -> String {
    bearer_token("admin", Role::Admin, ctx.state.settings())
}

/// Seeds a ledger row whose timer started `seconds_ago` in the past.
pub(crate) async fn backdate_start(
    pool: &SqlitePool,
    username: &str,
    question: &str,
    seconds_ago: i64,
) {
    let started_at = primitive_now_utc() - Duration::seconds(seconds_ago);
    repositories::submissions::start_if_absent(pool, username, question, started_at)
        .await
        .expect("backdated start");
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) fn multipart_request(
    uri: &str,
    token: &str,
    field_name: &str,
    filename: &str,
    content: &[u8],
) -> Request<Body> {
    let boundary = "proctor-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; \
             name=\"{field_name}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .expect("request body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
