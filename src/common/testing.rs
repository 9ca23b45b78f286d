//! Shared fixtures for the `#[cfg(test)]` modules
//!
//! Every [`TestApp`] gets its own in-memory database, storage directory and
//! job queue. Jobs are not run in the background; tests drain the queue
//! explicitly so side effects can be asserted deterministically.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use crate::app::{build_job_context, build_router, build_state, share};
use crate::auth::password::hash_password;
use crate::auth::tokens::{issue_token, LOGIN_TOKEN_NAME};
use crate::auth::User;
use crate::common::config::{AppConfig, MailDriver};
use crate::common::{generate_photo_key, migrations, SharedState};
use crate::queue::worker::drain;
use crate::queue::{JobContext, JobReceiver};
use crate::services::{MailError, MailMessage, Mailer};

pub const ADMIN_EMAIL: &str = "admin@admin.com";
pub const USER_EMAIL: &str = "user@user.com";
pub const TEST_PASSWORD: &str = "password123";

/// PNG signature plus the start of an IHDR chunk, enough for sniffing
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
];

/// Migrated in-memory database on a single long-lived connection
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    migrations::run_migrations(&pool)
        .await
        .expect("migrations run");
    pool
}

fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("catalog-{}-{}", label, generate_photo_key()))
}

pub fn test_config(storage_dir: PathBuf, spec_file_path: PathBuf) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        storage_dir,
        spec_file_path,
        admin_emails: HashSet::from([ADMIN_EMAIL.to_string()]),
        mail_driver: MailDriver::Log,
        notify_email: ADMIN_EMAIL.to_string(),
        ses: None,
        queue_max_attempts: 3,
        queue_backoff: Duration::from_millis(1),
        sentry_dsn: None,
        cookie_secure: false,
    }
}

// ============================================================================
// Mailers
// ============================================================================

/// Keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent.lock().expect("mailer lock").push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Fails every send with a transient error and counts the attempts
#[derive(Default)]
pub struct FailingMailer {
    pub attempts: AtomicUsize,
}

impl FailingMailer {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MailError::SendFailed("smtp unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

// ============================================================================
// Application harness
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    pub db: SqlitePool,
    pub receiver: JobReceiver,
    pub jobs: JobContext,
    pub mailer: Arc<RecordingMailer>,
    pub storage_dir: PathBuf,
}

impl TestApp {
    pub async fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        Self::with_mailer(mailer.clone(), mailer).await
    }

    /// `recorder` is kept for assertions, `mailer` is what the jobs use
    pub async fn with_mailer(recorder: Arc<RecordingMailer>, mailer: Arc<dyn Mailer>) -> Self {
        let db = test_pool().await;
        let storage_dir = temp_dir("storage");
        let spec_dir = temp_dir("spec");
        std::fs::create_dir_all(&spec_dir).expect("spec dir");
        let spec_file = spec_dir.join("product-specification.pdf");
        std::fs::write(&spec_file, b"%PDF-1.4\n%%EOF\n").expect("spec file");

        let config = test_config(storage_dir.clone(), spec_file);
        let cors = config.cors_origins.clone();
        let (state, receiver) = build_state(db.clone(), config).expect("state");
        let jobs = build_job_context(&state, mailer).expect("job context");
        let shared = share(state);

        Self {
            router: build_router(shared.clone(), &cors),
            state: shared,
            db,
            receiver,
            jobs,
            mailer: recorder,
            storage_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Runs every queued job, including jobs queued by other jobs
    pub async fn run_jobs(&mut self) -> usize {
        drain(&mut self.receiver, &self.jobs).await
    }

    pub async fn admin_token(&self) -> String {
        let admin = create_user(&self.db, "Admin", ADMIN_EMAIL, true).await;
        token_for(&self.db, admin.id).await
    }

    pub async fn user_token(&self) -> String {
        let user = create_user(&self.db, "User", USER_EMAIL, false).await;
        token_for(&self.db, user.id).await
    }
}

pub async fn create_user(pool: &SqlitePool, name: &str, email: &str, is_admin: bool) -> User {
    let hash = hash_password(TEST_PASSWORD).expect("hash");
    let id = sqlx::query(
        "INSERT INTO users (name, email, password, phone, dob, is_admin) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(hash)
    .bind("1234567890")
    .bind("1990-01-01")
    .bind(is_admin)
    .execute(pool)
    .await
    .expect("insert user")
    .last_insert_rowid();

    crate::auth::handlers::find_user(pool, id)
        .await
        .expect("query user")
        .expect("user exists")
}

pub async fn token_for(pool: &SqlitePool, user_id: i64) -> String {
    issue_token(pool, user_id, LOGIN_TOKEN_NAME)
        .await
        .expect("issue token")
}

// ============================================================================
// Requests and bodies
// ============================================================================

fn with_token(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    with_token(Request::builder().method(Method::GET).uri(uri), token)
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_token(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn form_request(method: Method, uri: &str, token: Option<&str>, pairs: &[(&str, &str)]) -> Request<Body> {
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    with_token(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request")
}

/// A file part for [`multipart_request`]
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
) -> Request<Body> {
    const BOUNDARY: &str = "catalog-test-boundary";
    let mut body: Vec<u8> = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    with_token(Request::builder().method(method).uri(uri), token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("request")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("utf-8 body")
}
