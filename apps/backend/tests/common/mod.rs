//! Shared integration test setup.
//!
//! Integration tests need a PostgreSQL database; set DATABASE_URL.

pub mod fixtures;

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestRequest, TestServer};
use uuid::Uuid;

use lessondeck_backend::config::Config;
use lessondeck_backend::db::Database;
use lessondeck_backend::models::{DbCard, UserRole};
use lessondeck_backend::{app, AppState};

/// Database connection plus the full application router.
pub struct TestContext {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    users: std::sync::Mutex<Vec<Uuid>>,
}

impl TestContext {
    /// Connect and migrate.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or the database is unreachable.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Same as `new`, with a hook to adjust configuration first.
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        dotenvy::dotenv().ok();

        let mut config =
            Config::from_env().expect("DATABASE_URL must be set for integration tests");
        adjust(&mut config);

        let db = Database::connect(&config.database_url, 5)
            .await
            .expect("Failed to connect to test database");
        db.run_migrations().await.expect("Failed to run migrations");

        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            users: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn router(&self) -> Router {
        app(AppState {
            db: self.db.clone(),
            config: self.config.clone(),
        })
    }

    /// Register a user directly and remember it for cleanup.
    pub async fn create_user(&self, role: UserRole) -> (Uuid, String) {
        let user = self
            .db
            .create_user(&format!("test-{}", role.as_str()), role)
            .await
            .expect("Failed to create test user");
        self.track(user.id);
        (user.id, user.token)
    }

    /// Remember a user created through the API for cleanup.
    pub fn track(&self, user_id: Uuid) {
        if let Ok(mut users) = self.users.lock() {
            users.push(user_id);
        }
    }

    pub async fn create_lesson(&self, owner_id: Uuid, title: &str) -> Uuid {
        self.db
            .create_lesson(owner_id, title, None)
            .await
            .expect("Failed to create lesson")
            .id
    }

    pub async fn enroll(&self, user_id: Uuid, lesson_id: Uuid) {
        self.db.enroll(user_id, lesson_id).await.expect("Failed to enroll");
    }

    /// Insert a card with the given approval status.
    pub async fn create_card(
        &self,
        lesson_id: Uuid,
        author_id: Uuid,
        front: &str,
        approval: &str,
    ) -> Uuid {
        let card: DbCard = fixtures::card(lesson_id, author_id, front, approval);
        self.db.create_card(&card).await.expect("Failed to create card").id
    }

    /// Header pair for bearer auth.
    pub fn auth(token: &str) -> (HeaderName, HeaderValue) {
        (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
        )
    }

    /// Remove everything created by tracked users, children first.
    pub async fn cleanup(&self) {
        let users: Vec<Uuid> = self.users.lock().map(|u| u.clone()).unwrap_or_default();
        let statements = [
            r#"DELETE FROM reviews WHERE user_id = ANY($1) OR card_id IN (
                   SELECT c.id FROM cards c JOIN lessons l ON l.id = c.lesson_id
                   WHERE c.author_id = ANY($1) OR l.owner_id = ANY($1))"#,
            r#"DELETE FROM scheduling_states WHERE user_id = ANY($1) OR card_id IN (
                   SELECT c.id FROM cards c JOIN lessons l ON l.id = c.lesson_id
                   WHERE c.author_id = ANY($1) OR l.owner_id = ANY($1))"#,
            r#"DELETE FROM content_flags WHERE reporter_id = ANY($1)
                   OR content_id IN (SELECT id FROM lessons WHERE owner_id = ANY($1))
                   OR content_id IN (SELECT id FROM cards WHERE author_id = ANY($1))"#,
            r#"DELETE FROM enrollments WHERE user_id = ANY($1)
                   OR lesson_id IN (SELECT id FROM lessons WHERE owner_id = ANY($1))"#,
            r#"DELETE FROM cards WHERE author_id = ANY($1)
                   OR lesson_id IN (SELECT id FROM lessons WHERE owner_id = ANY($1))"#,
            "DELETE FROM lessons WHERE owner_id = ANY($1)",
            "DELETE FROM user_progress WHERE user_id = ANY($1)",
            "DELETE FROM users WHERE id = ANY($1)",
        ];

        for sql in statements {
            let _ = sqlx::query(sql).bind(&users).execute(self.db.pool()).await;
        }
    }
}

/// POST as the user owning `token`.
pub fn post_as(server: &TestServer, path: &str, token: &str) -> TestRequest {
    let (name, value) = TestContext::auth(token);
    server.post(path).add_header(name, value)
}

/// GET as the user owning `token`.
pub fn get_as(server: &TestServer, path: &str, token: &str) -> TestRequest {
    let (name, value) = TestContext::auth(token);
    server.get(path).add_header(name, value)
}

/// PUT as the user owning `token`.
pub fn put_as(server: &TestServer, path: &str, token: &str) -> TestRequest {
    let (name, value) = TestContext::auth(token);
    server.put(path).add_header(name, value)
}
