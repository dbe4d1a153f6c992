use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use timeclock::config::{Config, RegistrationMode};

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a user and return the auth response body + status. The
    /// first registered user becomes the admin.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Login and return the auth response body + status.
    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register the bootstrap admin, return their access token.
    pub async fn bootstrap_admin(&self) -> String {
        let (body, status) = self.register("admin@test.com", "password123", "Admin").await;
        assert_eq!(status, StatusCode::OK, "bootstrap register failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Register a regular user (the admin must already exist), return their
    /// access token.
    pub async fn register_user(&self, email: &str) -> String {
        let (body, status) = self.register(email, "password123", "User").await;
        assert_eq!(status, StatusCode::OK, "register user failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Create a project, return the project JSON.
    pub async fn create_project(&self, token: &str, name: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/v1/projects"))
            .bearer_auth(token)
            .json(&json!({
                "name": name,
                "hourly_rate": 50.0,
                "rate_currency": "USD",
                "committed_weekly_hours": 10.0,
            }))
            .send()
            .await
            .expect("create project failed");
        assert_eq!(resp.status(), StatusCode::OK, "create project non-200");
        resp.json().await.unwrap()
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request, with or without a JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: Option<&Value>) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url(path)).bearer_auth(token);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await.expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Insert a closed session directly, bypassing the timer engine. Used
    /// to seed precise history for edit/delete/reset tests.
    pub async fn insert_closed_session(
        &self,
        project_id: &str,
        start_ms: i64,
        duration_secs: i64,
    ) -> Uuid {
        let project_id: Uuid = project_id.parse().unwrap();
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO time_sessions (project_id, start_time, end_time, duration)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(project_id)
        .bind(start_ms)
        .bind(start_ms + duration_secs * 1000)
        .bind(duration_secs)
        .fetch_one(&self.pool)
        .await
        .expect("insert session failed");
        id
    }

    /// Set a project's aggregate directly (paired with seeded sessions).
    pub async fn set_total_time(&self, project_id: &str, total_secs: i64) {
        let project_id: Uuid = project_id.parse().unwrap();
        sqlx::query("UPDATE projects SET total_time = $2 WHERE id = $1")
            .bind(project_id)
            .bind(total_secs)
            .execute(&self.pool)
            .await
            .expect("set total_time failed");
    }

    /// Sum of closed-session durations for a project, straight from the
    /// store. The aggregate invariant check.
    pub async fn closed_session_sum(&self, project_id: &str) -> i64 {
        let project_id: Uuid = project_id.parse().unwrap();
        let (sum,): (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(duration)::BIGINT FROM time_sessions
             WHERE project_id = $1 AND end_time IS NOT NULL",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .expect("session sum failed");
        sum.unwrap_or(0)
    }

    pub async fn session_count(&self, project_id: &str) -> i64 {
        let project_id: Uuid = project_id.parse().unwrap();
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM time_sessions WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await
                .expect("session count failed");
        count
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!(
        "timeclock_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        registration: RegistrationMode::Open,
        log_level: "warn".to_string(),
    };

    let app = timeclock::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
