//! Integration tests for AdBurst.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests (no database needed)
//! cargo test -p adburst-integration-tests
//!
//! # Live tests against a running server and database
//! ADBURST_BASE_URL=http://localhost:3000 \
//! ADBURST_IDENTITY_SECRET=... \
//! ADBURST_DATABASE_URL=postgres://localhost/adburst \
//!     cargo test -p adburst-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `router` - In-process requests through the full middleware stack
//! - `generation` - Request validation and the render fallback path
//! - `live_api` - End-to-end flows against a running server
//! - `live_scheduler` - Scheduler ticks against a migrated database and a local webhook

use std::time::Duration;

use adburst_server::config::{ClaudeConfig, CreditConfig, RenderConfig, ServerConfig};
use adburst_server::state::AppState;
use axum::Router;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Identity secret shared by [`test_config`] and signed test requests.
pub const TEST_IDENTITY_SECRET: &str = "k9$Qz!7vLm2@Xw4#Rt8^Np1&Hs5*Jd3%";

/// Client IP sent with in-process requests so the rate limiters can key them.
pub const TEST_CLIENT_IP: &str = "198.51.100.20";

/// A configuration that never touches the environment.
///
/// # Panics
///
/// Never; the host literal is a valid address.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/adburst_test"),
        host: "127.0.0.1".parse().expect("valid address"),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        identity_secret: SecretString::from(TEST_IDENTITY_SECRET),
        claude: ClaudeConfig {
            api_key: SecretString::from("sk-ant-test"),
            model: "claude-sonnet-4-20250514".to_string(),
        },
        search: None,
        render: RenderConfig {
            chrome_executable: None,
            settle_delay: Duration::from_millis(0),
            timeout: Duration::from_secs(5),
            media_dir: std::env::temp_dir().join("adburst-integration-media"),
        },
        credits: CreditConfig {
            generation_cost: 1,
            signup_credits: 10,
        },
        scheduler_interval: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// The full application router over a lazily connecting pool.
///
/// Requests that never reach the database work without one.
///
/// # Panics
///
/// Panics if the state cannot be built.
#[must_use]
pub fn test_app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://localhost/adburst_test")
        .expect("lazy pool accepts a well-formed URL");
    let state = AppState::new(config, pool).expect("state builds without network access");
    adburst_server::router(state)
}

/// Base URL for live tests (configurable via environment).
#[must_use]
pub fn live_base_url() -> String {
    std::env::var("ADBURST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Identity secret for live tests (configurable via environment).
#[must_use]
pub fn live_identity_secret() -> String {
    std::env::var("ADBURST_IDENTITY_SECRET").unwrap_or_else(|_| TEST_IDENTITY_SECRET.to_string())
}

/// Pool on the live database, for arranging state the API cannot.
///
/// # Panics
///
/// Panics if the database is unreachable.
pub async fn live_pool() -> PgPool {
    let url = std::env::var("ADBURST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| "postgres://localhost/adburst".to_string());
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database")
}
