//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADBURST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADBURST_BASE_URL` - Public URL of the API (used for image and share links)
//! - `ADBURST_IDENTITY_SECRET` - Shared HMAC secret with the identity gateway (min 32 chars)
//! - `CLAUDE_API_KEY` - Anthropic Claude API key
//!
//! ## Optional
//! - `ADBURST_HOST` - Bind address (default: 127.0.0.1)
//! - `ADBURST_PORT` - Listen port (default: 3000)
//! - `CLAUDE_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `CHROME_EXECUTABLE` - Chromium binary (default: auto-detect)
//! - `RENDER_SETTLE_MS` - Delay after page load before the screenshot (default: 1500)
//! - `RENDER_TIMEOUT_SECS` - Upper bound for one render (default: 60)
//! - `MEDIA_DIR` - Directory for rendered images (default: uploads)
//! - `GENERATION_CREDIT_COST` - Credits charged per successful design (default: 1)
//! - `SIGNUP_CREDITS` - Credits granted to new accounts (default: 10)
//! - `SCHEDULER_INTERVAL_SECS` - Social post polling interval (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (ad inspiration search)
//! - `GOOGLE_SEARCH_API_KEY` - Google Custom Search API key
//! - `GOOGLE_SEARCH_ENGINE_ID` - Programmable search engine id (`cx`)
//!
//! ## Optional (TLS)
//! - `ADBURST_TLS_CERT` - PEM-encoded certificate chain
//! - `ADBURST_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_IDENTITY_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// HMAC secret shared with the identity gateway
    pub identity_secret: SecretString,
    /// Claude AI configuration
    pub claude: ClaudeConfig,
    /// Google Custom Search configuration (optional, enables ad inspiration search)
    pub search: Option<SearchConfig>,
    /// Headless browser rendering configuration
    pub render: RenderConfig,
    /// Credit bookkeeping
    pub credits: CreditConfig,
    /// How often the scheduler looks for due social posts
    pub scheduler_interval: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Claude AI API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Google Custom Search configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SearchConfig {
    /// Google API key
    pub api_key: SecretString,
    /// Programmable search engine id
    pub engine_id: String,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &"[REDACTED]")
            .field("engine_id", &self.engine_id)
            .finish()
    }
}

impl SearchConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let api_key = get_optional_env("GOOGLE_SEARCH_API_KEY");
        let engine_id = get_optional_env("GOOGLE_SEARCH_ENGINE_ID");

        match (api_key, engine_id) {
            (Some(key), Some(id)) => {
                if let Err(e) = validate_secret_strength(&key, "GOOGLE_SEARCH_API_KEY") {
                    tracing::warn!("GOOGLE_SEARCH_API_KEY validation warning: {e}");
                }
                Ok(Some(Self {
                    api_key: SecretString::from(key),
                    engine_id: id,
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "GOOGLE_SEARCH_*".to_string(),
                "Both GOOGLE_SEARCH_API_KEY and GOOGLE_SEARCH_ENGINE_ID must be set together"
                    .to_string(),
            )),
        }
    }
}

/// Headless browser rendering configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Chromium executable; `None` lets the browser crate auto-detect one.
    pub chrome_executable: Option<PathBuf>,
    /// Delay between page load and screenshot so the Tailwind CDN can apply styles.
    pub settle_delay: Duration,
    /// Upper bound for a single render, browser launch included.
    pub timeout: Duration,
    /// Directory rendered images are written to and served from.
    pub media_dir: PathBuf,
}

impl RenderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let settle_ms = parse_env_or_default::<u64>("RENDER_SETTLE_MS", "1500")?;
        let timeout_secs = parse_env_or_default::<u64>("RENDER_TIMEOUT_SECS", "60")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RENDER_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            chrome_executable: get_optional_env("CHROME_EXECUTABLE").map(PathBuf::from),
            settle_delay: Duration::from_millis(settle_ms),
            timeout: Duration::from_secs(timeout_secs),
            media_dir: PathBuf::from(get_env_or_default("MEDIA_DIR", "uploads")),
        })
    }
}

/// Credit bookkeeping configuration.
#[derive(Debug, Clone, Copy)]
pub struct CreditConfig {
    /// Credits charged per successful generation.
    pub generation_cost: i32,
    /// Credits granted when an account is first created.
    pub signup_credits: i32,
}

impl CreditConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let generation_cost = parse_env_or_default::<i32>("GENERATION_CREDIT_COST", "1")?;
        let signup_credits = parse_env_or_default::<i32>("SIGNUP_CREDITS", "10")?;
        if generation_cost < 0 || signup_credits < 0 {
            return Err(ConfigError::InvalidEnvVar(
                "GENERATION_CREDIT_COST/SIGNUP_CREDITS".to_string(),
                "must not be negative".to_string(),
            ));
        }
        Ok(Self {
            generation_cost,
            signup_credits,
        })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADBURST_TLS_CERT");
        let key_pem = get_optional_env("ADBURST_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADBURST_TLS_*".to_string(),
                "Both ADBURST_TLS_CERT and ADBURST_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADBURST_DATABASE_URL")?;
        let host = get_env_or_default("ADBURST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADBURST_HOST".to_string(), e.to_string()))?;
        let port = parse_env_or_default::<u16>("ADBURST_PORT", "3000")?;
        let base_url = get_required_env("ADBURST_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ADBURST_BASE_URL".to_string(), e.to_string())
        })?;
        let identity_secret = get_validated_secret("ADBURST_IDENTITY_SECRET")?;
        validate_secret_length(&identity_secret, "ADBURST_IDENTITY_SECRET")?;

        let claude = ClaudeConfig::from_env()?;
        let search = SearchConfig::from_env()?;
        let render = RenderConfig::from_env()?;
        let credits = CreditConfig::from_env()?;
        let scheduler_interval = Duration::from_secs(
            parse_env_or_default::<u64>("SCHEDULER_INTERVAL_SECS", "60")?.max(1),
        );
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            identity_secret,
            claude,
            search,
            render,
            credits,
            scheduler_interval,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns a reference to the Claude configuration.
    #[must_use]
    pub const fn claude(&self) -> &ClaudeConfig {
        &self.claude
    }

    /// Returns the search configuration, if ad inspiration search is enabled.
    #[must_use]
    pub const fn search(&self) -> Option<&SearchConfig> {
        self.search.as_ref()
    }

    /// Absolute URL for a path under the public base URL.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl ClaudeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret("CLAUDE_API_KEY")?,
            model: get_env_or_default("CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a shared secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_IDENTITY_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_IDENTITY_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// A complete configuration for unit tests; never touches the environment.
    pub(crate) fn test_config() -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/adburst_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            identity_secret: SecretString::from("k9$Qz!7vLm2@Xw4#Rt8^Np1&Hs5*Jd3%"),
            claude: ClaudeConfig {
                api_key: SecretString::from("sk-ant-test"),
                model: DEFAULT_CLAUDE_MODEL.to_string(),
            },
            search: None,
            render: RenderConfig {
                chrome_executable: None,
                settle_delay: Duration::from_millis(0),
                timeout: Duration::from_secs(5),
                media_dir: std::env::temp_dir().join("adburst-test-media"),
            },
            credits: CreditConfig {
                generation_cost: 1,
                signup_credits: 10,
            },
            scheduler_interval: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        let err = validate_secret_strength("your-claude-key-here", "CLAUDE_API_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "X").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        assert!(validate_secret_strength("abababababababababab", "X").is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "X").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "X").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "X").is_ok());
    }

    #[test]
    fn test_socket_addr_and_public_url() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(
            config.public_url("/uploads/creations/a.png"),
            "http://localhost:3000/uploads/creations/a.png"
        );
        assert_eq!(config.public_url("share/x"), "http://localhost:3000/share/x");
    }

    #[test]
    fn test_claude_config_debug_redacts_secrets() {
        let config = ClaudeConfig {
            api_key: SecretString::from("sk-ant-super-secret-key"),
            model: "claude-sonnet-4-20250514".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("claude-sonnet-4-20250514"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-ant-super-secret-key"));
    }

    #[test]
    fn test_search_config_debug_redacts_secrets() {
        let config = SearchConfig {
            api_key: SecretString::from("AIzaSyD-google-key"),
            engine_id: "engine-123".to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("engine-123"));
        assert!(!debug_output.contains("AIzaSyD-google-key"));
    }
}
