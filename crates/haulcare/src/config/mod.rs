use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub security: SecurityConfig,
    pub intake: IntakeConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let api_key = non_empty_var("APP_API_KEY");
        let bcrypt_cost = env::var("APP_BCRYPT_COST")
            .unwrap_or_else(|_| DEFAULT_BCRYPT_COST.to_string())
            .parse::<u32>()
            .ok()
            .filter(|cost| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(cost))
            .ok_or(ConfigError::InvalidBcryptCost)?;
        let seed_admin = match (
            non_empty_var("APP_ADMIN_EMAIL"),
            non_empty_var("APP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteSeedAdmin),
        };

        let session_lifetime_hours = env::var("APP_SESSION_LIFETIME_HOURS")
            .unwrap_or_else(|_| DEFAULT_SESSION_LIFETIME_HOURS.to_string())
            .parse::<i64>()
            .ok()
            .filter(|hours| (1..=MAX_SESSION_LIFETIME_HOURS).contains(hours))
            .ok_or(ConfigError::InvalidSessionLifetime)?;

        let submission_timeout_secs = env::var("APP_SUBMISSION_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_SUBMISSION_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidSubmissionTimeout)?;
        let idle_minutes = env::var("APP_ENROLLMENT_IDLE_MINUTES")
            .unwrap_or_else(|_| DEFAULT_ENROLLMENT_IDLE_MINUTES.to_string())
            .parse::<u64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(ConfigError::InvalidEnrollmentIdleTimeout)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                include_targets: environment == AppEnvironment::Development,
            },
            security: SecurityConfig {
                api_key,
                bcrypt_cost,
                session_lifetime_hours,
                seed_admin,
            },
            intake: IntakeConfig {
                submission_timeout: Duration::from_secs(submission_timeout_secs),
                session_idle_timeout: Duration::from_secs(idle_minutes * 60),
            },
        })
    }
}

const DEFAULT_BCRYPT_COST: u32 = 10;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
const DEFAULT_SUBMISSION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 12;
const MAX_SESSION_LIFETIME_HOURS: i64 = 24 * 30;
const DEFAULT_ENROLLMENT_IDLE_MINUTES: u64 = 120;

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub include_targets: bool,
}

/// Credentials and secrets used by the HTTP surface.
#[derive(Clone)]
pub struct SecurityConfig {
    /// Shared secret expected in the `x-api-key` header of scheduled jobs.
    pub api_key: Option<String>,
    pub bcrypt_cost: u32,
    /// Hours a login token stays valid.
    pub session_lifetime_hours: i64,
    pub seed_admin: Option<SeedAdmin>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            session_lifetime_hours: DEFAULT_SESSION_LIFETIME_HOURS,
            seed_admin: None,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("session_lifetime_hours", &self.session_lifetime_hours)
            .field("seed_admin", &self.seed_admin)
            .finish()
    }
}

/// Administrator account created at startup when both variables are set.
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Enrollment intake tuning.
#[derive(Debug, Clone, Copy)]
pub struct IntakeConfig {
    pub submission_timeout: Duration,
    /// Wizard sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            submission_timeout: Duration::from_secs(DEFAULT_SUBMISSION_TIMEOUT_SECS),
            session_idle_timeout: Duration::from_secs(DEFAULT_ENROLLMENT_IDLE_MINUTES * 60),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBcryptCost,
    IncompleteSeedAdmin,
    InvalidSubmissionTimeout,
    InvalidSessionLifetime,
    InvalidEnrollmentIdleTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBcryptCost => write!(
                f,
                "APP_BCRYPT_COST must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"
            ),
            ConfigError::IncompleteSeedAdmin => write!(
                f,
                "APP_ADMIN_EMAIL and APP_ADMIN_PASSWORD must be set together"
            ),
            ConfigError::InvalidSubmissionTimeout => write!(
                f,
                "APP_SUBMISSION_TIMEOUT_SECS must be a positive number of seconds"
            ),
            ConfigError::InvalidSessionLifetime => write!(
                f,
                "APP_SESSION_LIFETIME_HOURS must be between 1 and {MAX_SESSION_LIFETIME_HOURS}"
            ),
            ConfigError::InvalidEnrollmentIdleTimeout => write!(
                f,
                "APP_ENROLLMENT_IDLE_MINUTES must be a positive number of minutes"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBcryptCost
            | ConfigError::IncompleteSeedAdmin
            | ConfigError::InvalidSubmissionTimeout
            | ConfigError::InvalidSessionLifetime
            | ConfigError::InvalidEnrollmentIdleTimeout => None,
        }
    }
}
