//! Command line and environment configuration for the server.

use std::{fmt::Display, time::Duration};

use clap::{Parser, ValueEnum};
use serde::Serialize;

/// The cross-origin callers allowed when none are configured.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:19000",
    "http://localhost:19006",
    "exp://localhost:19000",
];

/// Which environment the server is running in.
///
/// Production turns on rate limiting and the keep-alive job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development and tests.
    #[default]
    Development,
    /// A deployed instance.
    Production,
}

impl Environment {
    /// Whether this is the production environment.
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// The REST API server for recording transactions.
///
/// Every option may also be set with the environment variable shown in its help text.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File path to the application SQLite database, or ":memory:".
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// The environment the server runs in [default: development].
    #[arg(long, env = "APP_ENV", value_enum)]
    pub environment: Option<Environment>,

    /// The environment name set by older deployments, used when `APP_ENV` is not set.
    ///
    /// Only "production" is recognised, anything else means development.
    #[arg(long, env = "NODE_ENV", hide = true)]
    pub node_env: Option<String>,

    /// Origins allowed to make cross-origin requests, separated by commas.
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOWED_ORIGINS.map(String::from)
    )]
    pub allowed_origins: Vec<String>,

    /// The URL the keep-alive job requests in production.
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// How many requests a client may make per rate limit window.
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 100)]
    pub rate_limit_max_requests: u64,

    /// The length of a rate limit window in seconds.
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    pub rate_limit_window_secs: u64,

    /// Seconds between keep-alive requests.
    #[arg(long, env = "KEEP_ALIVE_INTERVAL_SECS", default_value_t = 14 * 60)]
    pub keep_alive_interval_secs: u64,
}

impl Config {
    /// The environment to run in, preferring `APP_ENV` over `NODE_ENV`.
    pub fn environment(&self) -> Environment {
        match (self.environment, self.node_env.as_deref()) {
            (Some(environment), _) => environment,
            (None, Some("production")) => Environment::Production,
            (None, _) => Environment::Development,
        }
    }

    /// The length of a rate limit window.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// The time between keep-alive requests.
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval_secs)
    }
}
