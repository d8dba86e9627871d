//! Runtime configuration read from the environment (and `.env`)

use std::env;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "data.db";
/// Used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "shortener=debug,tower_http=debug";

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server listens on
    pub port: u16,

    /// Path of the redb database file
    pub database_url: String,

    /// Public address short links are built on, without trailing slash
    pub base_url: String,

    /// Shared secret required in the `Authorization` header of API calls.
    /// `None` disables the check.
    pub auth_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            base_url: format!("http://localhost:{}", DEFAULT_PORT),
            auth_secret: None,
        }
    }
}

impl Config {
    /// Reads `PORT`, `DATABASE_URL`, `BASE_URL` and `AUTHORIZATION`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(port = %raw, "invalid PORT, falling back to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let base_url = lookup("BASE_URL")
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Self {
            port,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            base_url,
            auth_secret: lookup("AUTHORIZATION").filter(|secret| !secret.is_empty()),
        }
    }
}
