//! Configuration management for OpsDesk.
//!
//! Loads configuration from environment variables with sensible
//! defaults for local development. A `.env` file is honored when
//! present.

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub approvals: ApprovalConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ApprovalConfig {
    /// Seconds between scheduled auto-approval scans (default: hourly)
    pub interval_secs: u64,
    /// Hours a request waits before it becomes eligible for auto-approval
    pub auto_approve_delay_hours: i64,
    /// Days a granted download link stays valid
    pub download_expiry_days: i64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Seconds a project stays in the approval scan's lookup cache
    pub project_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8970").parse().expect("Invalid PORT"),
                public_url: env_or("PUBLIC_URL", "http://localhost:8970"),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/opsdesk.db"),
            },
            approvals: ApprovalConfig {
                interval_secs: env_or("APPROVAL_INTERVAL_SECS", "3600")
                    .parse()
                    .unwrap_or(3600),
                auto_approve_delay_hours: env_or("AUTO_APPROVE_DELAY_HOURS", "24")
                    .parse()
                    .unwrap_or(24),
                download_expiry_days: env_or("DOWNLOAD_EXPIRY_DAYS", "30")
                    .parse()
                    .unwrap_or(30),
            },
            cache: CacheConfig {
                project_ttl_secs: env_or("PROJECT_CACHE_TTL_SECS", "300")
                    .parse()
                    .unwrap_or(300),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
