//! Configuration Module
//!
//! Handles loading service configuration from environment variables
//! (after `.env` has been applied by `main`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::generation::{DEFAULT_DEEPSEEK_URL, DEFAULT_STABILITY_URL};
use crate::notify::TelegramConfig;

/// Origins allowed by CORS in addition to `ALLOWED_ORIGINS`.
pub const DEFAULT_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:8000"];

const DEV_SECRET_KEY: &str = "change-me-in-production";

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// HMAC secret used to sign bearer tokens
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub deepseek_api_key: Option<String>,
    pub deepseek_api_url: String,
    pub stability_api_key: Option<String>,
    pub stability_api_url: String,
    /// Per-attempt timeout for provider calls
    pub api_timeout: Duration,
    pub telegram: TelegramConfig,
    pub allowed_origins: Vec<String>,
    /// Accepted `Host` values; `*` accepts any host
    pub trusted_hosts: Vec<String>,
    pub rate_limit_per_minute: u32,
    pub rate_limit_per_hour: u32,
    /// Default TTL for cache entries
    pub cache_ttl: Duration,
    /// Background cleanup task interval
    pub cleanup_interval: Duration,
    /// Capacity of the request-metrics ring buffer
    pub metrics_history: usize,
    pub caption_font_path: Option<PathBuf>,
    /// Directory served under `/static`, also holding `favicon.ico`
    pub static_dir: PathBuf,
    /// Argon2 memory cost in KiB
    pub password_hash_memory_kib: u32,
    pub seed_demo_users: bool,
    pub json_logs: bool,
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

fn list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 8000)
    /// - `SECRET_KEY` - token signing secret (default: a development value)
    /// - `ACCESS_TOKEN_EXPIRE_MINUTES` - token lifetime (default: 30)
    /// - `DEEPSEEK_API_KEY`, `DEEPSEEK_API_URL` - text provider
    /// - `STABILITY_API_KEY`, `STABILITY_API_URL` - image provider
    /// - `API_TIMEOUT` - provider timeout in seconds (default: 60)
    /// - `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, `TELEGRAM_ENABLED` (default: true)
    /// - `ALLOWED_ORIGINS` - extra CORS origins, comma separated
    /// - `TRUSTED_HOSTS` - comma separated (default: `*`)
    /// - `RATE_LIMIT_PER_MINUTE` (default: 60), `RATE_LIMIT_PER_HOUR` (default: 1000)
    /// - `CACHE_TTL` - default cache TTL in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - cleanup frequency in seconds (default: 60)
    /// - `METRICS_HISTORY` - metrics ring buffer size (default: 1000)
    /// - `CAPTION_FONT_PATH` - TTF/OTF font for image captions
    /// - `STATIC_DIR` - static assets directory (default: static)
    /// - `PASSWORD_HASH_MEMORY_KIB` - Argon2 memory cost (default: 19456)
    /// - `SEED_DEMO_USERS` - seed `admin` and `user` accounts (default: true)
    /// - `LOG_FORMAT` - `json` for JSON logs
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let trusted_hosts = list("TRUSTED_HOSTS");
        let mut allowed_origins = defaults.allowed_origins.clone();
        for origin in list("ALLOWED_ORIGINS") {
            if !allowed_origins.contains(&origin) {
                allowed_origins.push(origin);
            }
        }

        Self {
            server_port: parsed("PORT", defaults.server_port),
            secret_key: optional("SECRET_KEY").unwrap_or(defaults.secret_key),
            access_token_expire_minutes: parsed(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                defaults.access_token_expire_minutes,
            ),
            deepseek_api_key: optional("DEEPSEEK_API_KEY"),
            deepseek_api_url: optional("DEEPSEEK_API_URL").unwrap_or(defaults.deepseek_api_url),
            stability_api_key: optional("STABILITY_API_KEY"),
            stability_api_url: optional("STABILITY_API_URL")
                .unwrap_or(defaults.stability_api_url),
            api_timeout: Duration::from_secs(parsed("API_TIMEOUT", 60)),
            telegram: TelegramConfig {
                bot_token: optional("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
                chat_id: optional("TELEGRAM_CHAT_ID").unwrap_or_default(),
                enabled: flag("TELEGRAM_ENABLED", true),
            },
            allowed_origins,
            trusted_hosts: if trusted_hosts.is_empty() {
                defaults.trusted_hosts
            } else {
                trusted_hosts
            },
            rate_limit_per_minute: parsed("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute),
            rate_limit_per_hour: parsed("RATE_LIMIT_PER_HOUR", defaults.rate_limit_per_hour),
            cache_ttl: Duration::from_secs(parsed("CACHE_TTL", 3600)),
            cleanup_interval: Duration::from_secs(parsed("CLEANUP_INTERVAL", 60).max(1)),
            metrics_history: parsed("METRICS_HISTORY", defaults.metrics_history),
            caption_font_path: optional("CAPTION_FONT_PATH").map(PathBuf::from),
            static_dir: optional("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            password_hash_memory_kib: parsed(
                "PASSWORD_HASH_MEMORY_KIB",
                defaults.password_hash_memory_kib,
            ),
            seed_demo_users: flag("SEED_DEMO_USERS", true),
            json_logs: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// True when the secret is still the built-in development value.
    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }

    pub fn trusts_any_host(&self) -> bool {
        self.trusted_hosts.iter().any(|h| h == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            secret_key: DEV_SECRET_KEY.to_string(),
            access_token_expire_minutes: 30,
            deepseek_api_key: None,
            deepseek_api_url: DEFAULT_DEEPSEEK_URL.to_string(),
            stability_api_key: None,
            stability_api_url: DEFAULT_STABILITY_URL.to_string(),
            api_timeout: Duration::from_secs(60),
            telegram: TelegramConfig {
                enabled: true,
                ..TelegramConfig::default()
            },
            allowed_origins: DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
            trusted_hosts: vec!["*".to_string()],
            rate_limit_per_minute: 60,
            rate_limit_per_hour: 1000,
            cache_ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(60),
            metrics_history: 1000,
            caption_font_path: None,
            static_dir: PathBuf::from("static"),
            password_hash_memory_kib: argon2::Params::DEFAULT_M_COST,
            seed_demo_users: true,
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.access_token_expire_minutes, 30);
        assert_eq!(config.api_timeout, Duration::from_secs(60));
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.rate_limit_per_hour, 1000);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.metrics_history, 1000);
        assert!(config.trusts_any_host());
        assert!(config.uses_dev_secret());
        assert!(config.seed_demo_users);
        assert!(!config.telegram.is_active());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests.
        for key in ["PORT", "RATE_LIMIT_PER_MINUTE", "CACHE_TTL", "TRUSTED_HOSTS"] {
            env::remove_var(key);
        }
        let config = Config::from_env();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert!(config.trusts_any_host());

        env::set_var("PORT", "9100");
        env::set_var("RATE_LIMIT_PER_MINUTE", "not-a-number");
        env::set_var("CACHE_TTL", "120");
        env::set_var("TRUSTED_HOSTS", "example.com, api.example.com");
        env::set_var("ALLOWED_ORIGINS", "https://blog.example.com,http://localhost:3000");

        let config = Config::from_env();
        assert_eq!(config.server_port, 9100);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.trusted_hosts, vec!["example.com", "api.example.com"]);
        assert!(!config.trusts_any_host());
        assert_eq!(
            config.allowed_origins,
            vec![
                "http://localhost:3000",
                "http://localhost:8000",
                "https://blog.example.com"
            ]
        );

        for key in ["PORT", "RATE_LIMIT_PER_MINUTE", "CACHE_TTL", "TRUSTED_HOSTS", "ALLOWED_ORIGINS"] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_flag_parsing() {
        env::set_var("BLOG_GENERATOR_TEST_FLAG", "TRUE");
        assert!(flag("BLOG_GENERATOR_TEST_FLAG", false));
        env::set_var("BLOG_GENERATOR_TEST_FLAG", "false");
        assert!(!flag("BLOG_GENERATOR_TEST_FLAG", true));
        env::remove_var("BLOG_GENERATOR_TEST_FLAG");
        assert!(flag("BLOG_GENERATOR_TEST_FLAG", true));
    }
}
