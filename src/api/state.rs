//! Application state shared across all handlers and middleware.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::auth::{AuthStore, PasswordHasher, TokenService};
use crate::cache::CacheStore;
use crate::config::Config;
use crate::generation::{
    BlogGenerator, CaptionRenderer, ContentGenerator, DeepSeekClient, ImageGenerator,
    RetryPolicy, StabilityClient,
};
use crate::monitoring::{
    DiskSpaceProbe, ExternalApiProbe, HealthChecker, MetricsCollector, UserStoreProbe,
};
use crate::notify::{NotificationDispatcher, TelegramNotifier};
use crate::ratelimit::RateLimiter;

const USER_STORE_INTERVAL: Duration = Duration::from_secs(30);
const EXTERNAL_APIS_INTERVAL: Duration = Duration::from_secs(60);
const DISK_SPACE_INTERVAL: Duration = Duration::from_secs(300);

/// Everything a request may touch, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<RwLock<CacheStore>>,
    pub limiter: Arc<Mutex<RateLimiter>>,
    pub metrics: Arc<RwLock<MetricsCollector>>,
    pub health: Arc<Mutex<HealthChecker>>,
    pub users: Arc<AuthStore>,
    pub tokens: Arc<TokenService>,
    pub generator: Arc<BlogGenerator>,
    pub notifier: NotificationDispatcher,
    /// Clients flagged by the suspicious-request screen
    pub blocked_ips: Arc<RwLock<HashSet<String>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assembles state around already-built collaborators.
    ///
    /// Registers the built-in health probes.
    pub fn new(
        config: Config,
        users: AuthStore,
        generator: BlogGenerator,
        notifier: NotificationDispatcher,
    ) -> Self {
        let users = Arc::new(users);

        let mut health = HealthChecker::new();
        health.add_check("user_store", UserStoreProbe(users.clone()), USER_STORE_INTERVAL);
        health.add_check(
            "external_apis",
            ExternalApiProbe {
                text_configured: generator.content().is_configured(),
                image_configured: generator.images().is_configured(),
            },
            EXTERNAL_APIS_INTERVAL,
        );
        health.add_check(
            "disk_space",
            DiskSpaceProbe {
                dir: std::env::temp_dir(),
            },
            DISK_SPACE_INTERVAL,
        );

        let tokens = TokenService::new(
            config.secret_key.clone(),
            chrono::Duration::minutes(config.access_token_expire_minutes),
        );

        Self {
            cache: Arc::new(RwLock::new(CacheStore::new(config.cache_ttl))),
            limiter: Arc::new(Mutex::new(RateLimiter::new(
                config.rate_limit_per_minute,
                config.rate_limit_per_hour,
            ))),
            metrics: Arc::new(RwLock::new(MetricsCollector::new(config.metrics_history))),
            health: Arc::new(Mutex::new(health)),
            users,
            tokens: Arc::new(tokens),
            generator: Arc::new(generator),
            notifier,
            blocked_ips: Arc::new(RwLock::new(HashSet::new())),
            config: Arc::new(config),
        }
    }

    /// Builds production state: real provider clients, font lookup,
    /// the Telegram notifier and (optionally) the demo users.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        if config.uses_dev_secret() {
            warn!("SECRET_KEY not set, using the development signing key");
        }

        let text = DeepSeekClient::new(
            config.deepseek_api_url.clone(),
            config.deepseek_api_key.clone(),
            config.api_timeout,
        )?;
        let images = StabilityClient::new(
            config.stability_api_url.clone(),
            config.stability_api_key.clone(),
            config.api_timeout,
        )?;
        if config.deepseek_api_key.is_none() || config.stability_api_key.is_none() {
            warn!("provider API keys missing, generation endpoints will fail");
        }

        let renderer = CaptionRenderer::load(config.caption_font_path.as_deref());
        let generator = BlogGenerator::new(
            ContentGenerator::new(Arc::new(text), RetryPolicy::default()),
            ImageGenerator::new(Arc::new(images), renderer),
        );

        let notifier = match TelegramNotifier::from_config(&config.telegram) {
            Some(telegram) => {
                info!("telegram notifications enabled");
                NotificationDispatcher::new(Arc::new(telegram))
            }
            None => {
                warn!("telegram notifications disabled or misconfigured");
                NotificationDispatcher::disabled()
            }
        };

        let hasher = PasswordHasher::new(config.password_hash_memory_kib);
        let users = if config.seed_demo_users {
            AuthStore::with_demo_users(hasher).await?
        } else {
            AuthStore::new(hasher)
        };
        info!(users = users.len().await, "user store ready");

        Ok(Self::new(config, users, generator, notifier))
    }
}
