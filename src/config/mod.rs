use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub use crate::logging::LoggingConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: BrowserConfig,
    pub readiness: ReadinessConfig,
    pub scroll: ScrollConfig,
    pub pacing: PacingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub launch_settle_ms: u64,
    pub navigation_timeout_seconds: u64,
}

/// What the readiness gate reports once every attempt has timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Report the page as not ready
    Report,
    /// Report the page as ready anyway
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub max_attempts: usize,
    pub timeout_per_attempt_ms: u64,
    pub exhaustion: ExhaustionPolicy,
    pub require_ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub enabled: bool,
    pub max_iterations: usize,
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub wait_ms: u64,
    pub delta_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            user_agent: None,
            launch_settle_ms: 2000,
            navigation_timeout_seconds: 60,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_per_attempt_ms: 5000,
            exhaustion: ExhaustionPolicy::Report,
            require_ready: false,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_iterations: 3,
            settle_delay_ms: 8000,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            wait_ms: 5000,
            delta_ms: 1000,
        }
    }
}

impl ReadinessConfig {
    pub fn timeout_per_attempt(&self) -> Duration {
        Duration::from_millis(self.timeout_per_attempt_ms)
    }
}

impl ScrollConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl AppConfig {
    /// Load configuration from default locations
    pub async fn load() -> Result<Self> {
        let config_path = get_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            info!("No configuration file found, using defaults");
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Load configuration from specific file
    pub async fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to default location
    pub async fn save(&self) -> Result<()> {
        let config_path = get_config_path();

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content).await?;

        info!("Configuration saved to: {}", config_path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.readiness.max_attempts == 0 {
            warn!("Readiness max_attempts is 0, pages are scraped without waiting");
        }

        if self.scroll.enabled && self.scroll.max_iterations == 0 {
            return Err(anyhow::anyhow!("Scroll max_iterations must be > 0 when scrolling is enabled"));
        }

        if self.browser.navigation_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Browser navigation_timeout_seconds must be > 0"));
        }

        Ok(())
    }
}

/// Get the configuration file path
fn get_config_path() -> PathBuf {
    directories::ProjectDirs::from("com", "productcrawl", "crawl")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("config.toml"))
}

/// Environment-based configuration overrides
pub struct ConfigOverrides;

impl ConfigOverrides {
    /// Apply `CRAWL_*` environment variable overrides to configuration
    pub fn apply(config: &mut AppConfig) {
        Self::apply_from(config, |key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`
    pub fn apply_from<F>(config: &mut AppConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Logging overrides
        if let Some(log_level) = lookup("CRAWL_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        if let Some(log_dir) = lookup("CRAWL_LOG_DIR") {
            config.logging.log_directory = PathBuf::from(log_dir);
        }

        // Browser overrides
        if let Some(headless) = lookup("CRAWL_HEADLESS") {
            config.browser.headless = headless.to_lowercase() == "true";
        }

        // Readiness overrides
        if let Some(attempts) = lookup("CRAWL_READY_ATTEMPTS").and_then(|v| v.parse().ok()) {
            config.readiness.max_attempts = attempts;
        }

        if let Some(timeout) = lookup("CRAWL_READY_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.readiness.timeout_per_attempt_ms = timeout;
        }

        // Scroll overrides
        if let Some(iterations) = lookup("CRAWL_SCROLL_ITERATIONS").and_then(|v| v.parse().ok()) {
            config.scroll.max_iterations = iterations;
        }

        if let Some(delay) = lookup("CRAWL_SCROLL_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.scroll.settle_delay_ms = delay;
        }

        info!("Applied environment variable overrides");
    }
}
