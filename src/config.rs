// ABOUTME: Promoter configuration loaded from TOML with environment credentials
// ABOUTME: Defaults mirror the platform's usual dev-to-qa promotion setup

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::DEFAULT_OBJECT_TYPES;
use crate::error::PromoterError;
use crate::orchestrator::PromotionSettings;
use crate::poll::PollPolicy;
use crate::remote::{ConflictResolution, Credentials};

pub const DEFAULT_CONFIG_FILE: &str = "ic-promoter.toml";
const DEFAULT_LOGIN_URL: &str = "https://dm-us.informaticacloud.com/ma/api/v2/user/login";
const SOURCE_PREFIX: &str = "DEV";
const TARGET_PREFIX: &str = "QA";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub direction: String,
    pub output_root: PathBuf,
    pub conflict_resolution: ConflictResolution,
    pub object_types: Vec<String>,
    pub http_timeout_secs: u64,
    pub source: EnvironmentConfig,
    pub target: EnvironmentConfig,
    pub polling: PollingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            direction: "dev_to_qa".to_string(),
            output_root: PathBuf::from("."),
            conflict_resolution: ConflictResolution::Overwrite,
            object_types: DEFAULT_OBJECT_TYPES.iter().map(|t| t.to_string()).collect(),
            http_timeout_secs: 60,
            source: EnvironmentConfig::with_prefix(SOURCE_PREFIX),
            target: EnvironmentConfig::with_prefix(TARGET_PREFIX),
            polling: PollingConfig::default(),
        }
    }
}

/// One org. Credentials come from `<env_prefix>_IC_USERNAME` and
/// `<env_prefix>_IC_PASSWORD`; `<env_prefix>_IC_LOGIN_URL` overrides `login_url`.
///
/// A table without `env_prefix` keeps its role's prefix (DEV for the source,
/// QA for the target).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub env_prefix: String,
    pub login_url: String,
}

impl EnvironmentConfig {
    fn with_prefix(prefix: &str) -> Self {
        Self {
            env_prefix: prefix.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }

    fn or_prefix(&mut self, prefix: &str) {
        if self.env_prefix.trim().is_empty() {
            self.env_prefix = prefix.to_string();
        }
    }

    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_from(|key| std::env::var(key).ok())
    }

    pub fn credentials_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        let var = |suffix: &str| format!("{}_IC_{}", self.env_prefix, suffix);
        let required = |suffix: &str| -> Result<String> {
            let key = var(suffix);
            lookup(&key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    PromoterError::Configuration(format!("environment variable {} is not set", key))
                        .into()
                })
        };

        Ok(Credentials {
            login_url: lookup(&var("LOGIN_URL"))
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| self.login_url.clone()),
            username: required("USERNAME")?,
            password: required("PASSWORD")?,
        })
    }
}

impl Default for EnvironmentConfig {
    /// The prefix is filled in per role once the file is parsed.
    fn default() -> Self {
        Self::with_prefix("")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    pub export: PollSettings,
    pub import: PollSettings,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            export: PollSettings::from(PollPolicy::export_default()),
            import: PollSettings::from(PollPolicy::import_default()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollSettings {
    pub initial_delay_secs: u64,
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl From<PollPolicy> for PollSettings {
    fn from(policy: PollPolicy) -> Self {
        Self {
            initial_delay_secs: policy.initial_delay.as_secs(),
            interval_secs: policy.interval.as_secs(),
            max_attempts: policy.max_attempts,
        }
    }
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        PollPolicy::new(
            Duration::from_secs(settings.initial_delay_secs),
            Duration::from_secs(settings.interval_secs),
            settings.max_attempts,
        )
    }
}

impl Config {
    /// Loads `path`, or the default file when present, or built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if explicit {
                return Err(PromoterError::Configuration(format!(
                    "config file {} does not exist",
                    path.display()
                ))
                .into());
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(raw).context("Failed to parse TOML")?;
        config.source.or_prefix(SOURCE_PREFIX);
        config.target.or_prefix(TARGET_PREFIX);
        config.validate()?;
        Ok(config)
    }

    /// Checked again after command-line flags are applied.
    pub fn validate(&self) -> Result<()> {
        if self.direction.trim().is_empty() {
            return Err(PromoterError::Configuration("direction must not be empty".into()).into());
        }
        if self.object_types.is_empty() {
            return Err(
                PromoterError::Configuration("object_types must list at least one type".into()).into(),
            );
        }
        if self.polling.export.max_attempts == 0 || self.polling.import.max_attempts == 0 {
            return Err(
                PromoterError::Configuration("max_attempts must be at least 1".into()).into(),
            );
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn promotion_settings(&self) -> PromotionSettings {
        PromotionSettings {
            object_types: self.object_types.clone(),
            conflict_resolution: self.conflict_resolution,
            export_policy: self.polling.export.into(),
            import_policy: self.polling.import.into(),
        }
    }
}
