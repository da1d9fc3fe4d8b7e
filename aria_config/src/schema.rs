use aria_core::AssistantConfig;
use aria_core::util::DEFAULT_SYSTEM_PROMPT;
use aria_reminders::{QuietHours, TimeContext};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, Result};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub agents: AgentsConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentsConfig {
    pub defaults: AgentDefaults,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentDefaults {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl AgentDefaults {
    #[must_use]
    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
}

impl ProviderConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured data directory, or `~/aria/data`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Config::config_dir()?.join("data")),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct QuietHoursConfig {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "SchedulerConfig::default_timezone")]
    pub timezone: String,
    #[serde(default = "SchedulerConfig::default_tick_secs")]
    pub tick_secs: u64,
    #[serde(default = "SchedulerConfig::default_tolerance_secs")]
    pub tolerance_secs: u32,
    #[serde(default = "SchedulerConfig::default_bias_secs")]
    pub bias_secs: u32,
    #[serde(default = "SchedulerConfig::default_max_catch_up_secs")]
    pub max_catch_up_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHoursConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: Self::default_timezone(),
            tick_secs: Self::default_tick_secs(),
            tolerance_secs: Self::default_tolerance_secs(),
            bias_secs: Self::default_bias_secs(),
            max_catch_up_secs: Self::default_max_catch_up_secs(),
            quiet_hours: None,
        }
    }
}

impl SchedulerConfig {
    fn default_timezone() -> String {
        "UTC".to_string()
    }

    const fn default_tick_secs() -> u64 {
        30
    }

    const fn default_tolerance_secs() -> u32 {
        30
    }

    const fn default_bias_secs() -> u32 {
        60
    }

    const fn default_max_catch_up_secs() -> u32 {
        3600
    }

    /// Validate the zone and the windows and build the time context.
    pub fn time_context(&self) -> Result<TimeContext> {
        if self.tolerance_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "scheduler.tolerance_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_catch_up_secs < self.tolerance_secs {
            return Err(ConfigError::Invalid {
                field: "scheduler.max_catch_up_secs",
                reason: "must not be smaller than tolerance_secs".to_string(),
            });
        }

        let mut ctx = TimeContext::new(TimeContext::parse_zone(&self.timezone)?);
        ctx.bias = Duration::seconds(i64::from(self.bias_secs));
        ctx.tolerance = Duration::seconds(i64::from(self.tolerance_secs));
        ctx.max_catch_up = Duration::seconds(i64::from(self.max_catch_up_secs));
        if let Some(quiet) = &self.quiet_hours {
            ctx = ctx.with_quiet_hours(QuietHours::parse(&quiet.start, &quiet.end)?);
        }
        Ok(ctx)
    }

    pub fn tick_period(&self) -> Result<std::time::Duration> {
        if self.tick_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "scheduler.tick_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(std::time::Duration::from_secs(self.tick_secs))
    }
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(ConfigError::NoHomeDir)?.join("aria"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.scheduler.time_context()?;
        config.scheduler.tick_period()?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::io(&config_dir, e))?;
        Ok(config_dir)
    }

    /// Write the config template to `~/aria/config.json`.
    pub fn create_config() -> Result<PathBuf> {
        Self::create_in(&Self::ensure_config_dir()?)
    }

    /// Write the config template into `dir`. Never overwrites.
    pub fn create_in(dir: &Path) -> Result<PathBuf> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Err(ConfigError::AlreadyExists(config_path));
        }

        std::fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
        std::fs::write(&config_path, CONFIG_TEMPLATE)
            .map_err(|e| ConfigError::io(&config_path, e))?;
        Ok(config_path)
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "agents": {
    "defaults": {
      "model": "gpt-4o-mini",
      "max_tokens": 4096,
      "temperature": 0.7,
      "system_prompt": "You are Aria, a friendly personal assistant. Keep answers short and use directives to act on the user's behalf."
    }
  },
  "providers": {
    "openai": {
      "api_key": "your-openai-api-key-here",
      "base_url": "https://api.openai.com/v1"
    }
  },
  "storage": {},
  "scheduler": {
    "timezone": "UTC",
    "tick_secs": 30,
    "tolerance_secs": 30,
    "bias_secs": 60,
    "max_catch_up_secs": 3600,
    "quiet_hours": {
      "start": "22:00",
      "end": "07:00"
    }
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_and_validates() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.providers.openai.api_key, "your-openai-api-key-here");
        assert!(config.storage.data_dir.is_none());

        let ctx = config.scheduler.time_context().unwrap();
        assert_eq!(ctx.bias, Duration::seconds(60));
        assert!(ctx.quiet_hours.is_some());
    }

    #[test]
    fn scheduler_defaults_apply() {
        let scheduler: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(scheduler.timezone, "UTC");
        assert_eq!(scheduler.tick_period().unwrap(), std::time::Duration::from_secs(30));
        let ctx = scheduler.time_context().unwrap();
        assert_eq!(ctx.tolerance, Duration::seconds(30));
        assert_eq!(ctx.max_catch_up, Duration::seconds(3600));
        assert!(ctx.quiet_hours.is_none());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let scheduler = SchedulerConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            scheduler.time_context(),
            Err(ConfigError::Scheduler(_))
        ));
    }

    #[test]
    fn zero_windows_are_rejected() {
        let scheduler = SchedulerConfig {
            tick_secs: 0,
            tolerance_secs: 0,
            ..SchedulerConfig::default()
        };
        assert!(matches!(scheduler.time_context(), Err(ConfigError::Invalid { .. })));
        assert!(matches!(scheduler.tick_period(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn assistant_config_falls_back_to_default_prompt() {
        let defaults = AgentDefaults {
            model: "m".to_string(),
            max_tokens: 10,
            temperature: 0.0,
            system_prompt: None,
        };
        assert_eq!(defaults.assistant_config().system_prompt, DEFAULT_SYSTEM_PROMPT);
    }
}
