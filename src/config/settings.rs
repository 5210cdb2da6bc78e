use std::{path::Path, time::Duration};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use super::SettingsError;
use crate::{error::InvalidConfig, event::envelope::MIN_LEN, logging::LoggingConfig};

/// Параметры брокера.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrokerConfig {
    /// Ёмкость истории последних событий.
    pub history_capacity: usize,
    /// Буфер каждого `EventStream`.
    pub stream_capacity: usize,
    /// Таймаут `wait_for_async_id`, если вызывающий не указал свой.
    pub default_wait_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            stream_capacity: 1024,
            default_wait_timeout_ms: 5000,
        }
    }
}

impl BrokerConfig {
    pub fn default_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.default_wait_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.history_capacity == 0 {
            return Err(InvalidConfig::new("broker.history_capacity", "must be > 0"));
        }
        if self.stream_capacity == 0 {
            return Err(InvalidConfig::new("broker.stream_capacity", "must be > 0"));
        }
        if self.default_wait_timeout_ms == 0 {
            return Err(InvalidConfig::new(
                "broker.default_wait_timeout_ms",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

/// Параметры входной точки.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Буферы длиннее отбрасываются без разбора.
    pub max_envelope_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_envelope_size: 4 * 1024 * 1024,
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.max_envelope_size < MIN_LEN {
            return Err(InvalidConfig::new(
                "gateway.max_envelope_size",
                format!("must be at least {MIN_LEN} bytes"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Значения по умолчанию, затем `evgate.toml` из текущего каталога
    /// (если есть), затем переменные `EVGATE_*`.
    pub fn load() -> Result<Self, SettingsError> {
        Self::build(File::with_name("evgate").required(false))
    }

    /// Как [`Settings::load`], но файл конфигурации обязателен.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self, SettingsError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let cfg = Config::builder()
            // Добавляем значения по умолчанию
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            // EVGATE_BROKER__HISTORY_CAPACITY=500 -> broker.history_capacity
            .add_source(
                Environment::with_prefix("EVGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        self.broker.validate()?;
        self.gateway.validate()?;
        self.logging.validate()
    }
}
