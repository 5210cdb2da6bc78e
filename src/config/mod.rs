//! Настройки процесса: значения по умолчанию, TOML-файл и переменные
//! окружения `EVGATE_*`.

pub mod settings;

use thiserror::Error;

pub use settings::{BrokerConfig, GatewayConfig, Settings};

use crate::error::InvalidConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
}
