//! Структурированное логирование на `tracing`.
//!
//! Консольный вывод (pretty, compact, json) и необязательный файл с
//! ежедневной ротацией. Фильтр берётся из `RUST_LOG`, иначе из конфигурации.

pub mod config;
mod filters;
mod formatter;
pub mod handle;
pub mod sinks;

use std::io;

use thiserror::Error;
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, Layer,
};

pub use config::{LogFormat, LoggingConfig};
pub use handle::LoggingHandle;

use crate::error::InvalidConfig;

/// Ошибка инициализации логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error(transparent)]
    Config(#[from] InvalidConfig),
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Инициализирует глобальный subscriber по конфигурации.
///
/// Повторный вызов в одном процессе возвращает
/// [`LoggingError::AlreadyInitialized`].
pub fn init_logging(config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.validate()?;
    config.ensure_log_dir()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers = Vec::new();

    if config.console_enabled {
        layers.push(sinks::console::layer_with_config(&config));
    }

    let file_guard = if config.file_enabled {
        let (file_layer, guard) = sinks::file::layer_with_config(&config);
        layers.push(file_layer.boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = %config.format,
        console_enabled = config.console_enabled,
        file_enabled = config.file_enabled,
        log_dir = %config.log_dir.display(),
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
