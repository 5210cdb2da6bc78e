use std::{fmt, fs, io, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InvalidConfig;

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Формат вывода в консоль.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Многострочный, для разработки
    Pretty,
    /// Однострочный
    #[default]
    Compact,
    /// JSON, для сборщиков логов
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{other}', expected pretty|compact|json"
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: trace, debug, info, warn, error, off.
    pub level: String,
    /// Дополнительные директивы `EnvFilter`, например `evgate::gateway=trace`.
    pub directives: Vec<String>,
    pub console_enabled: bool,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
    /// Ежедневно ротируемый файл в `log_dir`.
    pub file_enabled: bool,
    pub log_dir: PathBuf,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            console_enabled: true,
            format: LogFormat::default(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
            file_enabled: false,
            log_dir: PathBuf::from("logs"),
            file_prefix: "evgate.log".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Строка для `EnvFilter`: базовый уровень плюс дополнительные директивы.
    pub fn build_filter_directive(&self) -> String {
        let mut directive = self.level.to_ascii_lowercase();
        for extra in &self.directives {
            directive.push(',');
            directive.push_str(extra);
        }
        directive
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let level = self.level.to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(InvalidConfig::new(
                "logging.level",
                format!("unknown level '{}'", self.level),
            ));
        }
        if self.file_enabled && self.file_prefix.trim().is_empty() {
            return Err(InvalidConfig::new(
                "logging.file_prefix",
                "must not be empty when file logging is enabled",
            ));
        }
        Ok(())
    }

    /// Создаёт каталог для файлового лога, если он включён.
    pub fn ensure_log_dir(&self) -> io::Result<()> {
        if self.file_enabled {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = LoggingConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.build_filter_directive(), "info");
    }

    #[test]
    fn test_directive_with_extras() {
        let cfg = LoggingConfig {
            level: "WARN".into(),
            directives: vec!["evgate::gateway=trace".into()],
            ..Default::default()
        };
        assert_eq!(cfg.build_filter_directive(), "warn,evgate::gateway=trace");
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let cfg = LoggingConfig {
            level: "loud".into(),
            ..Default::default()
        };
        assert_eq!(cfg.validate().unwrap_err().key, "logging.level");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Compact.to_string(), "compact");
    }

    #[test]
    fn test_ensure_log_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = LoggingConfig {
            file_enabled: true,
            log_dir: tmp.path().join("nested/logs"),
            ..Default::default()
        };
        cfg.ensure_log_dir().unwrap();
        assert!(cfg.log_dir.is_dir());
    }
}
