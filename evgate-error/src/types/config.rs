use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Недопустимое значение в настройках брокера или шлюза.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid config value for `{key}`: {reason}")]
pub struct InvalidConfig {
    pub key: &'static str,
    pub reason: String,
}

impl InvalidConfig {
    pub fn new(
        key: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }
}

impl ErrorExt for InvalidConfig {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidConfig
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
