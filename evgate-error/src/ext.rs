use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок брокера (object-safe).
///
/// Предоставляет вспомогательные методы для работы с ошибками:
/// - извлечение статус-кода,
/// - безопасное сообщение для вызывающего кода,
/// - детализированное сообщение для логов,
/// - формирование тегов для систем наблюдаемости.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки.
    ///
    /// По умолчанию возвращает [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any),
    /// чтобы можно было выполнить downcast к конкретному типу.
    fn as_any(&self) -> &dyn Any;

    /// Безопасное сообщение для вызывающей стороны.
    ///
    /// Для внутренних ошибок не раскрывает детали и возвращает
    /// `"Internal broker error"`.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal | StatusCode::Unexpected => {
                "Internal broker error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Набор тегов для метрик.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Имя типа ошибки (без пути модулей).
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::{any::Any, error::Error, fmt};

    use super::*;

    // Ошибка без переопределения status_code (default = Internal).
    #[derive(Debug)]
    struct OpaqueError(pub &'static str);

    impl fmt::Display for OpaqueError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "OpaqueError: {}", self.0)
        }
    }

    impl Error for OpaqueError {}

    impl ErrorExt for OpaqueError {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct SlowError(pub u64);

    impl fmt::Display for SlowError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "no event after {} ms", self.0)
        }
    }

    impl Error for SlowError {}

    impl ErrorExt for SlowError {
        fn status_code(&self) -> StatusCode {
            StatusCode::Timeout
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Тест проверяет, что по умолчанию статус ошибки — `Internal`.
    #[test]
    fn test_default_status_code_is_internal() {
        assert_eq!(OpaqueError("oops").status_code(), StatusCode::Internal);
    }

    /// Тест проверяет, что внутренние детали не попадают в `client_message`.
    #[test]
    fn test_client_message_hides_internal_details() {
        let e = OpaqueError("pointer 0xdeadbeef");
        assert_eq!(e.client_message(), "Internal broker error");
    }

    /// Тест проверяет, что для остальных кодов `client_message` совпадает с
    /// `Display`.
    #[test]
    fn test_client_message_uses_display() {
        let e = SlowError(250);
        assert_eq!(e.client_message(), "no event after 250 ms");
    }

    /// Тест проверяет downcast через `as_any`.
    #[test]
    fn test_as_any_downcast() {
        let e = SlowError(7);
        let down = e.as_any().downcast_ref::<SlowError>();
        assert_eq!(down.map(|e| e.0), Some(7));
    }

    /// Тест проверяет, что `metrics_tags` содержит тип и статус.
    #[test]
    fn test_metrics_tags() {
        let tags = SlowError(1).metrics_tags();
        assert!(tags
            .iter()
            .any(|(k, v)| *k == "error_type" && v == "SlowError"));
        assert!(tags
            .iter()
            .any(|(k, v)| *k == "status_code" && v == &StatusCode::Timeout.to_string()));
    }

    #[test]
    fn test_log_message_matches_debug() {
        let e = OpaqueError("dbg");
        assert_eq!(e.log_message(), format!("{e:?}"));
    }
}
