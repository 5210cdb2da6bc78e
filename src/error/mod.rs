//! Ошибки брокера.
//!
//! Типы определены в крейте `evgate-error` и переэкспортируются здесь, чтобы
//! внутренний код и пользователи библиотеки импортировали их из одного места.

pub use evgate_error::{
    DecodeError, ErrorExt, InvalidConfig, LogLevel, RecvError, StatusCode, TryRecvError,
    WaitError,
};
