pub mod config;
pub mod decode;
pub mod stream;
pub mod wait;

// Публичный экспорт всех типов ошибок из вложенных модулей, чтобы упростить
// доступ к ним из внешнего кода.
pub use config::*;
pub use decode::*;
pub use stream::*;
pub use wait::*;
