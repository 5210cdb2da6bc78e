/// Event-correlation broker: history, waiter registry, broadcast hub.
pub mod broker;
/// Settings loading: defaults, TOML file, `EVGATE_*` environment.
pub mod config;
/// Common error types re-exported from `evgate-error`.
pub mod error;
/// Events and their binary envelope.
pub mod event;
/// Entry point for the native engine, including the C ABI callback.
pub mod gateway;
/// Structured logging (formatting, filters, sinks).
pub mod logging;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Broker API.
pub use broker::{
    BroadcastHub, EventBroker, EventStream, Matcher, StatsSnapshot, SubscriptionId, WaiterId,
};
/// config
pub use config::{BrokerConfig, GatewayConfig, Settings, SettingsError};
/// Errors surfaced to callers.
pub use error::{DecodeError, ErrorExt, RecvError, StatusCode, TryRecvError, WaitError};
/// Events.
pub use event::{Event, EventKind};
/// Gateway.
pub use gateway::{evgate_on_event, Gateway};
/// Logging setup.
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingHandle};
