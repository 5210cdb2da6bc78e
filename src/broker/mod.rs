//! Брокер корреляции событий.
//!
//! - `event_broker`: [`EventBroker`], `dispatch` и `wait_for_event`.
//! - `history`: ограниченная история последних событий.
//! - `registry`: реестр ожидающих и условия совпадения.
//! - `hub`: широковещательная рассылка пассивным подписчикам.
//! - `stream`: асинхронная подписка через канал.
//! - `stats`: счётчики.

pub mod event_broker;
pub mod history;
pub mod hub;
pub mod registry;
pub mod stats;
pub mod stream;

pub use event_broker::EventBroker;
pub use history::{HistoryBuffer, HistoryEntry};
pub use hub::{BroadcastHub, Handler, PublishReport, SubscriptionId};
pub use registry::{Claim, Matcher, Predicate, WaiterId, WaiterRegistry};
pub use stats::{BrokerStats, StatsSnapshot};
pub use stream::EventStream;
