use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::error;

use super::EventStream;
use crate::event::Event;

/// Callback-обработчик широковещательной рассылки.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Дескриптор подписки, возвращаемый [`BroadcastHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Итог одной рассылки.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Обработчиков, завершившихся нормально.
    pub delivered: usize,
    /// Обработчиков, запаниковавших во время вызова.
    pub panicked: usize,
}

type HandlerList = Arc<Vec<(SubscriptionId, Handler)>>;

/// Набор пассивных подписчиков, получающих каждое событие.
///
/// Список хранится как copy-on-write `Arc<Vec<..>>` под узкой блокировкой:
/// `publish` берёт снимок и сразу отпускает её, поэтому обработчики могут
/// подписываться и отписываться изнутри вызова. Отписка не прерывает уже
/// начатую рассылку: обработчик из снимка ещё может быть вызван один раз.
pub struct BroadcastHub {
    handlers: RwLock<HandlerList>,
    next_id: AtomicU64,
    /// Канал для [`EventStream`]-подписчиков.
    stream_tx: broadcast::Sender<Event>,
}

impl BroadcastHub {
    /// Создаёт hub; `stream_capacity` — буфер каждого `EventStream`.
    pub fn new(stream_capacity: usize) -> Self {
        let (stream_tx, _) = broadcast::channel(stream_capacity.max(1));
        Self {
            handlers: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(0),
            stream_tx,
        }
    }

    /// Регистрирует обработчик.
    pub fn subscribe<F>(
        &self,
        handler: F,
    ) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let mut guard = self.handlers.write();
        Arc::make_mut(&mut guard).push((id, Arc::new(handler)));
        id
    }

    /// Удаляет обработчик. `false`, если такой подписки нет.
    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> bool {
        let mut guard = self.handlers.write();
        match guard.iter().position(|(sid, _)| *sid == id) {
            Some(pos) => {
                Arc::make_mut(&mut guard).remove(pos);
                true
            }
            None => false,
        }
    }

    /// Новый асинхронный подписчик.
    pub fn subscribe_stream(&self) -> EventStream {
        EventStream {
            inner: self.stream_tx.subscribe(),
        }
    }

    /// Рассылает событие всем обработчикам из снимка и в поток подписчиков.
    ///
    /// Паника обработчика перехватывается и не мешает остальным.
    pub fn publish(
        &self,
        event: &Event,
    ) -> PublishReport {
        let snapshot = self.handlers.read().clone();
        let mut report = PublishReport::default();

        for (id, handler) in snapshot.iter() {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => report.delivered += 1,
                Err(panic) => {
                    report.panicked += 1;
                    error!(
                        subscription = %id,
                        kind = %event.kind(),
                        reason = panic_message(&*panic),
                        "Broadcast handler panicked"
                    );
                }
            }
        }

        if self.stream_tx.receiver_count() > 0 {
            // Ошибка возможна только если все приёмники ушли между проверкой
            // и отправкой.
            let _ = self.stream_tx.send(event.clone());
        }
        report
    }

    /// Количество callback-подписчиков.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Количество активных `EventStream`.
    pub fn stream_count(&self) -> usize {
        self.stream_tx.receiver_count()
    }
}

impl fmt::Debug for BroadcastHub {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("handlers", &self.len())
            .field("streams", &self.stream_count())
            .finish()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
