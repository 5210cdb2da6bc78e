use std::{
    future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    sync::oneshot,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{
    BroadcastHub, BrokerStats, EventStream, HistoryBuffer, Matcher, StatsSnapshot, SubscriptionId,
    WaiterId, WaiterRegistry,
};
use crate::{config::BrokerConfig, error::WaitError, event::Event};

/// Всё, что меняется под критической секцией брокера.
struct BrokerState {
    history: HistoryBuffer,
    waiters: WaiterRegistry,
}

/// Брокер корреляции событий.
///
/// Единственный арбитр того, какой ожидающий забирает событие. История и
/// реестр ожидающих живут под одной блокировкой, поэтому проверка истории и
/// регистрация в `wait_for_event` атомарны относительно `dispatch`.
/// Обработчики рассылки вызываются уже после её освобождения.
///
/// Предикаты [`Matcher::Predicate`] выполняются под блокировкой брокера и не
/// должны обращаться к нему самому.
pub struct EventBroker {
    state: Mutex<BrokerState>,
    hub: BroadcastHub,
    stats: BrokerStats,
    next_async_id: AtomicU64,
    default_timeout: Duration,
}

enum Outcome {
    Matched(Result<Event, oneshot::error::RecvError>),
    Expired,
    Cancelled,
}

impl EventBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            state: Mutex::new(BrokerState {
                history: HistoryBuffer::new(config.history_capacity),
                waiters: WaiterRegistry::new(),
            }),
            hub: BroadcastHub::new(config.stream_capacity),
            stats: BrokerStats::new(),
            next_async_id: AtomicU64::new(0),
            default_timeout: config.default_wait_timeout(),
        }
    }

    /// Брокер с историей заданной ёмкости и остальными параметрами по
    /// умолчанию.
    pub fn with_capacity(history_capacity: usize) -> Self {
        Self::new(BrokerConfig {
            history_capacity,
            ..Default::default()
        })
    }

    /// Принимает разобранное событие.
    ///
    /// Под блокировкой: отдаёт событие не более чем одному ожидающему (первому
    /// по порядку регистрации) и кладёт его в историю. Затем, уже без
    /// блокировки, рассылает его всем подписчикам, независимо от того, был ли
    /// захват. Никогда не приостанавливается.
    pub fn dispatch(
        &self,
        event: Event,
    ) {
        let (claim, evicted) = {
            let mut state = self.state.lock();
            let claim = state.waiters.resolve(&event);
            let evicted = state.history.push(event.clone(), claim.is_some());
            (claim, evicted.is_some())
        };
        self.stats.record_dispatch(claim.is_some(), evicted);

        match claim {
            Some(claim) => debug!(
                waiter = %claim.waiter,
                kind = %event.kind(),
                async_id = ?event.async_id(),
                waited_ms = claim.waited.as_millis() as u64,
                "Event claimed by waiter"
            ),
            None => trace!(
                kind = %event.kind(),
                async_id = ?event.async_id(),
                evicted,
                "Event dispatched without waiter"
            ),
        }

        let report = self.hub.publish(&event);
        self.stats.record_handler_panics(report.panicked);
    }

    /// Ожидает событие, удовлетворяющее `matcher`.
    ///
    /// Сначала ищет незабранное совпадение в истории; если оно есть, ожидание
    /// завершается сразу. Иначе регистрирует ожидающего и ждёт одного из:
    /// совпавшего события, истечения `timeout`, срабатывания `cancel`.
    ///
    /// # Возвращает
    /// - `Ok(Event)` при совпадении
    /// - `Err(WaitError::Timeout)` если время вышло
    /// - `Err(WaitError::Cancelled)` если токен отменён (в том числе до
    ///   вызова)
    ///
    /// Уничтожение future до завершения снимает регистрацию. Слишком большой
    /// `timeout` равносилен его отсутствию.
    ///
    /// Предикат из `matcher` вызывается под блокировкой брокера: он не должен
    /// обращаться к этому брокеру (`dispatch`, `wait_for_event`,
    /// `pending_waiters` и т.п.), иначе получится взаимная блокировка.
    pub async fn wait_for_event(
        &self,
        matcher: impl Into<Matcher>,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Event, WaitError> {
        let matcher = matcher.into();

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            self.stats.record_cancel();
            return Err(WaitError::Cancelled);
        }

        // Переполнение означает, что срок не наступит никогда.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        let (id, mut rx) = {
            let mut state = self.state.lock();
            if let Some(event) = state.history.claim_first(|e| matcher.matches(e)) {
                drop(state);
                self.stats.record_history_hit();
                debug!(
                    ?matcher,
                    kind = %event.kind(),
                    async_id = ?event.async_id(),
                    "Wait satisfied from history"
                );
                return Ok(event);
            }
            state.waiters.register(matcher)
        };
        let mut pending = PendingWait {
            broker: self,
            id,
            armed: true,
        };
        trace!(waiter = %id, ?timeout, "Waiter registered");

        let outcome = tokio::select! {
            biased;
            res = &mut rx => Outcome::Matched(res),
            _ = expire(deadline) => Outcome::Expired,
            _ = cancelled(cancel) => Outcome::Cancelled,
        };

        let error = match outcome {
            Outcome::Matched(Ok(event)) => {
                pending.disarm();
                return Ok(event);
            }
            // Отправитель уничтожен без значения: регистрации уже нет.
            Outcome::Matched(Err(_)) => {
                pending.disarm();
                return Err(WaitError::Cancelled);
            }
            Outcome::Expired => WaitError::Timeout,
            Outcome::Cancelled => WaitError::Cancelled,
        };

        pending.disarm();
        self.settle(id, rx, error)
    }

    /// Завершает ожидание, прерванное таймаутом или отменой.
    ///
    /// Побеждает тот, кто снял регистрацию под блокировкой: если `dispatch`
    /// успел раньше, событие уже лежит в слоте и возвращается вместо `error`.
    fn settle(
        &self,
        id: WaiterId,
        mut rx: oneshot::Receiver<Event>,
        error: WaitError,
    ) -> Result<Event, WaitError> {
        let removed = self.state.lock().waiters.remove(id);
        if !removed {
            if let Ok(event) = rx.try_recv() {
                debug!(waiter = %id, "Event won the race against {error}");
                return Ok(event);
            }
        }

        match error {
            WaitError::Timeout => self.stats.record_timeout(),
            WaitError::Cancelled => self.stats.record_cancel(),
        }
        debug!(waiter = %id, %error, "Wait finished without event");
        Err(error)
    }

    /// Ожидает ответ на исходящий запрос с данным `async_id`.
    ///
    /// `None` в `timeout` означает таймаут из конфигурации брокера.
    pub async fn wait_for_async_id(
        &self,
        async_id: u64,
        timeout: Option<Duration>,
    ) -> Result<Event, WaitError> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        self.wait_for_event(Matcher::AsyncId(async_id), Some(timeout), None)
            .await
    }

    /// Новый уникальный идентификатор корреляции для исходящего запроса.
    /// Начинается с 1.
    pub fn next_async_id(&self) -> u64 {
        self.next_async_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn subscribe<F>(
        &self,
        handler: F,
    ) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.hub.subscribe(handler)
    }

    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> bool {
        self.hub.unsubscribe(id)
    }

    pub fn subscribe_stream(&self) -> EventStream {
        self.hub.subscribe_stream()
    }

    /// Количество зарегистрированных и ещё не завершённых ожиданий.
    pub fn pending_waiters(&self) -> usize {
        self.state.lock().waiters.len()
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn history_capacity(&self) -> usize {
        self.state.lock().history.capacity()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &BrokerStats {
        &self.stats
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl std::fmt::Debug for EventBroker {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EventBroker")
            .field("history", &state.history.len())
            .field("waiters", &state.waiters.len())
            .field("hub", &self.hub)
            .finish()
    }
}

/// Снимает регистрацию, если future ожидания уничтожен до завершения.
struct PendingWait<'a> {
    broker: &'a EventBroker,
    id: WaiterId,
    armed: bool,
}

impl PendingWait<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingWait<'_> {
    fn drop(&mut self) {
        if self.armed && self.broker.state.lock().waiters.remove(self.id) {
            self.broker.stats.record_abandoned();
            trace!(waiter = %self.id, "Abandoned wait removed");
        }
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => future::pending().await,
    }
}
