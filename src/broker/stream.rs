use tokio::sync::broadcast;

use crate::{
    error::{RecvError, TryRecvError},
    event::Event,
};

/// Асинхронная подписка на все события брокера.
///
/// Альтернатива callback-обработчикам: события читаются через `recv().await`.
/// Медленный подписчик не тормозит `dispatch`, а пропускает события и
/// получает [`RecvError::Lagged`].
///
/// Отписка происходит автоматически при `Drop`.
pub struct EventStream {
    pub(crate) inner: broadcast::Receiver<Event>,
}

impl EventStream {
    /// Асинхронно ожидает следующее событие.
    ///
    /// # Возвращает
    /// - `Ok(Event)` при успешном получении
    /// - `Err(RecvError::Closed)` если брокер уничтожен
    /// - `Err(RecvError::Lagged(n))` если подписчик отстал на `n` событий
    pub async fn recv(&mut self) -> Result<Event, RecvError> {
        self.inner.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => RecvError::Closed,
            broadcast::error::RecvError::Lagged(n) => RecvError::Lagged(n),
        })
    }

    /// Пытается получить событие без ожидания.
    pub fn try_recv(&mut self) -> Result<Event, TryRecvError> {
        self.inner.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => TryRecvError::Empty,
            broadcast::error::TryRecvError::Closed => TryRecvError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => TryRecvError::Lagged(n),
        })
    }

    /// Количество событий в очереди на получение.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
