use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Счётчики брокера. Обновляются без блокировок, читаются через
/// [`BrokerStats::snapshot`].
#[derive(Debug, Default)]
pub struct BrokerStats {
    dispatched: AtomicU64,
    claimed: AtomicU64,
    history_hits: AtomicU64,
    evicted: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
    abandoned: AtomicU64,
    decode_failures: AtomicU64,
    oversize_dropped: AtomicU64,
    handler_panics: AtomicU64,
}

/// Согласованный на момент чтения срез счётчиков.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Событий, прошедших через `dispatch`.
    pub dispatched: u64,
    /// Событий, отданных ожидающему в момент `dispatch`.
    pub claimed: u64,
    /// Ожиданий, удовлетворённых из истории.
    pub history_hits: u64,
    /// Записей, вытесненных из истории.
    pub evicted: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    /// Ожиданий, future которых был уничтожен до завершения.
    pub abandoned: u64,
    pub decode_failures: u64,
    pub oversize_dropped: u64,
    pub handler_panics: u64,
}

impl BrokerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dispatch(
        &self,
        claimed: bool,
        evicted: bool,
    ) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        if claimed {
            self.claimed.fetch_add(1, Ordering::Relaxed);
        }
        if evicted {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_history_hit(&self) {
        self.history_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancel(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_oversize(&self) {
        self.oversize_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_panics(
        &self,
        n: usize,
    ) {
        if n > 0 {
            self.handler_panics.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    /// Снимок текущих значений.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            claimed: self.claimed.load(Ordering::Relaxed),
            history_hits: self.history_hits.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            oversize_dropped: self.oversize_dropped.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = BrokerStats::new();
        stats.record_dispatch(true, false);
        stats.record_dispatch(false, true);
        stats.record_history_hit();
        stats.record_timeout();
        stats.record_cancel();
        stats.record_handler_panics(0);
        stats.record_handler_panics(2);

        let snap = stats.snapshot();
        assert_eq!(snap.dispatched, 2);
        assert_eq!(snap.claimed, 1);
        assert_eq!(snap.evicted, 1);
        assert_eq!(snap.history_hits, 1);
        assert_eq!(snap.timed_out, 1);
        assert_eq!(snap.cancelled, 1);
        assert_eq!(snap.handler_panics, 2);
        assert_eq!(snap.decode_failures, 0);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let stats = BrokerStats::new();
        stats.record_decode_failure();
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["decode_failures"], 1);
        assert_eq!(json["dispatched"], 0);
    }
}
