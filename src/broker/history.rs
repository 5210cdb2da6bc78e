use std::collections::VecDeque;

use crate::event::Event;

/// Запись истории: событие и признак того, что его уже забрал ожидающий.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub event: Event,
    pub claimed: bool,
}

/// Кольцевой буфер последних событий фиксированной ёмкости.
///
/// Вытеснение строго FIFO. Собственной синхронизации нет: все обращения
/// идут под критической секцией брокера.
#[derive(Debug)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Создаёт буфер; ёмкость 0 повышается до 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Добавляет событие в конец. Возвращает вытесненную запись, если буфер
    /// был полон.
    pub fn push(
        &mut self,
        event: Event,
        claimed: bool,
    ) -> Option<HistoryEntry> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(HistoryEntry { event, claimed });
        evicted
    }

    /// Находит самое старое незабранное событие, удовлетворяющее `pred`,
    /// помечает его как забранное и возвращает копию.
    pub fn claim_first<F>(
        &mut self,
        mut pred: F,
    ) -> Option<Event>
    where
        F: FnMut(&Event) -> bool,
    {
        self.entries
            .iter_mut()
            .find(|e| !e.claimed && pred(&e.event))
            .map(|e| {
                e.claimed = true;
                e.event.clone()
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Итератор от самого старого к самому новому.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn ev(id: u64) -> Event {
        Event::new(EventKind::RpcResponse, "").with_async_id(id)
    }

    fn ids(h: &HistoryBuffer) -> Vec<u64> {
        h.iter().filter_map(|e| e.event.async_id()).collect()
    }

    /// Тест проверяет строгое FIFO-вытеснение при переполнении.
    #[test]
    fn test_fifo_eviction() {
        let mut h = HistoryBuffer::new(3);
        assert!(h.push(ev(1), false).is_none());
        assert!(h.push(ev(2), false).is_none());
        assert!(h.push(ev(3), false).is_none());
        let evicted = h.push(ev(4), false).expect("must evict");
        assert_eq!(evicted.event.async_id(), Some(1));
        assert_eq!(ids(&h), vec![2, 3, 4]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut h = HistoryBuffer::new(0);
        assert_eq!(h.capacity(), 1);
        h.push(ev(1), false);
        h.push(ev(2), false);
        assert_eq!(ids(&h), vec![2]);
    }

    /// Тест проверяет, что `claim_first` возвращает самое старое совпадение
    /// и не отдаёт его повторно.
    #[test]
    fn test_claim_first_is_exclusive() {
        let mut h = HistoryBuffer::new(10);
        h.push(ev(7), false);
        h.push(ev(7), false);

        let is_7 = |e: &Event| e.async_id() == Some(7);
        assert!(h.claim_first(is_7).is_some());
        assert!(h.claim_first(is_7).is_some());
        assert!(h.claim_first(is_7).is_none());
        assert!(h.iter().all(|e| e.claimed));
    }

    #[test]
    fn test_claimed_entries_are_skipped() {
        let mut h = HistoryBuffer::new(4);
        h.push(ev(1), true);
        assert!(h.claim_first(|_| true).is_none());
        h.push(ev(2), false);
        assert_eq!(h.claim_first(|_| true).and_then(|e| e.async_id()), Some(2));
    }
}
