use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::oneshot, time::Instant};
use tracing::error;

use crate::event::{Event, EventKind};

/// Пользовательский предикат над событием.
pub type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Условие, по которому ожидающий узнаёт «своё» событие.
///
/// `AsyncId` обслуживается индексом по идентификатору корреляции, остальные
/// варианты — линейным просмотром в порядке регистрации.
#[derive(Clone)]
pub enum Matcher {
    /// Событие с данным `async_id`.
    AsyncId(u64),
    /// Любое событие данного вида.
    Kind(EventKind),
    /// Произвольный предикат.
    Predicate(Predicate),
}

impl Matcher {
    /// Условие-замыкание.
    ///
    /// Вызывается под блокировкой брокера, поэтому должно быть быстрым и не
    /// должно обращаться к тому же брокеру: вызов `dispatch`,
    /// `wait_for_event` или `pending_waiters` изнутри предиката приведёт к
    /// взаимной блокировке.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Проверяет событие. Паника в предикате перехватывается и считается
    /// несовпадением.
    pub fn matches(
        &self,
        event: &Event,
    ) -> bool {
        match self {
            Self::AsyncId(id) => event.async_id() == Some(*id),
            Self::Kind(kind) => event.kind() == *kind,
            Self::Predicate(f) => match catch_unwind(AssertUnwindSafe(|| f(event))) {
                Ok(matched) => matched,
                Err(_) => {
                    error!(
                        kind = %event.kind(),
                        async_id = ?event.async_id(),
                        "Waiter predicate panicked, treating as no match"
                    );
                    false
                }
            },
        }
    }
}

impl From<EventKind> for Matcher {
    fn from(kind: EventKind) -> Self {
        Self::Kind(kind)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::AsyncId(id) => f.debug_tuple("AsyncId").field(id).finish(),
            Self::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Идентификатор регистрации; монотонно растёт и задаёт порядок
/// «первым зарегистрировался — первым обслужен».
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaiterId(u64);

impl fmt::Display for WaiterId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

struct Waiter {
    matcher: Matcher,
    slot: oneshot::Sender<Event>,
    registered_at: Instant,
}

/// Результат успешного захвата события ожидающим.
#[derive(Debug, Clone, Copy)]
pub struct Claim {
    pub waiter: WaiterId,
    pub waited: Duration,
}

/// Реестр ожидающих.
///
/// Живёт внутри критической секции брокера, поэтому сам не синхронизирован.
#[derive(Default)]
pub struct WaiterRegistry {
    next_id: u64,
    waiters: HashMap<WaiterId, Waiter>,
    /// `async_id` → ожидающие этого id в порядке регистрации.
    by_async_id: HashMap<u64, BTreeSet<WaiterId>>,
    /// Ожидающие, которых нужно проверять предикатом.
    scan: BTreeSet<WaiterId>,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует ожидающего и возвращает его id и приёмник результата.
    pub fn register(
        &mut self,
        matcher: Matcher,
    ) -> (WaiterId, oneshot::Receiver<Event>) {
        self.next_id += 1;
        let id = WaiterId(self.next_id);
        let (tx, rx) = oneshot::channel();

        match &matcher {
            Matcher::AsyncId(async_id) => {
                self.by_async_id.entry(*async_id).or_default().insert(id);
            }
            Matcher::Kind(_) | Matcher::Predicate(_) => {
                self.scan.insert(id);
            }
        }
        self.waiters.insert(
            id,
            Waiter {
                matcher,
                slot: tx,
                registered_at: Instant::now(),
            },
        );
        (id, rx)
    }

    /// Снимает регистрацию. `false`, если её уже нет (событие успело
    /// захватить её раньше).
    pub fn remove(
        &mut self,
        id: WaiterId,
    ) -> bool {
        self.detach(id).is_some()
    }

    /// Отдаёт событие первому по порядку регистрации ожидающему, чьё условие
    /// совпало. Не более одного ожидающего на событие.
    ///
    /// Если приёмник ожидающего уже уничтожен, регистрация удаляется и поиск
    /// продолжается со следующего.
    pub fn resolve(
        &mut self,
        event: &Event,
    ) -> Option<Claim> {
        loop {
            let indexed = event
                .async_id()
                .and_then(|id| self.by_async_id.get(&id))
                .and_then(|set| set.first().copied());

            // Просматриваем только тех, кто зарегистрирован раньше
            // кандидата из индекса.
            let scanned = self
                .scan
                .iter()
                .take_while(|id| indexed.map_or(true, |first| **id < first))
                .find(|id| {
                    self.waiters
                        .get(id)
                        .is_some_and(|w| w.matcher.matches(event))
                })
                .copied();

            let winner = scanned.or(indexed)?;
            let waiter = self.detach(winner)?;
            let waited = waiter.registered_at.elapsed();
            if waiter.slot.send(event.clone()).is_ok() {
                return Some(Claim { waiter: winner, waited });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    fn detach(
        &mut self,
        id: WaiterId,
    ) -> Option<Waiter> {
        let waiter = self.waiters.remove(&id)?;
        match &waiter.matcher {
            Matcher::AsyncId(async_id) => {
                if let Some(set) = self.by_async_id.get_mut(async_id) {
                    set.remove(&id);
                    if set.is_empty() {
                        self.by_async_id.remove(async_id);
                    }
                }
            }
            Matcher::Kind(_) | Matcher::Predicate(_) => {
                self.scan.remove(&id);
            }
        }
        Some(waiter)
    }
}
