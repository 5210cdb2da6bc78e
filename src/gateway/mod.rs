//! Входная точка для событий нативного движка.
//!
//! Движок вызывает callback (возможно, одновременно из нескольких потоков)
//! с сырым буфером конверта. Шлюз разбирает его и передаёт событие брокеру.
//! Некорректный ввод логируется и отбрасывается, паника наружу не выходит.

pub mod ffi;

use std::{
    ffi::c_void,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use tracing::{error, warn};

use crate::{
    broker::{hub::panic_message, EventBroker},
    config::GatewayConfig,
    error::{DecodeError, ErrorExt},
    event::envelope,
};

pub use ffi::evgate_on_event;

#[derive(Debug, Clone)]
pub struct Gateway {
    broker: Arc<EventBroker>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        broker: Arc<EventBroker>,
        config: GatewayConfig,
    ) -> Self {
        Self { broker, config }
    }

    pub fn broker(&self) -> &Arc<EventBroker> {
        &self.broker
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Принимает один буфер от движка. Никогда не паникует.
    ///
    /// # Возвращает
    /// - `true` если событие разобрано и передано брокеру
    /// - `false` если буфер отброшен
    pub fn on_event(
        &self,
        buf: &[u8],
    ) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.try_ingest(buf))) {
            Ok(res) => res.is_ok(),
            Err(panic) => {
                error!(
                    len = buf.len(),
                    reason = panic_message(&*panic),
                    "Panic while ingesting event, dropped"
                );
                false
            }
        }
    }

    /// Как [`Gateway::on_event`], но возвращает причину отказа. Отказ уже
    /// залогирован и учтён в статистике брокера.
    pub fn try_ingest(
        &self,
        buf: &[u8],
    ) -> Result<(), DecodeError> {
        let max = self.config.max_envelope_size;
        if buf.len() > max {
            let err = DecodeError::TooLarge {
                size: buf.len(),
                max,
            };
            self.broker.counters().record_oversize();
            warn!(size = buf.len(), max, "Oversize envelope dropped");
            return Err(err);
        }

        match envelope::decode(buf) {
            Ok(event) => {
                self.broker.dispatch(event);
                Ok(())
            }
            Err(err) => {
                self.broker.counters().record_decode_failure();
                warn!(
                    len = buf.len(),
                    code = %err.status_code(),
                    error = %err,
                    "Malformed envelope dropped"
                );
                Err(err)
            }
        }
    }

    /// Непрозрачный указатель для [`evgate_on_event`].
    ///
    /// Действителен, пока жив и не перемещён этот `Gateway`.
    pub fn as_ffi_context(&self) -> *const c_void {
        self as *const Self as *const c_void
    }
}
