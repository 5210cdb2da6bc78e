//! C ABI для нативного движка.
#![allow(unsafe_code)]

use std::{ffi::c_void, slice};

use tracing::warn;

use super::Gateway;

/// Callback, который движок вызывает на каждое событие.
///
/// Нулевой `ctx` или нулевой `data` при ненулевом `len` отбрасываются.
///
/// # Safety
/// - `ctx` получен из [`Gateway::as_ffi_context`], и этот `Gateway` жив на
///   всё время вызова;
/// - `data` указывает на `len` читаемых байт, действительных до возврата.
#[no_mangle]
pub unsafe extern "C" fn evgate_on_event(
    ctx: *const c_void,
    data: *const u8,
    len: usize,
) {
    if ctx.is_null() {
        warn!(len, "Event callback invoked with null context, dropped");
        return;
    }
    let buf: &[u8] = if len == 0 {
        &[]
    } else if data.is_null() {
        warn!(len, "Event callback invoked with null buffer, dropped");
        return;
    } else {
        // SAFETY: вызывающий гарантирует `len` читаемых байт по `data`.
        unsafe { slice::from_raw_parts(data, len) }
    };

    // SAFETY: `ctx` получен из `Gateway::as_ffi_context` живого шлюза.
    let gateway = unsafe { &*(ctx as *const Gateway) };
    gateway.on_event(buf);
}
