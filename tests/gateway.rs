//! Шлюз: C ABI, отбрасывание мусора и прогон файла кадров.
#![allow(unsafe_code)]

use std::{
    fs,
    io::{BufWriter, Write},
    ptr,
    sync::Arc,
    time::Duration,
};

use evgate::{
    event::{envelope, frames},
    evgate_on_event, DecodeError, ErrorExt, Event, EventBroker, EventKind, Gateway, GatewayConfig,
    StatusCode,
};

fn gateway() -> Gateway {
    Gateway::new(Arc::new(EventBroker::default()), GatewayConfig::default())
}

/// Тест проверяет полный путь через C ABI: ожидающий получает событие,
/// пришедшее через `evgate_on_event`.
#[tokio::test]
async fn test_ffi_callback_resolves_waiter() {
    let gw = gateway();
    let broker = gw.broker().clone();
    let id = broker.next_async_id();

    let waiter = {
        let broker = broker.clone();
        tokio::spawn(async move { broker.wait_for_async_id(id, Some(Duration::from_secs(5))).await })
    };
    while broker.pending_waiters() == 0 {
        tokio::task::yield_now().await;
    }

    let raw = envelope::encode(
        &Event::new(EventKind::PublishTrack, "track-sid")
            .with_async_id(id)
            .with_handle(17),
    );
    unsafe { evgate_on_event(gw.as_ffi_context(), raw.as_ptr(), raw.len()) };

    let ev = waiter.await.unwrap().unwrap();
    assert_eq!(ev.kind(), EventKind::PublishTrack);
    assert_eq!(ev.handle(), Some(17));
}

#[test]
fn test_ffi_callback_survives_garbage() {
    let gw = gateway();
    let garbage = [0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0, 0, 0, 0, 0];
    unsafe {
        evgate_on_event(gw.as_ffi_context(), garbage.as_ptr(), garbage.len());
        evgate_on_event(ptr::null(), garbage.as_ptr(), garbage.len());
    }
    let stats = gw.broker().stats();
    assert_eq!(stats.decode_failures, 1);
    assert_eq!(stats.dispatched, 0);
}

#[test]
fn test_decode_errors_carry_status_codes() {
    let gw = gateway();
    let mut raw = envelope::encode(&Event::new(EventKind::Room, "")).to_vec();
    raw[2] = 9;
    let err = gw.try_ingest(&raw).unwrap_err();
    assert_eq!(err, DecodeError::UnsupportedVersion(9));
    assert_eq!(err.status_code(), StatusCode::UnsupportedVersion);
    assert!(err.status_code().is_protocol_error());

    // В JSON код статуса попадает числом.
    let json = serde_json::json!({ "status_code": err.status_code() });
    assert_eq!(json["status_code"], err.status_code().code());
}

/// Тест проверяет прогон файла кадров с обрезанным хвостом: целые кадры
/// доходят до брокера, хвост отбрасывается.
#[test]
fn test_replay_frame_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.bin");

    {
        let mut out = BufWriter::new(fs::File::create(&path).unwrap());
        for i in 1..=50u64 {
            let ev = Event::new(EventKind::Logs, format!("line {i}")).with_async_id(i);
            frames::write_frame(&mut out, &envelope::encode(&ev)).unwrap();
        }
        // кадр с мусором внутри и обрезанный хвост
        frames::write_frame(&mut out, b"not an envelope").unwrap();
        out.write_all(&[0, 0, 1, 0, 0x45]).unwrap();
        out.flush().unwrap();
    }

    let data = fs::read(&path).unwrap();
    let gw = gateway();
    let mut truncated = 0;
    let mut dropped = 0;
    for frame in frames::split_frames(&data) {
        match frame {
            Ok(raw) => {
                if !gw.on_event(raw) {
                    dropped += 1;
                }
            }
            Err(_) => truncated += 1,
        }
    }

    assert_eq!(truncated, 1);
    assert_eq!(dropped, 1);
    let stats = gw.broker().stats();
    assert_eq!(stats.dispatched, 50);
    assert_eq!(stats.decode_failures, 1);
    assert_eq!(gw.broker().history_len(), 50);
}
