#![no_main]

use libfuzzer_sys::fuzz_target;

use evgate::event::{decode, encode};

fuzz_target!(|data: &[u8]| {
    // Декодер не должен паниковать ни на каких данных.
    let result = std::panic::catch_unwind(|| decode(data));
    let Ok(decoded) = result else {
        panic!("Decoder panicked on input: {data:?}");
    };

    // Успешно разобранный конверт кодируется обратно байт в байт.
    if let Ok(event) = decoded {
        assert_eq!(&encode(&event)[..], data, "re-encoding changed the envelope");
    }
});
