#![no_main]

use libfuzzer_sys::fuzz_target;
use wmbus_dv::payload::data_encoding::{
    decode_bcd, decode_date_g, decode_datetime_f, decode_datetime_i, decode_int_le, decode_real32,
    decode_value,
};
use wmbus_dv::DataEncoding;

fuzz_target!(|data: &[u8]| {
    for len in 1..=8 {
        if data.len() >= len {
            let _ = decode_bcd(&data[..len], 0);
        }
    }
    // Short slices must fail cleanly.
    let _ = decode_date_g(data, 0);
    let _ = decode_datetime_f(data, 0);
    let _ = decode_datetime_i(data, 0);
    let _ = decode_real32(data, 0);
    for size in 1..=8 {
        let _ = decode_int_le(data, size, 0);
    }

    if let Some((&dif, payload)) = data.split_first() {
        if let Some(encoding) = DataEncoding::from_dif(dif) {
            let _ = decode_value(encoding, payload, 1);
        }
        if let Ok(encoding) = DataEncoding::from_lvar(dif) {
            let _ = decode_value(encoding, payload, 1);
        }
    }
});
