#![no_main]

use libfuzzer_sys::fuzz_target;
use wmbus_dv::{create_meter, scan, MeterInfo, OutputUnits, Telegram};

fuzz_target!(|data: &[u8]| {
    if let Ok(records) = scan(data, 0) {
        for record in records.iter() {
            assert!(record.byte_span.end() <= data.len());
            let _ = record.decode(data);
        }
    }

    // Drive the full driver path on anything that scans.
    if let Ok(mut t) = Telegram::parse(data.to_vec()) {
        if let Ok(mut meter) = create_meter(MeterInfo::new("fuzz", "sharky775", "0")) {
            meter.handle_telegram(&mut t);
            let _ = meter.render(&OutputUnits::new());
            let _ = t.analyse();
        }
    }
});
