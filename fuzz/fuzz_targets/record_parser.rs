#![no_main]

use libfuzzer_sys::fuzz_target;
use procflow::activity::{ingest, parse_records, parse_timestamp};
use procflow::config::FlowConfig;
use procflow::pipeline::analyze_log;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither parser nor engine may panic on any input
        let _ = parse_timestamp(input);
        if let Ok(records) = parse_records(input) {
            let report = ingest(records);
            let _ = analyze_log(&report.activities, &FlowConfig::default());
        }
    }
});
