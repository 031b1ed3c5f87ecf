#![no_main]

use libfuzzer_sys::fuzz_target;
use waypoint_specialist::{parse_task_response, truncate_chars, SpecialistResult};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    assert!(truncate_chars(&raw, 200).chars().count() <= 200);

    if let Ok(envelope) = parse_task_response(&raw) {
        let success = envelope.is_success();
        let result = SpecialistResult::from_task_response("fuzz", envelope);
        assert_eq!(result.is_error, !success);
    }
});
