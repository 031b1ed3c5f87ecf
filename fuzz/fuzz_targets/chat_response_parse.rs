#![no_main]

use libfuzzer_sys::fuzz_target;
use waypoint_ai::{parse_chat_response, MessageRole};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(response) = parse_chat_response(&raw) {
        assert_eq!(response.message.role, MessageRole::Assistant);
        for call in response.message.tool_calls() {
            let _ = call.argument_object();
            let _ = call.string_argument("task");
        }
    }
});
