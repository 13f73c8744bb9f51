#![no_main]

use guestlab_core::types::TestState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 마커 파싱은 &str을 받으므로 UTF-8 변환 필요
    if let Ok(marker) = std::str::from_utf8(data) {
        let _ = TestState::parse_marker(marker);
    }
});
