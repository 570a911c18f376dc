#![no_main]
use libfuzzer_sys::fuzz_target;

use tap_suite::{Parser, ParserConfig, StrLines};

fuzz_target!(|data: &str| {
    let config = ParserConfig {
        max_summary_skips: 16,
        ..Default::default()
    };
    if let Ok(suite) = Parser::with_config(StrLines::new(data), config).suite() {
        let _ = tap_suite::parse_str(&suite.to_string());
    }
});
