//! Fuzz target for line parsing
//!
//! Any input must parse or fail cleanly, and a parsed line must serialise
//! back to something that parses to the same line.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slproxy_proto::{Line, NetworkInfo};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.is_empty() || input.len() > 8191 {
            return;
        }

        if let Ok(line) = Line::parse(input) {
            let _ = line.check_args();
            let _ = line.nick();
            let text = line.to_string();
            if let Ok(again) = Line::parse(&text) {
                assert_eq!(again, line);
            }

            let mut info = NetworkInfo::default();
            if let Some(isupport) = slproxy_proto::Isupport::from_line(&line) {
                info.apply_isupport(&isupport);
            }
        }
    }
});
