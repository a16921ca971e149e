//! Fuzz target for MODE change parsing

#![no_main]

use libfuzzer_sys::fuzz_target;
use slproxy_proto::{parse_mode_changes, NetworkInfo};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 256 {
            return;
        }

        let mut pieces = input.split_whitespace();
        if let Some(flags) = pieces.next() {
            let info = NetworkInfo::default();
            let _ = parse_mode_changes(flags, pieces, |sign, mode| info.takes_arg(sign, mode));
        }
    }
});
