//! Fuzz target for origin prefix parsing
//!
//! A prefix that parses must print back to the same text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slproxy_proto::{nick_of, Prefix};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 256 || input.contains(' ') {
            return;
        }

        let prefix = Prefix::new_from_str(input);
        let _ = prefix.nick();
        let _ = prefix.is_full_mask();
        let _ = nick_of(input);
        if let Ok(parsed) = input.parse::<Prefix>() {
            let _ = parsed.to_string();
        }
    }
});
