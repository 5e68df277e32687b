// Copyright (c) 2019-2021 The pisim developers

//! Reserved channel identifiers.
//!
//! Channel ids `0..RESERVED` are pre-allocated and bridge to the outside
//! world: ids 0–255 are the standard input byte channels, 256–511 the
//! standard output byte channels, and the remainder are the read trigger,
//! the end-of-file channel and the debug channel. Programs name them through
//! the patterns resolved here; the parser produces *raw* references for
//! them, which need no binding.

use regex::Regex;

/// First standard output byte channel; `stdout_HH` maps to `STDOUT_OFFSET + 0xHH`.
pub const STDOUT_OFFSET: usize = 256;
/// Read trigger channel: a message delivered here performs one blocking read.
pub const STDIN_READ: usize = 512;
/// End-of-file channel: read replies divert here once input is exhausted.
pub const STDIN_EOF: usize = 513;
/// Debug channel: sends are handled synchronously and print listener info.
pub const DEBUG: usize = 514;
/// Total number of reserved channel ids.
pub const RESERVED: usize = 515;

/// Resolves reserved channel names to ids.
pub struct Resolver {
    stdin_hex: Regex,
    stdin_alnum: Regex,
    stdout_hex: Regex,
    stdout_alnum: Regex,
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver {
            stdin_hex: Regex::new("^stdin_([0-9A-F]{2})$").unwrap(),
            stdin_alnum: Regex::new("^stdin__([a-zA-Z0-9])$").unwrap(),
            stdout_hex: Regex::new("^stdout_([0-9A-F]{2})$").unwrap(),
            stdout_alnum: Regex::new("^stdout__([a-zA-Z0-9])$").unwrap(),
        }
    }

    /// Resolve a name against the reserved channel patterns. Patterns are
    /// tried in order; the first match wins.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        if let Some(m) = self.stdin_hex.captures(name) {
            return Some(hex_byte(&m[1]));
        }
        if let Some(m) = self.stdin_alnum.captures(name) {
            return Some(m[1].as_bytes()[0] as usize);
        }
        if let Some(m) = self.stdout_hex.captures(name) {
            return Some(STDOUT_OFFSET + hex_byte(&m[1]));
        }
        if let Some(m) = self.stdout_alnum.captures(name) {
            return Some(STDOUT_OFFSET + m[1].as_bytes()[0] as usize);
        }
        match name {
            "stdin_read" => Some(STDIN_READ),
            "stdin_EOF" => Some(STDIN_EOF),
            "DEBUG" => Some(DEBUG),
            _ => None,
        }
    }
}

impl Default for Resolver {
    fn default() -> Resolver {
        Resolver::new()
    }
}

fn hex_byte(digits: &str) -> usize {
    usize::from_str_radix(digits, 16).expect("checked by pattern")
}

/// The canonical source name of a reserved channel id. Used by the core-form
/// serializer, which must emit names the parser resolves back to the same id.
pub fn name(id: usize) -> String {
    match id {
        STDIN_READ => "stdin_read".to_string(),
        STDIN_EOF => "stdin_EOF".to_string(),
        DEBUG => "DEBUG".to_string(),
        _ if id < STDOUT_OFFSET => format!("stdin_{:02X}", id),
        _ if id < STDIN_READ => format!("stdout_{:02X}", id - STDOUT_OFFSET),
        _ => panic!("id {} is not a reserved channel", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns() {
        let r = Resolver::new();
        assert_eq!(r.resolve("stdin_41"), Some(0x41));
        assert_eq!(r.resolve("stdin__A"), Some(65));
        assert_eq!(r.resolve("stdout_00"), Some(256));
        assert_eq!(r.resolve("stdout__B"), Some(256 + 66));
        assert_eq!(r.resolve("stdin_read"), Some(512));
        assert_eq!(r.resolve("stdin_EOF"), Some(513));
        assert_eq!(r.resolve("DEBUG"), Some(514));
        assert_eq!(r.resolve("stdin_4"), None);
        assert_eq!(r.resolve("stdin_4g"), None);
        assert_eq!(r.resolve("stdout__"), None);
        assert_eq!(r.resolve("plain"), None);
    }

    #[test]
    fn names_resolve_back() {
        let r = Resolver::new();
        for id in &[0, 0x41, 255, 256, 256 + 0x42, 511, 512, 513, 514] {
            assert_eq!(r.resolve(&name(*id)), Some(*id));
        }
    }
}
