//! Byte escaping for C++ string literals.
//!
//! Every byte value is rendered as a backslash followed by exactly three
//! octal digits (`\000` through `\377`). An octal escape stops after three
//! digits, so a unit can never absorb a following character the way a
//! shorter octal or a `\x` escape would. The mapping is a constant table
//! built at compile time.

use crate::error::{Error, Result};

/// Width in characters of every escaped byte
pub const ESCAPE_WIDTH: usize = 4;

static ESCAPE_TABLE: [[u8; ESCAPE_WIDTH]; 256] = build_table();

const fn build_table() -> [[u8; ESCAPE_WIDTH]; 256] {
    let mut table = [[0u8; ESCAPE_WIDTH]; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = [
            b'\\',
            b'0' + (i >> 6) as u8,
            b'0' + ((i >> 3) & 0o7) as u8,
            b'0' + (i & 0o7) as u8,
        ];
        i += 1;
    }
    table
}

/// Returns the escaped form of a single byte
pub fn escape(byte: u8) -> &'static str {
    match std::str::from_utf8(&ESCAPE_TABLE[byte as usize]) {
        Ok(s) => s,
        Err(_) => unreachable!("escape table entries are ASCII"),
    }
}

/// Appends the escaped form of `bytes` to `out`
pub fn escape_into(out: &mut String, bytes: &[u8]) {
    out.reserve(bytes.len() * ESCAPE_WIDTH);
    for &byte in bytes {
        out.push_str(escape(byte));
    }
}

/// Escapes a byte slice into a new string
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::new();
    escape_into(&mut out, bytes);
    out
}

/// Decodes text produced by [`escape_bytes`].
///
/// Only the fixed `\ooo` format is accepted; anything else is reported with
/// the offset of the offending unit.
pub fn unescape(text: &str) -> Result<Vec<u8>> {
    let raw = text.as_bytes();
    if raw.len() % ESCAPE_WIDTH != 0 {
        let offset = raw.len() - raw.len() % ESCAPE_WIDTH;
        return Err(Error::invalid_escape(offset, "truncated escape unit"));
    }

    let mut out = Vec::with_capacity(raw.len() / ESCAPE_WIDTH);
    for (i, unit) in raw.chunks_exact(ESCAPE_WIDTH).enumerate() {
        out.push(decode_unit(unit, i * ESCAPE_WIDTH)?);
    }
    Ok(out)
}

fn decode_unit(unit: &[u8], offset: usize) -> Result<u8> {
    if unit[0] != b'\\' {
        return Err(Error::invalid_escape(offset, "expected '\\'"));
    }

    let mut value: u16 = 0;
    for &digit in &unit[1..] {
        if !(b'0'..=b'7').contains(&digit) {
            return Err(Error::invalid_escape(
                offset,
                format!("'{}' is not an octal digit", digit.escape_ascii()),
            ));
        }
        value = value * 8 + u16::from(digit - b'0');
    }

    u8::try_from(value)
        .map_err(|_| Error::invalid_escape(offset, format!("value {value} exceeds a byte")))
}
