//! Byte to hex/ASCII formatting.
//!
//! All functions here are pure. Hex output is always uppercase; parsing is
//! case-insensitive and ignores `:` and ` ` separators so that UIDs
//! (`04:A2:5F:11`) and block dumps (`04 A2 5F 11`) can be fed back in.
//!
//! # Examples
//!
//! ```
//! use tapdump_core::hex::{bytes_to_hex, bytes_to_hex_with, hex_to_bytes};
//!
//! let uid = [0x04, 0xA2, 0x5F, 0x11];
//! assert_eq!(bytes_to_hex(&uid), "04A25F11");
//! assert_eq!(bytes_to_hex_with(&uid, ":"), "04:A2:5F:11");
//! assert_eq!(hex_to_bytes("04:a2:5f:11").unwrap(), uid);
//! ```

use crate::{Error, Result};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Render bytes as uppercase hex with no separator.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes_to_hex_with(bytes, "")
}

/// Render bytes as uppercase hex with `separator` between each byte.
///
/// ```
/// use tapdump_core::hex::bytes_to_hex_with;
///
/// assert_eq!(bytes_to_hex_with(&[0x00, 0xFF], " "), "00 FF");
/// assert_eq!(bytes_to_hex_with(&[], ":"), "");
/// ```
pub fn bytes_to_hex_with(bytes: &[u8], separator: &str) -> String {
    let capacity = bytes.len() * 2 + bytes.len().saturating_sub(1) * separator.len();
    let mut out = String::with_capacity(capacity);

    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
    }

    out
}

/// Parse a hex string back into bytes.
///
/// Colons and spaces are stripped before parsing.
///
/// # Errors
///
/// Returns [`Error::MalformedHex`] if the stripped input has an odd number
/// of digits or contains a character that is not a hex digit.
///
/// ```
/// use tapdump_core::hex::hex_to_bytes;
///
/// assert_eq!(hex_to_bytes("FF 00").unwrap(), vec![0xFF, 0x00]);
/// assert!(hex_to_bytes("ABC").is_err());
/// assert!(hex_to_bytes("ZZ").is_err());
/// ```
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = hex
        .bytes()
        .filter(|b| *b != b':' && *b != b' ')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(Error::malformed_hex(format!(
            "odd number of hex digits ({})",
            digits.len()
        )));
    }

    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(Error::malformed_hex(format!(
                "invalid hex pair {:?} at byte {}",
                String::from_utf8_lossy(pair),
                i
            ))),
        })
        .collect()
}

/// Map each byte to its ASCII character when printable (32..=126), else `.`.
///
/// The output always has exactly one character per input byte.
///
/// ```
/// use tapdump_core::hex::bytes_to_printable_ascii;
///
/// assert_eq!(bytes_to_printable_ascii(b"Hi\x00\x7F!"), "Hi..!");
/// ```
pub fn bytes_to_printable_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
        .collect()
}

fn nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
