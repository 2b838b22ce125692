//! Row-key helpers: identifier escaping and prefix-scan bounds.
//!
//! Property keys are arbitrary bytes but end up embedded in substrate table
//! names, so they go through [`escape`] first. Every prefix scan in the engine
//! uses [`end_key`] as its exclusive stop row.

use crate::errors::{GraphStoreError, Result};

const ESCAPE: u8 = b'_';

fn passes_through(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-'
}

/// Escapes arbitrary bytes into a table-name-safe identifier.
///
/// `[A-Za-z0-9.-]` pass through unchanged; every other byte, including the
/// escape character `_` itself, becomes `_` followed by two lowercase hex
/// digits. Escaping `_` keeps [`unescape`] an exact inverse, at the cost of
/// naming differently from stores written with `_` passed through: an index
/// on `first_name` lives in `<prefix>_idx_first_5fname`, not
/// `<prefix>_idx_first_name`.
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if passes_through(b) {
            out.push(b as char);
        } else {
            out.push(ESCAPE as char);
            out.push_str(&format!("{b:02x}"));
        }
    }
    out
}

/// Inverse of [`escape`].
pub fn unescape(ident: &str) -> Result<Vec<u8>> {
    let raw = ident.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != ESCAPE {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        let hex = raw
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| {
                GraphStoreError::invalid_input(format!("truncated escape in {ident:?}"))
            })?;
        let b = u8::from_str_radix(hex, 16).map_err(|_| {
            GraphStoreError::invalid_input(format!("bad escape _{hex} in {ident:?}"))
        })?;
        out.push(b);
        i += 3;
    }
    Ok(out)
}

/// Exclusive upper bound for a scan over every key starting with `prefix`.
///
/// Increments the prefix as a big-endian counter: trailing `0xFF` bytes are
/// carried past and dropped, the last byte below `0xFF` is incremented.
/// Returns `None` when no finite bound exists (empty prefix or all `0xFF`),
/// in which case the scan has no stop row.
pub fn end_key(prefix: &[u8]) -> Option<Vec<u8>> {
    let idx = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut end = prefix[..=idx].to_vec();
    end[idx] += 1;
    Some(end)
}

/// Concatenates two byte strings, e.g. `vertex_id ++ edge_id`.
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// Renders bytes for log and error messages: printable ASCII as-is, the rest
/// as `\xNN`.
pub fn to_string_binary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{b:02X}"));
        }
    }
    out
}
