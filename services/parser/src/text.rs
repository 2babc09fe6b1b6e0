//! Raw payload decoding and lenient numeric cells

use encoding_rs::WINDOWS_1252;

/// Decode fetched bytes into text.
///
/// UTF-8 (with or without BOM) is used when valid; otherwise the payload is
/// read as Windows-1252, which is how legacy upstream files were exported.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Parse a count cell. Ragged or non-numeric cells read as `0`.
pub fn parse_count(cell: &str) -> i64 {
    let cleaned = cell.trim();
    if cleaned.is_empty() {
        return 0;
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return v;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}

/// Parse a coordinate cell, `0.0` when missing
pub fn parse_coordinate(cell: &str) -> f64 {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
