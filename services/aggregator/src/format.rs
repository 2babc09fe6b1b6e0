//! Number presentation helpers for chart labels and tooltips

/// Short form of a large count: `1.2B`, `3.4M`, `5.6K`, else the rounded value.
///
/// Scaled forms always show exactly `precision` decimals (`1.0K`).
pub fn abbreviate(value: f64, precision: u32) -> String {
    let scale = 10f64.powi(precision as i32);
    let short = |unit: f64, suffix: &str| {
        let rounded = (value / unit * scale).round() / scale;
        format!("{:.*}{}", precision as usize, rounded, suffix)
    };

    let magnitude = value.abs();
    if magnitude >= 1e9 {
        short(1e9, "B")
    } else if magnitude >= 1e6 {
        short(1e6, "M")
    } else if magnitude >= 1e3 {
        short(1e3, "K")
    } else {
        format!("{}", value.round())
    }
}

/// Thousands-separated integer; values under 10 keep one decimal
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.abs() < 10.0 {
        return format!("{:.1}", value);
    }

    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Scale a count to cases per million inhabitants
pub fn per_million(value: i64, population: Option<u64>) -> Option<f64> {
    match population {
        Some(p) if p > 0 => Some(value as f64 * 1_000_000.0 / p as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate(1_234_567_890.0, 1), "1.2B");
        assert_eq!(abbreviate(3_460_000.0, 1), "3.5M");
        assert_eq!(abbreviate(5_600.0, 1), "5.6K");
        assert_eq!(abbreviate(1_000.0, 1), "1.0K");
        assert_eq!(abbreviate(999.4, 1), "999");
        assert_eq!(abbreviate(-2_500.0, 1), "-2.5K");
        assert_eq!(abbreviate(1_234_567.0, 2), "1.23M");
        assert_eq!(abbreviate(1_900_000.0, 0), "2M");
        assert_eq!(abbreviate(2_000_000.0, 2), "2.00M");
        assert_eq!(abbreviate(3_000_000_000.0, 1), "3.0B");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1_234_567.0), "1,234,567");
        assert_eq!(format_count(999.6), "1,000");
        assert_eq!(format_count(10.0), "10");
        assert_eq!(format_count(7.26), "7.3");
        assert_eq!(format_count(-12_345.0), "-12,345");
        assert_eq!(format_count(f64::NAN), "0");
    }

    #[test]
    fn test_per_million() {
        assert_eq!(per_million(50, Some(10_000_000)), Some(5.0));
        assert_eq!(per_million(50, Some(0)), None);
        assert_eq!(per_million(50, None), None);
    }
}
