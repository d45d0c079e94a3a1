//! Human-readable number formatting
//!
//! Provides consistent display formatting for percentages, currency amounts
//! and file sizes across the dashboard JSON and the text report.

/// File size units, base 1024
const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Round to one decimal place, half-up.
///
/// A relative nudge absorbs binary representation error so that values such
/// as `1.15` (stored as 1.149999...) still round up.
///
/// # Examples
///
/// ```
/// use roi_common::human_format::round_one_decimal;
///
/// assert_eq!(round_one_decimal(66.666), 66.7);
/// assert_eq!(round_one_decimal(12.25), 12.3);
/// assert_eq!(round_one_decimal(1.15), 1.2);
/// assert_eq!(round_one_decimal(50.0), 50.0);
/// ```
pub fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scaled = value * 10.0;
    let nudged = scaled + scaled.abs() * 1e-12;
    nudged.round() / 10.0
}

/// Format a currency amount: integral values without decimals, others with two.
///
/// # Examples
///
/// ```
/// use roi_common::human_format::format_amount;
///
/// assert_eq!(format_amount(150.0), "150");
/// assert_eq!(format_amount(1234.5), "1234.50");
/// assert_eq!(format_amount(0.0), "0");
/// ```
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    // Normalise -0.0
    let value = if value == 0.0 { 0.0 } else { value };
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Format a currency amount with thousands separators.
///
/// # Examples
///
/// ```
/// use roi_common::human_format::format_amount_grouped;
///
/// assert_eq!(format_amount_grouped(25000.0), "25,000");
/// assert_eq!(format_amount_grouped(1234567.5), "1,234,567.50");
/// assert_eq!(format_amount_grouped(999.0), "999");
/// ```
pub fn format_amount_grouped(value: f64) -> String {
    let plain = format_amount(value);
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format a percentage with exactly one decimal ("50.0")
pub fn format_percent(value: f64) -> String {
    format!("{:.1}", round_one_decimal(value))
}

/// Format a byte count for display.
///
/// Base 1024, at most two decimals, trailing zeros dropped.
///
/// # Examples
///
/// ```
/// use roi_common::human_format::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(500), "500 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(1048576), "1 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0usize;
    let mut threshold = 1024u64;
    while exponent < SIZE_UNITS.len() - 1 && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(1024);
    }

    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[exponent])
}
