//! Number formatting for exported documents and dashboard labels.

/// Round to a whole number and group thousands: `45000.4` → `"45,000"`.
pub fn thousands(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    add_thousands_separator(&format!("{:.0}", value))
}

/// Add thousands separators to the integer part of a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (s, None),
    };

    let negative = integer_part.starts_with('-');
    let digits: String = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::new();
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    if negative && digits.chars().any(|c| c != '0') {
        result.insert(0, '-');
    }
    if let Some(d) = decimal_part {
        result.push('.');
        result.push_str(d);
    }
    result
}

/// Rounded mean with a unit suffix: `212.6` → `"213 miles"`.
pub fn miles(value: f64) -> String {
    format!("{} miles", thousands(value))
}

/// Money with a dollar sign: `55000.0` → `"$55,000"`.
pub fn dollars(value: f64) -> String {
    format!("${}", thousands(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(45_000.0), "45,000");
        assert_eq!(thousands(1_234_567.6), "1,234,568");
        assert_eq!(thousands(-12_500.0), "-12,500");
        assert_eq!(thousands(f64::NAN), "");
    }

    #[test]
    fn test_separator_keeps_decimals() {
        assert_eq!(add_thousands_separator("1234.50"), "1,234.50");
        assert_eq!(add_thousands_separator("-0"), "0");
    }

    #[test]
    fn test_units() {
        assert_eq!(miles(212.6), "213 miles");
        assert_eq!(dollars(55_000.0), "$55,000");
    }
}
