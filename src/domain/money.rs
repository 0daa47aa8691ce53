use anyhow::Result;

/// Largest accepted payment, in major units. Keeps `to_cents` well inside `i64`.
pub const MAX_PAYMENT_AMOUNT: f64 = 1_000_000_000.0;

/// Converts a major-unit amount to integer cents, rounding half away from zero.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn to_float(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Converts a running total in cents, which may exceed `i64`, to major units.
pub fn total_to_float(cents: i128) -> f64 {
    cents as f64 / 100.0
}

pub fn cents_from_str(raw: &str) -> Result<i64> {
    Ok(raw.trim().parse::<i64>()?)
}

pub fn float_from_str(raw: &str) -> Result<f64> {
    Ok(to_float(cents_from_str(raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_major_units_to_cents() {
        assert_eq!(to_cents(100.00), 10_000);
        assert_eq!(to_cents(10.00), 1_000);
        assert_eq!(to_cents(1.0), 100);
        assert_eq!(to_cents(0.0), 0);
        assert_eq!(to_cents(19.90), 1_990);
    }

    #[test]
    fn cents_survive_float_round_trip() {
        for cents in [0_i64, 1, 7, 99, 100, 1_990, 123_456, 9_999_999] {
            assert_eq!(to_cents(to_float(cents)), cents);
        }
    }

    #[test]
    fn largest_accepted_amount_fits_in_cents() {
        assert_eq!(to_cents(MAX_PAYMENT_AMOUNT), 100_000_000_000);
        assert_eq!(total_to_float(i64::MAX as i128 * 2), i64::MAX as f64 / 50.0);
    }

    #[test]
    fn parses_stored_cents() {
        assert_eq!(cents_from_str("1990").unwrap(), 1_990);
        assert!((float_from_str("1990").unwrap() - 19.90).abs() < f64::EPSILON);
        assert!(cents_from_str("19.90").is_err());
    }
}
