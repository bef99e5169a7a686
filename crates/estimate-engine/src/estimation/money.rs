//! Currency and measurement rounding shared by every calculation stage.
//!
//! Values are rounded to cents at each arithmetic boundary. Rounding only once
//! at the end yields different totals for some inputs than the receiving
//! estimate platform computes.

/// Round half away from zero to two decimals. Non-finite input becomes zero.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    // `+ 0.0` folds negative zero into positive zero.
    (value * 100.0).round() / 100.0 + 0.0
}

/// Clamp to `[0, 100]`, treating NaN as zero.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Floor at zero, treating NaN as zero.
pub fn non_negative(value: f64) -> f64 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `round2(value)` rendered with exactly two decimals.
pub fn fixed2(value: f64) -> String {
    format!("{:.2}", round2(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(20.009_999_999_999_998), 20.01);
        assert_eq!(round2(-0.001), 0.0);
        assert!(round2(-0.001).is_sign_positive());
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn clamps_percentages_and_amounts() {
        assert_eq!(clamp_percent(140.0), 100.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(non_negative(-12.5), 0.0);
        assert_eq!(non_negative(f64::INFINITY), 0.0);
        assert_eq!(non_negative(4.2), 4.2);
    }

    #[test]
    fn fixed2_always_emits_two_decimals() {
        assert_eq!(fixed2(352.0), "352.00");
        assert_eq!(fixed2(0.1 + 0.2), "0.30");
        assert_eq!(fixed2(-0.0), "0.00");
    }
}
