use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::{Percent, Score};

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len() as u64)
}

/// Arithmetic mean that reports overflow of the running sum as `None`.
pub fn checked_mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return Some(Decimal::ZERO);
    }
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    sum.checked_div(Decimal::from(values.len() as u64))
}

/// Population standard deviation (divides by n).
pub fn population_std_dev(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|v| (*v - m) * (*v - m))
        .sum::<Decimal>()
        / Decimal::from(values.len() as u64);
    sqrt_decimal(variance)
}

/// Square root via rust_decimal maths; zero for non-positive input.
pub fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

/// Safe division: returns Decimal::ZERO when the denominator is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// numerator / denominator × 100, zero when the denominator is zero.
pub fn safe_pct(numerator: Decimal, denominator: Decimal) -> Percent {
    safe_div(numerator, denominator) * dec!(100)
}

/// Clamp a score into [0, 100].
pub fn clamp_score(value: Decimal) -> Score {
    value.max(Decimal::ZERO).min(dec!(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_checked_mean_overflow() {
        assert_eq!(checked_mean(&[dec!(1), dec!(2), dec!(6)]), Some(dec!(3)));
        assert_eq!(checked_mean(&[]), Some(Decimal::ZERO));
        assert_eq!(checked_mean(&[Decimal::MAX, Decimal::MAX]), None);
    }

    #[test]
    fn test_population_std_dev() {
        // values 2,4,4,4,5,5,7,9 -> mean 5, population variance 4, sd 2
        let values = [
            dec!(2),
            dec!(4),
            dec!(4),
            dec!(4),
            dec!(5),
            dec!(5),
            dec!(7),
            dec!(9),
        ];
        let sd = population_std_dev(&values);
        assert!((sd - dec!(2)).abs() < dec!(0.0000001), "sd = {sd}");
    }

    #[test]
    fn test_std_dev_single_value_is_zero() {
        assert_eq!(population_std_dev(&[dec!(10)]), Decimal::ZERO);
    }

    #[test]
    fn test_safe_pct_zero_denominator() {
        assert_eq!(safe_pct(dec!(30), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_pct(dec!(30), dec!(100)), dec!(30));
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(dec!(-5)), Decimal::ZERO);
        assert_eq!(clamp_score(dec!(150)), dec!(100));
        assert_eq!(clamp_score(dec!(42.5)), dec!(42.5));
    }
}
