//! Integer percentage arithmetic.
//!
//! Pure, deterministic functions: the same input always yields the same output.

use super::types::OptionShare;

/// Round a raw provider percentage to an integer in `[0, 100]`.
///
/// Non-finite values become 0.
#[must_use]
pub fn clamp_percentage(raw: f64) -> u32 {
    if !raw.is_finite() {
        return 0;
    }
    // Clamped to [0, 100] first, so the cast is exact.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = raw.round().clamp(0.0, 100.0) as u32;
    value
}

/// `round(count * 100 / total)`, rounding halves up. A zero total counts as 1.
///
/// ```
/// use survey_simulator::aggregate::percentage_of;
///
/// assert_eq!(percentage_of(6, 10), 60);
/// assert_eq!(percentage_of(1, 3), 33);
/// assert_eq!(percentage_of(1, 8), 13);
/// assert_eq!(percentage_of(0, 0), 0);
/// ```
#[must_use]
pub fn percentage_of(count: usize, total: usize) -> u32 {
    let total = total.max(1) as u64;
    let scaled = rounded_ratio(count as u64 * 100, total);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Integer division rounding halves up.
const fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Coerce a distribution to integers summing to exactly 100.
///
/// Applied to single-choice results only. Order and labels are preserved.
///
/// 1. Clamp every value to `[0, 100]`.
/// 2. If the total is already 100, return as-is.
/// 3. If the total is 0, the first entry gets 100 and the rest 0.
/// 4. Otherwise rescale each value by `round(value * 100 / total)` and add
///    the residual to the first entry. If the first entry cannot absorb all
///    of it without leaving `[0, 100]`, the remainder carries to the next
///    entries in order.
///
/// An empty input yields an empty output.
///
/// ```
/// use survey_simulator::aggregate::{normalize_to_100, OptionShare};
///
/// let shares = vec![OptionShare::new("A", 1), OptionShare::new("B", 1), OptionShare::new("C", 1)];
/// let normalized = normalize_to_100(&shares);
/// let values: Vec<u32> = normalized.iter().map(|s| s.percentage).collect();
/// assert_eq!(values, vec![34, 33, 33]);
/// ```
#[must_use]
pub fn normalize_to_100(shares: &[OptionShare]) -> Vec<OptionShare> {
    let clamped: Vec<OptionShare> = shares
        .iter()
        .map(|s| OptionShare::new(s.text.clone(), s.percentage.min(100)))
        .collect();

    let total: u64 = clamped.iter().map(|s| u64::from(s.percentage)).sum();
    if clamped.is_empty() || total == 100 {
        return clamped;
    }

    if total == 0 {
        return clamped
            .into_iter()
            .enumerate()
            .map(|(i, s)| OptionShare {
                percentage: if i == 0 { 100 } else { 0 },
                ..s
            })
            .collect();
    }

    let mut values: Vec<i64> = clamped
        .iter()
        .map(|s| rounded_ratio(u64::from(s.percentage) * 100, total) as i64)
        .collect();

    let mut residual = 100 - values.iter().sum::<i64>();
    for value in &mut values {
        if residual == 0 {
            break;
        }
        let adjusted = (*value + residual).clamp(0, 100);
        residual -= adjusted - *value;
        *value = adjusted;
    }

    clamped
        .into_iter()
        .zip(values)
        .map(|(s, v)| OptionShare {
            percentage: u32::try_from(v).unwrap_or(0),
            ..s
        })
        .collect()
}

/// Sum of a distribution's percentages.
#[must_use]
pub fn total_percentage(shares: &[OptionShare]) -> i64 {
    shares.iter().map(|s| i64::from(s.percentage)).sum()
}
