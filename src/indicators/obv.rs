// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// Running volume total: a period whose close is below the previous close
// subtracts its volume, every other period adds it. The first period has no
// predecessor and seeds the total with its own volume.
//
// Reading: OBV rising into the last period means volume is flowing in
// (accumulation); flat or falling OBV is distribution.

use super::classification::Classification;

/// Cumulative OBV series aligned with the input.
///
/// Returns an empty `Vec` when the slices are empty or differ in length.
pub fn calculate_obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    if closes.is_empty() || closes.len() != volumes.len() {
        return Vec::new();
    }

    let mut total = 0.0;
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            if i > 0 && close < closes[i - 1] {
                total -= volume;
            } else {
                total += volume;
            }
            total
        })
        .collect()
}

/// Last OBV value and the one before it.
pub fn current_obv(closes: &[f64], volumes: &[f64]) -> Option<(f64, f64)> {
    let series = calculate_obv(closes, volumes);
    match series.as_slice() {
        [.., prev, last] if last.is_finite() && prev.is_finite() => Some((*last, *prev)),
        _ => None,
    }
}

/// Rising OBV is accumulation; anything else is distribution.
pub fn classify(last: f64, prev: f64) -> Classification {
    if last > prev {
        Classification::Accumulation
    } else {
        Classification::Distribution
    }
}
