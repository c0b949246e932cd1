// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_t = mean(close_{t-period+1} ..= close_t)
//
// Each value is an independent closed-form window mean; positions before the
// first full window are `None`.
//
// The mean is accumulated as offsets from the first element of the window, so
// a constant window returns that constant bit-for-bit. A plain `sum / n`
// drifts by an ulp for prices such as 0.1 or 2650.47.
// =============================================================================

/// Mean of a non-empty window, exact for constant input.
pub fn window_mean(window: &[f64]) -> f64 {
    let Some(&first) = window.first() else {
        return f64::NAN;
    };
    first + window.iter().map(|x| x - first).sum::<f64>() / window.len() as f64
}

/// Rolling SMA aligned with `values`.
///
/// Returns an empty `Vec` when `period` is zero or the input is shorter than
/// `period`.
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let mut result = vec![None; period - 1];
    result.extend(
        values
            .windows(period)
            .map(|w| Some(window_mean(w))),
    );
    result
}

/// Mean of the last `period` values.
pub fn current_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let mean = window_mean(window);
    mean.is_finite().then_some(mean)
}
