//! Pearson correlation over aligned series.

use crate::domain::align::{AlignedFrame, AlignedPair};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorrelationResult {
    /// In `[-1, 1]`; `0.0` when the inputs are degenerate.
    pub coefficient: f64,
    pub sample_count: usize,
}

impl CorrelationResult {
    pub const EMPTY: Self = Self {
        coefficient: 0.0,
        sample_count: 0,
    };
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|&v| v == values[0])
}

/// Sample Pearson coefficient, or `None` when it is not a real number
/// (mismatched or empty input, zero variance in either column).
///
/// A column with a single distinct value is degenerate even when rounding
/// in the mean leaves a tiny nonzero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.is_empty() {
        return None;
    }
    if is_constant(xs) || is_constant(ys) {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

pub fn correlate(pair: &AlignedPair) -> CorrelationResult {
    if pair.is_empty() {
        return CorrelationResult::EMPTY;
    }
    CorrelationResult {
        coefficient: pearson(&pair.a_values(), &pair.b_values()).unwrap_or(0.0),
        sample_count: pair.len(),
    }
}

/// Pairwise coefficients over a frame's common dates; the diagonal is 1.0
/// unless the column is constant.
pub fn correlation_matrix(frame: &AlignedFrame) -> Vec<Vec<f64>> {
    let k = frame.columns.len();
    let mut matrix = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&frame.columns[i], &frame.columns[j]).unwrap_or(0.0);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}
