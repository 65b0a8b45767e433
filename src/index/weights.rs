//! Per-channel coefficient weights and magnitude bins.
//!
//! Low-frequency coefficients (small positions in the 128x128 transform)
//! fall into low bins and weigh more. Bin 0 is the DC term and weighs the
//! luminance difference.

use crate::signature::{NUM_CHANNELS, NUM_PIXELS};
use crate::types::Score;

/// Number of weight bins.
pub const NUM_BINS: usize = 6;

/// Weights indexed by `[bin][channel]` for the Y, I and Q channels.
pub const WEIGHTS: [[Score; NUM_CHANNELS]; NUM_BINS] = [
    [5.00, 19.21, 34.37],
    [0.83, 1.26, 0.36],
    [1.01, 0.44, 0.45],
    [0.52, 0.53, 0.14],
    [0.47, 0.28, 0.18],
    [0.30, 0.14, 0.27],
];

/// Map a coefficient magnitude to its weight bin.
///
/// The magnitude encodes a `row * 128 + col` position; the bin is the larger
/// of row and col, capped at the last bin.
pub fn bin(magnitude: usize) -> usize {
    let row = magnitude / NUM_PIXELS;
    let col = magnitude % NUM_PIXELS;
    row.max(col).min(NUM_BINS - 1)
}

/// Weight of a coefficient match in `color`.
pub fn coef_weight(coef: i16, color: usize) -> Score {
    WEIGHTS[bin(coef.unsigned_abs() as usize)][color]
}

/// Weight applied to the average luminance difference of `color`.
pub fn luminance_weight(color: usize) -> Score {
    WEIGHTS[0][color]
}
