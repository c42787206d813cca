//! Precision selection for a computation pass.
//!
//! Determines how many mantissa bits high-precision values need so that
//! adjacent pixels stay distinguishable at the current zoom and the orbit
//! survives error amplification over the iteration cap.

use crate::viewport::Viewport;

/// Margin for rounding error accumulated across arithmetic operations.
const SAFETY_BITS: u64 = 64;

/// Mantissa bits required to compute `viewport` at `canvas` resolution.
///
/// Rounded up to a power of two, minimum 64 (so shallow zooms run entirely
/// on the `f64` fast path).
pub fn required_precision_bits(
    viewport: &Viewport,
    canvas: (u32, u32),
    max_iterations: u32,
) -> usize {
    let width = viewport.width();
    let height = viewport.height();
    let (cx, cy) = viewport.center();

    // log2 of the smaller per-pixel step
    let log2_delta_x = width.log2_approx() - (canvas.0 as f64).log2();
    let log2_delta_y = height.log2_approx() - (canvas.1 as f64).log2();
    let log2_min_delta = log2_delta_x.min(log2_delta_y);

    // Magnitude of the largest coordinate in play: |c| + extent/2 per axis,
    // approximated as max(log2 |c|, log2 extent/2) + 1.
    let log2_mx = cx.abs().log2_approx().max(width.log2_approx() - 1.0) + 1.0;
    let log2_my = cy.abs().log2_approx().max(height.log2_approx() - 1.0) + 1.0;
    let log2_m = log2_mx.max(log2_my);

    let bits_from_ratio = (log2_m - log2_min_delta).ceil().max(0.0) as u64;

    let iter_bits = if max_iterations > 1 {
        (max_iterations as f64).log2().ceil() as u64
    } else {
        0
    };

    let total = bits_from_ratio + iter_bits + SAFETY_BITS;
    (total as usize).next_power_of_two().max(64)
}
