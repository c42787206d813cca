//! Low-precision delta iteration against a reference orbit.

use super::ReferenceOrbit;
use crate::escape::{smooth_value, ESCAPE_RADIUS_SQ};
use deepbrot_core::{ComplexArith, EscapeData, F64Complex};

/// Reference magnitudes below this are treated as zero by glitch detection;
/// the criterion is meaningless against a vanishing reference value.
const GLITCH_REF_FLOOR: f64 = 1e-40;

/// Evaluate one pixel as a delta against the reference orbit.
///
/// `delta0` is the pixel's offset from the reference center, already
/// computed by high-precision subtraction and downcast (the difference is
/// small and representable even when the absolute coordinates are not).
///
/// The recurrence is `δ ← δ·(X_n + δ) + δ₀` with `X_n = 2·z_n`; the full
/// orbit value is recovered as `z = X_n/2 + δ` for the escape check.
///
/// Glitch detection (Pauldelbrot criterion): when `|z|² < τ²·|X_n/2|²` the
/// delta has lost its significant digits against the reference and the
/// result is flagged; the same applies when the pixel outlives a reference
/// orbit that escaped. Flagged results must be re-evaluated at full
/// precision by the caller.
pub fn evaluate_perturbed(
    delta0: F64Complex,
    orbit: &ReferenceOrbit,
    max_iterations: u32,
    tau_sq: f64,
) -> EscapeData {
    let mut delta = delta0.zero();
    let mut glitched = false;

    for n in 0..max_iterations {
        let m = n as usize;
        if m >= orbit.len() {
            // Reference escaped before this pixel resolved.
            return EscapeData::interior(max_iterations).with_glitch();
        }

        let (x_re, x_im) = orbit.scaled(m);
        let z = F64Complex::new(x_re / 2.0 + delta.re, x_im / 2.0 + delta.im);
        let z_norm_sq = z.norm_sq();

        if z_norm_sq > ESCAPE_RADIUS_SQ {
            let data = EscapeData::escaped(n, smooth_value(n, z_norm_sq), z_norm_sq);
            return if glitched { data.with_glitch() } else { data };
        }

        let ref_norm_sq = (x_re * x_re + x_im * x_im) / 4.0;
        if ref_norm_sq > GLITCH_REF_FLOOR && z_norm_sq < tau_sq * ref_norm_sq {
            glitched = true;
        }

        let x = F64Complex::new(x_re, x_im);
        delta = delta.mul(&x.add(&delta)).add(&delta0);
    }

    let data = EscapeData::interior(max_iterations);
    if glitched {
        data.with_glitch()
    } else {
        data
    }
}
