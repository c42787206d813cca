//! Exact escape-time evaluation with smooth coloring.

use deepbrot_core::{ComplexArith, EscapeData};

/// Bailout radius shared by the exact and perturbed evaluators.
///
/// The classical escape test uses radius 2, but the smooth-coloring formula
/// needs the orbit to overshoot well past the bailout before the logarithm
/// stabilizes; 16 is the practical choice. One constant for every mode:
/// mixing radii across variants makes their iteration counts disagree, which
/// would break the brute-force/border-trace equivalence guarantee.
pub const ESCAPE_RADIUS: f64 = 16.0;
pub const ESCAPE_RADIUS_SQ: f64 = ESCAPE_RADIUS * ESCAPE_RADIUS;

/// Iterate `z ← z² + c` from zero until the orbit leaves the bailout radius
/// or the iteration cap is reached.
///
/// Generic over the complex instantiation: `F64Complex` for per-pixel work,
/// `BigComplex` when a glitched pixel needs a full-precision re-check.
pub fn evaluate<C: ComplexArith>(c: &C, max_iterations: u32) -> EscapeData {
    let mut z = c.zero();
    for n in 0..max_iterations {
        let norm_sq = z.norm_sq();
        if norm_sq > ESCAPE_RADIUS_SQ {
            return EscapeData::escaped(n, smooth_value(n, norm_sq), norm_sq);
        }
        z = z.square().add(c);
    }
    EscapeData::interior(max_iterations)
}

/// Continuous escape index: `n + 1 − log2((ln |z|²)/2 / ln 2)`.
///
/// Falls back to the integer count when the logarithms leave their domain,
/// which happens when |z|² sits exactly at the bailout boundary.
pub fn smooth_value(iterations: u32, final_norm_sq: f64) -> f64 {
    let base = iterations as f64;
    if !(final_norm_sq > 1.0) {
        return base;
    }
    let nu = libm::log2(libm::log(final_norm_sq) / 2.0 / std::f64::consts::LN_2);
    if nu.is_finite() {
        base + 1.0 - nu
    } else {
        base
    }
}
