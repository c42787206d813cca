//! High-precision reference orbit generation.

use crate::escape::ESCAPE_RADIUS_SQ;
use deepbrot_core::{BigComplex, BigReal, ComplexArith};

/// The escape recurrence evaluated at the reference center in full
/// precision, with each step stored as `X_n = 2·z_n` downcast to `f64`.
///
/// The pre-scaling matches the delta recurrence `δ ← δ·(X_n + δ) + δ₀`
/// directly, so the per-pixel loop never multiplies by two. Orbit values are
/// bounded by the bailout radius while they matter, so the downcast is safe.
///
/// Immutable once generated; the engine regenerates it whenever the
/// reference center changes.
#[derive(Clone, Debug)]
pub struct ReferenceOrbit {
    center: (BigReal, BigReal),
    scaled: Vec<(f64, f64)>,
    escaped_at: Option<u32>,
}

impl ReferenceOrbit {
    /// Run the recurrence at `center` for up to `max_iterations` steps.
    ///
    /// If the reference itself escapes, generation stops there and the orbit
    /// is shorter than `max_iterations`; consumers treat running past the
    /// end as a glitch (the reference cannot stand in for pixels that
    /// outlive it).
    pub fn compute(center: (BigReal, BigReal), max_iterations: u32) -> Self {
        let c = BigComplex::new(center.0.clone(), center.1.clone());
        let mut z = c.zero();
        let mut scaled = Vec::with_capacity(max_iterations as usize);
        let mut escaped_at = None;

        for n in 0..max_iterations {
            let (re, im) = z.to_f64_pair();
            scaled.push((2.0 * re, 2.0 * im));
            if z.norm_sq() > ESCAPE_RADIUS_SQ {
                escaped_at = Some(n);
                break;
            }
            z = z.square().add(&c);
        }

        log::debug!(
            "reference orbit: {} steps at {} bits{}",
            scaled.len(),
            c.precision_bits(),
            match escaped_at {
                Some(n) => format!(", reference escaped at {n}"),
                None => String::new(),
            }
        );

        Self {
            center,
            scaled,
            escaped_at,
        }
    }

    pub fn center(&self) -> &(BigReal, BigReal) {
        &self.center
    }

    /// `X_n = 2·z_n` for step `n`. Callers must bound `n` by [`len`].
    #[inline]
    pub fn scaled(&self, n: usize) -> (f64, f64) {
        self.scaled[n]
    }

    pub fn len(&self) -> usize {
        self.scaled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scaled.is_empty()
    }

    pub fn escaped_at(&self) -> Option<u32> {
        self.escaped_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big_pair(re: f64, im: f64, bits: usize) -> (BigReal, BigReal) {
        (
            BigReal::with_precision(re, bits),
            BigReal::with_precision(im, bits),
        )
    }

    #[test]
    fn origin_orbit_is_identically_zero() {
        let orbit = ReferenceOrbit::compute(big_pair(0.0, 0.0, 128), 64);
        assert_eq!(orbit.len(), 64);
        assert!(orbit.escaped_at().is_none());
        assert!((0..64).all(|n| orbit.scaled(n) == (0.0, 0.0)));
    }

    #[test]
    fn interior_reference_runs_full_length() {
        let orbit = ReferenceOrbit::compute(big_pair(-1.0, 0.0, 128), 100);
        assert_eq!(orbit.len(), 100);
        assert!(orbit.escaped_at().is_none());
        // Period-2 orbit: z alternates 0, -1, 0, -1, ... so X alternates 0, -2.
        assert_eq!(orbit.scaled(0), (0.0, 0.0));
        assert_eq!(orbit.scaled(1), (-2.0, 0.0));
        assert_eq!(orbit.scaled(2), (0.0, 0.0));
    }

    #[test]
    fn escaping_reference_truncates_orbit() {
        let orbit = ReferenceOrbit::compute(big_pair(2.0, 0.0, 128), 100);
        assert!(orbit.escaped_at().is_some());
        assert!(orbit.len() < 100);
        assert_eq!(orbit.len() as u32, orbit.escaped_at().unwrap() + 1);
    }

    #[test]
    fn values_are_prescaled_by_two() {
        // c = 0.25: z1 = 0.25, so X_1 = 0.5
        let orbit = ReferenceOrbit::compute(big_pair(0.25, 0.0, 128), 10);
        assert_eq!(orbit.scaled(1), (0.5, 0.0));
    }
}
