//! Viewport: the axis-aligned rectangle of the complex plane being computed.

use crate::bigreal::BigReal;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Rectangle in the complex plane, stored as its bottom-left and top-right
/// vertices. The real axis maps to x and the imaginary axis to y.
///
/// Invariant, enforced at construction and on every update: the top-right
/// vertex is strictly greater than the bottom-left on both axes. Degenerate
/// or inverted rectangles are rejected, never silently repaired.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Viewport {
    min: (BigReal, BigReal),
    max: (BigReal, BigReal),
}

impl Viewport {
    /// Primary constructor from the two vertices.
    pub fn new(min: (BigReal, BigReal), max: (BigReal, BigReal)) -> Result<Self, CoreError> {
        if !(max.0 > min.0) || !(max.1 > min.1) {
            return Err(CoreError::InvalidViewport(format!(
                "vertices must satisfy max > min on both axes (min=({}, {}), max=({}, {}))",
                min.0, min.1, max.0, max.1
            )));
        }
        Ok(Self { min, max })
    }

    /// Convenience constructor from `f64` vertices at an explicit precision.
    pub fn from_f64(
        min_re: f64,
        min_im: f64,
        max_re: f64,
        max_im: f64,
        bits: usize,
    ) -> Result<Self, CoreError> {
        Self::new(
            (
                BigReal::with_precision(min_re, bits),
                BigReal::with_precision(min_im, bits),
            ),
            (
                BigReal::with_precision(max_re, bits),
                BigReal::with_precision(max_im, bits),
            ),
        )
    }

    /// Constructor from decimal strings for coordinates beyond `f64`
    /// precision (deep-zoom save points).
    pub fn from_strings(
        min_re: &str,
        min_im: &str,
        max_re: &str,
        max_im: &str,
        bits: usize,
    ) -> Result<Self, CoreError> {
        Self::new(
            (
                BigReal::from_string(min_re, bits)?,
                BigReal::from_string(min_im, bits)?,
            ),
            (
                BigReal::from_string(max_re, bits)?,
                BigReal::from_string(max_im, bits)?,
            ),
        )
    }

    /// Re-derive a viewport as `center ± half-extent`. This is the only way
    /// re-centering builds viewports, so the invariant reduces to the
    /// half-extents being positive.
    pub fn from_center(
        center: (BigReal, BigReal),
        half_width: &BigReal,
        half_height: &BigReal,
    ) -> Result<Self, CoreError> {
        Self::new(
            (center.0.sub(half_width), center.1.sub(half_height)),
            (center.0.add(half_width), center.1.add(half_height)),
        )
    }

    pub fn min(&self) -> &(BigReal, BigReal) {
        &self.min
    }

    pub fn max(&self) -> &(BigReal, BigReal) {
        &self.max
    }

    pub fn width(&self) -> BigReal {
        self.max.0.sub(&self.min.0)
    }

    pub fn height(&self) -> BigReal {
        self.max.1.sub(&self.min.1)
    }

    pub fn center(&self) -> (BigReal, BigReal) {
        let two = BigReal::with_precision(2.0, self.precision_bits());
        (
            self.min.0.add(&self.max.0).div(&two),
            self.min.1.add(&self.max.1).div(&two),
        )
    }

    pub fn precision_bits(&self) -> usize {
        self.min
            .0
            .precision_bits()
            .max(self.min.1.precision_bits())
            .max(self.max.0.precision_bits())
            .max(self.max.1.precision_bits())
    }

    /// True when `other` lies strictly inside `self` on both axes.
    pub fn strictly_contains(&self, other: &Viewport) -> bool {
        other.min.0 > self.min.0
            && other.min.1 > self.min.1
            && other.max.0 < self.max.0
            && other.max.1 < self.max.1
    }
}
