//! Pixel-space to complex-plane mapping.
//!
//! All mappings derive from the FULL viewport and global pixel coordinates.
//! Tiles never accumulate incremental offsets, so the assembled grid is
//! bit-identical no matter how the image was partitioned.
//!
//! Orientation: pixel row 0 is the bottom of the viewport (minimum
//! imaginary part); pixels sample at their centers (`+0.5`).

use deepbrot_core::{BigReal, F64Complex, Viewport};

/// Fast `f64` mapping for shallow-zoom exact evaluation.
#[derive(Clone, Copy, Debug)]
pub struct PlaneMapper {
    min_re: f64,
    min_im: f64,
    step_re: f64,
    step_im: f64,
}

impl PlaneMapper {
    pub fn new(viewport: &Viewport, canvas: (u32, u32)) -> Self {
        Self {
            min_re: viewport.min().0.to_f64(),
            min_im: viewport.min().1.to_f64(),
            step_re: viewport.width().to_f64() / canvas.0 as f64,
            step_im: viewport.height().to_f64() / canvas.1 as f64,
        }
    }

    #[inline]
    pub fn point(&self, px: u32, py: u32) -> F64Complex {
        F64Complex::new(
            self.min_re + (px as f64 + 0.5) * self.step_re,
            self.min_im + (py as f64 + 0.5) * self.step_im,
        )
    }
}

/// High-precision mapping for reference selection and perturbation deltas.
#[derive(Clone, Debug)]
pub struct BigPlaneMapper {
    min: (BigReal, BigReal),
    step: (BigReal, BigReal),
    bits: usize,
}

impl BigPlaneMapper {
    pub fn new(viewport: &Viewport, canvas: (u32, u32), bits: usize) -> Self {
        let w = BigReal::with_precision(canvas.0 as f64, bits);
        let h = BigReal::with_precision(canvas.1 as f64, bits);
        Self {
            min: (viewport.min().0.clone(), viewport.min().1.clone()),
            step: (viewport.width().div(&w), viewport.height().div(&h)),
            bits,
        }
    }

    /// Full-precision coordinates of the pixel center.
    pub fn point(&self, px: u32, py: u32) -> (BigReal, BigReal) {
        let fx = BigReal::with_precision(px as f64 + 0.5, self.bits);
        let fy = BigReal::with_precision(py as f64 + 0.5, self.bits);
        (
            self.min.0.add(&self.step.0.mul(&fx)),
            self.min.1.add(&self.step.1.mul(&fy)),
        )
    }

    /// Pixel offset from the reference center: subtract in high precision,
    /// downcast the small difference to `f64`.
    pub fn delta_from(&self, reference: &(BigReal, BigReal), px: u32, py: u32) -> F64Complex {
        let (re, im) = self.point(px, py);
        F64Complex::new(
            re.sub(&reference.0).to_f64(),
            im.sub(&reference.1).to_f64(),
        )
    }
}
