//! Complex arithmetic for escape-time and perturbation evaluation.
//!
//! A single trait covers both instantiations the evaluators need: fixed
//! 64-bit floats for per-pixel work and `BigReal` for reference orbits and
//! glitch re-evaluation. The escape evaluator is generic over this trait, so
//! precision is a type choice rather than a runtime branch.

use crate::bigreal::BigReal;
use serde::{Deserialize, Serialize};

/// Absolute tolerance used by [`ComplexArith::approx_eq`] callers that have
/// no better domain-specific value.
///
/// Escape-time comparisons must tolerate rounding, so complex equality is a
/// tolerance test, never exact. The tolerance is an explicit absolute value,
/// deliberately untied to machine epsilon; pass a different one when the
/// viewport scale calls for it. Because equality is approximate, complex
/// values must never be used as map or set keys (none of these types
/// implement `Eq` or `Hash`).
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Arithmetic seam shared by the fixed- and arbitrary-precision complex
/// types. All operations are pure: no operand is ever mutated.
pub trait ComplexArith: Clone + Sized {
    /// Additive identity at the same precision as `self`.
    fn zero(&self) -> Self;

    /// Construct from `f64` components.
    fn from_f64_pair(re: f64, im: f64) -> Self;

    /// Downcast to `f64` components.
    fn to_f64_pair(&self) -> (f64, f64);

    fn add(&self, other: &Self) -> Self;

    fn sub(&self, other: &Self) -> Self;

    /// Standard complex product.
    fn mul(&self, other: &Self) -> Self;

    /// Scalar multiply.
    fn scale(&self, factor: f64) -> Self;

    /// Scalar divide.
    fn div_scalar(&self, divisor: f64) -> Self;

    /// Complex square, the hot operation of the escape recurrence.
    fn square(&self) -> Self;

    /// Modulus squared as `f64`, for escape checks. Orbit values are bounded
    /// by the bailout radius whenever this matters, so `f64` never overflows
    /// here.
    fn norm_sq(&self) -> f64;

    /// Modulus.
    fn norm(&self) -> f64 {
        self.norm_sq().sqrt()
    }

    /// Tolerance comparison: true when both components differ by less than
    /// `epsilon` in absolute value.
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        let (are, aim) = self.to_f64_pair();
        let (bre, bim) = other.to_f64_pair();
        (are - bre).abs() < epsilon && (aim - bim).abs() < epsilon
    }
}

/// Fixed 64-bit complex number used for all per-pixel iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct F64Complex {
    pub re: f64,
    pub im: f64,
}

impl F64Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl ComplexArith for F64Complex {
    #[inline]
    fn zero(&self) -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    #[inline]
    fn from_f64_pair(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[inline]
    fn to_f64_pair(&self) -> (f64, f64) {
        (self.re, self.im)
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    #[inline]
    fn sub(&self, other: &Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }

    #[inline]
    fn mul(&self, other: &Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    #[inline]
    fn scale(&self, factor: f64) -> Self {
        Self {
            re: self.re * factor,
            im: self.im * factor,
        }
    }

    #[inline]
    fn div_scalar(&self, divisor: f64) -> Self {
        Self {
            re: self.re / divisor,
            im: self.im / divisor,
        }
    }

    #[inline]
    fn square(&self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }

    #[inline]
    fn norm_sq(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

/// Arbitrary-precision complex number for reference orbit generation and
/// full-precision glitch re-evaluation.
#[derive(Clone, Debug)]
pub struct BigComplex {
    pub re: BigReal,
    pub im: BigReal,
}

impl BigComplex {
    pub fn new(re: BigReal, im: BigReal) -> Self {
        Self { re, im }
    }

    pub fn precision_bits(&self) -> usize {
        self.re.precision_bits().max(self.im.precision_bits())
    }
}

impl ComplexArith for BigComplex {
    fn zero(&self) -> Self {
        let bits = self.precision_bits();
        Self {
            re: BigReal::zero(bits),
            im: BigReal::zero(bits),
        }
    }

    fn from_f64_pair(re: f64, im: f64) -> Self {
        // Callers that need more than 64 bits build components explicitly;
        // this constructor only exists for the generic seam.
        Self {
            re: BigReal::with_precision(re, 64),
            im: BigReal::with_precision(im, 64),
        }
    }

    fn to_f64_pair(&self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }

    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re.add(&other.re),
            im: self.im.add(&other.im),
        }
    }

    fn sub(&self, other: &Self) -> Self {
        Self {
            re: self.re.sub(&other.re),
            im: self.im.sub(&other.im),
        }
    }

    fn mul(&self, other: &Self) -> Self {
        Self {
            re: self.re.mul(&other.re).sub(&self.im.mul(&other.im)),
            im: self.re.mul(&other.im).add(&self.im.mul(&other.re)),
        }
    }

    fn scale(&self, factor: f64) -> Self {
        let s = BigReal::with_precision(factor, self.precision_bits());
        Self {
            re: self.re.mul(&s),
            im: self.im.mul(&s),
        }
    }

    fn div_scalar(&self, divisor: f64) -> Self {
        let d = BigReal::with_precision(divisor, self.precision_bits());
        Self {
            re: self.re.div(&d),
            im: self.im.div(&d),
        }
    }

    fn square(&self) -> Self {
        let two = BigReal::with_precision(2.0, self.precision_bits());
        Self {
            re: self.re.mul(&self.re).sub(&self.im.mul(&self.im)),
            im: self.re.mul(&self.im).mul(&two),
        }
    }

    fn norm_sq(&self) -> f64 {
        self.re
            .mul(&self.re)
            .add(&self.im.mul(&self.im))
            .to_f64()
    }
}
