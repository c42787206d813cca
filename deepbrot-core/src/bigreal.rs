//! Precision-parameterized real number.
//!
//! `BigReal` is the scalar type used wherever the zoom depth decides how many
//! mantissa bits are needed: viewport coordinates, reference orbit centers,
//! and the high-precision pixel offsets fed into perturbation deltas.
//!
//! Values at 64 bits or below are stored as a plain `f64`; anything above
//! that uses `FBig`. The split is invisible to callers: every operation
//! carries the maximum precision of its operands.

use crate::error::CoreError;
use dashu_base::{Abs, Approximation, EstimatedLog2};
use dashu_float::ops::SquareRoot;
use dashu_float::{DBig, FBig};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
enum Repr {
    Fixed(f64),
    Arbitrary(FBig),
}

/// Arbitrary-precision-capable real with explicit precision.
///
/// There is no default precision; every constructor takes the bit count.
#[derive(Clone, Debug)]
pub struct BigReal {
    repr: Repr,
    bits: usize,
}

impl BigReal {
    /// Build from an `f64` at the requested precision.
    pub fn with_precision(val: f64, bits: usize) -> Self {
        let repr = if bits <= 64 {
            Repr::Fixed(val)
        } else {
            Repr::Arbitrary(f64_to_fbig(val, bits))
        };
        Self { repr, bits }
    }

    pub fn zero(bits: usize) -> Self {
        Self::with_precision(0.0, bits)
    }

    /// Parse a decimal string. Accepts values outside the `f64` exponent
    /// range (e.g. `"1e-2000"`) when `bits > 64`.
    pub fn from_string(val: &str, bits: usize) -> Result<Self, CoreError> {
        if bits <= 64 {
            let f = val
                .parse::<f64>()
                .map_err(|e| CoreError::ParseValue(format!("{val:?}: {e}")))?;
            Ok(Self::with_precision(f, bits))
        } else {
            let dec = val
                .parse::<DBig>()
                .map_err(|e| CoreError::ParseValue(format!("{val:?}: {e}")))?;
            // Atomic base conversion at the target precision, then normalize
            // to the zero-rounding mode FBig uses by default.
            let halfaway = match dec.with_base_and_precision::<2>(bits) {
                Approximation::Exact(v) => v,
                Approximation::Inexact(v, _) => v,
            };
            Ok(Self {
                repr: Repr::Arbitrary(halfaway.with_rounding::<dashu_float::round::mode::Zero>()),
                bits,
            })
        }
    }

    pub fn precision_bits(&self) -> usize {
        self.bits
    }

    /// Downcast to `f64`. Loses precision above 64 bits; underflows to zero
    /// outside the `f64` exponent range. This is the cast the perturbation
    /// path applies to already-small differences.
    pub fn to_f64(&self) -> f64 {
        match &self.repr {
            Repr::Fixed(v) => *v,
            Repr::Arbitrary(v) => v.to_f64().value(),
        }
    }

    /// Estimated base-2 logarithm of |self|, valid far outside the `f64`
    /// exponent range. Returns negative infinity for zero.
    pub fn log2_approx(&self) -> f64 {
        match &self.repr {
            Repr::Fixed(v) => v.abs().log2(),
            Repr::Arbitrary(v) => {
                if v.repr().is_zero() {
                    f64::NEG_INFINITY
                } else {
                    v.log2_est() as f64
                }
            }
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a + b, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a * b, |a, b| a * b)
    }

    pub fn div(&self, other: &Self) -> Self {
        self.binary_op(other, |a, b| a / b, |a, b| a / b)
    }

    pub fn sqrt(&self) -> Self {
        let repr = match &self.repr {
            Repr::Fixed(v) => Repr::Fixed(v.sqrt()),
            Repr::Arbitrary(v) => Repr::Arbitrary(v.clone().sqrt()),
        };
        Self {
            repr,
            bits: self.bits,
        }
    }

    pub fn abs(&self) -> Self {
        let repr = match &self.repr {
            Repr::Fixed(v) => Repr::Fixed(v.abs()),
            Repr::Arbitrary(v) => Repr::Arbitrary(v.clone().abs()),
        };
        Self {
            repr,
            bits: self.bits,
        }
    }

    pub fn neg(&self) -> Self {
        let repr = match &self.repr {
            Repr::Fixed(v) => Repr::Fixed(-v),
            Repr::Arbitrary(v) => Repr::Arbitrary(-v.clone()),
        };
        Self {
            repr,
            bits: self.bits,
        }
    }

    fn binary_op(
        &self,
        other: &Self,
        fixed: impl Fn(f64, f64) -> f64,
        arbitrary: impl Fn(&FBig, &FBig) -> FBig,
    ) -> Self {
        let bits = self.bits.max(other.bits);
        let repr = match (&self.repr, &other.repr) {
            (Repr::Fixed(a), Repr::Fixed(b)) if bits <= 64 => Repr::Fixed(fixed(*a, *b)),
            _ => Repr::Arbitrary(arbitrary(&self.to_fbig(), &other.to_fbig())),
        };
        Self { repr, bits }
    }

    fn to_fbig(&self) -> FBig {
        match &self.repr {
            Repr::Fixed(v) => f64_to_fbig(*v, self.bits),
            Repr::Arbitrary(v) => v.clone(),
        }
    }
}

fn f64_to_fbig(val: f64, bits: usize) -> FBig {
    if val == 0.0 {
        // FBig::try_from(0.0) yields an exact zero with no precision attached
        FBig::ZERO.with_precision(bits).value()
    } else {
        // bits >= 64 > the f64 mantissa, so widening is always exact
        FBig::try_from(val).unwrap_or(FBig::ZERO).with_precision(bits).value()
    }
}

impl PartialEq for BigReal {
    fn eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Fixed(a), Repr::Fixed(b)) => a == b,
            _ => self.to_fbig() == other.to_fbig(),
        }
    }
}

impl PartialOrd for BigReal {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (&self.repr, &other.repr) {
            (Repr::Fixed(a), Repr::Fixed(b)) => a.partial_cmp(b),
            _ => self.to_fbig().partial_cmp(&other.to_fbig()),
        }
    }
}

impl std::fmt::Display for BigReal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.repr {
            Repr::Fixed(v) => write!(f, "{}", v),
            Repr::Arbitrary(v) => write!(f, "{}", v),
        }
    }
}

/// Plain-text serde representation so extreme values survive JSON. The
/// digit string is whatever the active representation prints and parses,
/// which the two branches of `Deserialize` mirror exactly.
#[derive(Serialize, Deserialize)]
struct BigRealWire {
    digits: String,
    bits: usize,
}

impl Serialize for BigReal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let digits = match &self.repr {
            Repr::Fixed(v) => v.to_string(),
            Repr::Arbitrary(v) => v.to_string(),
        };
        BigRealWire {
            digits,
            bits: self.bits,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigReal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = BigRealWire::deserialize(deserializer)?;
        if wire.bits <= 64 {
            let f = wire
                .digits
                .parse::<f64>()
                .map_err(|e| serde::de::Error::custom(format!("bad f64: {e}")))?;
            Ok(BigReal::with_precision(f, wire.bits))
        } else {
            let v = wire
                .digits
                .parse::<FBig>()
                .map_err(|e| serde::de::Error::custom(format!("bad FBig: {e}")))?;
            Ok(BigReal {
                repr: Repr::Arbitrary(v),
                bits: wire.bits,
            })
        }
    }
}
