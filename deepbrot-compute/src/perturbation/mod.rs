//! Perturbation-theory evaluation: one high-precision reference orbit, many
//! low-precision per-pixel deltas.

mod pixel;
mod reference_orbit;

pub use pixel::evaluate_perturbed;
pub use reference_orbit::ReferenceOrbit;
