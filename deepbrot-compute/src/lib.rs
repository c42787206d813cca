//! Escape-time computation for the Mandelbrot set.
//!
//! The pipeline: a [`MandelbrotEngine`] owns a viewport and a configuration,
//! partitions the image into frames, renders each frame on its own thread
//! (exact `f64` iteration or perturbation against a high-precision reference
//! orbit, optionally border-traced), reassembles the full grid, and repairs
//! any glitched pixels at full precision. [`colorize::to_rgba`] turns the
//! grid into pixels.

pub mod border;
pub mod colorize;
pub mod engine;
pub mod error;
pub mod escape;
pub mod mapping;
pub mod perturbation;
pub mod tiles;

pub use colorize::to_rgba;
pub use engine::MandelbrotEngine;
pub use error::ComputeError;
pub use escape::{evaluate, smooth_value, ESCAPE_RADIUS, ESCAPE_RADIUS_SQ};
pub use perturbation::{evaluate_perturbed, ReferenceOrbit};
pub use tiles::{generate_frames, join_frames, tile_split, Frame};

use deepbrot_core::{ComputeConfig, PixelGrid, Viewport};

/// Default worker count for multithreaded passes: one per logical CPU.
pub fn auto_thread_count() -> usize {
    num_cpus::get().max(1)
}

/// One-shot convenience: run a single pass over `viewport` without keeping
/// an engine around for re-centering.
pub fn compute_pixels(
    viewport: Viewport,
    config: &ComputeConfig,
) -> Result<PixelGrid, ComputeError> {
    MandelbrotEngine::new(config.clone(), viewport)?.compute_pixels()
}
