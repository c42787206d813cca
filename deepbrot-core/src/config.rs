//! Computation pass configuration.
//!
//! All of this is external configuration consumed at construction time:
//! nothing here mutates during a pass.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Which optimizations a pass runs with. Pure value, never mutated while a
/// pass is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationFlags {
    /// Fan the tile set out across worker threads.
    pub multithread: bool,
    /// Use the border tracer instead of the brute-force sweep per tile.
    pub border_trace: bool,
    /// Evaluate pixels as low-precision deltas against a reference orbit.
    pub perturbation: bool,
}

impl OptimizationFlags {
    pub const NONE: Self = Self {
        multithread: false,
        border_trace: false,
        perturbation: false,
    };

    pub const FULL: Self = Self {
        multithread: true,
        border_trace: true,
        perturbation: true,
    };
}

/// How the palette step maps normalized escape values to RGB. Consumed only
/// by the colorizer, never compared numerically by the evaluators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    Grayscale,
    Palette,
}

/// Configuration for a computation pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputeConfig {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    /// Worker threads per pass; also the tile count. Non-factorable counts
    /// produce an approximate tiling rather than an error.
    pub thread_count: usize,
    /// Magnification applied per re-center. Default 10.
    pub zoom_factor: f64,
    pub flags: OptimizationFlags,
    pub color_mode: ColorMode,
    /// Pauldelbrot glitch threshold squared (τ²). A perturbation delta is
    /// declared glitched when |z|² < τ²·|Z_ref|². Default 1e-6 (τ = 10⁻³).
    pub tau_sq: f64,
}

impl ComputeConfig {
    pub fn new(width: u32, height: u32, max_iterations: u32) -> Self {
        Self {
            width,
            height,
            max_iterations,
            thread_count: 1,
            zoom_factor: 10.0,
            flags: OptimizationFlags::NONE,
            color_mode: ColorMode::Grayscale,
            tau_sq: 1e-6,
        }
    }

    pub fn with_flags(mut self, flags: OptimizationFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_threads(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_iterations == 0 {
            return Err(CoreError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.thread_count == 0 {
            return Err(CoreError::InvalidConfig(
                "thread_count must be at least 1".into(),
            ));
        }
        if !(self.zoom_factor > 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "zoom_factor must exceed 1, got {}",
                self.zoom_factor
            )));
        }
        if !(self.tau_sq > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "tau_sq must be positive, got {}",
                self.tau_sq
            )));
        }
        Ok(())
    }
}
