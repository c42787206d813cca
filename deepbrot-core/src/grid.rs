//! Per-pixel escape results and the full-resolution grid.

use serde::{Deserialize, Serialize};

/// Escape result for one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscapeData {
    /// Recurrence steps completed before escape was detected; equals the
    /// pass's `max_iterations` for presumed-interior points.
    pub iterations: u32,
    /// Whether the orbit left the bailout radius within the iteration cap.
    pub escaped: bool,
    /// Set when a perturbation result tripped glitch detection. Cleared
    /// again once the pixel has been re-evaluated at full precision.
    pub glitched: bool,
    /// Continuous escape index for palette interpolation; 0 for interior.
    pub smooth: f32,
    /// |z|² at escape; 0 for interior.
    pub final_z_norm_sq: f32,
}

impl EscapeData {
    /// Build an escaped result, sanitizing non-finite float fields so the
    /// value always survives JSON (serde_json writes NaN as null).
    pub fn escaped(iterations: u32, smooth: f64, final_z_norm_sq: f64) -> Self {
        Self {
            iterations,
            escaped: true,
            glitched: false,
            smooth: sanitize(smooth as f32, iterations as f32),
            final_z_norm_sq: sanitize(final_z_norm_sq as f32, 0.0),
        }
    }

    /// Build an interior (never escaped) result.
    pub fn interior(max_iterations: u32) -> Self {
        Self {
            iterations: max_iterations,
            escaped: false,
            glitched: false,
            smooth: 0.0,
            final_z_norm_sq: 0.0,
        }
    }

    pub fn with_glitch(mut self) -> Self {
        self.glitched = true;
        self
    }
}

#[inline]
fn sanitize(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Row-major `width × height` grid of escape results.
///
/// Allocated once per computation pass and fully overwritten; the tile
/// scheduler guarantees every cell has been assigned before the grid is
/// handed back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    /// Iteration cap the pass ran with; the value interior cells carry.
    pub max_iterations: u32,
    cells: Vec<EscapeData>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, max_iterations: u32) -> Self {
        Self {
            width,
            height,
            max_iterations,
            cells: vec![EscapeData::interior(max_iterations); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> &EscapeData {
        &self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, data: EscapeData) {
        let i = self.index(x, y);
        self.cells[i] = data;
    }

    pub fn cells(&self) -> &[EscapeData] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [EscapeData] {
        &mut self.cells
    }
}
