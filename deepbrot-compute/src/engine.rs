//! Pass orchestration and viewport/center tracking.

use crate::error::ComputeError;
use crate::escape::evaluate;
use crate::mapping::{BigPlaneMapper, PlaneMapper};
use crate::perturbation::ReferenceOrbit;
use crate::tiles::{dispatch, generate_frames, join_frames, render_frame, PassContext, PerturbedInputs};
use deepbrot_core::{
    required_precision_bits, BigComplex, BigReal, ComputeConfig, PixelGrid, Viewport,
};

/// Owns everything a sequence of computation passes needs: the current
/// viewport, the perturbation reference (an explicit `Option`, defaulting to
/// the plane origin, no hidden first-frame flag), the cached reference
/// orbit, and the previous grid used for reference selection.
///
/// `compute_pixels` and `update_vertices` both take `&mut self`, so a
/// re-center during an in-flight pass is a compile error rather than a
/// race: requests are serialized by construction.
pub struct MandelbrotEngine {
    config: ComputeConfig,
    viewport: Viewport,
    reference: Option<(BigReal, BigReal)>,
    orbit: Option<ReferenceOrbit>,
    previous: Option<PixelGrid>,
}

impl MandelbrotEngine {
    pub fn new(config: ComputeConfig, viewport: Viewport) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            viewport,
            reference: None,
            orbit: None,
            previous: None,
        })
    }

    /// The classic full view of the set: [-2.5, 1.5] × [-2, 2].
    pub fn default_viewport(bits: usize) -> Viewport {
        Viewport::from_f64(-2.5, -2.0, 1.5, 2.0, bits)
            .expect("default viewport constants are valid")
    }

    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Run one full computation pass over the current viewport.
    ///
    /// The viewport and reference orbit are snapshotted before dispatch and
    /// stay read-only until the join barrier; each frame buffer is owned by
    /// exactly one worker. No locks anywhere, by construction.
    pub fn compute_pixels(&mut self) -> Result<PixelGrid, ComputeError> {
        let canvas = (self.config.width, self.config.height);
        let bits = required_precision_bits(&self.viewport, canvas, self.config.max_iterations)
            .max(self.viewport.precision_bits());

        log::info!(
            "pass: {}x{} max_iter={} threads={} flags={:?} bits={}",
            self.config.width,
            self.config.height,
            self.config.max_iterations,
            self.config.thread_count,
            self.config.flags,
            bits
        );

        if self.config.flags.perturbation {
            // Cheap default on the very first pass: the plane origin.
            if self.reference.is_none() {
                self.reference = Some((BigReal::zero(bits), BigReal::zero(bits)));
            }
            if self.orbit.is_none() {
                if let Some(reference) = &self.reference {
                    self.orbit = Some(ReferenceOrbit::compute(
                        reference.clone(),
                        self.config.max_iterations,
                    ));
                }
            }
        }

        let thread_count = if self.config.flags.multithread {
            self.config.thread_count
        } else {
            1
        };

        let mut ctx = PassContext {
            max_iterations: self.config.max_iterations,
            tau_sq: self.config.tau_sq,
            border_trace: self.config.flags.border_trace,
            mapper: PlaneMapper::new(&self.viewport, canvas),
            perturbed: None,
        };
        if self.config.flags.perturbation {
            if let Some(orbit) = self.orbit.as_ref() {
                ctx.perturbed = Some(PerturbedInputs {
                    mapper: BigPlaneMapper::new(&self.viewport, canvas, bits),
                    orbit,
                });
            }
        }

        let frames = generate_frames(&self.viewport, canvas.0, canvas.1, thread_count)?;
        let frames = dispatch(frames, |frame| render_frame(frame, &ctx))?;
        let mut grid = join_frames(frames, canvas.0, canvas.1, self.config.max_iterations);

        if self.config.flags.perturbation {
            let fallbacks = self.reevaluate_glitches(&mut grid, canvas, bits);
            if fallbacks > 0 {
                log::warn!("re-evaluated {fallbacks} glitched pixels at full precision");
            }
        }

        self.previous = Some(grid.clone());
        Ok(grid)
    }

    /// Full-precision re-check of every pixel perturbation flagged as
    /// glitched. Returns how many pixels were re-evaluated.
    fn reevaluate_glitches(
        &self,
        grid: &mut PixelGrid,
        canvas: (u32, u32),
        bits: usize,
    ) -> usize {
        let mapper = BigPlaneMapper::new(&self.viewport, canvas, bits);
        let mut fallbacks = 0;
        for py in 0..canvas.1 {
            for px in 0..canvas.0 {
                if grid.get(px, py).glitched {
                    let (re, im) = mapper.point(px, py);
                    grid.set(
                        px,
                        py,
                        evaluate(&BigComplex::new(re, im), self.config.max_iterations),
                    );
                    fallbacks += 1;
                }
            }
        }
        fallbacks
    }

    /// Re-center and zoom on a clicked pixel. Must be called between
    /// passes; the borrow checker enforces that.
    ///
    /// The new viewport is `center ± extent/(2·zoom_factor)`, strictly
    /// contained in the old one by the configured zoom factor. In
    /// perturbation mode this also selects the next reference center from
    /// the previous grid, before the viewport changes underneath it.
    pub fn update_vertices(&mut self, click_x: f64, click_y: f64) -> Result<(), ComputeError> {
        let width = self.config.width;
        let height = self.config.height;
        if !click_x.is_finite()
            || !click_y.is_finite()
            || click_x < 0.0
            || click_y < 0.0
            || click_x >= width as f64
            || click_y >= height as f64
        {
            return Err(ComputeError::ClickOutOfBounds(click_x, click_y));
        }
        let px = click_x.floor() as u32;
        let py = click_y.floor() as u32;

        let canvas = (width, height);
        let bits = required_precision_bits(&self.viewport, canvas, self.config.max_iterations)
            .max(self.viewport.precision_bits());
        let mapper = BigPlaneMapper::new(&self.viewport, canvas, bits);

        if self.config.flags.perturbation {
            // Previous-grid pixels are addressed in the old viewport, so the
            // reference must be selected before the viewport moves.
            if let Some((rx, ry)) = self.select_reference_pixel(px, py) {
                self.reference = Some(mapper.point(rx, ry));
                self.orbit = None;
            }
        }

        let two = BigReal::with_precision(2.0, bits);
        let zoom = BigReal::with_precision(self.config.zoom_factor, bits);
        let half_width = self.viewport.width().div(&two).div(&zoom);
        let half_height = self.viewport.height().div(&two).div(&zoom);
        let center = mapper.point(px, py);

        self.viewport = Viewport::from_center(center, &half_width, &half_height)?;
        log::debug!(
            "re-centered on pixel ({px}, {py}); new extent {} x {}",
            self.viewport.width(),
            self.viewport.height()
        );
        Ok(())
    }

    /// Pick the pixel of the previous grid whose point should anchor the
    /// next reference orbit.
    ///
    /// Preference order: the clicked pixel if it is itself presumed
    /// interior, then any interior pixel in a small window around the
    /// click, then the first interior pixel anywhere, then the pixel with
    /// the highest iteration count seen (the best available approximation
    /// to a point near the boundary). Responsiveness over exactness: a poor
    /// pick shows up as glitched pixels and is repaired by the fallback.
    fn select_reference_pixel(&self, px: u32, py: u32) -> Option<(u32, u32)> {
        let prev = self.previous.as_ref()?;
        let max = prev.max_iterations;
        let (w, h) = (prev.width(), prev.height());

        if prev.get(px, py).iterations == max {
            return Some((px, py));
        }

        // Window radius scales with the zoom step: extent / zoom_factor.
        let radius = ((w.min(h) as f64 / self.config.zoom_factor / 2.0).ceil() as i64).max(1);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let x = px as i64 + dx;
                let y = py as i64 + dy;
                if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
                    continue;
                }
                if prev.get(x as u32, y as u32).iterations == max {
                    return Some((x as u32, y as u32));
                }
            }
        }

        let mut best = (0, 0);
        let mut best_iterations = 0;
        for y in 0..h {
            for x in 0..w {
                let iterations = prev.get(x, y).iterations;
                if iterations == max {
                    return Some((x, y));
                }
                if iterations > best_iterations {
                    best_iterations = iterations;
                    best = (x, y);
                }
            }
        }
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepbrot_core::{EscapeData, OptimizationFlags};

    fn engine(width: u32, height: u32, flags: OptimizationFlags) -> MandelbrotEngine {
        let config = ComputeConfig::new(width, height, 100).with_flags(flags);
        MandelbrotEngine::new(config, MandelbrotEngine::default_viewport(64)).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = ComputeConfig::new(0, 0, 100);
        assert!(MandelbrotEngine::new(config, MandelbrotEngine::default_viewport(64)).is_err());
    }

    #[test]
    fn update_vertices_zooms_by_the_configured_factor() {
        let mut e = engine(40, 40, OptimizationFlags::NONE);
        let old = e.viewport().clone();
        let old_width = old.width().to_f64();

        // Pixel (30, 20) maps to a point outside the set (re > 0.4).
        e.update_vertices(30.0, 20.0).unwrap();

        let new = e.viewport();
        assert!(old.strictly_contains(new));
        let ratio = old_width / new.width().to_f64();
        assert!((ratio - 10.0).abs() < 1e-9, "ratio = {ratio}");
    }

    #[test]
    fn repeated_zooms_stay_nested() {
        let mut e = engine(32, 32, OptimizationFlags::NONE);
        let mut outer = e.viewport().clone();
        for _ in 0..3 {
            e.update_vertices(16.0, 16.0).unwrap();
            assert!(outer.strictly_contains(e.viewport()));
            outer = e.viewport().clone();
        }
    }

    #[test]
    fn out_of_bounds_click_is_rejected() {
        let mut e = engine(32, 32, OptimizationFlags::NONE);
        assert!(matches!(
            e.update_vertices(-1.0, 5.0),
            Err(ComputeError::ClickOutOfBounds(_, _))
        ));
        assert!(e.update_vertices(32.0, 5.0).is_err());
        assert!(e.update_vertices(f64::NAN, 5.0).is_err());
    }

    #[test]
    fn first_recenter_without_grid_keeps_origin_reference() {
        let flags = OptimizationFlags {
            perturbation: true,
            ..OptimizationFlags::NONE
        };
        let mut e = engine(16, 16, flags);
        e.update_vertices(8.0, 8.0).unwrap();
        assert!(e.reference.is_none());
    }

    #[test]
    fn clicked_interior_pixel_becomes_the_reference() {
        let flags = OptimizationFlags {
            perturbation: true,
            ..OptimizationFlags::NONE
        };
        let mut e = engine(16, 16, flags);
        let mut prev = PixelGrid::new(16, 16, 100);
        // Mark everything except (5, 6) escaped so exactly one pixel is interior.
        for y in 0..16 {
            for x in 0..16 {
                if (x, y) != (5, 6) {
                    prev.set(x, y, EscapeData::escaped(7, 7.0, 300.0));
                }
            }
        }
        let expected = BigPlaneMapper::new(e.viewport(), (16, 16), 64).point(5, 6);
        e.previous = Some(prev);

        e.update_vertices(5.4, 6.7).unwrap();
        let reference = e.reference.as_ref().unwrap();
        assert_eq!(reference.0, expected.0);
        assert_eq!(reference.1, expected.1);
    }

    #[test]
    fn window_search_finds_nearby_interior_pixel() {
        let flags = OptimizationFlags {
            perturbation: true,
            ..OptimizationFlags::NONE
        };
        let mut e = engine(20, 20, flags);
        let mut prev = PixelGrid::new(20, 20, 100);
        for y in 0..20 {
            for x in 0..20 {
                prev.set(x, y, EscapeData::escaped(9, 9.0, 300.0));
            }
        }
        prev.set(10, 11, EscapeData::interior(100));
        e.previous = Some(prev);

        // Click next to the interior pixel; window radius is 1.
        assert_eq!(e.select_reference_pixel(10, 10), Some((10, 11)));
        e.update_vertices(10.0, 10.0).unwrap();
        assert!(e.reference.is_some());
        assert!(e.orbit.is_none());
    }

    #[test]
    fn highest_iteration_pixel_is_the_last_resort() {
        let flags = OptimizationFlags {
            perturbation: true,
            ..OptimizationFlags::NONE
        };
        let e = {
            let mut e = engine(8, 8, flags);
            let mut prev = PixelGrid::new(8, 8, 100);
            for y in 0..8 {
                for x in 0..8 {
                    prev.set(x, y, EscapeData::escaped(2, 2.0, 300.0));
                }
            }
            prev.set(6, 1, EscapeData::escaped(57, 57.0, 300.0));
            e.previous = Some(prev);
            e
        };
        assert_eq!(e.select_reference_pixel(0, 0), Some((6, 1)));
    }

    #[test]
    fn glitched_pixels_are_repaired_at_full_precision() {
        use crate::perturbation::evaluate_perturbed;
        use deepbrot_core::F64Complex;

        let flags = OptimizationFlags {
            perturbation: true,
            ..OptimizationFlags::NONE
        };
        let config = ComputeConfig::new(9, 9, 60).with_flags(flags);
        let viewport = Viewport::from_f64(-0.5, -0.5, 0.5, 0.5, 64).unwrap();
        let mut e = MandelbrotEngine::new(config, viewport).unwrap();
        // Force the reference onto c = -1. The center pixel maps to c = 0,
        // whose orbit cancels against the period-2 reference orbit at every
        // odd step, so the delta path must flag it.
        let reference = (BigReal::with_precision(-1.0, 128), BigReal::zero(128));
        e.reference = Some(reference.clone());

        let orbit = ReferenceOrbit::compute(reference, 60);
        let raw = evaluate_perturbed(F64Complex::new(1.0, 0.0), &orbit, 60, 1e-6);
        assert!(raw.glitched);

        let grid = e.compute_pixels().unwrap();
        assert!(grid.cells().iter().all(|c| !c.glitched));
        // After the fallback the center pixel carries the exact result.
        let center = grid.get(4, 4);
        assert!(!center.escaped);
        assert_eq!(center.iterations, 60);
    }
}
