//! End-to-end passes through the engine: determinism, tiling invariance,
//! optimization equivalence, and re-centering.

use deepbrot_compute::{auto_thread_count, to_rgba, ComputeError, MandelbrotEngine};
use deepbrot_core::{ColorMode, ComputeConfig, OptimizationFlags, PixelGrid, Viewport};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run(config: ComputeConfig, viewport: Viewport) -> PixelGrid {
    MandelbrotEngine::new(config, viewport)
        .unwrap()
        .compute_pixels()
        .unwrap()
}

fn assert_grids_identical(a: &PixelGrid, b: &PixelGrid, what: &str) {
    assert_eq!(a.width(), b.width());
    assert_eq!(a.height(), b.height());
    for y in 0..a.height() {
        for x in 0..a.width() {
            assert_eq!(a.get(x, y), b.get(x, y), "{what}: mismatch at ({x}, {y})");
        }
    }
}

#[test]
fn identical_passes_are_bit_identical() {
    init_logging();
    let config = ComputeConfig::new(48, 36, 100);
    let a = run(config.clone(), MandelbrotEngine::default_viewport(64));
    let b = run(config, MandelbrotEngine::default_viewport(64));
    assert_grids_identical(&a, &b, "repeated pass");
}

#[test]
fn thread_count_never_changes_the_result() {
    init_logging();
    let viewport = MandelbrotEngine::default_viewport(64);
    let baseline = run(ComputeConfig::new(53, 41, 80), viewport.clone());

    let flags = OptimizationFlags {
        multithread: true,
        ..OptimizationFlags::NONE
    };
    for threads in [1, 2, 4, 7, 8] {
        let config = ComputeConfig::new(53, 41, 80)
            .with_flags(flags)
            .with_threads(threads);
        let grid = run(config, viewport.clone());
        assert_grids_identical(&baseline, &grid, &format!("{threads} threads"));
    }
}

#[test]
fn auto_thread_count_is_usable() {
    init_logging();
    let threads = auto_thread_count();
    assert!(threads >= 1);
    let flags = OptimizationFlags {
        multithread: true,
        ..OptimizationFlags::NONE
    };
    let config = ComputeConfig::new(32, 32, 50)
        .with_flags(flags)
        .with_threads(threads);
    let grid = run(config, MandelbrotEngine::default_viewport(64));
    assert_eq!(grid.cells().len(), 32 * 32);
}

#[test]
fn border_tracing_matches_brute_force_on_smooth_exterior() {
    init_logging();
    // Entirely outside the set: wide iteration bands, where the scanline
    // fill is exact.
    let viewport = Viewport::from_f64(1.0, 0.5, 2.0, 1.5, 64).unwrap();
    let brute = run(ComputeConfig::new(48, 48, 100), viewport.clone());

    let flags = OptimizationFlags {
        border_trace: true,
        ..OptimizationFlags::NONE
    };
    let traced = run(ComputeConfig::new(48, 48, 100).with_flags(flags), viewport);
    for y in 0..48 {
        for x in 0..48 {
            assert_eq!(
                brute.get(x, y).iterations,
                traced.get(x, y).iterations,
                "at ({x}, {y})"
            );
        }
    }
}

#[test]
fn perturbation_agrees_with_exact_iteration_at_shallow_zoom() {
    init_logging();
    let viewport = Viewport::from_f64(1.0, 0.5, 2.0, 1.5, 64).unwrap();
    let exact = run(ComputeConfig::new(40, 40, 100), viewport.clone());

    let flags = OptimizationFlags {
        perturbation: true,
        ..OptimizationFlags::NONE
    };
    let perturbed = run(ComputeConfig::new(40, 40, 100).with_flags(flags), viewport);
    for y in 0..40 {
        for x in 0..40 {
            let a = exact.get(x, y);
            let b = perturbed.get(x, y);
            assert_eq!(a.escaped, b.escaped, "at ({x}, {y})");
            let diff = a.iterations.abs_diff(b.iterations);
            assert!(diff <= 1, "at ({x}, {y}): {} vs {}", a.iterations, b.iterations);
        }
    }
}

#[test]
fn perturbation_pass_leaves_no_glitched_cells() {
    init_logging();
    let flags = OptimizationFlags {
        perturbation: true,
        ..OptimizationFlags::NONE
    };
    let config = ComputeConfig::new(40, 40, 150).with_flags(flags);
    let grid = run(config, MandelbrotEngine::default_viewport(64));
    assert!(grid.cells().iter().all(|c| !c.glitched));
}

#[test]
fn all_optimizations_combined_complete_a_pass() {
    init_logging();
    let config = ComputeConfig::new(64, 48, 200)
        .with_flags(OptimizationFlags::FULL)
        .with_threads(4);
    let grid = run(config, MandelbrotEngine::default_viewport(64));
    assert_eq!(grid.cells().len(), 64 * 48);
    // The classic full view has both interior and exterior pixels.
    assert!(grid.cells().iter().any(|c| c.escaped));
    assert!(grid.cells().iter().any(|c| !c.escaped));

    let rgba = to_rgba(&grid, ColorMode::Palette);
    assert_eq!(rgba.len(), 64 * 48 * 4);
    assert!(rgba.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn recentering_between_passes_zooms_in() {
    init_logging();
    let config = ComputeConfig::new(32, 32, 100).with_flags(OptimizationFlags::FULL);
    let mut engine = MandelbrotEngine::new(config, MandelbrotEngine::default_viewport(64)).unwrap();

    let first = engine.compute_pixels().unwrap();
    assert_eq!(first.cells().len(), 32 * 32);
    let outer = engine.viewport().clone();

    engine.update_vertices(16.0, 16.0).unwrap();
    assert!(outer.strictly_contains(engine.viewport()));

    let second = engine.compute_pixels().unwrap();
    assert_eq!(second.cells().len(), 32 * 32);
}

#[test]
fn click_outside_the_image_is_rejected() {
    init_logging();
    let config = ComputeConfig::new(32, 32, 100);
    let mut engine = MandelbrotEngine::new(config, MandelbrotEngine::default_viewport(64)).unwrap();
    assert!(matches!(
        engine.update_vertices(200.0, 5.0),
        Err(ComputeError::ClickOutOfBounds(_, _))
    ));
}
