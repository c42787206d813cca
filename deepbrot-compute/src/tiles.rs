//! Tile scheduling: partition the image, fan out across threads, reassemble.

use crate::border::trace_frame;
use crate::error::ComputeError;
use crate::escape::evaluate;
use crate::mapping::{BigPlaneMapper, PlaneMapper};
use crate::perturbation::{evaluate_perturbed, ReferenceOrbit};
use deepbrot_core::{BigReal, EscapeData, PixelGrid, PixelRect, Viewport};

/// One tile of the image with its exclusively-owned pixel buffer.
///
/// A frame is moved into its worker thread and moved back out on join;
/// frames never share mutable state, which is the whole synchronization
/// story of a pass.
#[derive(Debug)]
pub struct Frame {
    /// (row, col) position in the tiling.
    pub index: (u32, u32),
    /// Global pixel-space sub-rectangle this frame covers.
    pub rect: PixelRect,
    /// Complex-plane slice covered by `rect`, derived from the full
    /// viewport. Informational: evaluation always maps through the full
    /// viewport so tiling cannot perturb results.
    pub region: Viewport,
    /// Row-major escape results, `rect.area()` long once rendered.
    pub data: Vec<EscapeData>,
}

/// Split a thread count into a `(rows, cols)` tile pair by repeated halving:
/// the vertical count takes half, the horizontal count takes what divides
/// out. Non-factorable counts lose the remainder (7 threads tile as 3×2);
/// the approximation is accepted rather than rejected.
pub fn tile_split(thread_count: usize) -> (u32, u32) {
    let rows = if thread_count <= 2 {
        1
    } else {
        thread_count / 2
    };
    let cols = (thread_count / rows).max(1);
    (rows as u32, cols as u32)
}

/// Evaluation inputs shared read-only by every worker in a pass.
pub(crate) struct PassContext<'a> {
    pub max_iterations: u32,
    pub tau_sq: f64,
    pub border_trace: bool,
    pub mapper: PlaneMapper,
    pub perturbed: Option<PerturbedInputs<'a>>,
}

pub(crate) struct PerturbedInputs<'a> {
    pub mapper: BigPlaneMapper,
    pub orbit: &'a ReferenceOrbit,
}

pub(crate) fn eval_pixel(ctx: &PassContext, px: u32, py: u32) -> EscapeData {
    match &ctx.perturbed {
        Some(p) => evaluate_perturbed(
            p.mapper.delta_from(p.orbit.center(), px, py),
            p.orbit,
            ctx.max_iterations,
            ctx.tau_sq,
        ),
        None => evaluate(&ctx.mapper.point(px, py), ctx.max_iterations),
    }
}

/// Render one frame in place: border-traced or brute-force sweep, exact or
/// perturbed, per the pass context.
pub(crate) fn render_frame(frame: &mut Frame, ctx: &PassContext) {
    let rect = frame.rect;
    if ctx.border_trace {
        frame.data = trace_frame(rect.width, rect.height, ctx.max_iterations, &mut |lx, ly| {
            eval_pixel(ctx, rect.x + lx, rect.y + ly)
        });
    } else {
        let mut data = Vec::with_capacity(rect.area());
        for ly in 0..rect.height {
            for lx in 0..rect.width {
                data.push(eval_pixel(ctx, rect.x + lx, rect.y + ly));
            }
        }
        frame.data = data;
    }
}

/// Partition the image into frames for `thread_count` workers.
///
/// Tile counts are clipped to the image dimensions; the last row/column
/// absorbs any division remainder so the frames cover the image exactly.
pub fn generate_frames(
    viewport: &Viewport,
    width: u32,
    height: u32,
    thread_count: usize,
) -> Result<Vec<Frame>, ComputeError> {
    let (rows, cols) = tile_split(thread_count);
    let rows = rows.min(height).max(1);
    let cols = cols.min(width).max(1);

    let bits = viewport.precision_bits();
    let step_re = viewport
        .width()
        .div(&BigReal::with_precision(width as f64, bits));
    let step_im = viewport
        .height()
        .div(&BigReal::with_precision(height as f64, bits));

    let edge_re = |px: u32| {
        viewport
            .min()
            .0
            .add(&step_re.mul(&BigReal::with_precision(px as f64, bits)))
    };
    let edge_im = |py: u32| {
        viewport
            .min()
            .1
            .add(&step_im.mul(&BigReal::with_precision(py as f64, bits)))
    };

    let base_w = width / cols;
    let base_h = height / rows;
    let mut frames = Vec::with_capacity((rows * cols) as usize);

    for row in 0..rows {
        let y = row * base_h;
        let h = if row == rows - 1 { height - y } else { base_h };
        for col in 0..cols {
            let x = col * base_w;
            let w = if col == cols - 1 { width - x } else { base_w };
            let rect = PixelRect::new(x, y, w, h);
            let region = Viewport::new(
                (edge_re(x), edge_im(y)),
                (edge_re(x + w), edge_im(y + h)),
            )?;
            frames.push(Frame {
                index: (row, col),
                rect,
                region,
                data: Vec::new(),
            });
        }
    }

    log::debug!(
        "tiling {}x{} image as {}x{} frames for {} threads",
        width,
        height,
        rows,
        cols,
        thread_count
    );
    Ok(frames)
}

/// Run `render` over every frame, one scoped thread per frame.
///
/// Each frame is moved into its worker and moved back on join. A panicking
/// worker cannot corrupt any other frame (exclusive ownership) and fails
/// the whole pass: a corrupt tile in the middle of an image is worse than
/// no image.
pub(crate) fn dispatch<F>(frames: Vec<Frame>, render: F) -> Result<Vec<Frame>, ComputeError>
where
    F: Fn(&mut Frame) + Sync,
{
    if frames.len() == 1 {
        let mut frames = frames;
        render(&mut frames[0]);
        return Ok(frames);
    }

    crossbeam::thread::scope(|s| {
        let render = &render;
        let handles: Vec<_> = frames
            .into_iter()
            .map(|mut frame| {
                s.spawn(move |_| {
                    render(&mut frame);
                    frame
                })
            })
            .collect();

        let mut done = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(frame) => done.push(frame),
                Err(_) => return Err(ComputeError::TileFailed),
            }
        }
        Ok(done)
    })
    .map_err(|_| ComputeError::TileFailed)?
}

/// Scatter-copy every frame's buffer into the full-resolution grid.
pub fn join_frames(
    frames: Vec<Frame>,
    width: u32,
    height: u32,
    max_iterations: u32,
) -> PixelGrid {
    let mut grid = PixelGrid::new(width, height, max_iterations);
    for frame in frames {
        let rect = frame.rect;
        debug_assert_eq!(frame.data.len(), rect.area());
        for ly in 0..rect.height {
            for lx in 0..rect.width {
                let cell = frame.data[(ly * rect.width + lx) as usize];
                grid.set(rect.x + lx, rect.y + ly, cell);
            }
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_viewport() -> Viewport {
        Viewport::from_f64(-2.5, -1.5, 1.5, 1.5, 64).unwrap()
    }

    #[test]
    fn tile_split_shapes() {
        assert_eq!(tile_split(1), (1, 1));
        assert_eq!(tile_split(2), (1, 2));
        assert_eq!(tile_split(4), (2, 2));
        assert_eq!(tile_split(8), (4, 2));
        assert_eq!(tile_split(6), (3, 2));
        // Non-factorable: remainder dropped, approximate tiling accepted.
        assert_eq!(tile_split(7), (3, 2));
    }

    #[test]
    fn frames_cover_the_image_exactly() {
        for threads in [1, 2, 3, 4, 6, 7, 8] {
            let frames = generate_frames(&test_viewport(), 101, 67, threads).unwrap();
            let mut covered = vec![0u8; 101 * 67];
            for f in &frames {
                for ly in 0..f.rect.height {
                    for lx in 0..f.rect.width {
                        let idx = ((f.rect.y + ly) * 101 + f.rect.x + lx) as usize;
                        covered[idx] += 1;
                    }
                }
            }
            assert!(
                covered.iter().all(|&c| c == 1),
                "threads={threads}: frames overlap or leave gaps"
            );
        }
    }

    #[test]
    fn frame_regions_partition_the_viewport() {
        let vp = test_viewport();
        let frames = generate_frames(&vp, 100, 100, 4).unwrap();
        assert_eq!(frames.len(), 4);
        // Corner frames inherit the viewport's outer vertices.
        let first = &frames[0];
        let last = &frames[3];
        assert_eq!(first.region.min().0, vp.min().0);
        assert_eq!(first.region.min().1, vp.min().1);
        assert!((last.region.max().0.to_f64() - vp.max().0.to_f64()).abs() < 1e-12);
        assert!((last.region.max().1.to_f64() - vp.max().1.to_f64()).abs() < 1e-12);
    }

    #[test]
    fn tiny_image_clamps_tile_counts() {
        let frames = generate_frames(&test_viewport(), 2, 1, 8).unwrap();
        assert!(frames.len() <= 2);
        let total: usize = frames.iter().map(|f| f.rect.area()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn join_places_each_frame_at_its_tile() {
        let frames = generate_frames(&test_viewport(), 10, 10, 4).unwrap();
        let frames: Vec<Frame> = frames
            .into_iter()
            .map(|mut f| {
                // Stamp every cell with the frame's flat tile id.
                let id = f.index.0 * 2 + f.index.1;
                f.data = vec![EscapeData::escaped(id, id as f64, 300.0); f.rect.area()];
                f
            })
            .collect();
        let grid = join_frames(frames, 10, 10, 50);
        assert_eq!(grid.get(0, 0).iterations, 0);
        assert_eq!(grid.get(9, 0).iterations, 1);
        assert_eq!(grid.get(0, 9).iterations, 2);
        assert_eq!(grid.get(9, 9).iterations, 3);
    }

    #[test]
    fn dispatch_renders_every_frame() {
        let frames = generate_frames(&test_viewport(), 20, 20, 4).unwrap();
        let done = dispatch(frames, |f| {
            f.data = vec![EscapeData::interior(9); f.rect.area()];
        })
        .unwrap();
        assert_eq!(done.len(), 4);
        assert!(done.iter().all(|f| f.data.len() == f.rect.area()));
    }

    #[test]
    fn panicking_worker_fails_the_whole_pass() {
        let frames = generate_frames(&test_viewport(), 20, 20, 4).unwrap();
        let result = dispatch(frames, |f| {
            if f.index == (1, 0) {
                panic!("injected tile failure");
            }
            f.data = vec![EscapeData::interior(9); f.rect.area()];
        });
        assert!(matches!(result, Err(ComputeError::TileFailed)));
    }
}
