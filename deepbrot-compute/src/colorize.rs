//! Escape data to RGBA conversion.

use deepbrot_core::{ColorMode, PixelGrid};

/// Classic deep-blue / white / orange gradient control points.
const PALETTE: [(u8, u8, u8); 5] = [
    (0, 7, 100),
    (32, 107, 203),
    (237, 255, 255),
    (255, 170, 0),
    (0, 2, 0),
];

/// Render a grid as tightly-packed RGBA bytes, row-major, alpha 255.
///
/// Presumed-interior pixels are black; escaped pixels are shaded from the
/// smooth iteration value normalized against the iteration limit, so bands
/// blend instead of stepping.
pub fn to_rgba(grid: &PixelGrid, mode: ColorMode) -> Vec<u8> {
    let limit = grid.max_iterations.max(1) as f64;
    let mut out = Vec::with_capacity(grid.cells().len() * 4);
    for cell in grid.cells() {
        let (r, g, b) = if !cell.escaped {
            (0, 0, 0)
        } else {
            let t = (cell.smooth as f64 / limit).clamp(0.0, 1.0);
            match mode {
                ColorMode::Grayscale => {
                    let v = (t * 255.0).round() as u8;
                    (v, v, v)
                }
                ColorMode::Palette => palette(t),
            }
        };
        out.extend_from_slice(&[r, g, b, 255]);
    }
    out
}

/// Piecewise-linear interpolation over the palette control points.
fn palette(t: f64) -> (u8, u8, u8) {
    let segments = (PALETTE.len() - 1) as f64;
    let pos = t.clamp(0.0, 1.0) * segments;
    let idx = (pos.floor() as usize).min(PALETTE.len() - 2);
    let frac = pos - idx as f64;
    let a = PALETTE[idx];
    let b = PALETTE[idx + 1];
    let mix = |lo: u8, hi: u8| (lo as f64 + (hi as f64 - lo as f64) * frac).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}
