pub mod bigreal;
pub mod complex;
pub mod config;
pub mod error;
pub mod grid;
pub mod pixel_rect;
pub mod precision;
pub mod viewport;

pub use bigreal::BigReal;
pub use complex::{BigComplex, ComplexArith, F64Complex, DEFAULT_EPSILON};
pub use config::{ColorMode, ComputeConfig, OptimizationFlags};
pub use error::CoreError;
pub use grid::{EscapeData, PixelGrid};
pub use pixel_rect::PixelRect;
pub use precision::required_precision_bits;
pub use viewport::Viewport;
