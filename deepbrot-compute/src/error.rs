//! Compute-pass error types.

use deepbrot_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A tile worker panicked. The frame isolation guarantees no other
    /// frame was touched, and the whole pass is abandoned rather than
    /// accepting a partial image.
    #[error("tile worker panicked; pass aborted")]
    TileFailed,

    #[error("click at ({0}, {1}) is outside the image")]
    ClickOutOfBounds(f64, f64),
}
