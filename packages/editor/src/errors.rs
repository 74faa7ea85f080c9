//! Error types for the editor session.

use thiserror::Error;

use vellum_model::TransformError;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("document rejected: {0}")]
    Transform(#[from] TransformError),

    #[error("an image resize drag is already active")]
    ResizeActive,

    #[error("no image at position {0}")]
    NoImage(usize),
}
