use thiserror::Error;

/// Errors raised by the cast entry points and shape factories.
///
/// A missing physics world is not an error: casts report it as
/// [`CastOutcome::WorldUnavailable`](crate::CastOutcome::WorldUnavailable).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastError {
    /// Raw orientation value outside `0..=3` (None, Up, Right, Back).
    #[error("invalid orientation: {0}")]
    InvalidOrientation(u8),

    /// A shape factory could not produce a shape from the given parameters.
    #[error("failed to generate {shape} shape: {reason}")]
    ShapeConstruction { shape: &'static str, reason: String },

    /// Sweeps only support convex shapes.
    #[error("shape is not convex")]
    NonConvexShape,
}

impl CastError {
    pub(crate) fn construction(shape: &'static str, reason: impl Into<String>) -> Self {
        Self::ShapeConstruction {
            shape,
            reason: reason.into(),
        }
    }
}
