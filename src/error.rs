use crate::{lattice::Point, pattern::PatternId};

use thiserror::Error;

/// Errors raised while building a `Generator` or talking to the VOX collaborator. Running out of
/// possibilities during generation is not an error; see `UpdateResult::Failure`.
#[derive(Debug, Error)]
pub enum WfcError {
    #[error("invalid input dimensions: {0}")]
    InvalidDimensions(String),

    #[error("invalid input dimensions: voxel {point} lies outside the example size {size}")]
    VoxelOutOfBounds { point: Point, size: Point },

    #[error("too many patterns ({found}), maximum is {max}")]
    TooManyPatterns { found: usize, max: usize },

    #[error("slot {0} is outside the output lattice")]
    SlotOutOfBounds(Point),

    #[error("{0:?} is not in the pattern catalog")]
    UnknownPattern(PatternId),

    #[error("VOX error: {0}")]
    Vox(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
