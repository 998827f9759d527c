//! Implementation of the discrete "Wave Function Collapse" algorithm for 3D voxel maps with cubic
//! patterns.

mod adjacency;
mod error;
mod generate;
mod id_vec;
mod lattice;
mod materialize;
mod model;
mod offset;
mod pattern;
mod vox;
mod wave;

pub use adjacency::AdjacencyMap;
pub use error::WfcError;
pub use generate::{Generator, GeneratorConfig, Status, UpdateResult};
pub use id_vec::{Id, IdVec};
pub use lattice::{Lattice, Point};
pub use materialize::{materialize, pattern_fractions};
pub use model::{ExampleModel, Voxel};
pub use offset::{OffsetGroup, OffsetId, OffsetMap};
pub use pattern::{
    Extraction, PatternCatalog, PatternId, PatternMap, PatternSampler, Selection, MAX_PATTERNS,
};
pub use vox::{
    example_model_from_vox, example_model_from_vox_model, load_vox, save_vox,
    vox_model_from_lattice, VoxLabel, MAX_MODEL_SIZE,
};
pub use wave::{Wave, WaveError};
