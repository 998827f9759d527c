//! Reading examples from and writing outputs to MagicaVoxel VOX files.
//!
//! A VOX voxel stores a 0-based palette index, and every index is a real color. Labels are that
//! index plus one, leaving label 0 (`VoxLabel::default()`) for empty space.

use crate::{
    error::WfcError,
    lattice::{Lattice, Point},
    model::{ExampleModel, Voxel},
};

use dot_vox::{DotVoxData, Model, Size};
use log::info;
use std::convert::TryFrom;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Largest extent of a single VOX model on any axis.
pub const MAX_MODEL_SIZE: i32 = 256;

/// Label of a voxel read from a VOX file. 0 is empty space.
pub type VoxLabel = u16;

fn label_from_palette_index(i: u8) -> VoxLabel {
    VoxLabel::from(i) + 1
}

fn palette_index_from_label(label: VoxLabel) -> Result<u8, WfcError> {
    label
        .checked_sub(1)
        .and_then(|i| u8::try_from(i).ok())
        .ok_or_else(|| WfcError::Vox(format!("label {} has no palette index", label)))
}

pub fn load_vox(path: &Path) -> Result<DotVoxData, WfcError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| WfcError::Vox(format!("path {:?} is not valid UTF-8", path)))?;

    dot_vox::load(path_str).map_err(|e| WfcError::Vox(format!("{:?}: {}", path, e)))
}

/// The example held by model `model_index` of `data`.
pub fn example_model_from_vox(
    data: &DotVoxData,
    model_index: usize,
) -> Result<ExampleModel<VoxLabel>, WfcError> {
    let model = data.models.get(model_index).ok_or_else(|| {
        WfcError::Vox(format!(
            "model {} requested but the file has {}",
            model_index,
            data.models.len()
        ))
    })?;

    Ok(example_model_from_vox_model(model))
}

pub fn example_model_from_vox_model(model: &Model) -> ExampleModel<VoxLabel> {
    let size = Point::new(model.size.x as i32, model.size.y as i32, model.size.z as i32);
    let voxels = model
        .voxels
        .iter()
        .map(|v| Voxel {
            point: Point::new(v.x as i32, v.y as i32, v.z as i32),
            label: label_from_palette_index(v.i),
        })
        .collect();

    ExampleModel::new(size, voxels)
}

/// A VOX model holding every non-empty label of `lattice`.
pub fn vox_model_from_lattice(lattice: &Lattice<VoxLabel>) -> Result<Model, WfcError> {
    let size = lattice.size();
    if size.x > MAX_MODEL_SIZE || size.y > MAX_MODEL_SIZE || size.z > MAX_MODEL_SIZE {
        return Err(WfcError::InvalidDimensions(format!(
            "output size {} does not fit in a VOX model (max {} per axis)",
            size, MAX_MODEL_SIZE
        )));
    }

    let voxels = ExampleModel::from(lattice)
        .voxels
        .into_iter()
        .map(|v| {
            Ok(dot_vox::Voxel {
                x: v.point.x as u8,
                y: v.point.y as u8,
                z: v.point.z as u8,
                i: palette_index_from_label(v.label)?,
            })
        })
        .collect::<Result<_, WfcError>>()?;

    Ok(Model {
        size: Size {
            x: size.x as u32,
            y: size.y as u32,
            z: size.z as u32,
        },
        voxels,
    })
}

/// Write `lattice` as the only model of `data`, keeping its palette and materials.
pub fn save_vox(
    path: &Path,
    mut data: DotVoxData,
    lattice: &Lattice<VoxLabel>,
) -> Result<(), WfcError> {
    let model = vox_model_from_lattice(lattice)?;
    info!(
        "Writing {} voxels of size {} to {:?}",
        model.voxels.len(),
        lattice.size(),
        path
    );

    data.models = vec![model];
    // The scene graph may refer to models that are gone.
    data.scenes.clear();
    data.layers.clear();

    let mut writer = BufWriter::new(File::create(path)?);
    data.write_vox(&mut writer)?;

    Ok(())
}
