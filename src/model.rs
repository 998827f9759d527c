use crate::{error::WfcError, lattice::{Lattice, Point}};

/// One labeled sample of an example model.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Voxel<T> {
    pub point: Point,
    pub label: T,
}

/// The sparse form an external loader hands over: a bounding size plus the labeled voxels inside
/// it. Points with no voxel take `T::default()`.
#[derive(Clone, Debug)]
pub struct ExampleModel<T> {
    pub size: Point,
    pub voxels: Vec<Voxel<T>>,
}

impl<T> ExampleModel<T> {
    pub fn new(size: Point, voxels: Vec<Voxel<T>>) -> Self {
        ExampleModel { size, voxels }
    }
}

impl<T: Clone + Default> ExampleModel<T> {
    /// Densify into a lattice, failing if the size is empty or any voxel is out of bounds. Later
    /// voxels overwrite earlier ones at the same point.
    pub fn to_lattice(&self) -> Result<Lattice<T>, WfcError> {
        if self.size.min_element() <= 0 {
            return Err(WfcError::InvalidDimensions(format!(
                "example size {} must be positive on every axis",
                self.size
            )));
        }

        let mut lattice = Lattice::fill(self.size, T::default());
        for voxel in self.voxels.iter() {
            let slot = lattice.get_mut(&voxel.point).ok_or(WfcError::VoxelOutOfBounds {
                point: voxel.point,
                size: self.size,
            })?;
            *slot = voxel.label.clone();
        }

        Ok(lattice)
    }
}

impl<T: Clone + PartialEq + Default> From<&Lattice<T>> for ExampleModel<T> {
    /// Keeps only the non-default values, like a VOX model does.
    fn from(lattice: &Lattice<T>) -> Self {
        let empty = T::default();
        let voxels = lattice
            .iter()
            .filter(|(_, label)| **label != empty)
            .map(|(point, label)| Voxel {
                point,
                label: label.clone(),
            })
            .collect();

        ExampleModel::new(lattice.size(), voxels)
    }
}
