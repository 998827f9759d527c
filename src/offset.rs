use crate::{
    id_vec::{Id, IdVec},
    lattice::Point,
};

use std::collections::HashMap;

/// The unit offsets from a slot to each of its neighbors.
#[derive(Clone, Debug)]
pub struct OffsetGroup {
    offsets: Vec<Point>,
    offset_index: HashMap<Point, usize>,
}

impl OffsetGroup {
    /// `offsets` must be in order of the `OffsetId` assignments, and closed under negation.
    pub fn new(offsets: &[Point]) -> Self {
        // Build the index so users can provide `Point` offsets instead of `OffsetId`s when
        // convenient.
        let offset_index: HashMap<Point, usize> = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| (*offset, i))
            .collect();
        debug_assert!(offsets.iter().all(|o| offset_index.contains_key(&-*o)));

        OffsetGroup {
            offsets: offsets.to_vec(),
            offset_index,
        }
    }

    /// The 6 face neighbors in 3D.
    pub fn faces_3d() -> Self {
        OffsetGroup::new(&FACE_3D_OFFSETS)
    }

    pub fn num_offsets(&self) -> usize {
        self.offsets.len()
    }

    pub fn offset_id(&self, offset: &Point) -> Option<OffsetId> {
        self.offset_index.get(offset).map(|i| OffsetId(*i))
    }

    pub fn offset(&self, id: OffsetId) -> Point {
        self.offsets[id.0]
    }

    /// The ID of the offset pointing the other way.
    pub fn opposite(&self, id: OffsetId) -> OffsetId {
        OffsetId(self.offset_index[&-self.offsets[id.0]])
    }

    pub fn iter(&self) -> impl Iterator<Item = (OffsetId, &Point)> {
        self.offsets
            .iter()
            .enumerate()
            .map(|(i, o)| (OffsetId(i), o))
    }

    pub fn ids(&self) -> impl Iterator<Item = OffsetId> {
        (0..self.num_offsets()).map(OffsetId)
    }
}

/// Represents one of the possible offsets.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OffsetId(pub usize);

impl From<OffsetId> for usize {
    fn from(id: OffsetId) -> usize {
        id.0
    }
}

impl From<usize> for OffsetId {
    fn from(other: usize) -> OffsetId {
        OffsetId(other)
    }
}

impl Id for OffsetId {}

pub type OffsetMap<T> = IdVec<OffsetId, T>;

const FACE_3D_OFFSETS: [Point; 6] = [
    Point::new(1, 0, 0),
    Point::new(-1, 0, 0),
    Point::new(0, 1, 0),
    Point::new(0, -1, 0),
    Point::new(0, 0, 1),
    Point::new(0, 0, -1),
];
