use crate::{
    lattice::{Lattice, Point},
    offset::{OffsetGroup, OffsetId, OffsetMap},
    pattern::{Extraction, PatternCatalog, PatternId, PatternMap},
};

use hibitset::{BitSet, BitSetLike};
use log::{debug, warn};

/// For each pattern and each offset, the set of patterns allowed at that offset. Built once from
/// the catalog and read-only afterwards.
///
/// Each offset is derived on its own; nothing forces `B in allowed(A, d)` to imply
/// `A in allowed(B, -d)`, though both derivations happen to produce that.
pub struct AdjacencyMap {
    allowed: PatternMap<OffsetMap<BitSet>>,
    offset_group: OffsetGroup,
}

impl AdjacencyMap {
    fn empty(num_patterns: u16, offset_group: OffsetGroup) -> Self {
        let allowed = PatternMap::fill(
            OffsetMap::fill(BitSet::new(), offset_group.num_offsets()),
            num_patterns as usize,
        );

        AdjacencyMap {
            allowed,
            offset_group,
        }
    }

    /// Overlapping catalogs with blocks of at least 2 use the overlap test. Everything else reads
    /// the neighbors seen in the catalog's sample lattice, since a 1-voxel block has no overlap to
    /// compare.
    pub fn build<T: Eq>(catalog: &PatternCatalog<T>, offset_group: OffsetGroup) -> Self {
        let map = match catalog.extraction() {
            Extraction::Overlapping if catalog.pattern_size() > 1 => {
                Self::from_overlaps(catalog, offset_group)
            }
            _ => Self::from_samples(catalog.samples(), catalog.num_patterns(), offset_group),
        };

        let num_empty = map.num_empty_sets();
        if num_empty > 0 {
            warn!(
                "{} pattern/offset pairs have no allowed neighbor",
                num_empty
            );
        }
        debug!("Built adjacency for {} patterns", map.num_patterns());

        map
    }

    /// `A` allows `B` at offset `d` iff the `k - 1` thick part of `A` facing `d` equals the part
    /// of `B` facing `-d`, i.e. the two agree wherever they overlap after shifting `B` by `d`.
    pub fn from_overlaps<T: Eq>(catalog: &PatternCatalog<T>, offset_group: OffsetGroup) -> Self {
        let mut map = Self::empty(catalog.num_patterns(), offset_group);
        for (a, pattern_a) in catalog.iter() {
            for (b, pattern_b) in catalog.iter() {
                for offset_id in map.offset_group.ids() {
                    let offset = map.offset_group.offset(offset_id);
                    if patterns_agree(pattern_a, pattern_b, offset) {
                        map.allow(a, offset_id, b);
                    }
                }
            }
        }

        map
    }

    /// Record the pattern actually found at each offset of each sample. Samples on the boundary get
    /// nothing for the offsets that leave the lattice.
    pub fn from_samples(
        samples: &Lattice<PatternId>,
        num_patterns: u16,
        offset_group: OffsetGroup,
    ) -> Self {
        let mut map = Self::empty(num_patterns, offset_group);
        for (p, pattern) in samples.iter() {
            for offset_id in map.offset_group.ids() {
                let neighbor = p + map.offset_group.offset(offset_id);
                if let Some(neighbor_pattern) = samples.get(&neighbor) {
                    map.allow(*pattern, offset_id, *neighbor_pattern);
                }
            }
        }

        map
    }

    fn allow(&mut self, pattern: PatternId, offset: OffsetId, neighbor: PatternId) {
        self.allowed[pattern][offset].add(neighbor.0 as u32);
    }

    pub fn offset_group(&self) -> &OffsetGroup {
        &self.offset_group
    }

    pub fn num_patterns(&self) -> u16 {
        self.allowed.len() as u16
    }

    pub fn allowed_set(&self, pattern: PatternId, offset: OffsetId) -> &BitSet {
        &self.allowed[pattern][offset]
    }

    pub fn iter_allowed(
        &self,
        pattern: PatternId,
        offset: OffsetId,
    ) -> impl Iterator<Item = PatternId> + '_ {
        (&self.allowed[pattern][offset])
            .iter()
            .map(|i| PatternId(i as u16))
    }

    pub fn is_allowed(&self, pattern: PatternId, neighbor: PatternId, offset: OffsetId) -> bool {
        self.allowed[pattern][offset].contains(neighbor.0 as u32)
    }

    /// How many (pattern, offset) pairs allow nothing at all. Diagnostic only; such patterns are
    /// legal, they just can never have a neighbor at that offset.
    pub fn num_empty_sets(&self) -> usize {
        self.allowed
            .values()
            .iter()
            .map(|by_offset| by_offset.values().iter().filter(|s| s.is_empty()).count())
            .sum()
    }

    /// Union of the allowed sets at `offset` over every pattern in `patterns`.
    pub fn project(&self, patterns: &[PatternId], offset: OffsetId) -> BitSet {
        let mut union = BitSet::new();
        for pattern in patterns.iter() {
            for neighbor in self.allowed_set(*pattern, offset).iter() {
                union.add(neighbor);
            }
        }

        union
    }

    /// Returns `true` iff every pair of adjacent points in `assignment` is allowed.
    pub fn assignment_is_valid(&self, assignment: &Lattice<PatternId>) -> bool {
        for (p, pattern) in assignment.iter() {
            for (offset_id, offset) in self.offset_group.iter() {
                let offset_p = p + *offset;
                if let Some(offset_pattern) = assignment.get(&offset_p) {
                    if !self.is_allowed(*pattern, *offset_pattern, offset_id) {
                        return false;
                    }
                }
            }
        }

        true
    }
}

fn patterns_agree<T: Eq>(a: &Lattice<T>, b: &Lattice<T>, offset: Point) -> bool {
    a.iter().all(|(p, value)| match b.get(&(p - offset)) {
        Some(other) => value == other,
        None => true,
    })
}
