use crate::{
    adjacency::AdjacencyMap,
    lattice::{Lattice, Point},
    pattern::PatternId,
};

use log::trace;
use rand::prelude::*;
use std::collections::VecDeque;

/// The possible remaining patterns that could go in each slot of the output. The colloquial "wave
/// function" to be collapsed.
///
/// A slot's domain keeps ascending pattern order and only ever shrinks between resets. One
/// pattern left means the slot is collapsed; none left is a contradiction.
pub struct Wave {
    slots: Lattice<Vec<PatternId>>,
    num_patterns: u16,
    /// Slots already narrowed by the current call to `propagate`.
    visited: Lattice<bool>,
}

/// Why narrowing the wave stopped early.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaveError {
    /// The domain of `slot` became empty.
    Contradiction { slot: Point },
    /// `slot` is not part of the wave. Nothing was changed.
    OutOfBounds { slot: Point },
}

impl Wave {
    pub fn new(num_patterns: u16, output_size: Point) -> Self {
        // Start with all possible patterns.
        let all_possible: Vec<PatternId> = (0..num_patterns).map(PatternId).collect();

        Wave {
            slots: Lattice::fill(output_size, all_possible),
            num_patterns,
            visited: Lattice::fill(output_size, false),
        }
    }

    /// Forget every collapse and return all slots to full superposition.
    pub fn reset(&mut self) {
        *self = Wave::new(self.num_patterns, self.slots.size());
    }

    pub fn size(&self) -> Point {
        self.slots.size()
    }

    pub fn num_patterns(&self) -> u16 {
        self.num_patterns
    }

    pub fn get_slots(&self) -> &Lattice<Vec<PatternId>> {
        &self.slots
    }

    pub fn get_slot(&self, slot: &Point) -> Option<&[PatternId]> {
        self.slots.get(slot).map(|domain| domain.as_slice())
    }

    pub fn num_collapsed(&self) -> usize {
        self.slots.values().filter(|d| d.len() == 1).count()
    }

    /// Every slot has exactly one pattern left.
    pub fn determined(&self) -> bool {
        self.slots.values().all(|d| d.len() == 1)
    }

    /// The single pattern of every slot, or `None` unless `determined`.
    pub fn collapsed_patterns(&self) -> Option<Lattice<PatternId>> {
        if !self.determined() {
            return None;
        }

        Some(self.slots.map(|domain| domain[0]))
    }

    pub fn has_empty_slot(&self) -> bool {
        self.slots.values().any(|d| d.is_empty())
    }

    /// Slots with 2 or more patterns left. Collapsed and contradictory slots are excluded.
    pub fn collapsable_slots(&self) -> Vec<Point> {
        self.slots
            .iter()
            .filter(|(_, d)| d.len() >= 2)
            .map(|(p, _)| p)
            .collect()
    }

    /// A uniformly random collapsable slot. There is no entropy heuristic.
    pub fn choose_random_slot<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point> {
        self.collapsable_slots().choose(rng).copied()
    }

    /// Narrow `slot` down to just `pattern`. Fails if `pattern` was no longer possible there.
    pub fn collapse_slot(&mut self, slot: &Point, pattern: PatternId) -> Result<(), WaveError> {
        let domain = self
            .slots
            .get_mut(slot)
            .ok_or(WaveError::OutOfBounds { slot: *slot })?;
        trace!("Collapsing {} to {:?}", slot, pattern);
        domain.retain(|p| *p == pattern);
        domain.dedup();

        if domain.is_empty() {
            Err(WaveError::Contradiction { slot: *slot })
        } else {
            Ok(())
        }
    }

    /// Breadth-first narrowing starting at `origin`. Each slot is visited at most once per call, so
    /// some narrowing may be left for a later call. Stops at the first emptied slot without undoing
    /// anything.
    pub fn propagate(&mut self, adjacency: &AdjacencyMap, origin: &Point) -> Result<(), WaveError> {
        if !self.slots.contains(origin) {
            return Err(WaveError::OutOfBounds { slot: *origin });
        }
        self.visited.set_all(false);

        let mut queue = VecDeque::new();
        queue.push_back(*origin);
        mark_visited(&mut self.visited, origin);

        let offset_group = adjacency.offset_group();
        while let Some(current) = queue.pop_front() {
            for (offset_id, offset) in offset_group.iter() {
                let neighbor = current + *offset;
                if self.visited.get(&neighbor) != Some(&false) {
                    continue;
                }

                let allowed = match self.slots.get(&current) {
                    Some(domain) => adjacency.project(domain, offset_id),
                    None => continue,
                };
                let domain = match self.slots.get_mut(&neighbor) {
                    Some(domain) => domain,
                    None => continue,
                };
                let num_before = domain.len();
                domain.retain(|p| allowed.contains(p.0 as u32));
                if domain.len() < num_before {
                    trace!(
                        "Removed {} patterns from {}",
                        num_before - domain.len(),
                        neighbor
                    );
                }

                if domain.is_empty() {
                    return Err(WaveError::Contradiction { slot: neighbor });
                }

                mark_visited(&mut self.visited, &neighbor);
                queue.push_back(neighbor);
            }
        }

        Ok(())
    }
}

fn mark_visited(visited: &mut Lattice<bool>, p: &Point) {
    if let Some(v) = visited.get_mut(p) {
        *v = true;
    }
}
