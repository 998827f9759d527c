use crate::{
    adjacency::AdjacencyMap,
    error::WfcError,
    lattice::{Lattice, Point},
    materialize::{materialize, pattern_fractions},
    model::ExampleModel,
    offset::OffsetGroup,
    pattern::{Extraction, PatternCatalog, PatternId, PatternMap, PatternSampler, Selection},
    wave::{Wave, WaveError},
};

use log::{debug, info, warn};
use rand::prelude::*;
use std::hash::Hash;

/// Everything needed besides the example itself.
#[derive(Clone, Copy, Debug)]
pub struct GeneratorConfig {
    /// Edge length of the cubic patterns.
    pub pattern_size: i32,
    /// Size of the output in slots. The label output is `pattern_size` times larger.
    pub output_size: Point,
    pub extraction: Extraction,
    pub selection: Selection,
}

impl GeneratorConfig {
    /// Overlapping extraction with weighted selection.
    pub fn new(pattern_size: i32, output_size: Point) -> Self {
        GeneratorConfig {
            pattern_size,
            output_size,
            extraction: Extraction::Overlapping,
            selection: Selection::Weighted,
        }
    }

    pub fn with_extraction(mut self, extraction: Extraction) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    fn validate(&self) -> Result<(), WfcError> {
        if self.output_size.min_element() <= 0 {
            return Err(WfcError::InvalidDimensions(format!(
                "output size {} must be positive on every axis",
                self.output_size
            )));
        }

        Ok(())
    }
}

/// Where a run is in its lifetime. Only `reset` leaves a terminal state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Initialized,
    Propagating,
    Finished,
    Contradiction,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateResult {
    /// The output lattice is fully assigned.
    Success,
    /// Further calls to `observe` are required.
    Continue,
    /// The currently assigned patterns cannot satisfy the constraints. Nothing is undone; call
    /// `reset` to start over.
    Failure,
}

/// Generates a lattice of labels resembling an example, using the "Wave Function Collapse"
/// algorithm on cubic patterns.
///
/// The catalog and adjacency are built once. The driver calls `observe` until it stops returning
/// `Continue`. Randomness is always passed in, so a seeded RNG gives a reproducible run.
pub struct Generator<T> {
    catalog: PatternCatalog<T>,
    adjacency: AdjacencyMap,
    sampler: PatternSampler,
    wave: Wave,
    finished: bool,
    contradiction: bool,
    generation: u64,
}

impl<T> Generator<T>
where
    T: Clone + Default + Eq + Hash,
{
    pub fn new(example: &ExampleModel<T>, config: &GeneratorConfig) -> Result<Self, WfcError> {
        let example = example.to_lattice()?;

        Self::from_lattice(&example, config)
    }

    pub fn from_lattice(example: &Lattice<T>, config: &GeneratorConfig) -> Result<Self, WfcError> {
        config.validate()?;

        info!(
            "Example size {}, pattern size {}, {} extraction, {} selection",
            example.size(),
            config.pattern_size,
            config.extraction,
            config.selection
        );
        let catalog = PatternCatalog::extract(example, config.pattern_size, config.extraction)?;
        let adjacency = AdjacencyMap::build(&catalog, OffsetGroup::faces_3d());
        let sampler = PatternSampler::new(&catalog, config.selection);
        let wave = Wave::new(catalog.num_patterns(), config.output_size);

        let mut generator = Generator {
            catalog,
            adjacency,
            sampler,
            wave,
            finished: false,
            contradiction: false,
            generation: 0,
        };
        generator.reset();

        Ok(generator)
    }

    /// The label output. Only meaningful once `is_finished`; see `materialize::materialize` for
    /// what unfinished slots show.
    pub fn materialize(&self) -> Lattice<T> {
        let output = materialize(&self.wave, &self.catalog);
        debug!("Pattern fractions = {:?}", self.pattern_fractions().values());

        output
    }
}

impl<T> Generator<T> {
    /// Collapse one random slot and propagate. A no-op once the run is finished or has failed.
    pub fn observe<R: Rng + ?Sized>(&mut self, rng: &mut R) -> UpdateResult {
        if self.finished || self.contradiction {
            return self.update_result();
        }

        let slot = match self.wave.choose_random_slot(rng) {
            Some(slot) => slot,
            None => {
                // Nothing left to choose: either everything is collapsed or some slot is empty.
                if self.wave.has_empty_slot() {
                    self.contradiction = true;
                } else {
                    self.check_determined();
                }
                return self.update_result();
            }
        };
        let pattern = match self
            .wave
            .get_slot(&slot)
            .and_then(|domain| self.sampler.sample_pattern(domain, rng))
        {
            Some(pattern) => pattern,
            None => {
                // Collapsable slots hold at least 2 patterns, so this means the wave is broken.
                debug!("No pattern to choose from at slot {}", slot);
                self.contradiction = true;
                return self.update_result();
            }
        };
        debug!(
            "{} collapsed slots; chose {:?} for slot {}",
            self.wave.num_collapsed(),
            pattern,
            slot
        );

        let result = self.collapse_and_propagate(&slot, pattern);
        self.settle(result);

        self.update_result()
    }

    /// Force `slot` to `pattern` and propagate, e.g. to seed the output before observing. If
    /// `pattern` was already ruled out for `slot`, the run ends in contradiction.
    pub fn collapse_slot(
        &mut self,
        slot: Point,
        pattern: PatternId,
    ) -> Result<UpdateResult, WfcError> {
        if self.wave.get_slot(&slot).is_none() {
            return Err(WfcError::SlotOutOfBounds(slot));
        }
        if pattern.0 >= self.catalog.num_patterns() {
            return Err(WfcError::UnknownPattern(pattern));
        }
        if self.finished || self.contradiction {
            return Ok(self.update_result());
        }

        debug!("Forcing {:?} at slot {}", pattern, slot);
        let result = self.collapse_and_propagate(&slot, pattern);
        self.settle(result);

        Ok(self.update_result())
    }

    fn collapse_and_propagate(
        &mut self,
        slot: &Point,
        pattern: PatternId,
    ) -> Result<(), WaveError> {
        self.wave.collapse_slot(slot, pattern)?;

        self.wave.propagate(&self.adjacency, slot)
    }

    fn settle(&mut self, result: Result<(), WaveError>) {
        match result {
            Ok(()) => self.check_determined(),
            Err(WaveError::Contradiction { slot }) => {
                debug!("Contradiction at slot {}", slot);
                self.contradiction = true;
            }
            Err(WaveError::OutOfBounds { slot }) => {
                warn!("Slot {} is outside the wave, nothing collapsed", slot);
                return;
            }
        }
        self.generation += 1;
    }

    /// Once every slot is collapsed, make sure all neighbors agree. Propagation visits each slot
    /// once per call, so two slots can collapse without ever being checked against each other.
    fn check_determined(&mut self) {
        if let Some(assignment) = self.wave.collapsed_patterns() {
            if self.adjacency.assignment_is_valid(&assignment) {
                self.finished = true;
            } else {
                debug!("Every slot collapsed, but some neighbors disagree");
                self.contradiction = true;
            }
        }
    }

    /// Discard all progress but keep the catalog and adjacency.
    pub fn reset(&mut self) {
        self.wave.reset();
        self.finished = false;
        self.contradiction = false;
        self.generation = 0;
        // A catalog with a single pattern is done before it starts.
        self.check_determined();
    }

    pub fn update_result(&self) -> UpdateResult {
        if self.contradiction {
            UpdateResult::Failure
        } else if self.finished {
            UpdateResult::Success
        } else {
            UpdateResult::Continue
        }
    }

    pub fn status(&self) -> Status {
        if self.contradiction {
            Status::Contradiction
        } else if self.finished {
            Status::Finished
        } else if self.generation == 0 {
            Status::Initialized
        } else {
            Status::Propagating
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_contradiction(&self) -> bool {
        self.contradiction
    }

    /// Number of collapse steps since construction or the last reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn num_collapsed(&self) -> usize {
        self.wave.num_collapsed()
    }

    pub fn catalog(&self) -> &PatternCatalog<T> {
        &self.catalog
    }

    pub fn adjacency(&self) -> &AdjacencyMap {
        &self.adjacency
    }

    pub fn wave(&self) -> &Wave {
        &self.wave
    }

    /// The chosen pattern of every slot, or `None` until the run is finished.
    pub fn result(&self) -> Option<Lattice<PatternId>> {
        if !self.finished {
            return None;
        }

        self.wave.collapsed_patterns()
    }

    pub fn pattern_fractions(&self) -> PatternMap<f64> {
        pattern_fractions(&self.wave)
    }
}
