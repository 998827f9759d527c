use crate::{
    error::WfcError,
    id_vec::{Id, IdVec},
    lattice::{Lattice, Point},
};

use hibitset::BitSet;
use log::{debug, info};
use rand::prelude::*;
use rand_distr::WeightedIndex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Represents one of the possible patterns.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PatternId(pub u16);

/// One ID is held back as the "not yet assigned" marker of the sample lattice.
pub const MAX_PATTERNS: usize = std::u16::MAX as usize;

const EMPTY_PATTERN_ID: PatternId = PatternId(std::u16::MAX);

impl From<PatternId> for usize {
    fn from(id: PatternId) -> usize {
        id.0 as usize
    }
}

impl From<usize> for PatternId {
    fn from(other: usize) -> PatternId {
        PatternId(other as u16)
    }
}

impl Id for PatternId {}

pub type PatternMap<T> = IdVec<PatternId, T>;

/// How patterns are cut out of the example.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Extraction {
    /// Every position of a sliding window at unit stride.
    Overlapping,
    /// Disjoint blocks at a stride of the pattern size.
    Tiled,
}

impl FromStr for Extraction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overlapping" => Ok(Extraction::Overlapping),
            "tiled" => Ok(Extraction::Tiled),
            other => Err(format!("unknown extraction mode {:?}", other)),
        }
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Extraction::Overlapping => write!(f, "overlapping"),
            Extraction::Tiled => write!(f, "tiled"),
        }
    }
}

/// How a slot's pattern is picked when it gets collapsed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Selection {
    /// By each pattern's frequency in the example. Falls back to `Uniform` when the catalog has no
    /// weights.
    Weighted,
    Uniform,
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weighted" => Ok(Selection::Weighted),
            "uniform" => Ok(Selection::Uniform),
            other => Err(format!("unknown selection mode {:?}", other)),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Selection::Weighted => write!(f, "weighted"),
            Selection::Uniform => write!(f, "uniform"),
        }
    }
}

/// Every distinct cubic block of the example, numbered in the order first seen.
pub struct PatternCatalog<T> {
    pattern_size: i32,
    extraction: Extraction,
    patterns: PatternMap<Lattice<T>>,
    /// Number of sample positions that produced each pattern.
    counts: PatternMap<u32>,
    /// `counts` normalized to sum to 1. Only computed for overlapping extraction.
    weights: Option<PatternMap<f64>>,
    /// The pattern found at each sample position.
    samples: Lattice<PatternId>,
}

impl<T> PatternCatalog<T>
where
    T: Clone + Eq + Hash,
{
    /// For each unique block of `example`, create a `PatternId` and count its occurrences.
    pub fn extract(
        example: &Lattice<T>,
        pattern_size: i32,
        extraction: Extraction,
    ) -> Result<Self, WfcError> {
        let example_size = example.size();
        if pattern_size < 1 {
            return Err(WfcError::InvalidDimensions(format!(
                "pattern size {} must be at least 1",
                pattern_size
            )));
        }
        if pattern_size > example_size.min_element() {
            return Err(WfcError::InvalidDimensions(format!(
                "pattern size {} does not fit in example of size {}",
                pattern_size, example_size
            )));
        }

        let (sample_size, stride) = match extraction {
            Extraction::Overlapping => (example_size - Point::splat(pattern_size - 1), 1),
            // Trailing partial blocks are dropped.
            Extraction::Tiled => (example_size / pattern_size, pattern_size),
        };
        let block_size = Point::splat(pattern_size);

        // Map block contents to pattern ID.
        let mut index: HashMap<Lattice<T>, PatternId> = HashMap::new();
        let mut patterns = PatternMap::new(Vec::new());
        let mut counts = PatternMap::new(Vec::new());
        let mut samples = Lattice::fill(sample_size, EMPTY_PATTERN_ID);

        for (sample_point, sample) in samples.iter_mut() {
            let block = example
                .copy_extent(sample_point * stride, block_size)
                .ok_or_else(|| {
                    WfcError::InvalidDimensions(format!(
                        "block at {} leaves example of size {}",
                        sample_point * stride,
                        example_size
                    ))
                })?;

            let id = match index.get(&block) {
                Some(id) => *id,
                None => {
                    if patterns.len() >= MAX_PATTERNS {
                        return Err(WfcError::TooManyPatterns {
                            found: patterns.len() + 1,
                            max: MAX_PATTERNS,
                        });
                    }
                    counts.push(0);
                    let id = patterns.push(block.clone());
                    index.insert(block, id);

                    id
                }
            };
            counts[id] += 1;
            *sample = id;
        }

        let weights = match extraction {
            Extraction::Overlapping => {
                let total = samples.volume() as f64;
                Some(PatternMap::new(
                    counts.values().iter().map(|c| *c as f64 / total).collect(),
                ))
            }
            Extraction::Tiled => None,
        };

        info!(
            "Found {} patterns in {} {} samples",
            patterns.len(),
            samples.volume(),
            extraction
        );
        let mut sorted_counts = counts.values().to_vec();
        sorted_counts.sort_unstable();
        debug!("Pattern counts = {:?}", sorted_counts);

        Ok(PatternCatalog {
            pattern_size,
            extraction,
            patterns,
            counts,
            weights,
            samples,
        })
    }
}

impl<T> PatternCatalog<T> {
    pub fn num_patterns(&self) -> u16 {
        self.patterns.len() as u16
    }

    pub fn pattern_size(&self) -> i32 {
        self.pattern_size
    }

    pub fn extraction(&self) -> Extraction {
        self.extraction
    }

    pub fn pattern(&self, id: PatternId) -> Option<&Lattice<T>> {
        self.patterns.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &Lattice<T>)> {
        self.patterns.iter()
    }

    /// Returns the number of occurrences of `pattern` in the example.
    pub fn count(&self, pattern: PatternId) -> u32 {
        self.counts.get(pattern).copied().unwrap_or(0)
    }

    pub fn weights(&self) -> Option<&PatternMap<f64>> {
        self.weights.as_ref()
    }

    pub fn samples(&self) -> &Lattice<PatternId> {
        &self.samples
    }
}

/// Chooses the pattern a slot collapses to.
pub struct PatternSampler {
    /// A prior distribution of patterns, or `None` for a uniform choice.
    weights: Option<PatternMap<f64>>,
}

impl PatternSampler {
    pub fn new<T>(catalog: &PatternCatalog<T>, selection: Selection) -> Self {
        let weights = match selection {
            Selection::Weighted => catalog.weights().cloned(),
            Selection::Uniform => None,
        };
        if selection == Selection::Weighted && weights.is_none() {
            debug!("No pattern weights for {} extraction, sampling uniformly", catalog.extraction());
        }

        PatternSampler { weights }
    }

    /// Pick one of `possible_patterns`, or `None` if there are none.
    pub fn sample_pattern<R: Rng + ?Sized>(
        &self,
        possible_patterns: &[PatternId],
        rng: &mut R,
    ) -> Option<PatternId> {
        match &self.weights {
            Some(weights) => sample_weighted(weights, possible_patterns, rng)
                .or_else(|| possible_patterns.choose(rng).copied()),
            // Duplicate entries are deliberately kept; each one counts.
            None => possible_patterns.choose(rng).copied(),
        }
    }
}

/// Inverts the cumulative distribution of the weights restricted to the unique patterns of
/// `possible_patterns`, walked in their given order. `None` if no weight is positive.
fn sample_weighted<R: Rng + ?Sized>(
    weights: &PatternMap<f64>,
    possible_patterns: &[PatternId],
    rng: &mut R,
) -> Option<PatternId> {
    let mut seen = BitSet::new();
    let mut unique = Vec::with_capacity(possible_patterns.len());
    let mut unique_weights = Vec::with_capacity(possible_patterns.len());
    for pattern in possible_patterns.iter() {
        if seen.add(pattern.0 as u32) {
            continue;
        }
        unique.push(*pattern);
        unique_weights.push(weights.get(*pattern).copied().unwrap_or(0.0));
    }

    let dist = WeightedIndex::new(&unique_weights).ok()?;

    Some(unique[dist.sample(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::SmallRng;

    fn lattice_1d(values: &[u8]) -> Lattice<u8> {
        Lattice::from_fn(Point::new(values.len() as i32, 1, 1), |p| values[p.x as usize])
    }

    #[test]
    fn overlapping_counts_every_window() {
        let example = Lattice::from_fn(Point::new(3, 3, 3), |p| (p.x % 2) as u8);
        let catalog = PatternCatalog::extract(&example, 2, Extraction::Overlapping).unwrap();

        // Windows start at x = 0 or x = 1, giving two distinct blocks.
        assert_eq!(catalog.num_patterns(), 2);
        assert_eq!(catalog.samples().size(), Point::splat(2));
        assert_eq!(catalog.count(PatternId(0)), 4);
        assert_eq!(catalog.count(PatternId(1)), 4);

        let weights = catalog.weights().unwrap();
        let sum: f64 = weights.values().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tiled_truncates_partial_blocks() {
        let example = Lattice::from_fn(Point::new(5, 2, 3), |p| (p.x / 2) as u8);
        let catalog = PatternCatalog::extract(&example, 2, Extraction::Tiled).unwrap();

        assert_eq!(catalog.samples().size(), Point::new(2, 1, 1));
        assert_eq!(catalog.num_patterns(), 2);
        assert!(catalog.weights().is_none());
        assert!(catalog
            .pattern(PatternId(1))
            .unwrap()
            .values()
            .all(|label| *label == 1));
    }

    #[test]
    fn extraction_is_deterministic() {
        let example = lattice_1d(&[1, 2, 1, 3, 3, 2]);
        let a = PatternCatalog::extract(&example, 1, Extraction::Overlapping).unwrap();
        let b = PatternCatalog::extract(&example, 1, Extraction::Overlapping).unwrap();

        assert_eq!(a.num_patterns(), 3);
        assert_eq!(a.samples(), b.samples());
        for (id, pattern) in a.iter() {
            assert_eq!(Some(pattern), b.pattern(id));
        }
    }

    #[test]
    fn pattern_size_must_fit() {
        let example = lattice_1d(&[1, 2, 3]);
        for extraction in [Extraction::Overlapping, Extraction::Tiled].iter() {
            assert!(matches!(
                PatternCatalog::extract(&example, 2, *extraction),
                Err(WfcError::InvalidDimensions(_))
            ));
        }
        assert!(matches!(
            PatternCatalog::extract(&example, 0, Extraction::Overlapping),
            Err(WfcError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn weighted_sampling_skips_zero_weight() {
        let weights = PatternMap::new(vec![0.0, 1.0, 0.0]);
        let sampler = PatternSampler { weights: Some(weights) };
        let mut rng = SmallRng::seed_from_u64(7);
        let domain = [PatternId(0), PatternId(1), PatternId(2)];
        for _ in 0..100 {
            assert_eq!(sampler.sample_pattern(&domain, &mut rng), Some(PatternId(1)));
        }
    }

    #[test]
    fn weighted_sampling_follows_weights() {
        let weights = PatternMap::new(vec![0.9, 0.1]);
        let sampler = PatternSampler { weights: Some(weights) };
        let mut rng = SmallRng::seed_from_u64(3);
        let domain = [PatternId(0), PatternId(1)];
        let zeros = (0..2000)
            .filter(|_| sampler.sample_pattern(&domain, &mut rng) == Some(PatternId(0)))
            .count();
        assert!(zeros > 1600 && zeros < 1950, "got {} zeros", zeros);
    }

    #[test]
    fn sampling_empty_domain_gives_none() {
        let sampler = PatternSampler { weights: None };
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(sampler.sample_pattern(&[], &mut rng), None);
    }

    #[test]
    fn parse_modes() {
        assert_eq!("Tiled".parse::<Extraction>(), Ok(Extraction::Tiled));
        assert_eq!("uniform".parse::<Selection>(), Ok(Selection::Uniform));
        assert!("entropy".parse::<Selection>().is_err());
    }
}
