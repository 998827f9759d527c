//! Turning a wave back into labels.

use crate::{
    lattice::Lattice,
    pattern::{PatternCatalog, PatternMap},
    wave::Wave,
};

/// Stamp each slot's pattern into a label lattice of size `wave size * pattern size`.
///
/// Meant to be called once the wave is determined. Before that, each slot shows the first pattern
/// still in its domain (the lowest remaining ID), and a contradictory slot is left as
/// `T::default()`.
pub fn materialize<T: Clone + Default>(wave: &Wave, catalog: &PatternCatalog<T>) -> Lattice<T> {
    let pattern_size = catalog.pattern_size();
    let mut output = Lattice::fill(wave.size() * pattern_size, T::default());
    for (slot, domain) in wave.get_slots().iter() {
        if let Some(pattern) = domain.first().and_then(|id| catalog.pattern(*id)) {
            output.copy_into(pattern, slot * pattern_size);
        }
    }

    output
}

/// Fraction of all slots showing each pattern, in the same sense as `materialize`.
pub fn pattern_fractions(wave: &Wave) -> PatternMap<f64> {
    let mut fractions = PatternMap::fill(0.0, wave.num_patterns() as usize);
    let volume = wave.get_slots().volume();
    if volume == 0 {
        return fractions;
    }

    for domain in wave.get_slots().values() {
        if let Some(pattern) = domain.first() {
            fractions[*pattern] += 1.0;
        }
    }
    for (_, fraction) in fractions.iter_mut() {
        *fraction /= volume as f64;
    }

    fractions
}
