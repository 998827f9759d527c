use voxel_wfc::*;

use rand::{rngs::SmallRng, SeedableRng};

fn row(values: &[u8]) -> ExampleModel<u8> {
    let voxels = values
        .iter()
        .enumerate()
        .map(|(x, label)| Voxel {
            point: Point::new(x as i32, 0, 0),
            label: *label,
        })
        .collect();

    ExampleModel::new(Point::new(values.len() as i32, 1, 1), voxels)
}

/// Observe until the run stops, checking that `finished` and `contradiction` never coexist.
fn run(generator: &mut Generator<u8>, seed: u64) -> UpdateResult {
    let mut rng = SmallRng::seed_from_u64(seed);
    loop {
        let result = generator.observe(&mut rng);
        assert!(!(generator.is_finished() && generator.is_contradiction()));
        if result != UpdateResult::Continue {
            return result;
        }
    }
}

fn pattern_with_label(generator: &Generator<u8>, label: u8) -> PatternId {
    generator
        .catalog()
        .iter()
        .find(|(_, pattern)| pattern.values().next() == Some(&label))
        .map(|(id, _)| id)
        .unwrap()
}

#[test]
fn uniform_block_fills_output() {
    let example = ExampleModel::from(&Lattice::fill(Point::splat(2), 7u8));
    let config = GeneratorConfig::new(1, Point::new(3, 4, 5));
    let mut generator = Generator::new(&example, &config).unwrap();

    assert_eq!(generator.catalog().num_patterns(), 1);
    let weights = generator.catalog().weights().unwrap();
    assert!((weights[PatternId(0)] - 1.0).abs() < 1e-12);
    let adjacency = generator.adjacency();
    for offset in adjacency.offset_group().ids() {
        assert!(adjacency.is_allowed(PatternId(0), PatternId(0), offset));
    }

    let mut rng = SmallRng::seed_from_u64(0);
    assert_eq!(generator.observe(&mut rng), UpdateResult::Success);
    assert_eq!(generator.status(), Status::Finished);

    let output = generator.materialize();
    assert_eq!(output.size(), Point::new(3, 4, 5));
    assert!(output.values().all(|label| *label == 7));
    assert_eq!(generator.pattern_fractions().values(), &[1.0]);
}

#[test]
fn separated_labels_never_touch() {
    let example = row(&[1, 0, 2, 0, 1, 0, 1, 0, 2]);

    for seed in 0..20 {
        let config = GeneratorConfig::new(1, Point::new(24, 1, 1));
        let mut generator = Generator::new(&example, &config).unwrap();

        let one = pattern_with_label(&generator, 1);
        let two = pattern_with_label(&generator, 2);
        let adjacency = generator.adjacency();
        for offset in adjacency.offset_group().ids() {
            assert!(!adjacency.is_allowed(one, two, offset));
            assert!(!adjacency.is_allowed(two, one, offset));
        }

        assert_eq!(run(&mut generator, seed), UpdateResult::Success);
        let output = generator.materialize();
        for x in 0..23 {
            let pair = (
                output.get(&Point::new(x, 0, 0)),
                output.get(&Point::new(x + 1, 0, 0)),
            );
            assert_ne!(pair, (Some(&1), Some(&2)), "seed {} at {}", seed, x);
            assert_ne!(pair, (Some(&2), Some(&1)), "seed {} at {}", seed, x);
        }
    }
}

#[test]
fn incompatible_seeds_contradict() {
    // 1 and 2 only ever sit next to 0, so labelled slots an odd distance apart cannot coexist.
    let config = GeneratorConfig::new(1, Point::new(8, 1, 1));
    let mut generator = Generator::new(&row(&[1, 0, 2, 0, 1]), &config).unwrap();
    let one = pattern_with_label(&generator, 1);
    let zero = pattern_with_label(&generator, 0);

    assert_eq!(
        generator.collapse_slot(Point::new(0, 0, 0), one).unwrap(),
        UpdateResult::Continue
    );
    assert_eq!(
        generator.wave().get_slot(&Point::new(5, 0, 0)),
        Some(&[zero][..])
    );
    assert_eq!(
        generator.collapse_slot(Point::new(6, 0, 0), one).unwrap(),
        UpdateResult::Continue
    );

    let result = generator.collapse_slot(Point::new(5, 0, 0), one).unwrap();
    assert_eq!(result, UpdateResult::Failure);
    assert_eq!(generator.status(), Status::Contradiction);
    assert!(!generator.is_finished());
    assert_eq!(generator.wave().get_slot(&Point::new(5, 0, 0)), Some(&[][..]));

    // Further steps change nothing.
    let mut rng = SmallRng::seed_from_u64(3);
    let generation = generator.generation();
    assert_eq!(generator.observe(&mut rng), UpdateResult::Failure);
    assert_eq!(generator.generation(), generation);
}

#[test]
fn dead_end_contradicts_during_propagation() {
    // Nothing was ever seen to the right of 3.
    let config = GeneratorConfig::new(1, Point::new(5, 1, 1));
    let mut generator = Generator::new(&row(&[1, 2, 3]), &config).unwrap();
    let one = pattern_with_label(&generator, 1);

    let result = generator.collapse_slot(Point::new(0, 0, 0), one).unwrap();
    assert_eq!(result, UpdateResult::Failure);
    assert!(generator.is_contradiction());
    assert_eq!(generator.generation(), 1);

    generator.reset();
    assert_eq!(generator.status(), Status::Initialized);
    assert!(!generator.is_contradiction());
}

#[test]
fn disagreeing_neighbors_are_caught_once_determined() {
    //   y=1:  1 2 3
    //   y=0:  4 2 1
    // Right of 1 is only ever 2 and above it only 3. Above 2 is only ever 2. Nothing is ever
    // right of 3.
    let rows = [[4u8, 2, 1], [1, 2, 3]];
    let example = Lattice::from_fn(Point::new(3, 2, 1), |p| rows[p.y as usize][p.x as usize]);
    let config = GeneratorConfig::new(1, Point::new(2, 2, 1));
    let mut generator = Generator::from_lattice(&example, &config).unwrap();
    let one = pattern_with_label(&generator, 1);

    // Propagation from (0, 0) reaches (1, 1) through (1, 0) first, so the pair (0, 1)-(1, 1) is
    // never narrowed. Every slot ends up with a single pattern, but 3 then 2 along x is not
    // allowed.
    let result = generator.collapse_slot(Point::new(0, 0, 0), one).unwrap();
    assert_eq!(result, UpdateResult::Failure);
    assert!(generator.wave().determined());
    assert!(!generator.wave().has_empty_slot());
    assert!(!generator.is_finished());
    assert!(generator.is_contradiction());
    assert!(generator.result().is_none());

    let materialized = generator.materialize();
    let labels: Vec<u8> = materialized.values().copied().collect();
    assert_eq!(labels, vec![1, 2, 3, 2]);
}

/// A small 3D example with some structure on every axis.
fn layered_example() -> Lattice<u8> {
    Lattice::from_fn(Point::new(6, 6, 4), |p| {
        if p.z == 0 {
            1
        } else if (p.x / 2 + p.y / 2) % 2 == 0 {
            2
        } else {
            3
        }
    })
}

#[test]
fn finished_outputs_are_locally_sound() {
    let example = layered_example();
    let configs = [
        GeneratorConfig::new(2, Point::new(5, 5, 3)),
        GeneratorConfig::new(2, Point::new(5, 5, 3)).with_selection(Selection::Uniform),
        GeneratorConfig::new(2, Point::new(4, 4, 2)).with_extraction(Extraction::Tiled),
    ];

    for config in configs.iter() {
        for seed in 0..10 {
            let mut generator = Generator::from_lattice(&example, config).unwrap();
            if run(&mut generator, seed) != UpdateResult::Success {
                continue;
            }

            let result = generator.result().unwrap();
            assert!(generator.adjacency().assignment_is_valid(&result));
            let size = config.output_size * config.pattern_size;
            assert_eq!(generator.materialize().size(), size);
        }
    }
}

#[test]
fn catalog_is_rebuilt_identically() {
    let example = layered_example();
    let config = GeneratorConfig::new(2, Point::new(3, 3, 3));
    let a = Generator::from_lattice(&example, &config).unwrap();
    let b = Generator::from_lattice(&example, &config).unwrap();

    assert_eq!(a.catalog().num_patterns(), b.catalog().num_patterns());
    for (id, pattern) in a.catalog().iter() {
        assert_eq!(b.catalog().pattern(id), Some(pattern));
        for offset in a.adjacency().offset_group().ids() {
            assert_eq!(
                a.adjacency().iter_allowed(id, offset).collect::<Vec<_>>(),
                b.adjacency().iter_allowed(id, offset).collect::<Vec<_>>()
            );
        }
    }
}

#[test]
fn domains_only_shrink_during_a_run() {
    let example = layered_example();
    let config = GeneratorConfig::new(2, Point::new(4, 4, 2));
    let mut generator = Generator::from_lattice(&example, &config).unwrap();
    let mut rng = SmallRng::seed_from_u64(17);
    let mut sizes: Vec<usize> = generator
        .wave()
        .get_slots()
        .values()
        .map(|d| d.len())
        .collect();

    while generator.observe(&mut rng) == UpdateResult::Continue {
        for (old, domain) in sizes.iter_mut().zip(generator.wave().get_slots().values()) {
            assert!(domain.len() <= *old);
            *old = domain.len();
        }
    }
}

#[test]
fn invalid_dimensions_fail_fast() {
    let example = ExampleModel::new(
        Point::new(2, 2, 2),
        vec![Voxel {
            point: Point::new(2, 0, 0),
            label: 1u8,
        }],
    );
    let config = GeneratorConfig::new(1, Point::splat(2));
    let err = Generator::new(&example, &config).err().unwrap();
    assert!(err.to_string().starts_with("invalid input dimensions"));

    let example = ExampleModel::from(&Lattice::fill(Point::new(4, 4, 2), 1u8));
    let config = GeneratorConfig::new(3, Point::splat(2));
    assert!(matches!(
        Generator::new(&example, &config),
        Err(WfcError::InvalidDimensions(_))
    ));
    let config = config.with_extraction(Extraction::Tiled);
    assert!(matches!(
        Generator::new(&example, &config),
        Err(WfcError::InvalidDimensions(_))
    ));
}
