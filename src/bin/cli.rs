use voxel_wfc::*;

use flexi_logger::{default_format, FileSpec, Logger};
use indicatif::ProgressBar;
use log::info;
use rand::{rngs::SmallRng, SeedableRng};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(structopt::StructOpt)]
struct Args {
    /// Path to the input VOX file.
    #[structopt(parse(from_os_str))]
    input_path: PathBuf,

    /// Path to the output VOX file.
    #[structopt(parse(from_os_str))]
    output_path: PathBuf,

    /// Edge length of the cubic patterns to extract from the input model.
    #[structopt(short, long, default_value = "2")]
    pattern_size: i32,

    /// Size of the generated output, in patterns. The output model is this times the pattern
    /// size.
    #[structopt(short, long)]
    output_size: Vec<i32>,

    /// Seed for the random number generator. Results are reproducible from a given seed.
    #[structopt(short, long, default_value = "1")]
    seed: u64,

    /// "overlapping" or "tiled".
    #[structopt(long, default_value = "overlapping")]
    extraction: Extraction,

    /// "weighted" or "uniform".
    #[structopt(long, default_value = "weighted")]
    selection: Selection,

    /// Which model of the input file to sample.
    #[structopt(long, default_value = "0")]
    model: usize,

    /// Start over after a contradiction, up to this many attempts in total.
    #[structopt(long, default_value = "1")]
    attempts: usize,

    /// A log config string, e.g. "info" or "debug, voxel_wfc = trace".
    #[structopt(short, long)]
    log: Option<String>,
}

#[paw::main]
fn main(args: Args) -> Result<(), Box<dyn Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    // Keep the handle alive so the file logger keeps flushing.
    let _logger = match &args.log {
        Some(log_config) => Some(
            Logger::try_with_str(log_config.as_str())?
                .log_to_file(FileSpec::default())
                .format(default_format)
                .start()?,
        ),
        None => None,
    };

    let config = GeneratorConfig::new(args.pattern_size, get_three_elements(&args.output_size)?)
        .with_extraction(args.extraction)
        .with_selection(args.selection);

    let input_vox = load_vox(&args.input_path)?;
    let example = example_model_from_vox(&input_vox, args.model)?;

    let mut generator = Generator::new(&example, &config)?;
    println!(
        "Found {} patterns in input model",
        generator.catalog().num_patterns()
    );
    let num_empty = generator.adjacency().num_empty_sets();
    if num_empty > 0 {
        println!("{} pattern/offset pairs allow no neighbor", num_empty);
    }

    let mut rng = SmallRng::seed_from_u64(args.seed);
    println!("Trying to generate with seed {}", args.seed);

    if !generate(&mut generator, &mut rng, args.attempts, &running) {
        println!("Failed to generate");
        return Ok(());
    }

    let output = generator.materialize();
    println!("Writing {:?}", args.output_path);
    save_vox(&args.output_path, input_vox, &output)?;

    Ok(())
}

fn get_three_elements(v: &[i32]) -> Result<Point, WfcError> {
    match v {
        [x, y, z] if *x > 0 && *y > 0 && *z > 0 => Ok(Point::new(*x, *y, *z)),
        _ => Err(WfcError::InvalidDimensions(format!(
            "output size must be 3 positive integers, got {:?}",
            v
        ))),
    }
}

/// Drive `generator` until it succeeds, runs out of attempts, or is interrupted. Returns `true` on
/// success.
fn generate(
    generator: &mut Generator<VoxLabel>,
    rng: &mut SmallRng,
    attempts: usize,
    running: &AtomicBool,
) -> bool {
    let volume = generator.wave().get_slots().volume();

    for attempt in 1..=attempts.max(1) {
        if attempt > 1 {
            info!("Restarting after contradiction, attempt {}", attempt);
            generator.reset();
        }

        let progress_bar = ProgressBar::new(volume as u64);
        println!("Starting generator");
        let result = loop {
            let result = generator.observe(rng);
            if result != UpdateResult::Continue {
                break result;
            }
            // Can be interrupted by other threads.
            if !running.load(Ordering::SeqCst) {
                progress_bar.abandon();
                return false;
            }

            progress_bar.set_position(generator.num_collapsed() as u64);
        };
        progress_bar.finish();

        info!(
            "Attempt {} ended with {:?} after {} generations",
            attempt,
            result,
            generator.generation()
        );
        if result == UpdateResult::Success {
            return true;
        }
    }

    false
}
