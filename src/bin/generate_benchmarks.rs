use attractor_benchmark_rs::generator::{model_name, Generator, GeneratorConfig};
use attractor_benchmark_rs::network::load_network;
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

/// Generates benchmark models by erasing update functions of a base model.
///
/// Benchmarks are grouped by the magnitude of the number of colours in which
/// the target state is an attractor state.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the base `.aeon` model.
    base_model: PathBuf,

    /// JSON file overriding (some of) the generator constants.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory in which the model-named output directory is created.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[arg(long)]
    max_erased_count: Option<usize>,

    #[arg(long)]
    samples_per_erase_count: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error: Cannot read config '{}': {}", path.display(), e);
            std::process::exit(1);
        }),
        None => GeneratorConfig::default(),
    };
    if let Some(count) = args.max_erased_count {
        config.max_erased_count = count;
    }
    if let Some(samples) = args.samples_per_erase_count {
        config.samples_per_erase_count = samples;
    }
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }

    if let Err(e) = generate(&args.base_model, &args.output, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn generate(
    base_model: &Path,
    output: &Path,
    config: GeneratorConfig,
) -> attractor_benchmark_rs::error::BenchResult<()> {
    let out_dir = output.join(model_name(base_model));
    if out_dir.exists() {
        return Err(attractor_benchmark_rs::error::BenchError::OutputExists(out_dir));
    }

    let model = load_network(base_model)?;
    info!("Loaded {} with {} variables.", base_model.display(), model.num_vars());

    let mut generator = Generator::new(&model, config)?;
    generator.sample()?;
    let written = generator.write(&out_dir)?;
    info!("Written {} benchmark(s) into {}.", written.len(), out_dir.display());
    Ok(())
}
