// Swing Solo Generator: CLI entry point.
//
// Trains a Markov model on the major or minor half of a MIDI corpus and
// writes a new solo in the requested key and tempo.
//
// Usage:
//   cargo run -p swing_solo -- --key Bb --tempo 160 --scale major --bars 32
//     [--corpus DIR] [--output-dir DIR] [--seed N] [--config FILE]
//
// Set RUST_LOG=debug for per-file decode details.

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use swing_solo::config::GeneratorConfig;
use swing_solo::key::ScaleType;
use swing_solo::session::{GenerationRequest, run};

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Generate a Markov-chain solo from a MIDI corpus", long_about = None)]
struct Args {
    /// Key of the generated solo (C, C#, Db, D, ... Bb, B)
    #[arg(short, long)]
    key: String,

    /// Tempo in BPM
    #[arg(short, long, default_value = "120")]
    tempo: u32,

    /// Scale type: which half of the corpus to train on
    #[arg(short, long, default_value = "major", value_parser = parse_scale)]
    scale: ScaleType,

    /// Number of bars (32 symbols each)
    #[arg(short, long, default_value = "32")]
    bars: u32,

    /// Corpus directory (overrides the config file)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Output directory (overrides the config file)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// RNG seed for reproducible output (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_scale(s: &str) -> Result<ScaleType, String> {
    s.parse().map_err(|e: swing_solo::SoloError| e.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match GeneratorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {e}");
                std::process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = args.corpus {
        config.corpus_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let request = GenerationRequest {
        key: args.key,
        tempo_bpm: args.tempo,
        scale: args.scale,
        bars: args.bars,
    };

    println!("=== Swing Solo Generator ===");
    println!("Key: {} {}", request.key, request.scale);
    println!("Tempo: {} BPM", request.tempo_bpm);
    println!("Bars: {} ({} symbols)", request.bars, request.bars as usize * config.symbols_per_bar);
    println!("Corpus: {}", config.corpus_dir.display());
    if let Some(s) = config.seed {
        println!("Seed: {}", s);
    }
    println!();

    let mut rng = match config.seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_os_rng(),
    };

    println!("[1/2] Training on {} performances and sampling...", request.scale);
    match run(&request, &config, &mut rng) {
        Ok(report) => {
            println!("  Corpus: {} files, {} symbols", report.corpus_files, report.corpus_symbols);
            println!("  Model: {} states", report.model_states);
            println!("  Generated {} symbols", report.generated_symbols);
            println!("[2/2] Writing MIDI...");
            println!();
            println!("Generated solo saved as '{}'", report.output_path.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
