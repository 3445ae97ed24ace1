// Lofi Chord Generator - CLI entry point.
//
// Loads a corpus, loads or fits a transition-table predictor, generates a
// scale-constrained chord progression, writes it to MIDI and prints the chord
// records as JSON on stdout. Logs go to stderr; set RUST_LOG to adjust.
//
// Usage:
//   cargo run -p lofi_chords -- --corpus chords.txt [--quantity N]
//     [--scale NAME] [--output PATH] [--config PATH] [--model PATH]
//     [--save-model PATH] [--seed N] [--list-scales]

use clap::Parser;
use lofi_chords::corpus::load_corpus;
use lofi_chords::vocabulary::Vocabulary;
use lofi_chords::{ChordGenerator, Error, GeneratorConfig, Result, TransitionPredictor};
use lofi_prng::ChordRng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate")]
#[command(about = "Generate a scale-constrained chord progression as MIDI")]
#[command(version)]
struct Cli {
    /// Corpus of chord symbols (.json array or whitespace-separated text)
    #[arg(long)]
    corpus: PathBuf,

    /// Number of chords to generate
    #[arg(short, long, default_value = "4")]
    quantity: usize,

    /// Scale every chord must fit inside
    #[arg(short, long, default_value = "e_major_scale")]
    scale: String,

    /// MIDI output path (overrides the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON generator config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Saved transition table; fitted from the corpus when absent
    #[arg(long)]
    model: Option<PathBuf>,

    /// Write the predictor used for this run to a JSON file
    #[arg(long)]
    save_model: Option<PathBuf>,

    /// RNG seed for window seeding and note values
    #[arg(long)]
    seed: Option<u64>,

    /// Print the available scale names and exit
    #[arg(long)]
    list_scales: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(output) = cli.output {
        config.output_path = output;
    }

    if cli.list_scales {
        for name in config.scales.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let corpus = load_corpus(&cli.corpus)?;
    let vocabulary = Vocabulary::from_corpus(&corpus)?;

    let predictor = match &cli.model {
        Some(path) => {
            let model = TransitionPredictor::load(path)?;
            if model.vocabulary_size != vocabulary.len() {
                return Err(Error::InvalidConfig(format!(
                    "model {} was built for {} symbols, corpus has {}",
                    path.display(),
                    model.vocabulary_size,
                    vocabulary.len()
                )));
            }
            info!(path = %path.display(), "loaded transition table");
            model
        }
        None => {
            let encoded = vocabulary.encode(corpus.as_slice())?;
            TransitionPredictor::from_indices(&encoded, vocabulary.len())
        }
    };
    if let Some(path) = &cli.save_model {
        predictor.save(path)?;
        info!(path = %path.display(), "saved transition table");
    }

    let mut rng = match cli.seed {
        Some(seed) => ChordRng::new(seed),
        None => ChordRng::from_entropy(),
    };

    let generator = ChordGenerator::from_parts(config, corpus, predictor)?;
    let records = generator.generate(cli.quantity, &cli.scale, &mut rng)?;

    let json = serde_json::to_string_pretty(&records).map_err(|source| Error::Json {
        path: PathBuf::from("<stdout>"),
        source,
    })?;
    println!("{json}");
    Ok(())
}
