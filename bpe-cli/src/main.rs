mod commands;
mod corpus;
mod report;

use anyhow::{Context, Result};
use bpe_tokenizer::{
    average_compression_ratio, compression_ratio, normalize, BpeTokenizer, TokenizerError, Trainer,
    TrainerConfig, TrainingStats,
};
use clap::Parser;
use commands::{Cli, Commands, DecodeArgs, EncodeArgs, ModelArgs, TrainArgs};
use env_logger::Env;
use log::{info, LevelFilter};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

const BLANK_INPUT: &str = "Please enter some text.";

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Decode(args) => run_decode(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Some(level) = level_override(verbose, quiet) {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

/// Level forced by `-v`/`-q`; without either flag `RUST_LOG` decides
fn level_override(verbose: u8, quiet: u8) -> Option<LevelFilter> {
    match (quiet, verbose) {
        (0, 0) => None,
        (0, 1) => Some(LevelFilter::Debug),
        (0, _) => Some(LevelFilter::Trace),
        (1, _) => Some(LevelFilter::Warn),
        _ => Some(LevelFilter::Error),
    }
}

fn run_train(args: TrainArgs) -> Result<ExitCode> {
    let mut texts = corpus::read_texts(&args.data_dir)?;

    let booster = args.data_dir.join(&args.booster);
    if booster.is_file() {
        info!("appending booster text {}", booster.display());
        texts.push(corpus::read_nfc(&booster)?);
    }

    let (train_texts, val_texts) = corpus::split_corpus(texts, args.val_ratio, args.seed);
    info!(
        "split corpus: {} train / {} validation texts",
        train_texts.len(),
        val_texts.len()
    );

    let config = TrainerConfig {
        vocab_size_limit: args.vocab_size,
        min_pair_freq: args.min_pair_freq,
        log_interval: args.log_interval,
    };
    let (tokenizer, summary) = Trainer::new(config)
        .train_with_summary(&train_texts)
        .context("training failed")?;

    fs::create_dir_all(&args.model.artifacts).with_context(|| {
        format!("failed to create {}", args.model.artifacts.display())
    })?;
    let model_path = args.model.model_path();
    tokenizer
        .save(&model_path)
        .with_context(|| format!("failed to save tokenizer to {}", model_path.display()))?;

    let stats = TrainingStats {
        vocab_size: tokenizer.vocab_size(),
        compression_ratio_val: average_compression_ratio(&tokenizer, &val_texts),
    };
    stats
        .save(&args.model.stats_path())
        .context("failed to write stats")?;

    if !args.no_readme {
        report::update_readme(&args.readme, &stats)?;
    }

    println!("\n=== Training done ===");
    println!("Merges: {} ({})", summary.merges_learned, summary.stop_reason);
    println!("Vocab size: {}", stats.vocab_size);
    println!("Validation compression ratio: {:.4}", stats.compression_ratio_val);
    println!("Model written to {}", model_path.display());

    Ok(ExitCode::SUCCESS)
}

/// Load the model, turning a missing file into a hint rather than an error chain
fn load_model(args: &ModelArgs) -> Result<Option<BpeTokenizer>> {
    let path = args.model_path();
    match BpeTokenizer::load(&path) {
        Ok(tokenizer) => Ok(Some(tokenizer)),
        Err(TokenizerError::ModelNotFound(_)) => {
            eprintln!("{}", not_found_hint(&path));
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}

fn not_found_hint(path: &Path) -> String {
    format!(
        "Tokenizer not found at {}. Please train first (run `bpe train`).",
        path.display()
    )
}

/// Token IDs, count, compression ratio and reconstruction for `input`.
///
/// Returns `None` when the input is blank.
fn encode_report(tokenizer: &BpeTokenizer, input: &str) -> Option<String> {
    let text = normalize(input);
    if text.is_empty() {
        return None;
    }

    let ids = tokenizer.encode(&text);
    Some(format!(
        "Token IDs: {:?}\nNumber of tokens: {}\nCompression ratio (chars/tok): {:.4}\nDecoded: {}",
        ids,
        ids.len(),
        compression_ratio(&text, &ids),
        tokenizer.decode(&ids)
    ))
}

fn run_encode(args: EncodeArgs) -> Result<ExitCode> {
    let Some(tokenizer) = load_model(&args.model)? else {
        return Ok(ExitCode::FAILURE);
    };

    let Some(report) = encode_report(&tokenizer, &args.text) else {
        eprintln!("{}", BLANK_INPUT);
        return Ok(ExitCode::FAILURE);
    };
    println!("{}", report);
    Ok(ExitCode::SUCCESS)
}

fn run_decode(args: DecodeArgs) -> Result<ExitCode> {
    let Some(tokenizer) = load_model(&args.model)? else {
        return Ok(ExitCode::FAILURE);
    };

    println!("{}", tokenizer.decode(&args.ids));
    Ok(ExitCode::SUCCESS)
}

fn run_info(args: ModelArgs) -> Result<ExitCode> {
    let Some(tokenizer) = load_model(&args)? else {
        return Ok(ExitCode::FAILURE);
    };

    println!("Model: {}", args.model_path().display());
    println!("Vocab size: {}", tokenizer.vocab_size());
    println!("Merges: {}", tokenizer.merges().len());
    println!("Special tokens: {}", tokenizer.special_tokens().join(", "));
    println!("Word end marker: {}", tokenizer.word_end());

    let stats_path = args.stats_path();
    if stats_path.is_file() {
        let stats = TrainingStats::load(&stats_path)
            .with_context(|| format!("failed to read {}", stats_path.display()))?;
        println!("Validation compression ratio: {:.4}", stats.compression_ratio_val);
    }

    Ok(ExitCode::SUCCESS)
}
