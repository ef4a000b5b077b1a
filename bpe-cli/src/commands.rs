use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bpe")]
#[command(about = "Train and run a BPE subword tokenizer")]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a tokenizer from the *.txt files in a data directory
    Train(TrainArgs),
    /// Tokenize text and report token count, compression and reconstruction
    Encode(EncodeArgs),
    /// Decode token IDs back into text
    Decode(DecodeArgs),
    /// Show model and training stats
    Info(ModelArgs),
}

/// Where the trained model lives
#[derive(Args)]
pub struct ModelArgs {
    /// Directory holding the model and stats.json
    #[arg(long, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Model file name prefix; the model is <artifacts>/<prefix>_tokenizer.json
    #[arg(long, default_value = "telugu_bpe")]
    pub prefix: String,
}

impl ModelArgs {
    pub fn model_path(&self) -> PathBuf {
        self.artifacts.join(format!("{}_tokenizer.json", self.prefix))
    }

    pub fn stats_path(&self) -> PathBuf {
        self.artifacts.join("stats.json")
    }
}

#[derive(Args)]
pub struct TrainArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Directory of UTF-8 *.txt corpus files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Extra text file inside the data directory appended to the corpus if present
    #[arg(long, default_value = "demo_sentences.txt")]
    pub booster: String,

    /// Hard ceiling on vocabulary size, special tokens included
    #[arg(long, default_value_t = 4000)]
    pub vocab_size: usize,

    /// Stop once the best pair occurs fewer times than this
    #[arg(long, default_value_t = 1)]
    pub min_pair_freq: usize,

    /// Log progress every N merges (0 = off)
    #[arg(long, default_value_t = 50)]
    pub log_interval: usize,

    /// Fraction of texts held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub val_ratio: f64,

    /// Seed for the train/validation shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Markdown file whose results block is rewritten after training
    #[arg(long, default_value = "README.md")]
    pub readme: PathBuf,

    /// Skip the README update
    #[arg(long)]
    pub no_readme: bool,
}

#[derive(Args)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Text to tokenize
    pub text: String,
}

#[derive(Args)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Token IDs
    #[arg(required = true)]
    pub ids: Vec<u32>,
}
