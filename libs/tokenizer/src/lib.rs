//! BPE (Byte Pair Encoding) Tokenizer
//!
//! A character-level subword tokenizer for Unicode text, aimed at scripts such
//! as Telugu where whitespace or per-character tokenization is wasteful.
//!
//! Words are split on whitespace, seeded as one symbol per character plus a
//! `</w>` end-of-word marker, and merged greedily by pair frequency until the
//! vocabulary limit is reached.
//!
//! ```rust
//! use bpe_tokenizer::{compression_ratio, Trainer, TrainerConfig};
//!
//! let config = TrainerConfig {
//!     vocab_size_limit: 100,
//!     min_pair_freq: 1,
//!     ..Default::default()
//! };
//! let tokenizer = Trainer::new(config).train(&["aa ab ab", "aa aa ab"]).unwrap();
//!
//! let ids = tokenizer.encode("ab aa");
//! assert_eq!(tokenizer.decode(&ids), "ab aa");
//! assert!(compression_ratio("ab aa", &ids) >= 1.0);
//! ```

use serde::{Deserialize, Serialize};

mod bpe;
mod merge;
mod metrics;
mod persist;
mod text;
mod trainer;
mod vocab;

pub use bpe::{BpeTokenizer, MergeRule};
pub use merge::{apply_merge, count_pairs, merge_pass, Corpus, PairCounts, SymbolPair, Word};
pub use metrics::{average_compression_ratio, compression_ratio, TrainingStats};
pub use persist::ModelRecord;
pub use text::{normalize, symbolize};
pub use trainer::{StopReason, Trainer, TrainingSummary};
pub use vocab::Vocabulary;

/// Marker appended to every word's symbol sequence
pub const WORD_END: &str = "</w>";

/// Special tokens used by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialToken {
    /// Padding token
    Pad,
    /// Unknown token (characters never seen in training)
    Unk,
    /// Beginning of sequence
    Bos,
    /// End of sequence
    Eos,
}

impl SpecialToken {
    /// Surface form, e.g. `<unk>`
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialToken::Pad => "<pad>",
            SpecialToken::Unk => "<unk>",
            SpecialToken::Bos => "<bos>",
            SpecialToken::Eos => "<eos>",
        }
    }

    /// All special tokens in ID order
    pub fn all() -> [SpecialToken; 4] {
        [
            SpecialToken::Pad,
            SpecialToken::Unk,
            SpecialToken::Bos,
            SpecialToken::Eos,
        ]
    }

    /// Position within the special-token list (and therefore its ID)
    pub fn index(&self) -> usize {
        match self {
            SpecialToken::Pad => 0,
            SpecialToken::Unk => 1,
            SpecialToken::Bos => 2,
            SpecialToken::Eos => 3,
        }
    }

    /// Canonical surface forms, used when a persisted record omits them
    pub fn default_strings() -> Vec<String> {
        Self::all().iter().map(|t| t.as_str().to_string()).collect()
    }
}

/// Configuration for BPE training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Hard ceiling on vocabulary size (special tokens included)
    pub vocab_size_limit: usize,
    /// Training stops once the best pair occurs fewer times than this
    pub min_pair_freq: usize,
    /// Log progress every N merges (0 disables progress lines)
    pub log_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            vocab_size_limit: 4000,
            min_pair_freq: 2,
            log_interval: 50,
        }
    }
}

/// Error type for tokenizer operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    /// No model file at the given path
    ModelNotFound(String),
    /// Persisted model record is missing fields or inconsistent
    MalformedRecord(String),
    /// Training configuration cannot produce a usable model
    InvalidConfig(String),
    /// IO error
    IoError(String),
    /// Serialization error
    SerializationError(String),
}

impl std::fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenizerError::ModelNotFound(p) => write!(f, "Model not found: {}", p),
            TokenizerError::MalformedRecord(e) => write!(f, "Malformed model record: {}", e),
            TokenizerError::InvalidConfig(e) => write!(f, "Invalid config: {}", e),
            TokenizerError::IoError(e) => write!(f, "IO error: {}", e),
            TokenizerError::SerializationError(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for TokenizerError {}
