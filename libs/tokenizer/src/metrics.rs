//! Compression metrics and the persisted training stats record

use crate::{BpeTokenizer, TokenizerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Characters of raw text per token.
///
/// Characters are Unicode scalar values, spaces included. The token count is
/// floored at 1 so an empty encoding does not divide by zero.
pub fn compression_ratio(raw_text: &str, token_ids: &[u32]) -> f64 {
    let raw_chars = raw_text.chars().count();
    let n_tokens = token_ids.len().max(1);
    raw_chars as f64 / n_tokens as f64
}

/// Corpus-level ratio: total characters over total tokens across all texts.
///
/// Returns 0.0 when the texts produce no tokens at all.
pub fn average_compression_ratio<S: AsRef<str>>(tokenizer: &BpeTokenizer, texts: &[S]) -> f64 {
    let mut total_chars = 0usize;
    let mut total_tokens = 0usize;

    for text in texts {
        let text = text.as_ref();
        total_chars += text.chars().count();
        total_tokens += tokenizer.encode(text).len();
    }

    if total_tokens == 0 {
        0.0
    } else {
        total_chars as f64 / total_tokens as f64
    }
}

/// Summary written after training for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub vocab_size: usize,
    pub compression_ratio_val: f64,
}

impl TrainingStats {
    pub fn save(&self, path: &Path) -> Result<(), TokenizerError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TokenizerError::SerializationError(e.to_string()))?;
        fs::write(path, json).map_err(|e| TokenizerError::IoError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, TokenizerError> {
        let json = fs::read_to_string(path).map_err(|e| TokenizerError::IoError(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| TokenizerError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Trainer, TrainerConfig};

    #[test]
    fn test_compression_ratio_basic() {
        assert_eq!(compression_ratio("abcd", &[1, 2]), 2.0);
        assert_eq!(compression_ratio("abcd", &[7]), 4.0);
    }

    #[test]
    fn test_compression_ratio_zero_tokens() {
        assert_eq!(compression_ratio("abc", &[]), 3.0);
        assert_eq!(compression_ratio("", &[]), 0.0);
    }

    #[test]
    fn test_compression_ratio_counts_characters_not_bytes() {
        // 6 code points, 18 bytes
        assert_eq!(compression_ratio("తెలుగు", &[1, 2, 3]), 2.0);
    }

    #[test]
    fn test_average_compression_ratio() {
        let config = TrainerConfig {
            vocab_size_limit: 100,
            min_pair_freq: 1,
            log_interval: 0,
        };
        let tokenizer = Trainer::new(config).train(&["ab ab ab"]).unwrap();

        // "ab" encodes to a single "ab</w>" token
        let ratio = average_compression_ratio(&tokenizer, &["ab", "ab ab"]);
        assert_eq!(ratio, 7.0 / 3.0);

        assert_eq!(average_compression_ratio::<&str>(&tokenizer, &[]), 0.0);
        assert_eq!(average_compression_ratio(&tokenizer, &[""]), 0.0);
    }

    #[test]
    fn test_training_stats_roundtrip() {
        let stats = TrainingStats {
            vocab_size: 3999,
            compression_ratio_val: 3.25,
        };

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stats.json");
        stats.save(&path).unwrap();

        assert_eq!(TrainingStats::load(&path).unwrap(), stats);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"compression_ratio_val\""));
    }
}
