//! Model persistence
//!
//! The on-disk record is JSON:
//!
//! ```json
//! {
//!   "merges": [["a", "b"], ["ab", "</w>"]],
//!   "vocab": {"<pad>": 0, "<unk>": 1, ...},
//!   "special_tokens": ["<pad>", "<unk>", "<bos>", "<eos>"],
//!   "word_end": "</w>"
//! }
//! ```
//!
//! `merges` order is significant and kept exactly. `special_tokens` may be
//! absent in older records and falls back to the canonical list; nothing else
//! has a default.

use crate::bpe::{BpeTokenizer, MergeRule};
use crate::{SpecialToken, TokenizerError, Vocabulary};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Serializable form of a [`BpeTokenizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Merge pairs in learned order
    pub merges: Vec<(String, String)>,
    /// Symbol -> ID; written in ID order
    #[serde(serialize_with = "serialize_by_id")]
    pub vocab: HashMap<String, u32>,
    #[serde(default = "SpecialToken::default_strings")]
    pub special_tokens: Vec<String>,
    pub word_end: String,
}

fn serialize_by_id<S>(vocab: &HashMap<String, u32>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut entries: Vec<(&String, &u32)> = vocab.iter().collect();
    entries.sort_by_key(|&(_, id)| *id);
    serializer.collect_map(entries)
}

impl ModelRecord {
    pub fn from_tokenizer(tokenizer: &BpeTokenizer) -> Self {
        Self {
            merges: tokenizer
                .merges()
                .iter()
                .map(|m| (m.first.clone(), m.second.clone()))
                .collect(),
            vocab: tokenizer
                .vocab()
                .iter()
                .map(|(id, token)| (token.to_string(), id))
                .collect(),
            special_tokens: tokenizer.special_tokens().to_vec(),
            word_end: tokenizer.word_end().to_string(),
        }
    }

    /// Rebuild the tokenizer, validating the record on the way
    pub fn into_tokenizer(self) -> Result<BpeTokenizer, TokenizerError> {
        let vocab = Vocabulary::from_map(self.vocab)?;
        let merges = self
            .merges
            .iter()
            .map(|(first, second)| MergeRule::new(first, second))
            .collect();
        BpeTokenizer::from_parts(merges, vocab, self.special_tokens, self.word_end)
    }
}

impl BpeTokenizer {
    /// Serialize tokenizer to JSON
    pub fn to_json(&self) -> Result<String, TokenizerError> {
        serde_json::to_string_pretty(&ModelRecord::from_tokenizer(self))
            .map_err(|e| TokenizerError::SerializationError(e.to_string()))
    }

    /// Deserialize tokenizer from JSON
    pub fn from_json(json: &str) -> Result<Self, TokenizerError> {
        let record: ModelRecord = serde_json::from_str(json)
            .map_err(|e| TokenizerError::MalformedRecord(e.to_string()))?;
        record.into_tokenizer()
    }

    /// Save tokenizer to file
    pub fn save(&self, path: &Path) -> Result<(), TokenizerError> {
        let json = self.to_json()?;
        fs::write(path, json)
            .map_err(|e| TokenizerError::IoError(format!("{}: {}", path.display(), e)))
    }

    /// Load tokenizer from file.
    ///
    /// A missing file is reported as [`TokenizerError::ModelNotFound`], a file
    /// that parses badly as [`TokenizerError::MalformedRecord`].
    pub fn load(path: &Path) -> Result<Self, TokenizerError> {
        let json = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TokenizerError::ModelNotFound(path.display().to_string()),
            _ => TokenizerError::IoError(format!("{}: {}", path.display(), e)),
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Trainer, TrainerConfig, WORD_END};

    fn trained() -> BpeTokenizer {
        let config = TrainerConfig {
            vocab_size_limit: 60,
            min_pair_freq: 1,
            log_interval: 0,
        };
        Trainer::new(config)
            .train(&["hello world hello world", "help held helm"])
            .unwrap()
    }

    #[test]
    fn test_serialization_roundtrip() {
        let tokenizer = trained();

        let json = tokenizer.to_json().unwrap();
        let loaded = BpeTokenizer::from_json(&json).unwrap();

        assert_eq!(loaded.merges(), tokenizer.merges());
        assert_eq!(loaded.vocab(), tokenizer.vocab());
        assert_eq!(loaded, tokenizer);

        let text = "hello help";
        assert_eq!(loaded.encode(text), tokenizer.encode(text));
    }

    #[test]
    fn test_record_field_names() {
        let json = trained().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["merges"].is_array());
        assert_eq!(value["merges"][0].as_array().unwrap().len(), 2);
        assert_eq!(value["vocab"]["<pad>"], 0);
        assert_eq!(value["special_tokens"][1], "<unk>");
        assert_eq!(value["word_end"], WORD_END);
    }

    #[test]
    fn test_vocab_written_in_id_order() {
        let json = trained().to_json().unwrap();
        let pad = json.find("\"<pad>\": 0").unwrap();
        let eos = json.find("\"<eos>\": 3").unwrap();
        assert!(pad < eos);
    }

    #[test]
    fn test_missing_special_tokens_falls_back() {
        let json = r#"{
            "merges": [["a", "b"]],
            "vocab": {"<pad>": 0, "<unk>": 1, "<bos>": 2, "<eos>": 3,
                      "</w>": 4, "a": 5, "b": 6, "ab": 7},
            "word_end": "</w>"
        }"#;
        let tokenizer = BpeTokenizer::from_json(json).unwrap();
        assert_eq!(tokenizer.special_tokens(), SpecialToken::default_strings().as_slice());
        assert_eq!(tokenizer.decode(&tokenizer.encode("ab")), "ab");
    }

    #[test]
    fn test_missing_merges_is_malformed() {
        let json = r#"{"vocab": {"<pad>": 0}, "word_end": "</w>"}"#;
        let err = BpeTokenizer::from_json(json).unwrap_err();
        assert!(matches!(err, TokenizerError::MalformedRecord(_)));
    }

    #[test]
    fn test_missing_vocab_is_malformed() {
        let json = r#"{"merges": [], "word_end": "</w>"}"#;
        let err = BpeTokenizer::from_json(json).unwrap_err();
        assert!(matches!(err, TokenizerError::MalformedRecord(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = BpeTokenizer::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TokenizerError::MalformedRecord(_)));
    }

    #[test]
    fn test_file_save_load() {
        let tokenizer = trained();

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("telugu_bpe_tokenizer.json");

        tokenizer.save(&path).unwrap();
        let loaded = BpeTokenizer::load(&path).unwrap();

        assert_eq!(loaded.vocab_size(), tokenizer.vocab_size());
        assert_eq!(loaded.merges(), tokenizer.merges());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("absent.json");

        let err = BpeTokenizer::load(&path).unwrap_err();
        assert!(matches!(err, TokenizerError::ModelNotFound(_)));
    }
}
