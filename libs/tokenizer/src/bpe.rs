//! The trained BPE model: merge table, vocabulary, encode and decode

use crate::merge::{merge_pass, SymbolPair};
use crate::text::{normalize, symbolize};
use crate::{SpecialToken, TokenizerError, Vocabulary, WORD_END};
use std::collections::{HashMap, HashSet};

/// A merge rule learned during BPE training
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeRule {
    /// First symbol in the pair
    pub first: String,
    /// Second symbol in the pair
    pub second: String,
    /// Resulting merged symbol
    pub merged: String,
}

impl MergeRule {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            merged: format!("{}{}", first, second),
        }
    }

    pub fn pair(&self) -> SymbolPair {
        SymbolPair::new(&self.first, &self.second)
    }
}

impl From<SymbolPair> for MergeRule {
    fn from(pair: SymbolPair) -> Self {
        Self::new(&pair.0, &pair.1)
    }
}

/// BPE tokenizer model.
///
/// Built once by the [`Trainer`](crate::Trainer) or loaded from disk, then
/// only read. Encode and decode take `&self`, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpeTokenizer {
    /// Merge rules in the order they were learned
    merges: Vec<MergeRule>,
    /// Symbol <-> ID mapping
    vocab: Vocabulary,
    /// Special token surface forms, in `SpecialToken::all()` order
    special_tokens: Vec<String>,
    /// End-of-word marker
    word_end: String,
    /// Fast lookup for merge rules: first -> {second}
    merge_lookup: HashMap<String, HashSet<String>>,
    /// IDs of the special tokens, in `SpecialToken::all()` order
    special_ids: [u32; 4],
}

impl BpeTokenizer {
    /// An untrained tokenizer: special tokens and the end marker only.
    ///
    /// Every character encodes to the unknown ID.
    pub fn new() -> Self {
        let special_tokens = SpecialToken::default_strings();
        let mut vocab = Vocabulary::with_tokens(&special_tokens);
        vocab.add_token(WORD_END);

        Self {
            merges: Vec::new(),
            vocab,
            special_tokens,
            word_end: WORD_END.to_string(),
            merge_lookup: HashMap::new(),
            special_ids: [0, 1, 2, 3],
        }
    }

    /// Assemble a model from its parts, checking that they agree.
    ///
    /// Every special token, the end marker and every merged symbol must be
    /// present in the vocabulary.
    pub fn from_parts(
        merges: Vec<MergeRule>,
        vocab: Vocabulary,
        special_tokens: Vec<String>,
        word_end: String,
    ) -> Result<Self, TokenizerError> {
        if special_tokens.len() != SpecialToken::all().len() {
            return Err(TokenizerError::MalformedRecord(format!(
                "expected {} special tokens, found {}",
                SpecialToken::all().len(),
                special_tokens.len()
            )));
        }

        let mut special_ids = [0u32; 4];
        for (slot, token) in special_ids.iter_mut().zip(&special_tokens) {
            *slot = vocab.get_id(token).ok_or_else(|| {
                TokenizerError::MalformedRecord(format!(
                    "special token {:?} missing from vocab",
                    token
                ))
            })?;
        }

        if !vocab.contains(&word_end) {
            return Err(TokenizerError::MalformedRecord(format!(
                "word end marker {:?} missing from vocab",
                word_end
            )));
        }

        let mut merge_lookup: HashMap<String, HashSet<String>> = HashMap::new();
        for (rank, merge) in merges.iter().enumerate() {
            if merge.merged == word_end || special_tokens.contains(&merge.merged) {
                return Err(TokenizerError::MalformedRecord(format!(
                    "merge #{} ({:?}, {:?}) produces reserved symbol {:?}",
                    rank, merge.first, merge.second, merge.merged
                )));
            }
            if !vocab.contains(&merge.merged) {
                return Err(TokenizerError::MalformedRecord(format!(
                    "merge #{} ({:?}, {:?}) produces {:?}, which is not in vocab",
                    rank, merge.first, merge.second, merge.merged
                )));
            }
            merge_lookup
                .entry(merge.first.clone())
                .or_default()
                .insert(merge.second.clone());
        }

        Ok(Self {
            merges,
            vocab,
            special_tokens,
            word_end,
            merge_lookup,
            special_ids,
        })
    }

    /// Get the vocabulary
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Get the vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Get the merge rules, in learned order
    pub fn merges(&self) -> &[MergeRule] {
        &self.merges
    }

    /// Get the special token surface forms, in `SpecialToken::all()` order
    pub fn special_tokens(&self) -> &[String] {
        &self.special_tokens
    }

    /// Get the end-of-word marker
    pub fn word_end(&self) -> &str {
        &self.word_end
    }

    /// Get the ID for a special token
    pub fn special_token_id(&self, token: SpecialToken) -> u32 {
        self.special_ids[token.index()]
    }

    /// ID of `<unk>`, used for symbols outside the vocabulary
    pub fn unk_id(&self) -> u32 {
        self.special_token_id(SpecialToken::Unk)
    }

    /// ID of `<bos>`
    pub fn bos_id(&self) -> u32 {
        self.special_token_id(SpecialToken::Bos)
    }

    /// ID of `<eos>`
    pub fn eos_id(&self) -> u32 {
        self.special_token_id(SpecialToken::Eos)
    }

    /// ID for a symbol, falling back to the unknown ID
    pub fn token_to_id(&self, symbol: &str) -> u32 {
        self.vocab.get_id(symbol).unwrap_or_else(|| self.unk_id())
    }

    /// Symbol for an ID, if the ID is in the vocabulary
    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.vocab.get_token(id)
    }

    fn is_merge(&self, first: &str, second: &str) -> bool {
        self.merge_lookup
            .get(first)
            .is_some_and(|seconds| seconds.contains(second))
    }

    fn is_special(&self, symbol: &str) -> bool {
        self.special_tokens.iter().any(|t| t == symbol)
    }

    /// Segment one word into symbols.
    ///
    /// Every learned merge is applied wherever it matches, pass after pass,
    /// until a pass changes nothing. Rank among merges plays no part here.
    pub fn encode_word(&self, word: &str) -> Vec<String> {
        let mut symbols = symbolize(word);
        if self.merges.is_empty() {
            return symbols;
        }

        while let Some(next) = merge_pass(&symbols, |l, r| self.is_merge(l, r)) {
            symbols = next;
        }
        symbols
    }

    /// Encode text into token IDs
    pub fn encode(&self, text: &str) -> Vec<u32> {
        let text = normalize(text);
        if text.is_empty() {
            return Vec::new();
        }

        text.split(' ')
            .flat_map(|word| self.encode_word(word))
            .map(|symbol| self.token_to_id(&symbol))
            .collect()
    }

    /// Encode with special tokens (BOS and EOS)
    pub fn encode_with_special(&self, text: &str) -> Vec<u32> {
        let mut ids = vec![self.bos_id()];
        ids.extend(self.encode(text));
        ids.push(self.eos_id());
        ids
    }

    /// Decode token IDs back to text.
    ///
    /// Symbols accumulate until one ending in the end marker closes the word,
    /// whether that is the bare marker or a symbol merged with it. Special tokens
    /// are dropped from the output, and IDs outside the vocabulary decode as
    /// `<unk>`, which is dropped the same way. A trailing word with no end
    /// marker is still emitted.
    pub fn decode(&self, token_ids: &[u32]) -> String {
        let unk = self.special_tokens[SpecialToken::Unk.index()].as_str();
        let mut words: Vec<String> = Vec::new();
        let mut current = String::new();

        for &id in token_ids {
            let symbol = self.vocab.get_token(id).unwrap_or(unk);

            if self.is_special(symbol) {
                continue;
            }
            match symbol.strip_suffix(self.word_end.as_str()) {
                Some(stem) => {
                    current.push_str(stem);
                    words.push(std::mem::take(&mut current));
                }
                None => current.push_str(symbol),
            }
        }

        if !current.is_empty() {
            words.push(current);
        }

        words.join(" ")
    }
}

impl Default for BpeTokenizer {
    fn default() -> Self {
        Self::new()
    }
}
