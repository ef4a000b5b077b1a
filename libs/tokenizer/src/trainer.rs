//! BPE training
//!
//! Learns merge rules from a list of texts by repeatedly merging the most
//! frequent adjacent symbol pair:
//! 1. Normalize, split on spaces, and symbolize every word
//! 2. Seed the vocabulary: special tokens, then observed symbols sorted by code point
//! 3. Count pairs, merge the best one across the corpus, record it
//! 4. Repeat until the vocabulary limit is hit or no pair is frequent enough

use log::{debug, info, warn};

use crate::bpe::{BpeTokenizer, MergeRule};
use crate::merge::Corpus;
use crate::{SpecialToken, TokenizerError, TrainerConfig, Vocabulary, WORD_END};

/// Why the merge loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Vocabulary reached `vocab_size_limit`
    VocabLimitReached,
    /// No pair left that can be merged without forming a reserved symbol
    PairsExhausted,
    /// The best remaining pair occurs fewer than `min_pair_freq` times
    BelowMinFrequency,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::VocabLimitReached => write!(f, "vocab size limit reached"),
            StopReason::PairsExhausted => write!(f, "no more pairs to merge"),
            StopReason::BelowMinFrequency => write!(f, "best pair below min_pair_freq"),
        }
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSummary {
    /// Vocabulary size before the first merge
    pub initial_vocab_size: usize,
    /// Number of merge rules recorded
    pub merges_learned: usize,
    /// Vocabulary size after training
    pub final_vocab_size: usize,
    pub stop_reason: StopReason,
}

/// Learns merge rules from a text corpus
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Create a new trainer with the given configuration.
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train a tokenizer on a list of texts.
    pub fn train<S: AsRef<str>>(&self, texts: &[S]) -> Result<BpeTokenizer, TokenizerError> {
        self.train_with_summary(texts).map(|(tokenizer, _)| tokenizer)
    }

    /// Train a tokenizer and report how the run went.
    pub fn train_with_summary<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<(BpeTokenizer, TrainingSummary), TokenizerError> {
        self.validate()?;
        self.train_corpus(Corpus::from_texts(texts))
    }

    fn validate(&self) -> Result<(), TokenizerError> {
        let num_special = SpecialToken::all().len();
        if self.config.vocab_size_limit <= num_special {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab_size_limit ({}) must exceed the {} special tokens",
                self.config.vocab_size_limit, num_special
            )));
        }
        Ok(())
    }

    /// Run the merge loop over an already-built corpus.
    fn train_corpus(
        &self,
        mut corpus: Corpus,
    ) -> Result<(BpeTokenizer, TrainingSummary), TokenizerError> {
        if corpus.is_empty() {
            warn!("Training corpus is empty; model will only segment per character");
        }

        let special_tokens = SpecialToken::default_strings();
        let mut vocab = initial_vocab(&corpus, &special_tokens);
        let initial_vocab_size = vocab.len();
        let mut merges: Vec<MergeRule> = Vec::new();

        info!(
            "Training BPE: {} distinct words ({} total), {} initial symbols, vocab limit {}",
            corpus.len(),
            corpus.total_words(),
            initial_vocab_size - special_tokens.len(),
            self.config.vocab_size_limit
        );

        let stop_reason = loop {
            if vocab.len() >= self.config.vocab_size_limit {
                break StopReason::VocabLimitReached;
            }

            let Some((pair, freq)) = corpus
                .count_pairs()
                .most_frequent_where(|l, r| is_admissible(l, r, &special_tokens))
            else {
                break StopReason::PairsExhausted;
            };

            if (freq as usize) < self.config.min_pair_freq {
                break StopReason::BelowMinFrequency;
            }

            corpus = corpus.apply_merge(&pair);
            let merge = MergeRule::from(pair);
            let id = vocab.add_token(&merge.merged);

            debug!(
                "merge {}: ({:?}, {:?}) -> {:?} id={} freq={}",
                merges.len() + 1,
                merge.first,
                merge.second,
                merge.merged,
                id,
                freq
            );
            merges.push(merge);

            if self.config.log_interval > 0 && merges.len() % self.config.log_interval == 0 {
                let last = &merges[merges.len() - 1];
                info!(
                    "Merges: {}, vocab size: {}, best pair: ({:?}, {:?}) freq {}",
                    merges.len(),
                    vocab.len(),
                    last.first,
                    last.second,
                    freq
                );
            }
        };

        info!(
            "Training complete: {} merges learned, vocab size = {} ({})",
            merges.len(),
            vocab.len(),
            stop_reason
        );

        let summary = TrainingSummary {
            initial_vocab_size,
            merges_learned: merges.len(),
            final_vocab_size: vocab.len(),
            stop_reason,
        };
        let tokenizer =
            BpeTokenizer::from_parts(merges, vocab, special_tokens, WORD_END.to_string())?;

        Ok((tokenizer, summary))
    }
}

/// Whether merging `left` and `right` keeps every reserved symbol intact.
///
/// A merge may never spell out a special token or the bare end marker, and
/// the marker may only appear in a merged symbol as its real trailing
/// boundary, carried in from the right-hand symbol.
fn is_admissible(left: &str, right: &str, special_tokens: &[String]) -> bool {
    let merged = format!("{}{}", left, right);
    if merged == WORD_END || special_tokens.iter().any(|t| *t == merged) {
        return false;
    }
    match merged.find(WORD_END) {
        None => true,
        Some(pos) => pos + WORD_END.len() == merged.len() && right.ends_with(WORD_END),
    }
}

/// Special tokens first, then every distinct symbol sorted by code point.
///
/// The end marker sorts in with the characters when words were seen and is
/// appended otherwise, so it is always present.
fn initial_vocab(corpus: &Corpus, special_tokens: &[String]) -> Vocabulary {
    let mut symbols: Vec<&str> = corpus.symbols().collect();
    symbols.sort_unstable();
    symbols.dedup();

    let mut vocab = Vocabulary::with_tokens(special_tokens);
    for symbol in symbols {
        vocab.add_token(symbol);
    }
    vocab.add_token(WORD_END);
    vocab
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SymbolPair;

    fn config(vocab_size_limit: usize, min_pair_freq: usize) -> TrainerConfig {
        TrainerConfig {
            vocab_size_limit,
            min_pair_freq,
            log_interval: 0,
        }
    }

    #[test]
    fn test_train_basic() {
        let trainer = Trainer::new(config(100, 1));
        let tokenizer = trainer.train(&["hello hello hello", "world world"]).unwrap();

        assert!(tokenizer.vocab_size() > 4);
        assert!(!tokenizer.merges().is_empty());
    }

    #[test]
    fn test_initial_vocab_order() {
        let trainer = Trainer::new(config(5000, 1000));
        let tokenizer = trainer.train(&["ba ca"]).unwrap();

        let tokens: Vec<_> = tokenizer.vocab().iter().map(|(_, t)| t).collect();
        // "<" (0x3C) sorts before lowercase letters
        assert_eq!(
            tokens,
            vec!["<pad>", "<unk>", "<bos>", "<eos>", "</w>", "a", "b", "c"]
        );
    }

    #[test]
    fn test_first_merge_is_most_frequent_pair() {
        // symbolized: a a </w> x3, a b </w> x3
        // counts: (a,a)=3 (a,</w>)=3 (a,b)=3 (b,</w>)=3; (a,a) is seen first
        let trainer = Trainer::new(config(1000, 1));
        let tokenizer = trainer.train(&["aa ab ab", "aa aa ab"]).unwrap();

        assert_eq!(tokenizer.merges()[0].pair(), SymbolPair::new("a", "a"));
    }

    #[test]
    fn test_tie_break_follows_corpus_order() {
        // (x,y) and (p,q) both occur twice; (p,q) is encountered first
        let trainer = Trainer::new(config(1000, 1));
        let tokenizer = trainer.train(&["pq xy", "xy pq"]).unwrap();
        assert_eq!(tokenizer.merges()[0].pair(), SymbolPair::new("p", "q"));

        let tokenizer = trainer.train(&["xy pq", "pq xy"]).unwrap();
        assert_eq!(tokenizer.merges()[0].pair(), SymbolPair::new("x", "y"));
    }

    #[test]
    fn test_vocab_limit_is_respected() {
        let trainer = Trainer::new(config(10, 1));
        let (tokenizer, summary) = trainer
            .train_with_summary(&["the quick brown fox jumps over the lazy dog"])
            .unwrap();

        assert!(tokenizer.vocab_size() <= 10.max(summary.initial_vocab_size));
        assert_eq!(summary.stop_reason, StopReason::VocabLimitReached);
        assert!(tokenizer.merges().is_empty());
    }

    #[test]
    fn test_min_frequency_cutoff() {
        let trainer = Trainer::new(config(300, 100));
        let (tokenizer, summary) = trainer.train_with_summary(&["hello world"]).unwrap();

        assert_eq!(tokenizer.merges().len(), 0);
        assert_eq!(summary.stop_reason, StopReason::BelowMinFrequency);
    }

    #[test]
    fn test_pairs_exhausted() {
        let trainer = Trainer::new(config(1000, 1));
        let (tokenizer, summary) = trainer.train_with_summary(&["ab ab"]).unwrap();

        assert_eq!(summary.stop_reason, StopReason::PairsExhausted);
        assert_eq!(tokenizer.encode_word("ab"), vec!["ab</w>"]);
        assert_eq!(summary.merges_learned, tokenizer.merges().len());
        assert_eq!(summary.final_vocab_size, tokenizer.vocab_size());
    }

    #[test]
    fn test_empty_corpus() {
        let trainer = Trainer::new(config(100, 1));
        let (tokenizer, summary) = trainer.train_with_summary::<&str>(&[]).unwrap();

        assert!(tokenizer.merges().is_empty());
        assert_eq!(summary.stop_reason, StopReason::PairsExhausted);
        assert_eq!(tokenizer.vocab_size(), 5);
        assert!(tokenizer.vocab().contains(WORD_END));
    }

    #[test]
    fn test_invalid_vocab_limit() {
        let trainer = Trainer::new(config(4, 1));
        let result = trainer.train(&["abc"]);
        assert!(matches!(result, Err(TokenizerError::InvalidConfig(_))));
    }

    #[test]
    fn test_training_is_deterministic() {
        let texts = ["the cat sat on the mat", "the dog sat on the log", "cats and dogs"];
        let trainer = Trainer::new(config(60, 1));

        let a = trainer.train(&texts).unwrap();
        let b = trainer.train(&texts).unwrap();

        assert_eq!(a.merges(), b.merges());
        assert_eq!(a.vocab(), b.vocab());
    }

    fn assert_no_reserved_merges(tokenizer: &BpeTokenizer) {
        for merge in tokenizer.merges() {
            assert_ne!(merge.merged, WORD_END);
            assert!(!tokenizer.special_tokens().contains(&merge.merged));
            if let Some(pos) = merge.merged.find(WORD_END) {
                assert_eq!(pos + WORD_END.len(), merge.merged.len());
            }
        }
    }

    #[test]
    fn test_never_merges_into_special_token() {
        let trainer = Trainer::new(config(100, 1));
        let tokenizer = trainer.train(&["<unk>a <unk>b"]).unwrap();

        assert!(!tokenizer.merges().is_empty());
        assert_no_reserved_merges(&tokenizer);
        for text in ["<unk>a", "<unk>b", "<unk>a <unk>b"] {
            assert_eq!(tokenizer.decode(&tokenizer.encode(text)), text);
        }
    }

    #[test]
    fn test_never_merges_into_word_end() {
        let trainer = Trainer::new(config(100, 1));
        let tokenizer = trainer.train(&["</w>x </w>y"]).unwrap();

        assert!(!tokenizer.merges().is_empty());
        assert_no_reserved_merges(&tokenizer);
        for text in ["</w>x", "</w>y", "</w>x </w>y"] {
            assert_eq!(tokenizer.decode(&tokenizer.encode(text)), text);
        }
    }

    #[test]
    fn test_is_admissible() {
        let specials = SpecialToken::default_strings();
        assert!(is_admissible("a", "b", &specials));
        assert!(is_admissible("ab", WORD_END, &specials));
        assert!(is_admissible("<u", "nk", &specials));
        assert!(!is_admissible("<unk", ">", &specials));
        assert!(!is_admissible("</w", ">", &specials));
        assert!(!is_admissible("</w", ">x</w>", &specials));
        assert!(!is_admissible("a</w", ">", &specials));
    }

    #[test]
    fn test_merged_symbols_get_next_ids() {
        let trainer = Trainer::new(config(1000, 1));
        let (tokenizer, summary) = trainer.train_with_summary(&["abab abab"]).unwrap();

        for (offset, merge) in tokenizer.merges().iter().enumerate() {
            let expected = (summary.initial_vocab_size + offset) as u32;
            assert_eq!(tokenizer.vocab().get_id(&merge.merged), Some(expected));
        }
    }
}
