//! Pair statistics and merge application over a symbolized corpus

use crate::text::{normalize, symbolize};
use std::collections::HashMap;

/// An ordered pair of adjacent symbols
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolPair(pub String, pub String);

impl SymbolPair {
    pub fn new(left: &str, right: &str) -> Self {
        Self(left.to_string(), right.to_string())
    }

    /// The symbol produced by merging this pair
    pub fn merged(&self) -> String {
        format!("{}{}", self.0, self.1)
    }
}

/// A distinct word with its current segmentation and occurrence count.
///
/// Identical words always segment identically, so the corpus stores each one
/// once and weights its pairs by `count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub symbols: Vec<String>,
    pub count: u64,
}

impl Word {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols, count: 1 }
    }
}

/// Adjacent-pair frequencies, kept in first-encounter order.
///
/// Order matters: among pairs tied on frequency, the one seen first while
/// scanning the corpus word by word, left to right, wins.
#[derive(Debug, Default)]
pub struct PairCounts<'a> {
    entries: Vec<((&'a str, &'a str), u64)>,
    index: HashMap<(&'a str, &'a str), usize>,
}

impl<'a> PairCounts<'a> {
    fn add(&mut self, left: &'a str, right: &'a str, count: u64) {
        match self.index.get(&(left, right)) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.index.insert((left, right), self.entries.len());
                self.entries.push(((left, right), count));
            }
        }
    }

    /// Frequency of a pair (0 if never seen)
    pub fn get(&self, left: &str, right: &str) -> u64 {
        self.index
            .get(&(left, right))
            .map(|&i| self.entries[i].1)
            .unwrap_or(0)
    }

    /// Number of distinct pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs with their counts, in first-encounter order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str, u64)> + '_ {
        self.entries.iter().map(|&((l, r), c)| (l, r, c))
    }

    /// Highest-frequency pair; ties go to the earliest encountered
    pub fn most_frequent(&self) -> Option<(SymbolPair, u64)> {
        self.most_frequent_where(|_, _| true)
    }

    /// Highest-frequency pair among those `allowed` accepts, with the same
    /// tie-break as [`most_frequent`](Self::most_frequent)
    pub fn most_frequent_where<F>(&self, mut allowed: F) -> Option<(SymbolPair, u64)>
    where
        F: FnMut(&str, &str) -> bool,
    {
        let mut best: Option<((&str, &str), u64)> = None;
        for &(pair, count) in &self.entries {
            if !allowed(pair.0, pair.1) {
                continue;
            }
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((pair, count)),
            }
        }
        best.map(|((l, r), count)| (SymbolPair::new(l, r), count))
    }
}

/// Count every adjacent symbol pair across all words in one pass
pub fn count_pairs(words: &[Word]) -> PairCounts<'_> {
    let mut counts = PairCounts::default();
    for word in words {
        for window in word.symbols.windows(2) {
            counts.add(&window[0], &window[1], word.count);
        }
    }
    counts
}

/// One left-to-right, non-overlapping merge pass over a symbol sequence.
///
/// Whenever `should_merge` accepts the symbols at `i` and `i + 1`, they are
/// emitted as one symbol and the scan resumes at `i + 2`. Returns `None` when
/// nothing was merged. Training and encoding both go through here so they
/// cannot disagree on overlap handling.
pub fn merge_pass<F>(symbols: &[String], mut should_merge: F) -> Option<Vec<String>>
where
    F: FnMut(&str, &str) -> bool,
{
    let mut result = Vec::with_capacity(symbols.len());
    let mut merged_any = false;
    let mut i = 0;

    while i < symbols.len() {
        if i + 1 < symbols.len() && should_merge(&symbols[i], &symbols[i + 1]) {
            result.push(format!("{}{}", symbols[i], symbols[i + 1]));
            merged_any = true;
            i += 2;
        } else {
            result.push(symbols[i].clone());
            i += 1;
        }
    }

    merged_any.then_some(result)
}

/// Rewrite every word, collapsing each occurrence of `pair` into one symbol
pub fn apply_merge(pair: &SymbolPair, words: &[Word]) -> Vec<Word> {
    words
        .iter()
        .map(|word| {
            let symbols = merge_pass(&word.symbols, |l, r| l == pair.0 && r == pair.1)
                .unwrap_or_else(|| word.symbols.clone());
            Word {
                symbols,
                count: word.count,
            }
        })
        .collect()
}

/// The training corpus: distinct words in first-occurrence order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    words: Vec<Word>,
}

impl Corpus {
    /// Normalize each text, split on spaces, and symbolize every word.
    ///
    /// Texts that normalize to nothing contribute no words.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut words: Vec<Word> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let text = normalize(text.as_ref());
            if text.is_empty() {
                continue;
            }
            for word in text.split(' ') {
                match seen.get(word) {
                    Some(&i) => words[i].count += 1,
                    None => {
                        seen.insert(word.to_string(), words.len());
                        words.push(Word::new(symbolize(word)));
                    }
                }
            }
        }

        Self { words }
    }

    /// Build a corpus from already-symbolized sequences
    pub fn from_sequences<I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut words: Vec<Word> = Vec::new();
        let mut seen: HashMap<Vec<String>, usize> = HashMap::new();

        for symbols in sequences {
            match seen.get(&symbols) {
                Some(&i) => words[i].count += 1,
                None => {
                    seen.insert(symbols.clone(), words.len());
                    words.push(Word::new(symbols));
                }
            }
        }

        Self { words }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Total number of word occurrences
    pub fn total_words(&self) -> u64 {
        self.words.iter().map(|w| w.count).sum()
    }

    /// Every symbol currently present, with repeats
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.words
            .iter()
            .flat_map(|w| w.symbols.iter().map(|s| s.as_str()))
    }

    pub fn count_pairs(&self) -> PairCounts<'_> {
        count_pairs(&self.words)
    }

    pub fn apply_merge(&self, pair: &SymbolPair) -> Corpus {
        Corpus {
            words: apply_merge(pair, &self.words),
        }
    }
}
