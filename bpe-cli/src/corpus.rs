//! Corpus loading and train/validation split

use anyhow::{bail, Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Read every *.txt file in `dir`, sorted by path, as NFC text.
///
/// Fails if the directory has no text files.
pub fn read_texts(dir: &Path) -> Result<Vec<String>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read data directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("no .txt files found in {}/", dir.display());
    }

    let mut texts = Vec::with_capacity(paths.len());
    for path in &paths {
        debug!("reading {}", path.display());
        texts.push(read_nfc(path)?);
    }
    info!("loaded {} corpus files from {}", texts.len(), dir.display());
    Ok(texts)
}

/// Read one file as NFC-normalized text
pub fn read_nfc(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(raw.nfc().collect())
}

/// Shuffle with a fixed seed and split off a validation set.
///
/// A single text is used for both sets so training is never empty. Otherwise
/// at least one text is held out.
pub fn split_corpus(mut texts: Vec<String>, val_ratio: f64, seed: u64) -> (Vec<String>, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    texts.shuffle(&mut rng);

    if texts.len() <= 1 {
        return (texts.clone(), texts);
    }

    let n_val = ((texts.len() as f64 * val_ratio) as usize).max(1);
    let train = texts.split_off(n_val);
    (train, texts)
}
