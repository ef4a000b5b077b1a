//! Results block in the project README

use anyhow::{Context, Result};
use bpe_tokenizer::TrainingStats;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const RESULTS_HEADER: &str = "### Results (Auto-filled)";

static NEXT_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n#{1,2} ").unwrap());

fn results_block(stats: &TrainingStats) -> String {
    format!(
        "{}\n- **Tokenizer vocabulary size**: `{}`\n- **Compression ratio (val)**: `{:.4}`\n",
        RESULTS_HEADER, stats.vocab_size, stats.compression_ratio_val
    )
}

/// Replace the results block in `body`, or append one.
///
/// An existing block runs until the next `#` or `##` heading.
pub fn with_results(body: &str, stats: &TrainingStats) -> String {
    let block = results_block(stats);

    let Some(start) = body.find(RESULTS_HEADER) else {
        return format!("{}\n\n{}", body, block);
    };

    let end = NEXT_HEADING
        .find_at(body, start + 1)
        .map(|m| m.start())
        .unwrap_or(body.len());

    format!("{}{}{}", &body[..start], block, &body[end..])
}

/// Rewrite the results block of the README at `path`, creating it if needed
pub fn update_readme(path: &Path, stats: &TrainingStats) -> Result<()> {
    let body = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        String::new()
    };

    fs::write(path, with_results(&body, stats))
        .with_context(|| format!("failed to write {}", path.display()))
}
