use std::{borrow::Cow, sync::LazyLock};

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator, ProgressStyle};
use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

/// Pattern a token must match after lowercasing: a maximal run of Unicode
/// letters and digits. Published in the exported artifact so external
/// scorers split text the same way.
pub const TOKEN_PATTERN: &str = r"[\p{L}\p{N}]+";

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("TOKEN_PATTERN is a valid regex"));

/// Minimum number of texts to consider parallelization
const MIN_TEXTS_FOR_PARALLEL: usize = 100;

/// Minimum total character count to consider parallelization
const MIN_CHARS_FOR_PARALLEL: usize = 10_000;

fn progress_bar_setup(len: usize, message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("progress template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb
}

/// Lowercase `text` and split it into word tokens.
#[must_use]
pub fn tokenize_text(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_owned())
        .collect()
}

fn tokenize_texts_par<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using parallel tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts in parallel");
    // indexed collect keeps document order
    let result = texts
        .par_iter()
        .progress_with(pb.clone())
        .map(|text| tokenize_text(text.as_ref()))
        .collect();
    pb.finish_with_message("Parallel tokenization complete");
    result
}

fn tokenize_texts<T: AsRef<str>>(texts: &[T]) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using sequential tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts");

    let result = texts
        .iter()
        .progress_with(pb.clone())
        .map(|text| tokenize_text(text.as_ref()))
        .collect();
    pb.finish_with_message("Tokenization complete");
    result
}

/// Parallel once either the text count or the total byte length crosses its
/// threshold.
#[inline]
fn should_use_parallel<T: AsRef<str>>(texts: &[T]) -> bool {
    texts.len() >= MIN_TEXTS_FOR_PARALLEL
        || texts.iter().map(|text| text.as_ref().len()).sum::<usize>() >= MIN_CHARS_FOR_PARALLEL
}

/// Tokenize every text, preserving input order.
pub fn tokenize<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<Vec<String>> {
    if should_use_parallel(texts) {
        tokenize_texts_par(texts)
    } else {
        tokenize_texts(texts)
    }
}
