//! Text vectorization using TF-IDF over word n-grams.
//!
//! The building blocks (`tokenize_text`, `count_ngrams`, `smooth_idf`,
//! `l2_normalize`) are public so that a scorer working from an exported
//! vocabulary and IDF table reproduces the transform exactly.

mod vectorizer;

pub use vectorizer::{
    CountVectorizer, DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_DF, DEFAULT_MIN_NGRAM,
    MAX_NGRAM_SIZE, NGRAM_SEPARATOR, TOKEN_PATTERN, TfidfVectorizer, VectorizerParams,
    count_ngrams, l2_norm, l2_normalize, smooth_idf, tokenize_text,
};
