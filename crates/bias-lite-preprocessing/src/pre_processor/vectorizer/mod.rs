mod count_vectorizer;
mod ngrams;
mod params;
mod tfidf_vectorizer;
mod tokenizer;

pub use count_vectorizer::CountVectorizer;
pub use ngrams::{NGRAM_SEPARATOR, count_ngrams};
pub use params::{
    DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_DF, DEFAULT_MIN_NGRAM, MAX_NGRAM_SIZE,
    VectorizerParams,
};
pub use tfidf_vectorizer::{TfidfVectorizer, l2_norm, l2_normalize, smooth_idf};
pub use tokenizer::{TOKEN_PATTERN, tokenize_text};
