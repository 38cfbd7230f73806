//! Pre-processing for bias-lite.
//!
//! Loading labeled examples, the stratified train/test split, and the word
//! n-gram TF-IDF vectorizer whose fitted state gets exported alongside the
//! classifier.

pub mod data_loader;
mod error;
pub mod pre_processor;

pub use error::{Error, Result};
