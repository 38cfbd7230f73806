use ahash::HashMap;
use sprs::{CsMat, CsVec};
use tracing::debug;

use super::{count_vectorizer::CountVectorizer, params::VectorizerParams};

/// Smoothed inverse document frequency: `ln((1 + n_docs) / (1 + df)) + 1`.
///
/// Strictly positive for every `df <= n_docs`.
#[inline]
#[must_use]
pub fn smooth_idf(n_docs: usize, doc_freq: usize) -> f64 {
    ((n_docs as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0
}

/// Divide every value by the Euclidean norm of the entries. All-zero input
/// is left untouched.
pub fn l2_normalize(values: &mut [f64]) {
    let norm = l2_norm(values.iter());
    if norm > 0.0 {
        for val in values {
            *val /= norm;
        }
    }
}

/// Euclidean norm, summed in iteration order.
#[inline]
#[must_use]
pub fn l2_norm<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    values.into_iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Word n-gram TF-IDF vectorizer with L2-normalized rows.
///
/// The vocabulary and IDF table are computed once by [`TfidfVectorizer::fit`]
/// and are read-only afterwards.
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> Self {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, tf_matrix) =
            CountVectorizer::fit_transform(texts, count_vectorizer_params);
        debug!("Calculating IDF values");

        let n_docs = texts.len();
        let num_features = count_vectorizer.num_features();

        // Count document frequency for each term
        let mut df = vec![0usize; num_features];
        for row_vec in tf_matrix.outer_iterator() {
            for (col_idx, _val) in row_vec.iter() {
                df[col_idx] += 1;
            }
        }
        let idf = df
            .iter()
            .map(|&doc_freq| smooth_idf(n_docs, doc_freq))
            .collect();
        debug!("IDF calculation complete");

        Self {
            count_vectorizer,
            idf,
        }
    }

    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        let mut tf_matrix = self.count_vectorizer.transform(texts);

        for mut row_vec in tf_matrix.outer_iterator_mut() {
            for (col_idx, val) in row_vec.iter_mut() {
                *val *= self.idf[col_idx];
            }
            let norm = l2_norm(row_vec.iter().map(|(_, val)| val));
            if norm > 0.0 {
                for (_, val) in row_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }
        tf_matrix
    }

    /// TF-IDF vector of a single document. Text without any known n-gram
    /// yields the all-zero vector.
    pub fn transform_document(&self, text: &str) -> CsVec<f64> {
        let mut vector = self.count_vectorizer.transform_document(text);
        for (col_idx, val) in vector.iter_mut() {
            *val *= self.idf[col_idx];
        }
        let norm = l2_norm(vector.iter().map(|(_, val)| val));
        if norm > 0.0 {
            vector.map_inplace(|val| val / norm);
        }
        vector
    }

    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> (Self, CsMat<f64>) {
        let vectorizer = Self::fit(texts, count_vectorizer_params);
        let transformed = vectorizer.transform(texts);
        (vectorizer, transformed)
    }

    pub fn num_features(&self) -> usize {
        self.count_vectorizer.num_features()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        self.count_vectorizer.vocabulary()
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.count_vectorizer.feature_names()
    }

    /// IDF weight per feature, aligned with the vocabulary indices.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn params(&self) -> &VectorizerParams {
        self.count_vectorizer.params()
    }
}
