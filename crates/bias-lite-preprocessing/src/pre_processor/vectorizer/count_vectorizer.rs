use std::cmp::Reverse;

use ahash::HashMap;
use sprs::{CsMat, CsVec};
use tracing::debug;

use super::{ngrams, params::VectorizerParams, tokenizer};

/// Raw n-gram counts over a vocabulary frozen at fit time.
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    /// N-gram to feature index. Indices are dense in `0..vocab.len()` and
    /// follow the lexicographic order of the n-grams.
    vocab: HashMap<String, usize>,
}

impl CountVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Self {
        debug!(num_texts = texts.len(), "Fitting CountVectorizer");
        let ngram_maps = Self::count_documents(texts, &params);
        Self::fit_from_ngrams(&ngram_maps, params)
    }

    fn count_documents<T: AsRef<str> + Sync>(
        texts: &[T],
        params: &VectorizerParams,
    ) -> Vec<HashMap<String, usize>> {
        let tokenized_texts = tokenizer::tokenize(texts);
        debug!("Computing n-grams for all documents");
        tokenized_texts
            .iter()
            .map(|tokens| ngrams::count_ngrams(tokens, params.ngram_sizes()))
            .collect()
    }

    /// Build the vocabulary from per-document n-gram counts.
    fn fit_from_ngrams(ngram_maps: &[HashMap<String, usize>], params: VectorizerParams) -> Self {
        debug!("Building vocabulary from n-gram counts");
        let vocab_df = ngrams::document_frequencies(ngram_maps);
        let vocab_size = vocab_df.len();

        debug!(min_df = params.min_df(), "Applying min_df filtering");
        let mut retained = vocab_df
            .into_iter()
            .filter(|(_, df)| *df >= params.min_df())
            .collect::<Vec<_>>();
        debug!(
            original_size = vocab_size,
            filtered_size = retained.len(),
            "Vocabulary filtered by min_df"
        );

        if let Some(max_features) = params.max_features()
            && retained.len() > max_features
        {
            // Highest document frequency first, ties broken lexicographically
            retained.sort_unstable_by(|(a_token, a_df), (b_token, b_df)| {
                (Reverse(a_df), a_token).cmp(&(Reverse(b_df), b_token))
            });
            retained.truncate(max_features);
            debug!(max_features, "Vocabulary truncated to max_features");
        }

        let mut sorted_tokens = retained
            .into_iter()
            .map(|(token, _)| token)
            .collect::<Vec<_>>();
        sorted_tokens.sort_unstable();
        let vocab = sorted_tokens
            .into_iter()
            .enumerate()
            .map(|(idx, token)| (token, idx))
            .collect::<HashMap<String, usize>>();

        debug!(vocab_size = vocab.len(), "CountVectorizer fitting complete");

        Self { params, vocab }
    }

    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let ngram_maps = Self::count_documents(texts, &self.params);
        self.transform_from_ngrams(&ngram_maps)
    }

    /// Count vector of a single document.
    pub fn transform_document(&self, text: &str) -> CsVec<f64> {
        let tokens = tokenizer::tokenize_text(text);
        let ngrams = ngrams::count_ngrams(&tokens, self.params.ngram_sizes());
        let (indices, data): (Vec<usize>, Vec<f64>) =
            self.row_entries(&ngrams).into_iter().unzip();
        CsVec::new(self.num_features(), indices, data)
    }

    /// Known n-grams of one document as `(column, count)`, sorted by column.
    fn row_entries(&self, ngrams: &HashMap<String, usize>) -> Vec<(usize, f64)> {
        let mut row_entries = ngrams
            .iter()
            .filter_map(|(ngram, &count)| {
                self.vocab
                    .get(ngram)
                    .map(|&col_idx| (col_idx, count as f64))
            })
            .collect::<Vec<_>>();
        row_entries.sort_unstable_by_key(|(col_idx, _)| *col_idx);
        row_entries
    }

    fn transform_from_ngrams(&self, ngram_maps: &[HashMap<String, usize>]) -> CsMat<f64> {
        // Build CSR format directly
        let mut indptr = Vec::with_capacity(ngram_maps.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);
        for ngrams in ngram_maps {
            for (col_idx, count) in self.row_entries(ngrams) {
                indices.push(col_idx);
                data.push(count);
            }
            indptr.push(indices.len());
        }

        debug!(
            non_zero_entries = data.len(),
            "Text transformation complete"
        );
        CsMat::new(
            (ngram_maps.len(), self.num_features()),
            indptr,
            indices,
            data,
        )
    }

    /// Fit and transform the same texts, tokenizing and counting n-grams once.
    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> (Self, CsMat<f64>) {
        debug!(
            num_texts = texts.len(),
            "fit_transform: tokenizing and computing n-grams once"
        );
        let ngram_maps = Self::count_documents(texts, &params);
        let vectorizer = Self::fit_from_ngrams(&ngram_maps, params);
        let transformed = vectorizer.transform_from_ngrams(&ngram_maps);
        (vectorizer, transformed)
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    /// N-gram to feature index mapping.
    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocab
    }

    /// N-grams ordered by feature index.
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.vocab.len()];
        for (ngram, &idx) in &self.vocab {
            names[idx] = ngram.as_str();
        }
        names
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: [&str; 4] = [
        "great team player",
        "biased against women",
        "excellent performer",
        "women are too emotional",
    ];

    #[test]
    fn test_vocabulary_contains_unigrams_and_bigrams() {
        let vectorizer = CountVectorizer::fit(&CORPUS, VectorizerParams::default());
        let vocab = vectorizer.vocabulary();
        assert_eq!(vectorizer.num_features(), 19);
        assert!(vocab.contains_key("women"));
        assert!(vocab.contains_key("great team"));
        assert!(vocab.contains_key("too emotional"));
        assert!(!vocab.contains_key("player biased"));
    }

    #[test]
    fn test_indices_are_dense_and_lexicographic() {
        let vectorizer = CountVectorizer::fit(&CORPUS, VectorizerParams::default());
        let names = vectorizer.feature_names();
        assert_eq!(names.len(), vectorizer.num_features());
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        for (idx, name) in names.iter().enumerate() {
            assert_eq!(vectorizer.vocabulary()[*name], idx);
        }
    }

    #[test]
    fn test_min_df_filters_rare_ngrams() {
        let params = VectorizerParams::new(1..=2, 2, None);
        let vectorizer = CountVectorizer::fit(&CORPUS, params);
        assert_eq!(vectorizer.feature_names(), vec!["women"]);
    }

    #[test]
    fn test_max_features_keeps_most_frequent_then_lexicographic() {
        let texts = ["b a", "b c", "b d", "a z"];
        let params = VectorizerParams::new(1..=1, 1, Some(3));
        let vectorizer = CountVectorizer::fit(&texts, params);
        // df: b=3, a=2, then c, d, z tied at 1 -> "c" wins the tie
        assert_eq!(vectorizer.feature_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_transform_counts_and_drops_unknown() {
        let vectorizer = CountVectorizer::fit(&CORPUS, VectorizerParams::default());
        let matrix = vectorizer.transform(&["Women, women and unknown words"]);
        assert_eq!(matrix.rows(), 1);
        assert_eq!(matrix.cols(), vectorizer.num_features());
        let row = matrix.outer_view(0).unwrap();
        assert_eq!(row.nnz(), 1);
        let women = vectorizer.vocabulary()["women"];
        assert_eq!(row.get(women), Some(&2.0));
    }

    #[test]
    fn test_fit_transform_matches_fit_then_transform() {
        let (vectorizer, fitted) =
            CountVectorizer::fit_transform(&CORPUS, VectorizerParams::default());
        let again = vectorizer.transform(&CORPUS);
        assert_eq!(fitted, again);

        let single = vectorizer.transform_document(CORPUS[3]);
        let row = fitted.outer_view(3).unwrap();
        assert_eq!(single.indices(), row.indices());
        assert_eq!(single.data(), row.data());
    }
}
