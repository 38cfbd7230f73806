use std::ops::RangeInclusive;

pub const DEFAULT_MIN_NGRAM: usize = 1;
pub const DEFAULT_MAX_NGRAM: usize = 2;
pub const DEFAULT_MIN_DF: usize = 1;
pub const DEFAULT_MAX_FEATURES: usize = 4000;
/// Largest n-gram size a vectorizer or exported artifact may use.
pub const MAX_NGRAM_SIZE: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorizerParams {
    ngram_range: Vec<usize>,
    /// Minimum number of training documents an n-gram must appear in.
    min_df: usize,
    /// Upper bound on vocabulary size. When more n-grams survive `min_df`,
    /// the highest document frequencies win and ties go to the
    /// lexicographically smaller n-gram.
    max_features: Option<usize>,
}

impl VectorizerParams {
    pub fn new(
        ngram_range: impl Into<RangeInclusive<usize>>,
        min_df: usize,
        max_features: Option<usize>,
    ) -> Self {
        let ngram_range = ngram_range.into();
        assert!(
            *ngram_range.end() <= MAX_NGRAM_SIZE,
            "ngram sizes are capped at {MAX_NGRAM_SIZE}"
        );
        let n_sizes = ngram_range.collect::<Vec<_>>();
        assert!(
            !n_sizes.is_empty(),
            "ngram_range must contain at least one value"
        );
        assert!(n_sizes[0] >= 1, "ngram sizes start at 1");
        assert!(min_df >= 1, "min_df must be an absolute count >= 1");
        assert!(
            max_features != Some(0),
            "max_features must be positive when set"
        );
        Self {
            ngram_range: n_sizes,
            min_df,
            max_features,
        }
    }

    /// Every n-gram size in the configured range, ascending.
    #[must_use]
    pub fn ngram_sizes(&self) -> &[usize] {
        &self.ngram_range
    }

    #[must_use]
    pub fn ngram_range(&self) -> (usize, usize) {
        (
            *self.ngram_range.first().expect("ngram_range is not empty"),
            *self.ngram_range.last().expect("ngram_range is not empty"),
        )
    }

    #[must_use]
    pub fn min_df(&self) -> usize {
        self.min_df
    }

    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_NGRAM..=DEFAULT_MAX_NGRAM,
            DEFAULT_MIN_DF,
            Some(DEFAULT_MAX_FEATURES),
        )
    }
}

impl From<((usize, usize), usize, Option<usize>)> for VectorizerParams {
    fn from(value: ((usize, usize), usize, Option<usize>)) -> Self {
        Self::new(value.0.0..=value.0.1, value.1, value.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = VectorizerParams::default();
        assert_eq!(params.ngram_range(), (1, 2));
        assert_eq!(params.ngram_sizes(), &[1, 2]);
        assert_eq!(params.min_df(), 1);
        assert_eq!(params.max_features(), Some(4000));
    }

    #[test]
    fn test_from_tuple() {
        let params = VectorizerParams::from(((1, 3), 2, None));
        assert_eq!(params.ngram_sizes(), &[1, 2, 3]);
        assert_eq!(params.min_df(), 2);
        assert_eq!(params.max_features(), None);
    }

    #[test]
    #[should_panic(expected = "ngram_range must contain at least one value")]
    fn test_empty_range_panics() {
        #[allow(clippy::reversed_empty_ranges)]
        let _ = VectorizerParams::new(2..=1, 1, None);
    }

    #[test]
    #[should_panic(expected = "min_df")]
    fn test_zero_min_df_panics() {
        let _ = VectorizerParams::new(1..=2, 0, None);
    }

    #[test]
    #[should_panic(expected = "ngram sizes are capped at 8")]
    fn test_oversized_range_panics() {
        let _ = VectorizerParams::new(1..=1_000_000_000_000, 1, None);
    }
}
