//! Portable JSON model artifact.
//!
//! The artifact carries everything needed to score text without this crate's
//! fitted types: the vocabulary, IDF weights, coefficients and intercept, plus
//! the n-gram range and tokenization settings. [`ExportedModel::probability`]
//! rescores text from those fields alone.

use std::{collections::BTreeMap, fs, io::BufWriter, path::Path};

use bias_lite_preprocessing::pre_processor::{
    MAX_NGRAM_SIZE, TOKEN_PATTERN, count_ngrams, l2_normalize,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    BiasClassifier, Classification, Error, Prediction, Result,
    model::{linear_score, sigmoid},
};

pub const NORM_L2: &str = "l2";
pub const NORM_NONE: &str = "none";

/// A validated model artifact.
///
/// Deserialization goes through the same validation as export, so every
/// value of this type has `|vocab| == |idf| == |coef|` and dense, in-range
/// vocabulary indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ArtifactFields")]
pub struct ExportedModel {
    vocab: BTreeMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<f64>,
    intercept: f64,
    ngram_range: [usize; 2],
    use_idf: bool,
    token_pattern: String,
    norm: String,
    #[serde(skip)]
    token_regex: Regex,
}

/// On-disk layout, before validation.
#[derive(Deserialize)]
struct ArtifactFields {
    vocab: BTreeMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<f64>,
    intercept: f64,
    ngram_range: [usize; 2],
    use_idf: bool,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
    #[serde(default = "default_norm")]
    norm: String,
}

fn default_token_pattern() -> String {
    TOKEN_PATTERN.to_string()
}

fn default_norm() -> String {
    NORM_L2.to_string()
}

impl TryFrom<ArtifactFields> for ExportedModel {
    type Error = Error;

    fn try_from(fields: ArtifactFields) -> Result<Self> {
        let ArtifactFields {
            vocab,
            idf,
            coef,
            intercept,
            ngram_range,
            use_idf,
            token_pattern,
            norm,
        } = fields;

        if vocab.len() != idf.len() || vocab.len() != coef.len() {
            return Err(Error::InconsistentArtifact {
                vocab: vocab.len(),
                idf: idf.len(),
                coef: coef.len(),
            });
        }
        let num_features = vocab.len();
        let mut seen = vec![false; num_features];
        for (token, &index) in &vocab {
            if index >= num_features || std::mem::replace(&mut seen[index], true) {
                return Err(Error::InvalidVocabularyIndex {
                    token: token.clone(),
                    index,
                    num_features,
                });
            }
        }

        if !idf.iter().all(|v| v.is_finite()) {
            return Err(Error::NonFiniteParameter { field: "idf" });
        }
        if !coef.iter().all(|v| v.is_finite()) {
            return Err(Error::NonFiniteParameter { field: "coef" });
        }
        if !intercept.is_finite() {
            return Err(Error::NonFiniteParameter { field: "intercept" });
        }

        let [min_n, max_n] = ngram_range;
        if min_n == 0 || min_n > max_n || max_n > MAX_NGRAM_SIZE {
            return Err(Error::InvalidNgramRange {
                min: min_n,
                max: max_n,
            });
        }
        if norm != NORM_L2 && norm != NORM_NONE {
            return Err(Error::UnsupportedNorm(norm));
        }
        let token_regex = Regex::new(&token_pattern)?;

        Ok(Self {
            vocab,
            idf,
            coef,
            intercept,
            ngram_range,
            use_idf,
            token_pattern,
            norm,
            token_regex,
        })
    }
}

impl ExportedModel {
    /// Snapshot a fitted classifier. Fails if its parts disagree on the
    /// number of features.
    pub fn from_classifier(classifier: &BiasClassifier) -> Result<Self> {
        let vectorizer = classifier.vectorizer();
        let model = classifier.model();
        let (min_n, max_n) = vectorizer.params().ngram_range();

        let fields = ArtifactFields {
            vocab: vectorizer
                .vocabulary()
                .iter()
                .map(|(ngram, &idx)| (ngram.clone(), idx))
                .collect(),
            idf: vectorizer.idf().to_vec(),
            coef: model.coef().to_vec(),
            intercept: model.intercept(),
            ngram_range: [min_n, max_n],
            use_idf: true,
            token_pattern: default_token_pattern(),
            norm: default_norm(),
        };
        let exported = Self::try_from(fields)?;
        debug!(num_features = exported.num_features(), "Exported model artifact");
        Ok(exported)
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocab(&self) -> &BTreeMap<String, usize> {
        &self.vocab
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn coef(&self) -> &[f64] {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn ngram_range(&self) -> [usize; 2] {
        self.ngram_range
    }

    pub fn use_idf(&self) -> bool {
        self.use_idf
    }

    pub fn token_pattern(&self) -> &str {
        &self.token_pattern
    }

    pub fn norm(&self) -> &str {
        &self.norm
    }

    /// Compact JSON. Non-ASCII vocabulary entries are written as-is.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer(writer, self)?;
        info!(path = %path.display(), num_features = self.num_features(), "Model artifact written");
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Sparse feature vector of `text` as `(column, weight)` pairs sorted by column.
    fn features(&self, text: &str) -> Vec<(usize, f64)> {
        let lowered = text.to_lowercase();
        let tokens = self
            .token_regex
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .collect::<Vec<_>>();
        let ngram_sizes = (self.ngram_range[0]..=self.ngram_range[1]).collect::<Vec<_>>();

        let mut entries = count_ngrams(&tokens, &ngram_sizes)
            .into_iter()
            .filter_map(|(ngram, count)| {
                self.vocab.get(&ngram).map(|&idx| {
                    let weight = if self.use_idf {
                        count as f64 * self.idf[idx]
                    } else {
                        count as f64
                    };
                    (idx, weight)
                })
            })
            .collect::<Vec<_>>();
        entries.sort_unstable_by_key(|(idx, _)| *idx);

        if self.norm == NORM_L2 {
            let mut weights = entries.iter().map(|(_, w)| *w).collect::<Vec<_>>();
            l2_normalize(&mut weights);
            for ((_, w), normalized) in entries.iter_mut().zip(weights) {
                *w = normalized;
            }
        }
        entries
    }

    /// P(biased) computed from the artifact fields only.
    ///
    /// Text with no known n-gram scores `sigmoid(intercept)`.
    pub fn probability(&self, text: &str) -> f64 {
        let entries = self.features(text);
        sigmoid(linear_score(
            &self.coef,
            self.intercept,
            entries.iter().map(|(idx, w)| (*idx, w)),
        ))
    }

    pub fn predict(&self, text: &str) -> Prediction {
        Prediction::from_biased_probability(self.probability(text))
    }

    pub fn classify(&self, text: &str, threshold: f64) -> Classification {
        self.predict(text).classification(threshold)
    }
}
