//! # bias-lite
//!
//! Train a small bias detector for short texts and ship it as a JSON artifact.
//!
//! The model is a TF-IDF vectorizer over word unigrams and bigrams followed by
//! an L2-regularized logistic regression with balanced class weights. The
//! exported artifact holds the vocabulary, IDF weights, coefficients and
//! intercept, which is everything a lightweight consumer needs to score text.
//!
//! ## Quick Start
//!
//! ```rust
//! use bias_lite::{TrainingConfig, train};
//! use bias_lite_preprocessing::data_loader::{Example, Label};
//!
//! let examples = vec![
//!     Example::new("great team player", Label::Neutral),
//!     Example::new("excellent performer", Label::Neutral),
//!     Example::new("clear and helpful feedback", Label::Neutral),
//!     Example::new("biased against women", Label::Biased),
//!     Example::new("women are too emotional", Label::Biased),
//!     Example::new("girls can't code", Label::Biased),
//! ];
//! let config = TrainingConfig {
//!     test_size: 0.34,
//!     ..TrainingConfig::default()
//! };
//! let run = train(&examples, &config)?;
//! println!("{}", run.evaluation);
//!
//! let prediction = run.classifier.predict("women are emotional");
//! println!("P(biased) = {:.3}", prediction.biased_probability());
//!
//! let artifact = run.classifier.export()?;
//! let json = artifact.to_json()?;
//! assert!(json.contains("\"vocab\""));
//! # Ok::<(), bias_lite::Error>(())
//! ```
//!
//! ## Scoring from an artifact
//!
//! ```rust,no_run
//! use bias_lite::ExportedModel;
//!
//! let model = ExportedModel::read_json("model.json")?;
//! let p = model.probability("Some text to check");
//! # Ok::<(), bias_lite::Error>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;

mod error;
pub mod evaluate;
pub mod export;
pub mod model;
mod pipeline;
pub mod rules;
mod training;

use bias_lite_preprocessing::pre_processor::TfidfVectorizer;
pub use error::{Error, Result};
pub use evaluate::{ClassificationReport, ConfusionMatrix, evaluate};
pub use export::ExportedModel;
pub use model::{CLASSIFICATION_THRESHOLD, LogisticRegression, TrainerParams};
pub use pipeline::{Classification, Prediction};
pub use rules::{RuleAnalysis, RuleSet};
pub use training::{
    TrainingConfig, TrainingRun, TrainingSummary, VectorizerConfig, fit_classifier, train,
};

/// A fitted vectorizer and model, frozen together.
///
/// # Examples
///
/// ```rust
/// use bias_lite::{BiasClassifier, LogisticRegression};
/// use bias_lite_preprocessing::pre_processor::{TfidfVectorizer, VectorizerParams};
///
/// let texts = ["kind words", "harsh words"];
/// let vectorizer = TfidfVectorizer::fit(&texts, VectorizerParams::default());
/// let model = LogisticRegression::new(vec![0.0; vectorizer.num_features()], 0.0);
/// let classifier = BiasClassifier::new(vectorizer, model)?.with_threshold(0.7);
/// let class = classifier.classify("kind words");
/// # Ok::<(), bias_lite::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BiasClassifier {
    vectorizer: TfidfVectorizer,
    model: LogisticRegression,
    threshold: f64,
}

impl BiasClassifier {
    /// Pair a vectorizer with a model of matching width, using the default
    /// classification threshold.
    pub fn new(vectorizer: TfidfVectorizer, model: LogisticRegression) -> Result<Self> {
        if vectorizer.num_features() != model.num_features() {
            return Err(Error::DimensionMismatch {
                expected: vectorizer.num_features(),
                actual: model.num_features(),
            });
        }
        Ok(Self {
            vectorizer,
            model,
            threshold: CLASSIFICATION_THRESHOLD,
        })
    }

    /// Set a custom classification threshold.
    ///
    /// - If P(biased) >= threshold: classified as Biased
    /// - If P(biased) < threshold: classified as Neutral
    ///
    /// # Panics
    ///
    /// If `threshold` is NaN or outside `[0, 1]`.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "threshold must lie in [0, 1], got {threshold}"
        );
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &LogisticRegression {
        &self.model
    }

    /// Predict probabilities for a single text.
    ///
    /// Text with no known n-gram gets `sigmoid(intercept)`.
    pub fn predict<T: AsRef<str>>(&self, text: T) -> Prediction {
        let features = self.vectorizer.transform_document(text.as_ref());
        let z = self.model.score(features.view());
        Prediction::from_biased_probability(model::sigmoid(z))
    }

    /// Predict probabilities for multiple texts, one per input.
    pub fn predict_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Vec<Prediction> {
        let features = self.vectorizer.transform(texts);
        features
            .outer_iterator()
            .map(|row| Prediction::from_biased_probability(model::sigmoid(self.model.score(row))))
            .collect()
    }

    /// Classify a single text using the configured threshold.
    pub fn classify<T: AsRef<str>>(&self, text: T) -> Classification {
        self.predict(text).classification(self.threshold)
    }

    pub fn classify_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Vec<Classification> {
        self.predict_batch(texts)
            .into_iter()
            .map(|pred| pred.classification(self.threshold))
            .collect()
    }

    /// Snapshot as a portable artifact.
    pub fn export(&self) -> Result<ExportedModel> {
        ExportedModel::from_classifier(self)
    }
}

#[cfg(test)]
mod tests {
    use bias_lite_preprocessing::pre_processor::VectorizerParams;

    use super::*;

    fn classifier() -> BiasClassifier {
        let texts = ["women are emotional", "great team"];
        let vectorizer = TfidfVectorizer::fit(&texts, VectorizerParams::default());
        let coef = vectorizer
            .feature_names()
            .iter()
            .map(|name| if name.contains("women") { 2.0 } else { -1.0 })
            .collect();
        BiasClassifier::new(vectorizer, LogisticRegression::new(coef, -0.25)).unwrap()
    }

    #[test]
    fn test_predict_probabilities() {
        let prediction = classifier().predict("This is a test text");
        assert!((0.0..=1.0).contains(&prediction.biased_probability()));
        let total = prediction.neutral_probability() + prediction.biased_probability();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_text_scores_intercept() {
        let classifier = classifier();
        let prediction = classifier.predict("");
        assert_eq!(prediction.biased_probability(), model::sigmoid(-0.25));
        assert_eq!(classifier.classify("nothing matches"), Classification::Neutral);
    }

    #[test]
    fn test_classify() {
        let classifier = classifier();
        assert_eq!(classifier.classify("women"), Classification::Biased);
        assert_eq!(classifier.classify("great team"), Classification::Neutral);
    }

    #[test]
    fn test_batch_matches_single() {
        let classifier = classifier();
        let texts = ["women are great", "", "team women"];
        let batch = classifier.predict_batch(&texts);
        assert_eq!(batch.len(), 3);
        for (text, prediction) in texts.iter().zip(batch) {
            assert_eq!(classifier.predict(text), prediction);
        }
    }

    #[test]
    fn test_threshold() {
        let classifier = classifier();
        assert!((classifier.threshold() - CLASSIFICATION_THRESHOLD).abs() < f64::EPSILON);
        let strict = classifier.with_threshold(0.9999);
        assert!((strict.threshold() - 0.9999).abs() < f64::EPSILON);
        assert_eq!(strict.classify("women"), Classification::Neutral);
    }

    #[test]
    #[should_panic(expected = "threshold must lie in [0, 1]")]
    fn test_out_of_range_threshold_panics() {
        let _ = classifier().with_threshold(1.5);
    }

    #[test]
    #[should_panic(expected = "threshold must lie in [0, 1]")]
    fn test_nan_threshold_panics() {
        let _ = classifier().with_threshold(f64::NAN);
    }

    #[test]
    fn test_dimension_mismatch() {
        let vectorizer = TfidfVectorizer::fit(&["a b"], VectorizerParams::default());
        let model = LogisticRegression::new(vec![0.0; 2], 0.0);
        assert!(matches!(
            BiasClassifier::new(vectorizer, model),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
