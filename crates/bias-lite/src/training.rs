use std::time::Instant;

use bias_lite_preprocessing::{
    data_loader::{
        DEFAULT_SEED, DEFAULT_TEST_SIZE, Example, Label, label_distribution, stratified_split,
    },
    pre_processor::{
        DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_DF, DEFAULT_MIN_NGRAM,
        MAX_NGRAM_SIZE, TfidfVectorizer, VectorizerParams,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    BiasClassifier, ClassificationReport, Error, ExportedModel, Result, evaluate,
    model::{FitSummary, LogisticRegressionTrainer, TrainerParams},
};

/// Serializable form of [`VectorizerParams`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub ngram_range: [usize; 2],
    pub min_df: usize,
    pub max_features: Option<usize>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: [DEFAULT_MIN_NGRAM, DEFAULT_MAX_NGRAM],
            min_df: DEFAULT_MIN_DF,
            max_features: Some(DEFAULT_MAX_FEATURES),
        }
    }
}

impl VectorizerConfig {
    pub fn to_params(&self) -> Result<VectorizerParams> {
        let [min_n, max_n] = self.ngram_range;
        if min_n == 0 || min_n > max_n || max_n > MAX_NGRAM_SIZE {
            return Err(Error::InvalidNgramRange {
                min: min_n,
                max: max_n,
            });
        }
        if self.min_df == 0 {
            return Err(Error::InvalidConfig("min_df must be at least 1".into()));
        }
        if self.max_features == Some(0) {
            return Err(Error::InvalidConfig("max_features must be positive".into()));
        }
        Ok(VectorizerParams::new(min_n..=max_n, self.min_df, self.max_features))
    }
}

/// Everything that determines a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Held-out fraction, strictly between 0 and 1.
    pub test_size: f64,
    pub seed: u64,
    pub vectorizer: VectorizerConfig,
    pub trainer: TrainerParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            vectorizer: VectorizerConfig::default(),
            trainer: TrainerParams::default(),
        }
    }
}

impl TrainingConfig {
    fn validate_trainer(&self) -> Result<()> {
        let params = &self.trainer;
        if !(params.c > 0.0 && params.c.is_finite()) {
            return Err(Error::InvalidConfig(format!("C must be positive, got {}", params.c)));
        }
        if !(params.tol > 0.0) {
            return Err(Error::InvalidConfig(format!("tol must be positive, got {}", params.tol)));
        }
        if params.history_size == 0 {
            return Err(Error::InvalidConfig("history_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Output of [`train`].
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub classifier: BiasClassifier,
    pub fit: FitSummary,
    /// Metrics on the held-out split.
    pub evaluation: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
}

/// Serializable record of a run, written next to the artifact on request.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary<'a> {
    pub config: &'a TrainingConfig,
    pub train_size: usize,
    pub test_size: usize,
    pub num_features: usize,
    pub fit: &'a FitSummary,
    pub evaluation: &'a ClassificationReport,
}

impl TrainingRun {
    pub fn export(&self) -> Result<ExportedModel> {
        self.classifier.export()
    }

    pub fn summary<'a>(&'a self, config: &'a TrainingConfig) -> TrainingSummary<'a> {
        TrainingSummary {
            config,
            train_size: self.train_size,
            test_size: self.test_size,
            num_features: self.classifier.vectorizer().num_features(),
            fit: &self.fit,
            evaluation: &self.evaluation,
        }
    }
}

/// Fit the vectorizer and the model on `examples`.
pub fn fit_classifier(
    examples: &[Example],
    vectorizer_params: VectorizerParams,
    trainer_params: TrainerParams,
) -> Result<(BiasClassifier, FitSummary)> {
    if examples.is_empty() {
        return Err(Error::EmptyTrainingSet);
    }
    let texts = examples.iter().map(|e| e.text.as_str()).collect::<Vec<_>>();
    let labels = examples.iter().map(|e| e.label).collect::<Vec<Label>>();

    let (vectorizer, features) = TfidfVectorizer::fit_transform(&texts, vectorizer_params);
    info!(num_features = vectorizer.num_features(), "Vectorizer fitted");

    let (model, fit) = LogisticRegressionTrainer::new(trainer_params).fit(&features, &labels)?;
    let classifier = BiasClassifier::new(vectorizer, model)?;
    Ok((classifier, fit))
}

/// Split, fit on the training side and evaluate on the held-out side.
pub fn train(examples: &[Example], config: &TrainingConfig) -> Result<TrainingRun> {
    let vectorizer_params = config.vectorizer.to_params()?;
    config.validate_trainer()?;

    let start = Instant::now();
    let counts = label_distribution(examples);
    info!(
        num_examples = examples.len(),
        neutral = counts[0],
        biased = counts[1],
        "Starting training run"
    );

    let split = stratified_split(examples, config.test_size, config.seed)?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        seed = config.seed,
        "Split dataset"
    );

    let (classifier, fit) =
        fit_classifier(&split.train, vectorizer_params, config.trainer.clone())?;
    let evaluation = evaluate(&classifier, &split.test)?;
    info!(
        accuracy = evaluation.accuracy,
        biased_f1 = evaluation.biased.f1_score,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Training run complete"
    );

    Ok(TrainingRun {
        train_size: split.train.len(),
        test_size: split.test.len(),
        classifier,
        fit,
        evaluation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Example> {
        let neutral = [
            "great team player",
            "excellent performer",
            "delivers projects on time",
            "clear and helpful feedback",
            "strong technical skills",
        ];
        let biased = [
            "biased against women",
            "women are too emotional",
            "girls can't do math",
            "she is bossy for a woman",
            "too emotional to lead",
        ];
        neutral
            .iter()
            .map(|t| Example::new(*t, Label::Neutral))
            .chain(biased.iter().map(|t| Example::new(*t, Label::Biased)))
            .collect()
    }

    #[test]
    fn test_train_produces_consistent_run() {
        let examples = corpus();
        let run = train(&examples, &TrainingConfig::default()).unwrap();
        assert_eq!(run.train_size, 8);
        assert_eq!(run.test_size, 2);
        assert_eq!(run.evaluation.support, 2);
        assert_eq!(run.evaluation.neutral.support, 1);
        assert_eq!(
            run.classifier.vectorizer().num_features(),
            run.classifier.model().num_features()
        );

        let artifact = run.export().unwrap();
        assert_eq!(artifact.num_features(), run.classifier.vectorizer().num_features());
    }

    #[test]
    fn test_train_is_deterministic() {
        let examples = corpus();
        let config = TrainingConfig::default();
        let a = train(&examples, &config).unwrap();
        let b = train(&examples, &config).unwrap();
        assert_eq!(a.classifier.model(), b.classifier.model());
        assert_eq!(a.evaluation, b.evaluation);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let examples = corpus();
        let bad_range = TrainingConfig {
            vectorizer: VectorizerConfig {
                ngram_range: [2, 1],
                ..VectorizerConfig::default()
            },
            ..TrainingConfig::default()
        };
        assert!(matches!(
            train(&examples, &bad_range),
            Err(Error::InvalidNgramRange { min: 2, max: 1 })
        ));

        let huge_range = VectorizerConfig {
            ngram_range: [1, 1_000_000_000_000],
            ..VectorizerConfig::default()
        };
        assert!(matches!(
            huge_range.to_params(),
            Err(Error::InvalidNgramRange {
                min: 1,
                max: 1_000_000_000_000
            })
        ));
        let widest = VectorizerConfig {
            ngram_range: [1, MAX_NGRAM_SIZE],
            ..VectorizerConfig::default()
        };
        assert_eq!(widest.to_params().unwrap().ngram_range(), (1, MAX_NGRAM_SIZE));

        let bad_c = TrainingConfig {
            trainer: TrainerParams {
                c: 0.0,
                ..TrainerParams::default()
            },
            ..TrainingConfig::default()
        };
        assert!(matches!(train(&examples, &bad_c), Err(Error::InvalidConfig(_))));

        let bad_split = TrainingConfig {
            test_size: 1.0,
            ..TrainingConfig::default()
        };
        assert!(matches!(train(&examples, &bad_split), Err(Error::Preprocessing(_))));
    }

    #[test]
    fn test_single_class_dataset_fails_at_fit() {
        let examples = corpus()
            .into_iter()
            .filter(|e| e.label == Label::Biased)
            .collect::<Vec<_>>();
        assert!(matches!(
            train(&examples, &TrainingConfig::default()),
            Err(Error::SingleClass {
                label: Label::Biased
            })
        ));
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: TrainingConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.test_size, DEFAULT_TEST_SIZE);
        assert_eq!(config.vectorizer.ngram_range, [1, 2]);
        assert_eq!(config.trainer.max_iter, 2000);

        let json = serde_json::to_string(&TrainingConfig::default()).unwrap();
        assert!(json.contains("\"class_weight\":\"balanced\""));
    }
}
