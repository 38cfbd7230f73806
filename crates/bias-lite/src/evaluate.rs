//! Held-out evaluation: confusion matrix and per-class precision, recall and F1.

use core::fmt;

use bias_lite_preprocessing::data_loader::{Example, Label};
use serde::{Deserialize, Serialize};

use crate::{BiasClassifier, Error, Result};

/// Binary confusion matrix with `Biased` as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Biased predicted as biased
    pub tp: usize,
    /// Neutral predicted as neutral
    pub tn: usize,
    /// Neutral predicted as biased
    pub fp: usize,
    /// Biased predicted as neutral
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Result<Self> {
        if predictions.len() != ground_truth.len() {
            return Err(Error::LabelCountMismatch {
                rows: predictions.len(),
                labels: ground_truth.len(),
            });
        }

        let mut matrix = Self::default();
        for (pred, truth) in predictions.iter().zip(ground_truth) {
            match (pred, truth) {
                (Label::Biased, Label::Biased) => matrix.tp += 1,
                (Label::Neutral, Label::Neutral) => matrix.tn += 1,
                (Label::Biased, Label::Neutral) => matrix.fp += 1,
                (Label::Neutral, Label::Biased) => matrix.fn_ += 1,
            }
        }
        Ok(matrix)
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// (TP + TN) / total, `0.0` when empty.
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// Metrics treating `label` as the positive class.
    pub fn class_metrics(&self, label: Label) -> ClassMetrics {
        let (hits, false_alarms, misses) = match label {
            Label::Biased => (self.tp, self.fp, self.fn_),
            Label::Neutral => (self.tn, self.fn_, self.fp),
        };
        let precision = ratio(hits, hits + false_alarms);
        let recall = ratio(hits, hits + misses);
        let f1_score = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            precision,
            recall,
            f1_score,
            support: hits + misses,
        }
    }
}

/// Undefined ratios (zero denominator) are reported as `0.0`.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of true instances of the class.
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub confusion_matrix: ConfusionMatrix,
    pub neutral: ClassMetrics,
    pub biased: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub support: usize,
}

impl ClassificationReport {
    pub fn from_confusion_matrix(cm: ConfusionMatrix) -> Self {
        let neutral = cm.class_metrics(Label::Neutral);
        let biased = cm.class_metrics(Label::Biased);
        let support = cm.total();

        let average = |weight_n: f64, weight_b: f64| ClassMetrics {
            precision: weight_n * neutral.precision + weight_b * biased.precision,
            recall: weight_n * neutral.recall + weight_b * biased.recall,
            f1_score: weight_n * neutral.f1_score + weight_b * biased.f1_score,
            support,
        };
        let macro_avg = average(0.5, 0.5);
        let weighted_avg = average(
            ratio(neutral.support, support),
            ratio(biased.support, support),
        );

        Self {
            accuracy: cm.accuracy(),
            confusion_matrix: cm,
            neutral,
            biased,
            macro_avg,
            weighted_avg,
            support,
        }
    }

    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Result<Self> {
        ConfusionMatrix::from_predictions(predictions, ground_truth)
            .map(Self::from_confusion_matrix)
    }

    pub fn class(&self, label: Label) -> &ClassMetrics {
        match label {
            Label::Neutral => &self.neutral,
            Label::Biased => &self.biased,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for label in Label::ALL {
            let m = self.class(label);
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                label.name(),
                m.precision,
                m.recall,
                m.f1_score,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                name, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows: actual, columns: predicted)")?;
        writeln!(f, "{:>14} {:>10} {:>10}", "", "neutral", "biased")?;
        let cm = &self.confusion_matrix;
        writeln!(f, "{:>14} {:>10} {:>10}", "neutral", cm.tn, cm.fp)?;
        write!(f, "{:>14} {:>10} {:>10}", "biased", cm.fn_, cm.tp)
    }
}

/// Classify every example with `classifier` and score against its label.
pub fn evaluate(classifier: &BiasClassifier, examples: &[Example]) -> Result<ClassificationReport> {
    let texts = examples.iter().map(|e| e.text.as_str()).collect::<Vec<_>>();
    let predicted = classifier
        .classify_batch(&texts)
        .into_iter()
        .map(Label::from)
        .collect::<Vec<_>>();
    let truth = examples.iter().map(|e| e.label).collect::<Vec<_>>();

    ClassificationReport::from_predictions(&predicted, &truth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(bits: &[u8]) -> Vec<Label> {
        bits.iter()
            .map(|&b| Label::from_binary(i64::from(b)).unwrap())
            .collect()
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let predicted = labels(&[1, 1, 0, 0, 1]);
        let truth = labels(&[1, 0, 0, 1, 1]);
        let cm = ConfusionMatrix::from_predictions(&predicted, &truth).unwrap();
        assert_eq!(
            cm,
            ConfusionMatrix {
                tp: 2,
                tn: 1,
                fp: 1,
                fn_: 1
            }
        );
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_per_class_metrics() {
        let cm = ConfusionMatrix {
            tp: 3,
            tn: 4,
            fp: 1,
            fn_: 2,
        };
        let biased = cm.class_metrics(Label::Biased);
        assert!((biased.precision - 0.75).abs() < 1e-12);
        assert!((biased.recall - 0.6).abs() < 1e-12);
        assert!((biased.f1_score - 2.0 * 0.75 * 0.6 / 1.35).abs() < 1e-12);
        assert_eq!(biased.support, 5);

        let neutral = cm.class_metrics(Label::Neutral);
        assert!((neutral.precision - 4.0 / 6.0).abs() < 1e-12);
        assert!((neutral.recall - 0.8).abs() < 1e-12);
        assert_eq!(neutral.support, 5);
    }

    #[test]
    fn test_undefined_metrics_are_zero() {
        // Nothing predicted biased, no biased examples
        let cm = ConfusionMatrix::from_predictions(&labels(&[0, 0]), &labels(&[0, 0])).unwrap();
        let biased = cm.class_metrics(Label::Biased);
        assert_eq!(biased.precision, 0.0);
        assert_eq!(biased.recall, 0.0);
        assert_eq!(biased.f1_score, 0.0);
        assert_eq!(biased.support, 0);
        assert_eq!(cm.accuracy(), 1.0);
    }

    #[test]
    fn test_report_averages() {
        let report = ClassificationReport::from_predictions(
            &labels(&[0, 0, 0, 1, 1, 0]),
            &labels(&[0, 0, 0, 0, 1, 1]),
        )
        .unwrap();
        assert_eq!(report.support, 6);
        let expected_macro = (report.neutral.f1_score + report.biased.f1_score) / 2.0;
        assert!((report.macro_avg.f1_score - expected_macro).abs() < 1e-12);
        let expected_weighted =
            (4.0 * report.neutral.f1_score + 2.0 * report.biased.f1_score) / 6.0;
        assert!((report.weighted_avg.f1_score - expected_weighted).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            ConfusionMatrix::from_predictions(&labels(&[0]), &labels(&[0, 1])),
            Err(Error::LabelCountMismatch { rows: 1, labels: 2 })
        ));
    }

    #[test]
    fn test_display_lists_both_classes() {
        let report =
            ClassificationReport::from_predictions(&labels(&[0, 1]), &labels(&[0, 1])).unwrap();
        let text = report.to_string();
        assert!(text.contains("neutral"));
        assert!(text.contains("biased"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("1.0000"));
    }
}
