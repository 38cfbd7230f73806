use core::fmt;

use bias_lite_preprocessing::data_loader::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Neutral,
    Biased,
}

impl Classification {
    /// Returns true if this classification is Neutral
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }

    /// Returns true if this classification is Biased
    #[must_use]
    pub fn is_biased(&self) -> bool {
        matches!(self, Self::Biased)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neutral => write!(f, "Neutral"),
            Self::Biased => write!(f, "Biased"),
        }
    }
}

impl From<Classification> for i64 {
    fn from(class: Classification) -> Self {
        match class {
            Classification::Neutral => 0,
            Classification::Biased => 1,
        }
    }
}

impl From<Classification> for Label {
    fn from(class: Classification) -> Self {
        match class {
            Classification::Neutral => Label::Neutral,
            Classification::Biased => Label::Biased,
        }
    }
}

/// Class probabilities of one text.
/// 0: P(neutral), 1: P(biased)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction(f64, f64);

impl Prediction {
    /// Build from the model output P(biased).
    #[must_use]
    pub fn from_biased_probability(biased_prob: f64) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&biased_prob),
            "Probability must lie in [0, 1]"
        );
        Self(1.0 - biased_prob, biased_prob)
    }

    #[must_use]
    pub fn neutral_probability(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn biased_probability(&self) -> f64 {
        self.1
    }

    #[inline]
    #[must_use]
    pub fn classification(&self, threshold: f64) -> Classification {
        if self.1 >= threshold {
            Classification::Biased
        } else {
            Classification::Neutral
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P(neutral)={:.3}, P(biased)={:.3}", self.0, self.1)
    }
}
