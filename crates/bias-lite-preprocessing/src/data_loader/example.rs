use core::fmt;

/// Binary target. `0` is neutral phrasing, `1` is biased phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Neutral,
    Biased,
}

impl Label {
    /// Both labels in column order (`0`, then `1`).
    pub const ALL: [Self; 2] = [Self::Neutral, Self::Biased];

    /// Maps an integer class id onto a label. Only `0` and `1` are valid.
    #[must_use]
    pub fn from_binary(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Neutral),
            1 => Some(Self::Biased),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_binary(self) -> u8 {
        match self {
            Self::Neutral => 0,
            Self::Biased => 1,
        }
    }

    /// Target value used by the logistic loss.
    #[inline]
    #[must_use]
    pub fn as_target(self) -> f64 {
        f64::from(self.to_binary())
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Biased => "biased",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_binary(), self.name())
    }
}

/// A single labeled text sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub text: String,
    pub label: Label,
}

impl Example {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Count of examples per label, indexed by [`Label::to_binary`].
#[must_use]
pub fn label_distribution(examples: &[Example]) -> [usize; 2] {
    label_counts(examples.iter().map(|example| example.label))
}

/// Occurrences of each label, indexed by [`Label::to_binary`].
#[must_use]
pub fn label_counts(labels: impl IntoIterator<Item = Label>) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for label in labels {
        counts[usize::from(label.to_binary())] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_binary_mapping() {
        assert_eq!(Label::from_binary(0), Some(Label::Neutral));
        assert_eq!(Label::from_binary(1), Some(Label::Biased));
        assert_eq!(Label::from_binary(2), None);
        assert_eq!(Label::from_binary(-1), None);
        assert_eq!(Label::Biased.to_binary(), 1);
        assert!((Label::Neutral.as_target() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_label_distribution() {
        let examples = vec![
            Example::new("a", Label::Neutral),
            Example::new("b", Label::Biased),
            Example::new("c", Label::Biased),
        ];
        assert_eq!(label_distribution(&examples), [1, 2]);
        assert_eq!(label_distribution(&[]), [0, 0]);
        assert_eq!(label_counts([Label::Neutral, Label::Neutral]), [2, 0]);
    }
}
