/// Default decision threshold between 0.0 and 1.0.
///
/// If P(biased) >= threshold, the text is classified as biased.
/// Lower thresholds flag more text, higher thresholds are more conservative.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.5;
