use bias_lite_preprocessing::data_loader::Label;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Loading or splitting the labeled examples failed.
    #[error(transparent)]
    Preprocessing(#[from] bias_lite_preprocessing::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training set is empty")]
    EmptyTrainingSet,

    /// Logistic regression needs both classes present.
    #[error("training set only contains class {label}; both classes are required")]
    SingleClass { label: Label },

    #[error("got {rows} feature rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `idf`, `coef` and `vocab` must all have one entry per feature column.
    #[error("inconsistent model artifact: |vocab| = {vocab}, |idf| = {idf}, |coef| = {coef}")]
    InconsistentArtifact { vocab: usize, idf: usize, coef: usize },

    #[error("vocabulary entry `{token}` has bad index {index} (0..{num_features}, unique)")]
    InvalidVocabularyIndex {
        token: String,
        index: usize,
        num_features: usize,
    },

    #[error("artifact field `{field}` holds a non-finite value")]
    NonFiniteParameter { field: &'static str },

    #[error(
        "invalid n-gram range [{min}, {max}], expected 1 <= min <= max <= {cap}",
        cap = bias_lite_preprocessing::pre_processor::MAX_NGRAM_SIZE
    )]
    InvalidNgramRange { min: usize, max: usize },

    #[error("unsupported normalization `{0}`, expected `l2` or `none`")]
    UnsupportedNorm(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
