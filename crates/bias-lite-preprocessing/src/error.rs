use crate::data_loader::Label;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("dataset contains no examples")]
    EmptyDataset,

    #[error("test_size must be in (0.0, 1.0), got {0}")]
    InvalidTestSize(f64),

    /// A stratified split needs at least one example of the class on each side.
    #[error("cannot stratify: class {label} has {count} example(s), at least 2 are required")]
    StratumTooSmall { label: Label, count: usize },

    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot interpret `{value}` as a 0/1 label")]
    InvalidLabel { row: usize, value: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
