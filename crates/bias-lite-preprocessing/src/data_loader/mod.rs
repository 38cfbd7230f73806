mod csv_source;
mod example;
mod split;

pub use csv_source::{LABEL_COLUMN, TEXT_COLUMN, load_csv, load_csv_reader};
pub use example::{Example, Label, label_counts, label_distribution};
pub use split::{DEFAULT_SEED, DEFAULT_TEST_SIZE, TrainTestSplit, stratified_split};
