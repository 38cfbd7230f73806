use std::{io::Read, path::Path};

use tracing::debug;

use super::example::{Example, Label, label_distribution};
use crate::error::{Error, Result};

pub const TEXT_COLUMN: &str = "text";
pub const LABEL_COLUMN: &str = "bias_present";

/// Load labeled examples from a headed CSV file.
///
/// See [`load_csv_reader`] for the column contract.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Example>> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading examples from CSV");
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    read_examples(reader)
}

/// Load labeled examples from any CSV source with a header row.
///
/// The `text` column is taken verbatim (an empty cell is an empty text).
/// The `bias_present` column must hold `0` or `1`; integral floats such as
/// `1.0` are accepted, anything else is an [`Error::InvalidLabel`].
pub fn load_csv_reader<R: Read>(reader: R) -> Result<Vec<Example>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    read_examples(reader)
}

fn read_examples<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Example>> {
    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(Error::MissingColumn(name))
    };
    let text_idx = column(TEXT_COLUMN)?;
    let label_idx = column(LABEL_COLUMN)?;

    let mut examples = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let text = record.get(text_idx).unwrap_or_default().to_string();
        let raw_label = record.get(label_idx).unwrap_or_default();
        let label = parse_label(raw_label).ok_or_else(|| Error::InvalidLabel {
            row,
            value: raw_label.to_string(),
        })?;
        examples.push(Example { text, label });
    }

    let [neutral, biased] = label_distribution(&examples);
    debug!(
        num_examples = examples.len(),
        neutral, biased, "Loaded labeled examples"
    );
    Ok(examples)
}

fn parse_label(raw: &str) -> Option<Label> {
    let raw = raw.trim();
    let value = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as i64)
    })?;
    Label::from_binary(value)
}
