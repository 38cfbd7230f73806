use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::example::{Example, Label};
use crate::error::{Error, Result};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Train and held-out subsets, each in the original input order.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Vec<Example>,
    pub test: Vec<Example>,
}

/// Partition `examples` into train/test subsets, sampling each label stratum
/// independently at `test_size`.
///
/// Every stratum present in the input contributes `round(test_size * n)`
/// examples to the test side, clamped so that both sides keep at least one.
/// Strata are shuffled with a `ChaCha8` generator seeded from `seed` in label
/// order, so the same input order and seed always yield the same partition.
pub fn stratified_split(examples: &[Example], test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if examples.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(Error::InvalidTestSize(test_size));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut in_test = vec![false; examples.len()];

    for label in Label::ALL {
        let mut stratum = examples
            .iter()
            .enumerate()
            .filter(|(_, example)| example.label == label)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        let count = stratum.len();
        if count == 0 {
            continue;
        }
        if count < 2 {
            return Err(Error::StratumTooSmall { label, count });
        }

        let n_test = ((count as f64 * test_size).round() as usize).clamp(1, count - 1);
        stratum.shuffle(&mut rng);
        for &idx in &stratum[..n_test] {
            in_test[idx] = true;
        }
        debug!(%label, stratum_size = count, n_test, "Sampled stratum");
    }

    let (test, train): (Vec<_>, Vec<_>) = examples
        .iter()
        .zip(&in_test)
        .partition(|(_, is_test)| **is_test);
    let split = TrainTestSplit {
        train: train.into_iter().map(|(e, _)| e.clone()).collect(),
        test: test.into_iter().map(|(e, _)| e.clone()).collect(),
    };

    debug!(
        train = split.train.len(),
        test = split.test.len(),
        "Stratified split complete"
    );
    Ok(split)
}
