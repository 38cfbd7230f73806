use ahash::HashMap;
use dashmap::DashMap;
use rayon::prelude::*;

/// Separator placed between the tokens of a multi-token n-gram.
pub const NGRAM_SEPARATOR: &str = " ";

/// Count every contiguous n-gram of each size in `ngram_sizes`.
///
/// Tokens never contain whitespace, so a joined bigram can never collide with
/// a unigram.
pub fn count_ngrams<S: AsRef<str>>(tokens: &[S], ngram_sizes: &[usize]) -> HashMap<String, usize> {
    let mut ngram_counter = HashMap::default();

    for &n in ngram_sizes {
        for window in tokens.windows(n) {
            let ngram = window
                .iter()
                .map(|token| token.as_ref())
                .collect::<Vec<&str>>()
                .join(NGRAM_SEPARATOR);
            *ngram_counter.entry(ngram).or_insert(0) += 1;
        }
    }
    ngram_counter
}

/// Document frequency of every n-gram across `ngram_maps`.
///
/// Counting happens in parallel; the result only holds integer counts, so it
/// does not depend on scheduling.
pub fn document_frequencies(
    ngram_maps: &[HashMap<String, usize>],
) -> DashMap<String, usize, ahash::RandomState> {
    let vocab_df = DashMap::with_hasher(ahash::RandomState::default());

    ngram_maps.par_iter().for_each(|ngrams| {
        for ngram in ngrams.keys() {
            vocab_df
                .entry(ngram.clone())
                .and_modify(|df| *df += 1)
                .or_insert(1usize);
        }
    });
    vocab_df
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unigrams_and_bigrams() {
        let tokens = ["women", "are", "women"];
        let counts = count_ngrams(&tokens, &[1, 2]);
        assert_eq!(counts.len(), 4);
        assert_eq!(counts["women"], 2);
        assert_eq!(counts["are"], 1);
        assert_eq!(counts["women are"], 1);
        assert_eq!(counts["are women"], 1);
    }

    #[test]
    fn test_short_documents() {
        let single = ["alone"];
        let counts = count_ngrams(&single, &[1, 2]);
        assert_eq!(counts.len(), 1);

        let empty: [&str; 0] = [];
        assert!(count_ngrams(&empty, &[1, 2]).is_empty());
    }

    #[test]
    fn test_document_frequency_counts_documents_not_occurrences() {
        let docs = [
            count_ngrams(&["women", "women"], &[1]),
            count_ngrams(&["women", "lead"], &[1]),
        ];
        let df = document_frequencies(&docs);
        assert_eq!(*df.get("women").unwrap(), 2);
        assert_eq!(*df.get("lead").unwrap(), 1);
    }
}
