use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Folds a string to the comparison key used by every text search:
/// NFD decomposition, combining diacritical marks stripped, lowercased.
///
/// Idempotent, so index keys and query terms can both be passed through it:
/// `normalize("México") == normalize("MEXICO") == "mexico"`.
pub fn normalize(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
