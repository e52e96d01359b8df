//! Text sanitizing ahead of the extraction model

use unicode_normalization::UnicodeNormalization;

/// Fold text to ASCII before sending it to the model.
///
/// Compatibility decomposition splits accented letters into base letter
/// plus combining mark; everything outside ASCII is then dropped.
pub fn sanitize_for_model(text: &str) -> String {
    text.nfkd().filter(|c| c.is_ascii()).collect()
}
