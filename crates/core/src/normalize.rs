use std::collections::BTreeMap;

use unicode_normalization::UnicodeNormalization;

/// Accent-strip and lower-case without trimming.
///
/// Text is decomposed (NFKD) and everything outside ASCII is dropped, which
/// removes combining accents along with any other non-ASCII remainder.
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Canonical form used for every identifier comparison: `fold` plus trim.
pub fn normalize(text: &str) -> String {
    let folded = fold(text);
    let trimmed = folded.trim();
    if trimmed.len() == folded.len() {
        folded
    } else {
        trimmed.to_string()
    }
}

/// Builds a rename map from raw column labels to canonical names.
///
/// Each label is normalized and looked up in `aliases` (whose keys must already
/// be normalized). Labels without a known alias are left out of the map.
pub fn resolve_aliases<'a, I, V>(columns: I, aliases: &BTreeMap<String, V>) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = &'a str>,
    V: Clone,
{
    columns
        .into_iter()
        .filter_map(|label| {
            aliases
                .get(&normalize(label))
                .map(|canonical| (label.to_string(), canonical.clone()))
        })
        .collect()
}
