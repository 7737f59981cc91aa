//! Text matching shared by the store backends.
//!
//! Queries are split into lowercase alphanumeric terms. A document matches
//! when any term equals one of its words; the last term also matches as a
//! prefix so partially typed words still find results.

/// Splits text into lowercase alphanumeric terms.
pub(crate) fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Counts how many query terms match words of `text`. Zero means no match.
pub(crate) fn score(query_terms: &[String], text: &str) -> usize {
    let words = terms(text);
    let last = query_terms.len().saturating_sub(1);

    query_terms
        .iter()
        .enumerate()
        .filter(|(i, term)| {
            words
                .iter()
                .any(|word| word == *term || (*i == last && word.starts_with(term.as_str())))
        })
        .count()
}

/// Builds an FTS5 MATCH expression, or `None` when the query has no terms.
pub(crate) fn fts_expression(text: &str) -> Option<String> {
    let query_terms = terms(text);
    let last = query_terms.len().checked_sub(1)?;

    let parts: Vec<String> = query_terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            if i == last {
                format!("\"{}\"*", term)
            } else {
                format!("\"{}\"", term)
            }
        })
        .collect();

    Some(parts.join(" OR "))
}
