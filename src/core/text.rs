use std::collections::BTreeSet;

/// Lower-case the text, replace every non-alphanumeric character with a
/// space and collapse runs of whitespace.
pub fn normalize_text(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text into word tokens, preserving order and duplicates
pub fn tokenize(text: &str) -> Vec<String> {
    normalize_text(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of two sets (intersection over union)
///
/// Returns 0.0 whenever either side is empty. Two empty sets carry no
/// information, so they are not treated as a perfect match.
#[inline]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count() as f64;
    let union = (a.len() + b.len()) as f64 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Whether a token mixes at least one letter with at least one digit
#[inline]
pub fn is_alphanumeric_mix(token: &str) -> bool {
    token.chars().any(|c| c.is_alphabetic()) && token.chars().any(|c| c.is_ascii_digit())
}
