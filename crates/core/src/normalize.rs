//! Name normalization and text tokenization shared by the document builder
//! and the manual text-search fallback.

/// Arabic tatweel (kashida) character, stripped during normalization.
const TATWEEL: char = '\u{0640}';

/// Lowercase, strip the tatweel character, and collapse any run of
/// non-letter/non-digit characters to a single space.
///
/// This is the canonical transform for `PropertyDocument::name_normalized`
/// and is also used to normalize query text before tokenizing.
pub fn normalize_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_sep = true; // trims leading separators
    for ch in input.chars() {
        if ch == TATWEEL {
            continue;
        }
        let lower: Vec<char> = ch.to_lowercase().collect();
        for lc in lower {
            if lc.is_alphanumeric() {
                out.push(lc);
                last_was_sep = false;
            } else if !last_was_sep {
                out.push(' ');
                last_was_sep = true;
            }
        }
    }
    out.trim_end().to_string()
}

/// Split normalized text into tokens on whitespace, dropping empties.
pub fn tokenize(input: &str) -> Vec<String> {
    normalize_name(input)
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}
