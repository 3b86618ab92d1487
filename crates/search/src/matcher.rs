//! Manual text-search fallback: scans a document's normalized
//! fields and keeps it if any query token appears as a substring.

use propdex_core::document::PropertyDocument;
use propdex_core::normalize::normalize_name;

/// Every normalized text field of `doc` eligible for a manual text match:
/// name, description, city, and each dynamic field value.
pub fn haystacks(doc: &PropertyDocument) -> Vec<String> {
    let mut out = Vec::with_capacity(3 + doc.dynamic_fields.len());
    out.push(doc.name_normalized.clone());
    out.push(normalize_name(&doc.description));
    out.push(normalize_name(&doc.city));
    out.extend(doc.dynamic_fields.values().map(|v| normalize_name(v)));
    out
}

/// Whether `doc` contains any of `tokens` as a substring of any haystack
/// field. An empty token list matches every document.
pub fn matches(doc: &PropertyDocument, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let fields = haystacks(doc);
    tokens.iter().any(|token| fields.iter().any(|field| field.contains(token.as_str())))
}
