// src/utils/text.rs

//! Text normalization for extracted fields.

use unicode_segmentation::UnicodeSegmentation;

/// Marker appended when a field is cut at `max_len`.
pub const TRUNCATION_MARKER: &str = " […truncated]";

/// Collapse all runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the HTML entities that survive rendered-page text extraction.
pub fn decode_entities(s: &str) -> String {
    let mut out = s
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}");
    // Numeric references: &#NNNN;. An unparseable reference is left in
    // place and the scan moves past it.
    let mut from = 0;
    while let Some(offset) = out[from..].find("&#") {
        let start = from + offset;
        let Some(end) = out[start..].find(';').map(|i| start + i) else {
            break;
        };
        let code = &out[start + 2..end];
        match code.parse::<u32>().ok().and_then(char::from_u32) {
            Some(c) => {
                let decoded = c.to_string();
                out.replace_range(start..=end, &decoded);
                from = start + decoded.len();
            }
            None => from = start + 2,
        }
    }
    out
}

/// Truncate at a grapheme boundary, appending an explicit marker rather
/// than cutting silently.
pub fn truncate_with_marker(s: &str, max_len: usize) -> String {
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    if graphemes.len() <= max_len {
        return s.to_string();
    }
    let mut out: String = graphemes[..max_len].concat();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Strip a known label ("Decision Summary", "INCOME TAX :", " | IT-rulings")
/// from the start or end of a field value. Only the first matching label
/// is removed.
pub fn strip_labels(s: &str, labels: &[&str]) -> String {
    let trimmed = s.trim();
    for label in labels {
        if let Some(rest) = trimmed.strip_prefix(label) {
            return rest.trim_start_matches([':', ' ']).to_string();
        }
        if let Some(rest) = trimmed.strip_suffix(label) {
            return rest.trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// Full cleanup applied to every extracted text field.
pub fn clean_field(raw: &str, max_len: usize) -> String {
    truncate_with_marker(&normalize_whitespace(&decode_entities(raw)), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(decode_entities("A &amp; B &nbsp;&#8211; C"), "A & B  \u{2013} C");
    }

    #[test]
    fn bad_reference_does_not_block_later_ones() {
        // Hex references are not decoded but must not stop the scan
        assert_eq!(
            decode_entities("&#x2019;s view &#8211; final"),
            "&#x2019;s view \u{2013} final"
        );
        assert_eq!(decode_entities("&#; then &#65;"), "&#; then A");
    }

    #[test]
    fn truncation_is_explicit() {
        let long = "x".repeat(20);
        let out = truncate_with_marker(&long, 10);
        assert!(out.starts_with("xxxxxxxxxx"));
        assert!(out.ends_with(TRUNCATION_MARKER));
        // Short strings pass through untouched
        assert_eq!(truncate_with_marker("short", 10), "short");
    }

    #[test]
    fn truncation_respects_graphemes() {
        let s = "a\u{0301}e\u{0301}i\u{0301}o\u{0301}";
        let out = truncate_with_marker(s, 2);
        assert!(out.starts_with("a\u{0301}e\u{0301}"));
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn strips_label_prefix_and_suffix() {
        assert_eq!(
            strip_labels("Decision Summary: Held in favour", &["Decision Summary"]),
            "Held in favour"
        );
        assert_eq!(
            strip_labels("INCOME TAX : assessee wins", &["INCOME TAX"]),
            "assessee wins"
        );
        assert_eq!(
            strip_labels("Some Ruling | IT-rulings", &[" | IT-rulings"]),
            "Some Ruling"
        );
        assert_eq!(strip_labels("plain text", &["GST"]), "plain text");
    }
}
