//! Shared XML attribute parsing utilities for XLSX parsing.
//!
//! All functions match on the full (possibly prefixed) attribute key unless
//! noted, and unescape entity references in values.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key.
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true; anything else is false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Extract a boolean attribute with a default value.
pub fn attr_bool_default(e: &BytesStart, key: &[u8], default: bool) -> bool {
    attr_bool(e, key).unwrap_or(default)
}

/// Minimal XML escaping for attribute/text content.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn make_start(content: &str) -> BytesStart<'_> {
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"sheet name="overlap fix" r:id="rId3""#);
        assert_eq!(attr_string(&e, b"name"), Some("overlap fix".to_string()));
        assert_eq!(attr_string(&e, b"id"), None);
        assert_eq!(attr_string_local(&e, b"id"), Some("rId3".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_string_unescapes() {
        let e = make_start(r#"sheet name="R&amp;D""#);
        assert_eq!(attr_string(&e, b"name"), Some("R&D".to_string()));
    }

    #[test]
    fn test_numeric_attrs() {
        let e = make_start(r#"col min="2" max="4" width="12.5""#);
        assert_eq!(attr_u32(&e, b"min"), Some(2));
        assert_eq!(attr_f64(&e, b"width"), Some(12.5));
        assert_eq!(attr_u32(&e, b"width"), None);
    }

    #[test]
    fn test_attr_bool() {
        let e = make_start(r#"row a="1" b="0" c="true" d="false""#);
        assert_eq!(attr_bool(&e, b"a"), Some(true));
        assert_eq!(attr_bool(&e, b"b"), Some(false));
        assert_eq!(attr_bool(&e, b"c"), Some(true));
        assert_eq!(attr_bool(&e, b"d"), Some(false));
        assert!(!attr_bool_default(&e, b"missing", false));
        assert!(attr_bool_default(&e, b"missing", true));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}
