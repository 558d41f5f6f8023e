//! HTML utility functions.
//!
//! Provides the small amount of HTML handling the rewriters need:
//! - `escape_attr()` - entity escaping for attribute values
//! - `parse_attributes()` - attribute string parsing
//! - [`Attributes`] - ordered attribute list with lookup and rendering
//! - [`OpenTag`] - locate and rebuild the opening tag of a fragment

use std::borrow::Cow;

// =============================================================================
// HTML Escaping
// =============================================================================

/// Characters that require HTML escaping.
const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML attribute values.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

// =============================================================================
// Attribute Parsing
// =============================================================================

/// Parse HTML-style attributes from a string.
///
/// Input: `src="a.jpg" class='hero' width=10 async`
/// Output: `[("src", "a.jpg"), ("class", "hero"), ("width", "10"), ("async", "")]`
///
/// Names are lowercased. A trailing `/` (self-closing syntax) is ignored.
pub fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == '/' {
            continue;
        }

        // Read attribute name
        let mut name = String::new();
        name.push(c.to_ascii_lowercase());
        while let Some(&next) = chars.peek() {
            if next == '=' || next == '/' || next.is_whitespace() {
                break;
            }
            name.push(next.to_ascii_lowercase());
            chars.next();
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        if chars.peek() != Some(&'=') {
            // Boolean attribute (no value)
            attrs.push((name, String::new()));
            continue;
        }
        chars.next(); // consume '='

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                for c in chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    value.push(c);
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }
        attrs.push((name, value));
    }

    attrs
}

// =============================================================================
// Attributes
// =============================================================================

/// Ordered attribute list, as passed between the host and the rewriters.
///
/// Keys are unique; `set` replaces in place so the original order survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the inside of an opening tag (without the tag name).
    pub fn parse(s: &str) -> Self {
        let mut attrs = Self::new();
        for (name, value) in parse_attributes(s) {
            if !attrs.contains(&name) {
                attrs.0.push((name, value));
            }
        }
        attrs
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(index).1)
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get("class").unwrap_or_default().split_ascii_whitespace()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as ` name="value"` pairs (leading space included).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.0 {
            if value.is_empty() && is_boolean_attribute(name) {
                out.push(' ');
                out.push_str(name);
            } else {
                out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attrs = Self::new();
        for (k, v) in iter {
            attrs.set(&k.into(), v);
        }
        attrs
    }
}

/// Attributes that are rendered without a value when empty.
fn is_boolean_attribute(name: &str) -> bool {
    matches!(
        name,
        "async" | "defer" | "nomodule" | "crossorigin" | "disabled" | "hidden" | "ismap"
    )
}

// =============================================================================
// Opening tag
// =============================================================================

/// The opening tag at the start of an HTML fragment.
///
/// `<script src="a.js" defer></script>` splits into name `script`, the raw
/// attribute text and everything after the closing `>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag<'a> {
    pub name: String,
    pub attrs: &'a str,
    pub self_closing: bool,
    pub rest: &'a str,
}

impl<'a> OpenTag<'a> {
    /// Split `fragment` at its first opening tag. Leading whitespace is allowed.
    pub fn split(fragment: &'a str) -> Option<Self> {
        let start = fragment.find('<')?;
        let body = &fragment[start + 1..];
        let end = find_tag_end(body)?;
        let inner = &body[..end];

        let name_len = inner
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(inner.len());
        let name = inner[..name_len].to_ascii_lowercase();
        if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }

        let attrs = inner[name_len..].trim_end();
        let self_closing = attrs.ends_with('/');
        let attrs = attrs.trim_end_matches('/');

        Some(Self {
            name,
            attrs,
            self_closing,
            rest: &body[end + 1..],
        })
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::parse(self.attrs)
    }
}

/// Index of the `>` closing a tag body, skipping quoted attribute values.
fn find_tag_end(body: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("normal"), "normal");
        assert_eq!(escape_attr("a\"b&c"), "a&quot;b&amp;c");
        assert_eq!(escape_attr("it's"), "it&#39;s");
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#"a="1" b='2' c=3 disabled"#);
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0], ("a".to_string(), "1".to_string()));
        assert_eq!(attrs[1], ("b".to_string(), "2".to_string()));
        assert_eq!(attrs[2], ("c".to_string(), "3".to_string()));
        assert_eq!(attrs[3], ("disabled".to_string(), "".to_string()));
    }

    #[test]
    fn test_parse_attributes_self_closing() {
        let attrs = parse_attributes(r#"src="a.jpg" /"#);
        assert_eq!(attrs, vec![("src".to_string(), "a.jpg".to_string())]);
    }

    #[test]
    fn test_attributes_set_keeps_order() {
        let mut attrs = Attributes::parse(r#"src="a.jpg" class="hero" alt="x""#);
        attrs.set("class", "hero wide");
        attrs.set("loading", "eager");
        let names: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["src", "class", "alt", "loading"]);
        assert_eq!(attrs.classes().collect::<Vec<_>>(), ["hero", "wide"]);
    }

    #[test]
    fn test_attributes_render() {
        let attrs: Attributes = [("src", "a.js"), ("defer", ""), ("data-x", "\"q\"")]
            .into_iter()
            .collect();
        assert_eq!(attrs.render(), r#" src="a.js" defer data-x="&quot;q&quot;""#);
    }

    #[test]
    fn test_open_tag_split() {
        let tag = OpenTag::split(r#"<script src="a.js?x=>" defer></script>"#).unwrap();
        assert_eq!(tag.name, "script");
        assert_eq!(tag.attributes().get("src"), Some("a.js?x=>"));
        assert!(tag.attributes().contains("defer"));
        assert_eq!(tag.rest, "</script>");
    }

    #[test]
    fn test_open_tag_self_closing() {
        let tag = OpenTag::split(r#"<img src="a.jpg"/>"#).unwrap();
        assert_eq!(tag.name, "img");
        assert!(tag.self_closing);
        assert_eq!(tag.attributes().get("src"), Some("a.jpg"));
        assert!(OpenTag::split("plain text").is_none());
    }
}
