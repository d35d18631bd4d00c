//! Regex construction from literal strings.
//!
//! Every regex built from content- or config-derived text goes through
//! [`escape_literal`], so a `.` or `?` inside a URL never acts as a
//! metacharacter.

use regex::Regex;

/// Escape all regex metacharacters in `text`.
#[inline]
pub fn escape_literal(text: &str) -> String {
    regex::escape(text)
}

/// Build a regex matching an `href` attribute whose value is exactly
/// `target`, in either quote style.
///
/// The attribute name must follow whitespace, so `data-href` and
/// `xlink:href` never match; group 1 holds that whitespace. The name is
/// case-insensitive and whitespace is allowed around `=`. The value itself is
/// matched literally and case-sensitively.
pub fn href_attr(target: &str) -> Result<Regex, regex::Error> {
    let lit = escape_literal(target);
    Regex::new(&format!(r#"(\s)(?i:href)\s*=\s*(?:"{lit}"|'{lit}')"#))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal_metacharacters() {
        assert_eq!(escape_literal("/a.b?c=1"), r"/a\.b\?c=1");
        assert_eq!(escape_literal("/plain-path"), "/plain-path");
    }

    #[test]
    fn test_href_attr_both_quotes() {
        let re = href_attr("/webseries").unwrap();
        assert!(re.is_match(r#"<a href="/webseries">"#));
        assert!(re.is_match("<a href='/webseries'>"));
        assert!(re.is_match(r#"<a HREF = "/webseries">"#));
        assert!(!re.is_match(r#"<a href="/webseries-2">"#));
    }

    #[test]
    fn test_href_attr_dot_is_literal() {
        let re = href_attr("/page.html").unwrap();
        assert!(re.is_match(r#"<a href="/page.html">"#));
        assert!(!re.is_match(r#"<a href="/pageXhtml">"#));
    }

    #[test]
    fn test_href_attr_mismatched_quotes() {
        let re = href_attr("/x").unwrap();
        assert!(!re.is_match(r#"<a href="/x'>"#));
    }

    #[test]
    fn test_href_attr_needs_whole_attribute_name() {
        let re = href_attr("/x").unwrap();
        assert!(!re.is_match(r#"<a data-href="/x">"#));
        assert!(!re.is_match(r#"<use xlink:href="/x"/>"#));
        assert!(!re.is_match(r#"<a href="/y" data-href="/x">"#));

        let caps = re.captures("<a\n\thref='/x'>").unwrap();
        assert_eq!(&caps[1], "\t");
    }
}
