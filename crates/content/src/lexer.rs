//! A minimal byte-level HTML tag lexer.
//!
//! The DOM built by `scraper` cannot be serialised back without normalising
//! the author's markup, so edits are made on byte spans found here instead.
//! Only tags and their attributes are tokenised; text, comments, doctypes and
//! the contents of raw-text elements are skipped over. Every span sits on a
//! char boundary because all delimiters are ASCII.

use crate::consts::RAW_TEXT_ELEMENTS;
use memchr::memchr;
use scraper::{ElementRef, Html};
use std::borrow::Cow;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attribute<'a> {
    /// Lowercased attribute name
    pub name: String,
    /// From the first byte of the name to the last byte of the value
    pub span: Range<usize>,
    /// The attribute as written, `name="value"`
    pub source: &'a str,
    /// Raw value without quotes, entities still encoded
    pub raw_value: Option<&'a str>,
}
impl<'a> Attribute<'a> {
    /// Decoded, whitespace-trimmed value; empty for a bare attribute.
    ///
    /// Decoding matches what [`scan`](crate::scan) sees for the same markup.
    pub fn value(&self) -> Cow<'a, str> {
        match self.raw_value {
            Some(raw) if !raw.contains(['&', '\r', '\0']) => Cow::Borrowed(raw.trim()),
            Some(_) => Cow::Owned(decode_attribute(self.source).trim().to_string()),
            None => Cow::Borrowed(""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag<'a> {
    /// Lowercased tag name
    pub name: String,
    /// From `<` to `>` inclusive
    pub span: Range<usize>,
    pub attributes: Vec<Attribute<'a>>,
    pub is_end: bool,
}
impl<'a> Tag<'a> {
    /// First attribute with this name; later duplicates are ignored by
    /// browsers, so they are ignored here too.
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

/// Iterator over the tags of an HTML document or fragment.
pub(crate) struct Tags<'a> {
    html: &'a str,
    position: usize,
}

pub(crate) fn tags(html: &str) -> Tags<'_> {
    Tags { html, position: 0 }
}

impl<'a> Iterator for Tags<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.html.as_bytes();
        loop {
            let start = self.position + memchr(b'<', bytes.get(self.position..)?)?;
            let rest = &bytes[start + 1..];
            match rest.first() {
                Some(b'!') if rest.starts_with(b"!--") => self.position = comment_end(bytes, start + 4),
                Some(b'!' | b'?') => self.position = bogus_end(bytes, start + 1),
                Some(b'/') => match rest.get(1) {
                    Some(c) if c.is_ascii_alphabetic() => {
                        let tag = self.lex_tag(start, start + 2, true)?;
                        self.position = tag.span.end;
                        return Some(tag);
                    },
                    _ => self.position = bogus_end(bytes, start + 2),
                },
                Some(c) if c.is_ascii_alphabetic() => {
                    let tag = self.lex_tag(start, start + 1, false)?;
                    self.position = tag.span.end;
                    if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                        self.position = raw_text_end(bytes, self.position, &tag.name);
                    }
                    return Some(tag);
                },
                // A lone `<` is text.
                _ => self.position = start + 1,
            }
        }
    }
}

impl<'a> Tags<'a> {
    /// Lex a tag whose name begins at `name_start`. Returns `None` if the
    /// input ends inside the tag, which browsers discard as well.
    fn lex_tag(&self, start: usize, name_start: usize, is_end: bool) -> Option<Tag<'a>> {
        let html = self.html;
        let bytes = html.as_bytes();
        let mut i = name_start;
        while i < bytes.len() && !is_space(bytes[i]) && bytes[i] != b'/' && bytes[i] != b'>' {
            i += 1;
        }
        let name = html[name_start..i].to_ascii_lowercase();
        let mut attributes = Vec::new();
        loop {
            while i < bytes.len() && (is_space(bytes[i]) || bytes[i] == b'/') {
                i += 1;
            }
            match bytes.get(i)? {
                b'>' => break,
                _ => {
                    let (attribute, end) = lex_attribute(html, i)?;
                    attributes.push(attribute);
                    i = end;
                },
            }
        }
        Some(Tag { name, span: start..i + 1, attributes, is_end })
    }
}

fn lex_attribute(html: &str, start: usize) -> Option<(Attribute<'_>, usize)> {
    let bytes = html.as_bytes();
    // A leading `=` is part of the name.
    let mut i = start + 1;
    while i < bytes.len() && !is_space(bytes[i]) && !matches!(bytes[i], b'/' | b'>' | b'=') {
        i += 1;
    }
    let name = html[start..i].to_ascii_lowercase();
    let name_end = i;
    while i < bytes.len() && is_space(bytes[i]) {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        let attribute = Attribute { name, span: start..name_end, source: &html[start..name_end], raw_value: None };
        return Some((attribute, name_end));
    }
    i += 1;
    while i < bytes.len() && is_space(bytes[i]) {
        i += 1;
    }
    let (raw_value, end) = match *bytes.get(i)? {
        quote @ (b'"' | b'\'') => {
            let close = i + 1 + memchr(quote, &bytes[i + 1..])?;
            (&html[i + 1..close], close + 1)
        },
        // `<a href=>` has an empty value and the `>` closes the tag.
        b'>' => (&html[i..i], i),
        _ => {
            let mut end = i;
            while end < bytes.len() && !is_space(bytes[end]) && bytes[end] != b'>' {
                end += 1;
            }
            (&html[i..end], end)
        },
    };
    Some((Attribute { name, span: start..end, source: &html[start..end], raw_value: Some(raw_value) }, end))
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

fn comment_end(bytes: &[u8], body_start: usize) -> usize {
    let body = bytes.get(body_start..).unwrap_or_default();
    // `<!-->` and `<!--->` are complete (empty) comments.
    if body.starts_with(b">") {
        return body_start + 1;
    }
    if body.starts_with(b"->") {
        return body_start + 2;
    }
    match memchr::memmem::find(body, b"-->") {
        Some(offset) => body_start + offset + 3,
        None => bytes.len(),
    }
}

fn bogus_end(bytes: &[u8], from: usize) -> usize {
    match bytes.get(from..).and_then(|rest| memchr(b'>', rest)) {
        Some(offset) => from + offset + 1,
        None => bytes.len(),
    }
}

/// Position of the `</name` that closes a raw-text element opened before `from`.
fn raw_text_end(bytes: &[u8], from: usize, name: &str) -> usize {
    if name == "plaintext" {
        return bytes.len();
    }
    let mut position = from;
    while let Some(offset) = bytes.get(position..).and_then(|rest| memchr(b'<', rest)) {
        let candidate = position + offset;
        let after = candidate + 2 + name.len();
        if bytes.get(candidate + 1) == Some(&b'/')
            && bytes.get(candidate + 2..after).is_some_and(|tag| tag.eq_ignore_ascii_case(name.as_bytes()))
            && bytes.get(after).is_none_or(|&next| is_space(next) || next == b'/' || next == b'>')
        {
            return candidate;
        }
        position = candidate + 1;
    }
    bytes.len()
}

/// Decode one attribute (`name="value"` as written) with the HTML parser.
///
/// Character references in attribute values have rules of their own (legacy
/// names without `;` are only decoded when not followed by `=` or an
/// alphanumeric), so the parser that scanned the fragment does the decoding
/// here too.
fn decode_attribute(source: &str) -> String {
    let fragment = Html::parse_fragment(&format!("<b {source}>"));
    fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "b")
        .and_then(|element| element.value().attrs().next().map(|(_, value)| value.to_string()))
        .unwrap_or_default()
}

/// Escape a value for use inside a double-quoted attribute.
pub(crate) fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '"']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('&', "&amp;").replace('"', "&quot;"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(html: &str) -> Vec<String> {
        tags(html).map(|tag| if tag.is_end { format!("/{}", tag.name) } else { tag.name }).collect()
    }

    #[test]
    fn test_basic_tags() {
        let html = r#"<p class="x">Hi <AMP-IMG SRC='a.jpg' alt=b layout="fill"/></p>"#;
        assert_eq!(names(html), vec!["p", "amp-img", "/p"]);
        let img = tags(html).nth(1).unwrap();
        assert_eq!(&html[img.span.clone()], "<AMP-IMG SRC='a.jpg' alt=b layout=\"fill\"/>");
        let src = img.attribute("src").unwrap();
        assert_eq!(&html[src.span.clone()], "SRC='a.jpg'");
        assert_eq!(src.source, "SRC='a.jpg'");
        assert_eq!(src.value(), "a.jpg");
        assert_eq!(img.attribute("alt").unwrap().value(), "b");
    }

    #[test]
    fn test_quoted_gt_does_not_end_tag() {
        let html = r#"<amp-img alt="a > b" src="x.png"><i>"#;
        assert_eq!(names(html), vec!["amp-img", "i"]);
        assert_eq!(tags(html).next().unwrap().attribute("src").unwrap().value(), "x.png");
    }

    #[test]
    fn test_bare_and_empty_attributes() {
        let html = r#"<amp-video autoplay loop src= >"#;
        let tag = tags(html).next().unwrap();
        let names: Vec<_> = tag.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["autoplay", "loop", "src"]);
        assert_eq!(tag.attribute("autoplay").unwrap().raw_value, None);
        assert_eq!(tag.attribute("src").unwrap().value(), "");
    }

    #[test]
    fn test_first_duplicate_attribute_wins() {
        let tag = tags(r#"<amp-img src="a" src="b">"#).next().unwrap();
        assert_eq!(tag.attribute("src").unwrap().value(), "a");
    }

    #[rstest]
    #[case::comment("<!-- <amp-img src=x> --><b>", vec!["b"])]
    #[case::empty_comment("<!--><b>", vec!["b"])]
    #[case::unterminated_comment("<!-- <amp-img src=x>", vec![])]
    #[case::doctype("<!DOCTYPE html><b>", vec!["b"])]
    #[case::processing("<?xml version='1.0'?><b>", vec!["b"])]
    #[case::script("<script>if (a <amp-img) {}</script><b>", vec!["script", "/script", "b"])]
    #[case::script_string("<script>'</scriptx>'<amp-img></SCRIPT ><b>", vec!["script", "/script", "b"])]
    #[case::noscript("<noscript><amp-img src=x></noscript>", vec!["noscript", "/noscript"])]
    #[case::lone_lt("a < b <3 <b>", vec!["b"])]
    #[case::bogus_end("</ nope><b>", vec!["b"])]
    #[case::truncated("<b><amp-img src=\"x", vec!["b"])]
    fn test_skips_non_markup(#[case] html: &str, #[case] expected: Vec<&str>) {
        assert_eq!(names(html), expected);
    }

    #[rstest]
    #[case::plain(r#"src="plain""#, "plain")]
    #[case::amp(r#"src="a&amp;b""#, "a&b")]
    #[case::quot(r#"src='&quot;q&quot;'"#, "\"q\"")]
    #[case::numeric("src=&#39;&#x27;&#X27;", "'''")]
    #[case::numeric_without_semicolon(r#"src="a&#38b""#, "a&b")]
    #[case::named(r#"src="caf&eacute;.jpg""#, "café.jpg")]
    #[case::uppercase(r#"src="a&AMP;b""#, "a&b")]
    #[case::unknown(r#"src="&bogus; & x""#, "&bogus; & x")]
    #[case::legacy_before_equals(r#"src="?a=1&copy=2""#, "?a=1&copy=2")]
    #[case::legacy_at_end(r#"src="&copy""#, "©")]
    #[case::null(r#"src="&#0;""#, "\u{FFFD}")]
    fn test_value_decoding(#[case] attribute: &str, #[case] expected: &str) {
        let html = format!("<amp-img {attribute}>");
        let tag = tags(&html).next().unwrap();
        assert_eq!(tag.attribute("src").unwrap().value(), expected);
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("https://x/a.png"), "https://x/a.png");
        assert_eq!(escape_attribute(r#"a&b"c"#), "a&amp;b&quot;c");
    }
}
