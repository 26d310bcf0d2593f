//! XHTML compatibility for the HTML tree builder.
//!
//! EPUB chapters are XHTML, where `<title/>` or `<div class="x"/>` is a
//! complete, empty element. An HTML tree builder ignores the slash on
//! non-void elements and treats them as open tags, which swallows the rest
//! of the document into a `<title>` or `<script>`, or nests it inside the
//! empty `<div>`.

use std::borrow::Cow;

use memchr::memmem;
use quick_xml::Reader;
use quick_xml::events::Event;

const XHTML_NAMESPACE: &[u8] = b"http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// True for markup carrying an XML declaration or the XHTML namespace.
pub fn is_xhtml(markup: &str) -> bool {
    let bytes = markup.as_bytes();
    let head = &bytes[..bytes.len().min(256)];
    memmem::find(head, b"<?xml").is_some() || memmem::find(bytes, XHTML_NAMESPACE).is_some()
}

/// Rewrite self-closing non-void elements as explicit open/close pairs.
///
/// `<a id="p5"/>` becomes `<a id="p5"></a>`; void elements such as `<br/>`
/// are left alone. Rewriting stops where the markup stops being
/// well-formed enough to tokenize, and the remainder is copied unchanged.
pub fn expand_empty_elements(markup: &str) -> Cow<'_, str> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;

    let mut out = String::new();
    let mut copied = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) => {
                let name = e.name();
                if is_void(local_name(name.as_ref())) {
                    continue;
                }

                let end = reader.buffer_position() as usize;
                let Some(start) = markup
                    .get(copied..end)
                    .and_then(|span| memchr::memrchr(b'<', span.as_bytes()))
                    .map(|i| copied + i)
                else {
                    continue;
                };
                let (Some(open), Ok(tag)) = (
                    markup.get(start..end).and_then(|raw| raw.strip_suffix("/>")),
                    std::str::from_utf8(name.as_ref()),
                ) else {
                    continue;
                };

                out.push_str(&markup[copied..start]);
                out.push_str(open);
                out.push_str("></");
                out.push_str(tag);
                out.push('>');
                copied = end;
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    if copied == 0 {
        return Cow::Borrowed(markup);
    }
    out.push_str(&markup[copied..]);
    Cow::Owned(out)
}

fn local_name(name: &[u8]) -> &[u8] {
    match memchr::memrchr(b':', name) {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

fn is_void(local: &[u8]) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.as_bytes().eq_ignore_ascii_case(local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_xhtml() {
        assert!(is_xhtml("<?xml version=\"1.0\"?><html><body/></html>"));
        assert!(is_xhtml("<html xmlns=\"http://www.w3.org/1999/xhtml\"><body/></html>"));
        assert!(!is_xhtml("<!DOCTYPE html><html><body><p>x</p></body></html>"));
    }

    #[test]
    fn test_expands_non_void_elements() {
        let markup = r#"<head><title/><script type="text/javascript" src="a.js"/></head>"#;
        assert_eq!(
            expand_empty_elements(markup),
            r#"<head><title></title><script type="text/javascript" src="a.js"></script></head>"#
        );
    }

    #[test]
    fn test_keeps_void_elements() {
        let markup = r#"<p>One<br/>Two<img src="x.png" /></p>"#;
        assert!(matches!(expand_empty_elements(markup), Cow::Borrowed(_)));
    }

    #[test]
    fn test_prefixed_names_keep_their_prefix() {
        let markup = r#"<svg:svg><svg:rect width="1"/></svg:svg>"#;
        assert_eq!(
            expand_empty_elements(markup),
            r#"<svg:svg><svg:rect width="1"></svg:rect></svg:svg>"#
        );
    }

    #[test]
    fn test_stops_at_unparseable_markup() {
        let markup = "<p><span/>ok</p><!-- never closed <div/>";
        assert_eq!(
            expand_empty_elements(markup),
            "<p><span></span>ok</p><!-- never closed <div/>"
        );
    }
}
