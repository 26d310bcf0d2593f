//! Text helpers shared by the importer and the text pipeline.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// 1. UTF-8 first (a BOM is stripped by encoding_rs)
/// 2. If malformed, the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Windows-1252 as a last resort, common in old ebooks
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Decode an XML/XHTML document using its own declaration as the hint.
pub fn decode_document(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

/// Extract the encoding name from an XML declaration, if present.
///
/// Only the first 100 bytes are inspected.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = memchr::memmem::find(prefix, b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = memchr::memchr(quote, rest)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Replace every run of whitespace with a single ASCII space.
///
/// Leading and trailing runs are collapsed, not removed.
pub fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    let needs_work = {
        let mut prev_ws = false;
        text.chars().any(|c| {
            let ws = c.is_whitespace();
            let bad = ws && (prev_ws || c != ' ');
            prev_ws = ws;
            bad
        })
    };
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    Cow::Owned(out)
}

/// True if `text` is a whole 32-bit signed integer, like a stray page number.
pub fn is_integer(text: &str) -> bool {
    text.parse::<i32>().is_ok()
}
