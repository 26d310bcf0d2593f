//! Lenient HTML/XHTML parsing into an arena DOM.
//!
//! Chapter documents are parsed with html5ever's HTML tree builder, so
//! character references are already decoded in text nodes and attribute
//! values, and missing `<html>`/`<body>` wrappers are synthesized. XHTML
//! input has its self-closing elements expanded first.

mod arena;
mod tree_sink;
mod xhtml;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};

use std::borrow::Cow;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::ArenaSink;

/// Parse a markup document. Never fails; malformed input is recovered.
pub fn parse_html(html: &str) -> ArenaDom {
    let html = if xhtml::is_xhtml(html) {
        xhtml::expand_empty_elements(html)
    } else {
        Cow::Borrowed(html)
    };

    parse_document(ArenaSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}
