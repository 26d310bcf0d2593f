//! EPUB package parsing (container.xml, OPF, NCX, EPUB 3 nav document).

use std::collections::HashMap;
use std::io;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::book::{Metadata, TocEntry};

/// Parsed OPF package data.
#[derive(Debug, Default)]
pub struct OpfData {
    pub metadata: Metadata,
    /// Maps manifest id -> href
    pub manifest: HashMap<String, String>,
    pub spine_ids: Vec<String>,
    /// NCX document referenced by `<spine toc="...">`.
    pub ncx_href: Option<String>,
    /// EPUB 3 navigation document (manifest item with `properties="nav"`).
    pub nav_href: Option<String>,
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(bytes: &[u8]) -> io::Result<String> {
    let content = std::str::from_utf8(strip_bom(bytes))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                if let Some(path) = attr_value(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(io::Error::other(e)),
            _ => {}
        }
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "No rootfile found in container.xml",
    ))
}

/// Parse OPF package document.
pub fn parse_opf(content: &str) -> io::Result<OpfData> {
    // No trim_text: it would eat the spaces around entity references.
    let mut reader = Reader::from_str(content);

    let mut opf = OpfData::default();
    let mut toc_id: Option<String> = None;

    let mut in_metadata = false;
    let mut current_element: Option<Vec<u8>> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = true,
                    b"title" | b"creator" | b"language" | b"identifier" | b"publisher"
                    | b"description"
                        if in_metadata =>
                    {
                        current_element = Some(local.to_vec());
                        buf_text.clear();
                    }
                    _ => read_package_entry(&mut opf, &mut toc_id, &e)?,
                }
            }
            Ok(Event::Empty(e)) => read_package_entry(&mut opf, &mut toc_id, &e)?,
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current_element.is_some()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    buf_text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"metadata" {
                    in_metadata = false;
                }

                if let Some(elem) = current_element.take() {
                    let value = buf_text.trim().to_string();
                    let metadata = &mut opf.metadata;
                    match elem.as_slice() {
                        b"title" if metadata.title.is_empty() => metadata.title = value,
                        b"creator" => metadata.authors.push(value),
                        b"language" if metadata.language.is_empty() => metadata.language = value,
                        b"identifier" if metadata.identifier.is_empty() => {
                            metadata.identifier = value
                        }
                        b"publisher" => metadata.publisher = Some(value),
                        b"description" => metadata.description = Some(value),
                        _ => {}
                    }
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(io::Error::other(e)),
            _ => {}
        }
    }

    opf.ncx_href = toc_id.and_then(|id| opf.manifest.get(&id).cloned());

    Ok(opf)
}

/// Manifest `item`, spine `itemref` and the `spine` element itself, in
/// either empty or long form.
fn read_package_entry(
    opf: &mut OpfData,
    toc_id: &mut Option<String>,
    e: &BytesStart<'_>,
) -> io::Result<()> {
    match local_name(e.name().as_ref()) {
        b"item" => {
            let id = attr_value(e, b"id")?.unwrap_or_default();
            let href = attr_value(e, b"href")?.unwrap_or_default();
            let is_nav = attr_value(e, b"properties")?
                .is_some_and(|p| p.split_ascii_whitespace().any(|p| p == "nav"));

            if is_nav {
                opf.nav_href = Some(href.clone());
            }
            if !id.is_empty() {
                opf.manifest.insert(id, href);
            }
        }
        b"itemref" => {
            if let Some(idref) = attr_value(e, b"idref")? {
                opf.spine_ids.push(idref);
            }
        }
        b"spine" => *toc_id = attr_value(e, b"toc")?,
        _ => {}
    }
    Ok(())
}

/// Parse NCX table of contents.
pub fn parse_ncx(content: &str) -> io::Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);

    #[derive(Default)]
    struct NavPointState {
        children: Vec<TocEntry>,
        text: Option<String>,
        src: Option<String>,
    }

    fn read_content_src(stack: &mut [NavPointState], e: &BytesStart<'_>) -> io::Result<()> {
        if stack.len() > 1
            && let Some(state) = stack.last_mut()
        {
            state.src = attr_value(e, b"src")?;
        }
        Ok(())
    }

    let mut stack: Vec<NavPointState> = vec![NavPointState::default()];
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => stack.push(NavPointState::default()),
                b"text" => in_text = true,
                b"content" => read_content_src(&mut stack, &e)?,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"content" {
                    read_content_src(&mut stack, &e)?;
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    state.text.get_or_insert_with(String::new).push_str(&raw);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text
                    && let Some(state) = stack.last_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    state.text.get_or_insert_with(String::new).push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navPoint" if stack.len() > 1 => {
                    if let Some(state) = stack.pop()
                        && let (Some(text), Some(src)) = (state.text, state.src)
                    {
                        let mut entry = TocEntry::new(text.trim(), src);
                        entry.children = state.children;

                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(entry);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(io::Error::other(e)),
            _ => {}
        }
    }

    Ok(stack.into_iter().next().map(|s| s.children).unwrap_or_default())
}

/// Parse the `<nav epub:type="toc">` list of an EPUB 3 navigation document.
///
/// Each `<li>` becomes an entry labelled by its `<a>` (or `<span>` heading)
/// text; nested `<ol>` lists become children. Other navs (landmarks,
/// page-list) are ignored.
pub fn parse_nav_toc(content: &str) -> io::Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = false;

    #[derive(Default)]
    struct ItemState {
        label: String,
        href: String,
        children: Vec<TocEntry>,
        labelled: bool,
    }

    let mut roots: Vec<TocEntry> = Vec::new();
    let mut stack: Vec<ItemState> = Vec::new();
    let mut nav_depth = 0usize;
    let mut in_toc = false;
    // Element depth inside the current label, 0 when not in a label.
    let mut label_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if local == b"nav" {
                    nav_depth += 1;
                    if !in_toc && is_toc_nav(&e)? {
                        in_toc = true;
                        nav_depth = 1;
                    }
                    continue;
                }
                if !in_toc {
                    continue;
                }
                if label_depth > 0 {
                    label_depth += 1;
                    continue;
                }
                match local {
                    b"li" => stack.push(ItemState::default()),
                    b"a" | b"span" => {
                        if let Some(item) = stack.last_mut()
                            && !item.labelled
                        {
                            if local == b"a" {
                                item.href = attr_value(&e, b"href")?.unwrap_or_default();
                            }
                            item.labelled = true;
                            label_depth = 1;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if label_depth > 0
                    && let Some(item) = stack.last_mut()
                {
                    item.label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if label_depth > 0
                    && let Some(item) = stack.last_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    item.label.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if !in_toc {
                    continue;
                }
                if label_depth > 0 {
                    label_depth -= 1;
                    continue;
                }
                match local {
                    b"nav" => {
                        nav_depth = nav_depth.saturating_sub(1);
                        if nav_depth == 0 {
                            break;
                        }
                    }
                    b"li" => {
                        if let Some(item) = stack.pop() {
                            let title = item.label.split_whitespace().collect::<Vec<_>>().join(" ");
                            if title.is_empty() && item.children.is_empty() {
                                continue;
                            }
                            let mut entry = TocEntry::new(title, item.href);
                            entry.children = item.children;
                            match stack.last_mut() {
                                Some(parent) => parent.children.push(entry),
                                None => roots.push(entry),
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(io::Error::other(e)),
            _ => {}
        }
    }

    Ok(roots)
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Look up an attribute by its local name, resolving entity references.
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> io::Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == key {
            let raw = String::from_utf8(attr.value.to_vec()).map_err(io::Error::other)?;
            return Ok(Some(unescape(&raw)));
        }
    }
    Ok(None)
}

/// Replace `&name;` references; unknown ones are kept verbatim.
fn unescape(raw: &str) -> String {
    if memchr::memchr(b'&', raw.as_bytes()).is_none() {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';').and_then(|end| Some((end, resolve_entity(&tail[1..end])?))) {
            Some((end, resolved)) => {
                out.push_str(&resolved);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_toc_nav(e: &BytesStart<'_>) -> io::Result<bool> {
    Ok(attr_value(e, b"type")?
        .is_some_and(|t| t.split_ascii_whitespace().any(|t| t == "toc")))
}

/// Resolve XML entity references, plus `nbsp` which XHTML nav files use.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };

    code.and_then(char::from_u32).map(|c| c.to_string())
}
