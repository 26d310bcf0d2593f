//! EPUB package document parsing.

mod parser;

pub use parser::{OpfData, parse_container_xml, parse_nav_toc, parse_ncx, parse_opf, strip_bom};
