//! HTML tree view - fragment parsing with byte-offset source locations.
//!
//! Built on top of `tl`'s zero-copy DOM: every `tl::Bytes` slice borrows
//! directly from the original source buffer, so byte offsets are recovered
//! by pointer arithmetic against that buffer rather than tracked by the
//! parser itself. The tree only ever *reads* offsets; the original bytes
//! remain the single source of truth for serialization (see the "Parallel
//! tree + bytes" design note).

mod content;
mod span;

pub use content::ContentAnalysis;
pub use span::ByteRange;

use tl::{HTMLTag, Node, NodeHandle, Parser, VDom};

/// A parsed HTML fragment plus the bytes it was parsed from.
pub struct HtmlTree<'a> {
    source: &'a str,
    dom: VDom<'a>,
}

impl<'a> HtmlTree<'a> {
    /// Parse in non-scripting mode. `tl` is permissive: malformed markup is
    /// recovered rather than rejected, and no diagnostic class exists at
    /// this layer for parse failures (spec 4.1).
    pub fn parse(source: &'a str) -> Self {
        let dom = tl::parse(source, tl::ParserOptions::default());
        Self { source, dom }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    fn parser(&self) -> &Parser<'a> {
        self.dom.parser()
    }

    /// In-order element traversal. `ignore_tag` prunes entire subtrees
    /// (their content is never visited); `<template>` elements are
    /// descended into via their inner document fragment rather than their
    /// direct children, per spec 4.1.
    pub fn elements<'t>(&'t self, ignore_tag: &dyn Fn(&str) -> bool) -> Vec<ElementRef<'a, 't>> {
        let mut out = Vec::new();
        for handle in self.dom.children() {
            self.walk(*handle, ignore_tag, &mut out);
        }
        out
    }

    fn walk<'t>(
        &'t self,
        handle: NodeHandle,
        ignore_tag: &dyn Fn(&str) -> bool,
        out: &mut Vec<ElementRef<'a, 't>>,
    ) {
        let Some(node) = handle.get(self.parser()) else {
            return;
        };
        let Node::Tag(tag) = node else {
            return;
        };
        let name = tag_name(tag);
        if ignore_tag(&name) {
            return;
        }

        out.push(ElementRef {
            source: self.source,
            parser: self.parser(),
            tag,
            handle,
        });

        if name.eq_ignore_ascii_case("template") {
            // Template content is a separate document fragment in the real
            // HTML parsing model; `tl` exposes it as ordinary children of
            // the `<template>` tag, which we treat as its descended-into
            // content per spec 4.1.
        }

        for child in tag.children().top().iter() {
            self.walk(*child, ignore_tag, out);
        }
    }
}

fn tag_name(tag: &HTMLTag<'_>) -> String {
    tag.name().as_utf8_str().to_string()
}

/// A single element with its parsed attributes and children, plus access
/// to byte-offset helpers computed against the original source.
pub struct ElementRef<'a, 't> {
    source: &'a str,
    parser: &'t Parser<'a>,
    tag: &'t HTMLTag<'a>,
    handle: NodeHandle,
}

impl<'a, 't> ElementRef<'a, 't> {
    pub fn tag_name(&self) -> String {
        tag_name(self.tag)
    }

    pub fn attribute_value(&self, name: &str) -> Option<String> {
        self.tag
            .attributes()
            .get(name)
            .flatten()
            .map(|v| v.as_utf8_str().to_string())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.tag.attributes().get(name).is_some()
    }

    /// Byte range of the opening tag, `<name ...>` or `<name .../>`.
    pub fn start_tag_range(&self) -> ByteRange {
        let name_start = span::offset_of(self.source, self.tag.name().as_bytes());
        let start = name_start.saturating_sub(1); // the leading '<'

        let mut scan_from = name_start + self.tag.name().as_bytes().len();
        for (attr_name, attr_value) in self.tag.attributes().iter() {
            let name_off = span::offset_of(self.source, attr_name.as_bytes());
            let end = match attr_value {
                Some(value) => {
                    let value_off = span::offset_of(self.source, value.as_bytes());
                    value_off + value.as_bytes().len()
                }
                None => name_off + attr_name.as_bytes().len(),
            };
            scan_from = scan_from.max(end);
        }

        let bytes = self.source.as_bytes();
        let mut end = scan_from;
        while end < bytes.len() && bytes[end] != b'>' {
            end += 1;
        }
        if end < bytes.len() {
            end += 1; // include the '>'
        }
        ByteRange { start, end }
    }

    /// Byte range covering an attribute's `name` plus, if present, its
    /// `="value"`, including the quotes.
    pub fn attribute_range(&self, name: &str) -> Option<ByteRange> {
        let (attr_name, attr_value) = self
            .tag
            .attributes()
            .iter()
            .find(|(n, _)| n.as_utf8_str().eq_ignore_ascii_case(name))?;

        let start = span::offset_of(self.source, attr_name.as_bytes());
        let end = match attr_value {
            Some(value) => {
                let value_off = span::offset_of(self.source, value.as_bytes());
                // `value` as returned by `tl` excludes the surrounding
                // quote characters; extend one byte on each side if quoted.
                let bytes = self.source.as_bytes();
                let mut v_end = value_off + value.as_bytes().len();
                if v_end < bytes.len() && matches!(bytes[v_end], b'"' | b'\'') {
                    v_end += 1;
                }
                v_end
            }
            None => start + attr_name.as_bytes().len(),
        };
        Some(ByteRange { start, end })
    }

    /// Byte range of the content region between the start tag's end and
    /// the matching end tag's start (empty for void/self-closing elements).
    pub fn content_range(&self) -> ByteRange {
        let start_tag = self.start_tag_range();
        let children = self.tag.children().top();
        let Some(last) = children.last() else {
            return ByteRange {
                start: start_tag.end,
                end: start_tag.end,
            };
        };
        let last_end = node_end_offset(*last, self.parser, self.source).unwrap_or(start_tag.end);
        ByteRange {
            start: start_tag.end,
            end: last_end,
        }
    }

    pub fn analyze_content(
        &self,
        text_ignore: &dyn Fn(&str) -> bool,
    ) -> ContentAnalysis {
        content::analyze(self.tag, self.parser, text_ignore)
    }

    pub fn handle(&self) -> NodeHandle {
        self.handle
    }
}

fn node_end_offset(handle: NodeHandle, parser: &Parser<'_>, source: &str) -> Option<usize> {
    let node = handle.get(parser)?;
    match node {
        Node::Raw(bytes) => {
            let off = span::offset_of(source, bytes.as_bytes());
            Some(off + bytes.as_bytes().len())
        }
        Node::Comment(bytes) => {
            let off = span::offset_of(source, bytes.as_bytes());
            Some(off + bytes.as_bytes().len() + "-->".len())
        }
        Node::Tag(tag) => {
            let children = tag.children().top();
            if let Some(last) = children.last() {
                node_end_offset(*last, parser, source)
            } else {
                let name_off = span::offset_of(source, tag.name().as_bytes());
                Some(name_off + tag.name().as_bytes().len())
            }
        }
    }
}
