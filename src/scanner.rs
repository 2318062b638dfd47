//! Balanced-delimiter scanning for wikitext `{{templates}}` and `[[links]]`.
//!
//! The scanner walks the text once, left to right. Entering a region seeds a
//! depth counter at 1; every opener (of any group) increments it and every
//! closer decrements it, so `{{a|[[b}}]]` is accepted the same way MediaWiki
//! dumps tolerate it. A region that never closes runs to the end of the text
//! and is reported as a [`Diagnostic::UnterminatedRegion`].
//!
//! All delimiters are two ASCII bytes, so byte offsets produced here always
//! fall on `char` boundaries.

use std::fmt;

use lazy_static::lazy_static;

use crate::error::{Diagnostic, Diagnostics};

/// Shortest text that can hold a complete region (`{{}}`). Anything shorter
/// is returned as-is.
pub const MIN_REGION_LEN: usize = 4;

/// Nesting group a delimiter pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Template,
    Link,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Template => f.write_str("template"),
            Group::Link => f.write_str("link"),
        }
    }
}

/// Two-byte opener/closer tokens and the group each opener starts.
#[derive(Debug, Clone)]
pub struct DelimiterTable {
    openers: Vec<([u8; 2], Group)>,
    closers: Vec<([u8; 2], Group)>,
}

lazy_static! {
    static ref WIKITEXT_TABLE: DelimiterTable = DelimiterTable::new(&[
        (*b"{{", *b"}}", Group::Template),
        (*b"[[", *b"]]", Group::Link),
    ]);
}

impl DelimiterTable {
    pub fn new(pairs: &[([u8; 2], [u8; 2], Group)]) -> Self {
        DelimiterTable {
            openers: pairs.iter().map(|(open, _, group)| (*open, *group)).collect(),
            closers: pairs.iter().map(|(_, close, group)| (*close, *group)).collect(),
        }
    }

    /// `{{ }}` templates and `[[ ]]` links.
    pub fn wikitext() -> &'static DelimiterTable {
        &WIKITEXT_TABLE
    }

    fn opener_at(&self, bytes: &[u8], i: usize) -> Option<Group> {
        let pair = bytes.get(i..i + 2)?;
        self.openers
            .iter()
            .find(|(token, _)| token.as_slice() == pair)
            .map(|(_, group)| *group)
    }

    fn closer_at(&self, bytes: &[u8], i: usize) -> Option<Group> {
        let pair = bytes.get(i..i + 2)?;
        self.closers
            .iter()
            .find(|(token, _)| token.as_slice() == pair)
            .map(|(_, group)| *group)
    }
}

/// One top-level delimited region. `start..end` covers the delimiters,
/// `inner` excludes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<'a> {
    pub group: Group,
    pub inner: &'a str,
    pub start: usize,
    pub end: usize,
    pub terminated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Region(Region<'a>),
}

/// Decides what a resolved region turns into.
pub trait RegionHandler {
    fn render(
        &mut self,
        scanner: &DelimiterScanner<'_>,
        region: &Region<'_>,
        diags: &mut Diagnostics,
    ) -> String;
}

/// Replaces every region with its own (recursively resolved) content.
pub struct Identity;

impl RegionHandler for Identity {
    fn render(
        &mut self,
        scanner: &DelimiterScanner<'_>,
        region: &Region<'_>,
        diags: &mut Diagnostics,
    ) -> String {
        scanner.resolve_with(region.inner, self, diags)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DelimiterScanner<'t> {
    table: &'t DelimiterTable,
}

impl DelimiterScanner<'static> {
    pub fn wikitext() -> Self {
        DelimiterScanner::new(DelimiterTable::wikitext())
    }
}

impl<'t> DelimiterScanner<'t> {
    pub fn new(table: &'t DelimiterTable) -> Self {
        DelimiterScanner { table }
    }

    /// Scan the region whose opener sits at `start`.
    fn region_at<'a>(&self, text: &'a str, start: usize, group: Group) -> Region<'a> {
        let bytes = text.as_bytes();
        let mut depth: i32 = 1;
        let mut j = start + 2;
        while j < bytes.len() {
            if self.table.opener_at(bytes, j).is_some() {
                depth += 1;
                j += 2;
            } else if self.table.closer_at(bytes, j).is_some() {
                depth -= 1;
                j += 2;
            } else {
                j += 1;
            }
            if depth == 0 {
                return Region {
                    group,
                    inner: &text[start + 2..j - 2],
                    start,
                    end: j,
                    terminated: true,
                };
            }
        }
        Region {
            group,
            inner: &text[start + 2..],
            start,
            end: bytes.len(),
            terminated: false,
        }
    }

    /// Split `text` into plain runs and top-level regions.
    pub fn segments<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut last = 0;
        let mut i = 0;
        while i + 1 < bytes.len() {
            match self.table.opener_at(bytes, i) {
                Some(group) => {
                    if last < i {
                        segments.push(Segment::Text(&text[last..i]));
                    }
                    let region = self.region_at(text, i, group);
                    i = region.end;
                    last = i;
                    segments.push(Segment::Region(region));
                }
                None => i += 1,
            }
        }
        if last < bytes.len() {
            segments.push(Segment::Text(&text[last..]));
        }
        segments
    }

    /// Resolve every region to its content, recursively.
    pub fn resolve(&self, text: &str, diags: &mut Diagnostics) -> String {
        self.resolve_with(text, &mut Identity, diags)
    }

    pub fn resolve_with<H>(&self, text: &str, handler: &mut H, diags: &mut Diagnostics) -> String
    where
        H: RegionHandler + ?Sized,
    {
        if text.len() < MIN_REGION_LEN {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        for segment in self.segments(text) {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Region(region) => {
                    if !region.terminated {
                        diags.report(Diagnostic::UnterminatedRegion {
                            group: region.group,
                            offset: region.start,
                        });
                    }
                    out.push_str(&handler.render(self, &region, diags));
                }
            }
        }
        out
    }

    /// Split on `sep` wherever it occurs outside a region, e.g. template
    /// arguments: `m|en|[[a|b]]` gives `["m", "en", "[[a|b]]"]`.
    pub fn split_top_level<'a>(&self, text: &'a str, sep: u8) -> Vec<&'a str> {
        debug_assert!(sep.is_ascii());
        let bytes = text.as_bytes();
        let mut parts = Vec::new();
        let mut last = 0;
        let mut i = 0;
        while i < bytes.len() {
            if let Some(group) = self.table.opener_at(bytes, i) {
                i = self.region_at(text, i, group).end;
                continue;
            }
            if bytes[i] == sep {
                parts.push(&text[last..i]);
                last = i + 1;
            }
            i += 1;
        }
        parts.push(&text[last..]);
        parts
    }

    /// The region `text` starts with, and whatever follows it.
    pub fn leading_region<'a>(&self, text: &'a str) -> Option<(Region<'a>, &'a str)> {
        let group = self.table.opener_at(text.as_bytes(), 0)?;
        let region = self.region_at(text, 0, group);
        let rest = &text[region.end..];
        Some((region, rest))
    }

    /// The closed region `text` ends with, and whatever precedes it.
    pub fn trailing_region<'a>(&self, text: &'a str) -> Option<(&'a str, Region<'a>)> {
        match self.segments(text).pop()? {
            Segment::Region(region) if region.terminated && region.end == text.len() => {
                Some((&text[..region.start], region))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str) -> (String, Diagnostics) {
        let mut diags = Diagnostics::new();
        let out = DelimiterScanner::wikitext().resolve(text, &mut diags);
        (out, diags)
    }

    // ─────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn nested_regions_collapse_to_content() {
        let (out, diags) = resolve("a{{b}}{{c}}{{d{{e{{{{f}}}}}}}}");
        assert_eq!(out, "abcdef");
        assert!(diags.is_empty());
    }

    #[test]
    fn plain_text_unchanged() {
        let (out, _) = resolve("just some words");
        assert_eq!(out, "just some words");
    }

    #[test]
    fn short_input_fast_path() {
        let (out, diags) = resolve("{{x");
        assert_eq!(out, "{{x");
        assert!(diags.is_empty());
    }

    #[test]
    fn empty_region() {
        let (out, _) = resolve("a{{}}b");
        assert_eq!(out, "ab");
    }

    #[test]
    fn link_content_kept_with_pipe() {
        let (out, _) = resolve("[[a|b]] x");
        assert_eq!(out, "a|b x");
    }

    #[test]
    fn mismatched_kinds_tolerated() {
        let (out, diags) = resolve("x{{a[[b}}]]y");
        assert_eq!(out, "xaby");
        assert!(diags.is_empty());
    }

    #[test]
    fn unterminated_region_runs_to_end() {
        let (out, diags) = resolve("xx{{a{{b}}");
        assert_eq!(out, "xxab");
        assert_eq!(
            diags.iter().collect::<Vec<_>>(),
            vec![&Diagnostic::UnterminatedRegion { group: Group::Template, offset: 2 }]
        );
    }

    #[test]
    fn stray_closer_passes_through() {
        let (out, _) = resolve("a}}b{{c}}");
        assert_eq!(out, "a}}bc");
    }

    #[test]
    fn multibyte_text_around_regions() {
        let (out, _) = resolve("café {{ēx}} λόγος");
        assert_eq!(out, "café ēx λόγος");
    }

    #[test]
    fn custom_handler_sees_groups() {
        struct Tag;
        impl RegionHandler for Tag {
            fn render(
                &mut self,
                scanner: &DelimiterScanner<'_>,
                region: &Region<'_>,
                diags: &mut Diagnostics,
            ) -> String {
                let inner = scanner.resolve_with(region.inner, self, diags);
                match region.group {
                    Group::Template => format!("T({})", inner),
                    Group::Link => format!("L({})", inner),
                }
            }
        }
        let mut diags = Diagnostics::new();
        let out = DelimiterScanner::wikitext().resolve_with("{{a|[[b]]}} c", &mut Tag, &mut diags);
        assert_eq!(out, "T(a|L(b)) c");
    }

    #[test]
    fn custom_table() {
        let table = DelimiterTable::new(&[(*b"<<", *b">>", Group::Template)]);
        let scanner = DelimiterScanner::new(&table);
        let mut diags = Diagnostics::new();
        assert_eq!(scanner.resolve("a<<b<<c>>>>d{{e}}", &mut diags), "abcd{{e}}");
    }

    // ─────────────────────────────────────────────────────────────
    // Segments and splitting
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn segments_split_text_and_regions() {
        let scanner = DelimiterScanner::wikitext();
        let segments = scanner.segments("a {{b}} c");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::Text("a "));
        match &segments[1] {
            Segment::Region(r) => {
                assert_eq!(r.inner, "b");
                assert_eq!((r.start, r.end), (2, 7));
            }
            other => panic!("expected region, got {:?}", other),
        }
        assert_eq!(segments[2], Segment::Text(" c"));
    }

    #[test]
    fn split_ignores_nested_pipes() {
        let scanner = DelimiterScanner::wikitext();
        let parts = scanner.split_top_level("m|en|[[a|b]]|{{q|x|y}}", b'|');
        assert_eq!(parts, vec!["m", "en", "[[a|b]]", "{{q|x|y}}"]);
    }

    #[test]
    fn split_consecutive_separators() {
        let scanner = DelimiterScanner::wikitext();
        assert_eq!(scanner.split_top_level("a||b", b'|'), vec!["a", "", "b"]);
        assert_eq!(scanner.split_top_level("", b'|'), vec![""]);
    }

    #[test]
    fn leading_region_and_rest() {
        let scanner = DelimiterScanner::wikitext();
        let (region, rest) = scanner.leading_region("{{lb|en|rare}} A cat.").unwrap();
        assert_eq!(region.inner, "lb|en|rare");
        assert_eq!(rest, " A cat.");
        assert!(scanner.leading_region("A {{cat}}").is_none());
    }

    #[test]
    fn trailing_region_and_head() {
        let scanner = DelimiterScanner::wikitext();
        let (head, region) = scanner.trailing_region("A cat. {{q|rare}}").unwrap();
        assert_eq!(head, "A cat. ");
        assert_eq!(region.inner, "q|rare");
        assert!(scanner.trailing_region("{{q|rare}} A cat.").is_none());
        assert!(scanner.trailing_region("A cat {{q|rare").is_none());
    }
}
