//! Extraction of parser-hostile spans before tree building.
//!
//! [§ 13.2.5.4 Script states](https://html.spec.whatwg.org/multipage/parsing.html#script-data-state)
//! treats script content as raw text; this parser gets the same effect by
//! lifting the content of `<script>`, `<style>` and `<code>` containers,
//! comments, CDATA sections, and processing instructions out of the buffer
//! before scanning it, leaving opaque placeholder tokens behind. The tag
//! scanner then never sees a stray `<` inside them. Serialization swaps
//! the placeholders back for the original bytes.
//!
//! A placeholder is the 11-character marker `___noise___` followed by a
//! 5-character right-aligned decimal key, 16 characters in all. Keys count
//! up from 1000 in replacement order; replacement runs right to left so
//! recorded offsets stay valid.

use std::collections::HashMap;

/// Replacement-token store filled during extraction and consulted during
/// serialization.
#[derive(Debug, Clone, Default)]
pub struct NoiseMap {
    entries: HashMap<String, String>,
}

const MARKER: &str = "___noise___";

impl NoiseMap {
    /// An empty map.
    #[must_use]
    pub(crate) fn new() -> Self {
        NoiseMap::default()
    }

    /// Number of recorded spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record `content` and return the placeholder token standing in for it.
    fn record(&mut self, content: String) -> String {
        let key = format!("{MARKER}{:>5}", 1000 + self.entries.len());
        self.entries.insert(key.clone(), content);
        key
    }

    /// Swap placeholder tokens back for their recorded text.
    ///
    /// Single pass: restored text is not rescanned. A marker followed by an
    /// unknown 5-character key restores to nothing; a marker with fewer
    /// than 5 characters after it is left verbatim.
    #[must_use]
    pub fn restore(&self, text: &str) -> String {
        if !text.contains(MARKER) {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find(MARKER) {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + MARKER.len()..];
            let mut seen = 0usize;
            let mut boundary = None;
            for (idx, _) in after.char_indices() {
                if seen == 5 {
                    boundary = Some(idx);
                    break;
                }
                seen += 1;
            }
            if boundary.is_none() && seen == 5 {
                boundary = Some(after.len());
            }
            let Some(key_bytes) = boundary else {
                // Not enough characters to form a key.
                out.push_str(&rest[pos..]);
                return out;
            };
            let key = &rest[pos..pos + MARKER.len() + key_bytes];
            if let Some(content) = self.entries.get(key) {
                out.push_str(content);
            }
            rest = &after[key_bytes..];
        }
        out.push_str(rest);
        out
    }
}

/// How the opening tag of a container may be written.
#[derive(Clone, Copy)]
enum OpenStyle {
    /// `<\s*name[^>]*[^/]>`: at least one character after the name, and not
    /// self-closing.
    AttrsNonSelfClosing,
    /// `<\s*name\s*>`: nothing but whitespace after the name.
    Bare,
    /// `<\s*name[^>]*>`: anything up to the first `>`.
    AnyAttrs,
}

/// Run the full extraction pipeline over `html`.
///
/// Script content comes out first so that, when configured, line-break
/// removal never touches it.
pub(crate) fn extract(mut html: String, remove_line_breaks: bool, map: &mut NoiseMap) -> String {
    strip_container(&mut html, map, "script", OpenStyle::AttrsNonSelfClosing);
    strip_container(&mut html, map, "script", OpenStyle::Bare);

    if remove_line_breaks {
        html = html.replace('\r', " ").replace('\n', " ");
    }

    strip_cdata(&mut html, map);
    strip_comments(&mut html, map);
    strip_container(&mut html, map, "style", OpenStyle::AttrsNonSelfClosing);
    strip_container(&mut html, map, "style", OpenStyle::Bare);
    strip_container(&mut html, map, "code", OpenStyle::AnyAttrs);
    strip_instructions(&mut html, map);

    html
}

/// Record each span (right to left) and splice its placeholder in.
fn replace_spans(html: &mut String, map: &mut NoiseMap, spans: &[(usize, usize)]) {
    for &(start, end) in spans.iter().rev() {
        let key = map.record(html[start..end].to_string());
        html.replace_range(start..end, &key);
    }
}

/// Extract the content of `<name …>…</name>` containers, keeping the tags.
fn strip_container(html: &mut String, map: &mut NoiseMap, name: &str, style: OpenStyle) {
    let bytes = html.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(content_start) = match_open(bytes, i, name, style) {
                if let Some((close_start, close_end)) = find_close(bytes, content_start, name) {
                    spans.push((content_start, close_start));
                    i = close_end;
                    continue;
                }
            }
        }
        i += 1;
    }
    replace_spans(html, map, &spans);
}

/// Try to match an opening tag at `i`; returns the content start (just
/// past `>`) on success.
fn match_open(bytes: &[u8], i: usize, name: &str, style: OpenStyle) -> Option<usize> {
    let mut j = i + 1;
    j = skip_ws(bytes, j);
    j = match_name_ci(bytes, j, name)?;
    match style {
        OpenStyle::Bare => {
            j = skip_ws(bytes, j);
            (bytes.get(j) == Some(&b'>')).then_some(j + 1)
        }
        OpenStyle::AnyAttrs => {
            let gt = find_byte(bytes, j, b'>')?;
            Some(gt + 1)
        }
        OpenStyle::AttrsNonSelfClosing => {
            let gt = find_byte(bytes, j, b'>')?;
            (gt > j && bytes[gt - 1] != b'/').then_some(gt + 1)
        }
    }
}

/// Find the first `</ name >` (whitespace-tolerant, case-insensitive) at
/// or after `from`. Returns its start and one past its `>`.
fn find_close(bytes: &[u8], from: usize, name: &str) -> Option<(usize, usize)> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let mut j = skip_ws(bytes, i + 1);
            if bytes.get(j) == Some(&b'/') {
                j = skip_ws(bytes, j + 1);
                if let Some(after_name) = match_name_ci(bytes, j, name) {
                    let k = skip_ws(bytes, after_name);
                    if bytes.get(k) == Some(&b'>') {
                        return Some((i, k + 1));
                    }
                }
            }
        }
        i += 1;
    }
    None
}

/// Extract whole `<![CDATA[ … ]]>` sections.
fn strip_cdata(html: &mut String, map: &mut NoiseMap) {
    let bytes = html.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i + 9 <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'!'
            && bytes[i + 2] == b'['
            && bytes[i + 3..i + 8].eq_ignore_ascii_case(b"cdata")
            && bytes[i + 8] == b'['
        {
            if let Some(end) = find_seq(bytes, i + 9, b"]]>") {
                spans.push((i, end + 3));
                i = end + 3;
                continue;
            }
        }
        i += 1;
    }
    replace_spans(html, map, &spans);
}

/// Extract the content of `<!-- … -->` comments, keeping the delimiters.
fn strip_comments(html: &mut String, map: &mut NoiseMap) {
    let bytes = html.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i + 4 <= bytes.len() {
        if &bytes[i..i + 4] == b"<!--" {
            if let Some(end) = find_seq(bytes, i + 4, b"-->") {
                spans.push((i + 4, end));
                i = end + 3;
                continue;
            }
        }
        i += 1;
    }
    replace_spans(html, map, &spans);
}

/// Extract whole `<? … ?>` processing instructions.
fn strip_instructions(html: &mut String, map: &mut NoiseMap) {
    let bytes = html.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i + 2 <= bytes.len() {
        if bytes[i] == b'<' && bytes[i + 1] == b'?' {
            if let Some(end) = find_seq(bytes, i + 2, b"?>") {
                spans.push((i, end + 2));
                i = end + 2;
                continue;
            }
        }
        i += 1;
    }
    replace_spans(html, map, &spans);
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Match `name` case-insensitively at `i`; returns the index after it.
fn match_name_ci(bytes: &[u8], i: usize, name: &str) -> Option<usize> {
    let name = name.as_bytes();
    if i + name.len() <= bytes.len() && bytes[i..i + name.len()].eq_ignore_ascii_case(name) {
        Some(i + name.len())
    } else {
        None
    }
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == byte).map(|p| from + p)
}

fn find_seq(bytes: &[u8], from: usize, seq: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(seq.len())
        .position(|w| w == seq)
        .map(|p| from + p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_sixteen_chars() {
        let mut map = NoiseMap::new();
        let key = map.record("x".to_string());
        assert_eq!(key.len(), 16);
        assert_eq!(key, "___noise___ 1000");
    }

    #[test]
    fn script_content_extracted_keeping_tags() {
        let mut map = NoiseMap::new();
        let out = extract(
            "<div><script>if (a < b) { go(); }</script></div>".to_string(),
            false,
            &mut map,
        );
        assert_eq!(out, "<div><script>___noise___ 1000</script></div>");
        assert_eq!(map.restore(&out), "<div><script>if (a < b) { go(); }</script></div>");
    }

    #[test]
    fn script_with_attributes_extracted() {
        let mut map = NoiseMap::new();
        let out = extract(
            "<script type=\"text/javascript\">1 < 2</script>".to_string(),
            false,
            &mut map,
        );
        assert_eq!(out, "<script type=\"text/javascript\">___noise___ 1000</script>");
    }

    #[test]
    fn script_keeps_line_breaks_when_removal_is_on() {
        let mut map = NoiseMap::new();
        let out = extract(
            "<p>a\nb</p><script>x();\ny();</script>".to_string(),
            true,
            &mut map,
        );
        assert_eq!(out, "<p>a b</p><script>___noise___ 1000</script>");
        assert!(map.restore(&out).contains("x();\ny();"));
    }

    #[test]
    fn comment_content_extracted_keeping_delimiters() {
        let mut map = NoiseMap::new();
        let out = extract("a<!-- <b>not a tag</b> -->z".to_string(), false, &mut map);
        assert_eq!(out, "a<!--___noise___ 1000-->z");
        assert_eq!(map.restore(&out), "a<!-- <b>not a tag</b> -->z");
    }

    #[test]
    fn cdata_and_instructions_extracted_whole() {
        let mut map = NoiseMap::new();
        let out = extract("x<![CDATA[1<2]]>y<?php eh(); ?>z".to_string(), false, &mut map);
        assert_eq!(out, "x___noise___ 1000y___noise___ 1001z");
        assert_eq!(map.restore(&out), "x<![CDATA[1<2]]>y<?php eh(); ?>z");
    }

    #[test]
    fn later_matches_replaced_first_keep_valid_offsets() {
        let mut map = NoiseMap::new();
        let out = extract(
            "<code>a</code> mid <code>b</code>".to_string(),
            false,
            &mut map,
        );
        // Rightmost match gets the lowest key.
        assert_eq!(out, "<code>___noise___ 1001</code> mid <code>___noise___ 1000</code>");
        assert_eq!(map.restore(&out), "<code>a</code> mid <code>b</code>");
    }

    #[test]
    fn unknown_key_restores_to_nothing() {
        let map = NoiseMap::new();
        assert_eq!(map.restore("a___noise___ 9999b"), "ab");
        // Too short to be a key: left alone.
        assert_eq!(map.restore("a___noise___12"), "a___noise___12");
    }

    #[test]
    fn self_closing_script_open_is_not_a_container() {
        let mut map = NoiseMap::new();
        let out = extract("<script src=\"x\"/>text</script>".to_string(), false, &mut map);
        assert_eq!(out, "<script src=\"x\"/>text</script>");
        assert!(map.is_empty());
    }
}
