//! Character cursor over the (noise-extracted) input buffer.
//!
//! The tree builder moves a single position forward and occasionally one
//! or two characters back when a guess about the markup turns out wrong.
//! Positions are character offsets, so backtracking can never land inside
//! a multi-byte sequence.

/// Whitespace recognized between tokens.
pub(crate) const WHITESPACE_CHARS: &str = " \t\r\n";

pub(crate) struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    pub(crate) fn new(text: &str) -> Self {
        Scanner {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// The character under the cursor, or `None` past the end.
    pub(crate) fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(crate) fn char_at(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    /// Move one character forward.
    pub(crate) fn advance(&mut self) {
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
    }

    /// Move one character back.
    pub(crate) fn retreat(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Step over any run of characters from `set`.
    pub(crate) fn skip(&mut self, set: &str) {
        while self
            .current()
            .is_some_and(|c| set.contains(c))
        {
            self.pos += 1;
        }
    }

    /// Step over a run of characters from `set`, returning what was
    /// skipped.
    pub(crate) fn copy_skip(&mut self, set: &str) -> String {
        let start = self.pos;
        self.skip(set);
        self.chars[start..self.pos].iter().collect()
    }

    /// Copy up to (not including) the first character in `set`, or to the
    /// end of the buffer.
    pub(crate) fn copy_until(&mut self, set: &str) -> String {
        let start = self.pos;
        while self.current().is_some_and(|c| !set.contains(c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Copy up to (not including) the first `target`. At the end of the
    /// buffer this returns empty; when `target` is absent it copies the
    /// rest and parks the cursor at the end.
    pub(crate) fn copy_until_char(&mut self, target: char) -> String {
        if self.current().is_none() {
            return String::new();
        }
        let start = self.pos;
        while self.current().is_some_and(|c| c != target) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// The characters in `[start, end)`, clamped to the buffer.
    pub(crate) fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_until_stops_at_set_member() {
        let mut s = Scanner::new("abc def>");
        assert_eq!(s.copy_until(" />\r\n\t"), "abc");
        assert_eq!(s.current(), Some(' '));
    }

    #[test]
    fn copy_until_char_parks_at_target() {
        let mut s = Scanner::new("hello<world");
        assert_eq!(s.copy_until_char('<'), "hello");
        assert_eq!(s.current(), Some('<'));
        // Already at the target: nothing copied, no movement.
        assert_eq!(s.copy_until_char('<'), "");
        assert_eq!(s.position(), 5);
    }

    #[test]
    fn copy_until_char_exhausts_on_missing_target() {
        let mut s = Scanner::new("rest of it");
        assert_eq!(s.copy_until_char('>'), "rest of it");
        assert_eq!(s.current(), None);
        assert_eq!(s.copy_until_char('>'), "");
    }

    #[test]
    fn skip_and_copy_skip() {
        let mut s = Scanner::new("  \t x");
        assert_eq!(s.copy_skip(WHITESPACE_CHARS), "  \t ");
        assert_eq!(s.current(), Some('x'));
    }

    #[test]
    fn positions_are_character_offsets() {
        let mut s = Scanner::new("aé<b");
        assert_eq!(s.copy_until_char('<'), "aé");
        assert_eq!(s.position(), 2);
        s.retreat();
        assert_eq!(s.current(), Some('é'));
    }
}
