//! Byte cursor for XML input navigation

use crate::error::Pos;

/// Cursor over byte input with line/column tracking
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Current byte without consuming
    pub fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Next `len` bytes starting at the current one
    pub fn peek_bytes(&self, len: usize) -> Option<&'a [u8]> {
        self.input.get(self.pos..self.pos.saturating_add(len))
    }

    /// True if the remaining input starts with `pattern`
    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        self.peek_bytes(pattern.len()) == Some(pattern)
    }

    pub fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    pub fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Consume bytes while `pred` holds and return them
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.current().is_some_and(&pred) {
            self.advance();
        }
        self.slice_from(start)
    }

    /// Consume through the next `terminator` and return the bytes before it.
    /// If it never occurs nothing is consumed.
    pub fn take_until(&mut self, terminator: &[u8]) -> Option<&'a [u8]> {
        if terminator.is_empty() {
            return Some(&[]);
        }
        let rest = self.input.get(self.pos..)?;
        let offset = rest
            .windows(terminator.len())
            .position(|window| window == terminator)?;
        let start = self.pos;
        self.advance_by(offset);
        let taken = self.slice_from(start);
        self.advance_by(terminator.len());
        Some(taken)
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.current() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.advance();
            } else {
                break;
            }
        }
    }

    pub const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Current byte index
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes from `start` up to the current position
    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        self.input.get(start..self.pos).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_basic() {
        let mut cursor = Cursor::new(b"hello");
        assert_eq!(cursor.current(), Some(b'h'));
        cursor.advance();
        assert_eq!(cursor.current(), Some(b'e'));
    }

    #[test]
    fn test_cursor_line_tracking() {
        let mut cursor = Cursor::new(b"  \t\nhello");
        cursor.skip_whitespace();
        assert_eq!(cursor.current(), Some(b'h'));
        assert_eq!(cursor.position().line, 2);
        assert_eq!(cursor.position().col, 1);
    }

    #[test]
    fn test_cursor_starts_with() {
        let mut cursor = Cursor::new(b"<!-- x -->");
        assert!(cursor.starts_with(b"<!--"));
        cursor.advance_by(4);
        assert!(!cursor.starts_with(b"<!--"));
        assert!(!cursor.starts_with(b" x --> and more"));
    }

    #[test]
    fn test_cursor_eof() {
        let mut cursor = Cursor::new(b"a");
        assert!(!cursor.is_eof());
        cursor.advance();
        assert!(cursor.is_eof());
        assert_eq!(cursor.current(), None);
        cursor.advance();
        assert_eq!(cursor.pos(), 1);
    }

    #[test]
    fn test_cursor_take_until() {
        let mut cursor = Cursor::new(b"a\nb]]>rest");
        assert_eq!(cursor.take_until(b"]]>"), Some(&b"a\nb"[..]));
        assert_eq!(cursor.current(), Some(b'r'));
        assert_eq!(cursor.position().line, 2);

        assert_eq!(cursor.take_until(b"-->"), None);
        assert_eq!(cursor.current(), Some(b'r'));
    }

    #[test]
    fn test_cursor_take_while() {
        let mut cursor = Cursor::new(b"name.rs>");
        assert_eq!(cursor.take_while(|b| b != b'>'), b"name.rs");
        assert_eq!(cursor.current(), Some(b'>'));
    }

    #[test]
    fn test_cursor_slice() {
        let mut cursor = Cursor::new(b"hello world");
        let start = cursor.pos();
        cursor.advance_by(3);
        assert_eq!(cursor.slice_from(start), b"hel");
    }
}
