// Heavily inspired by `rustc_lexer` and cut down to suit line-oriented assembly.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use std::str::Chars;

/// Peekable iterator over a char sequence, tracking the byte position within it.
#[derive(Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    chars: Chars<'a>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            input,
            chars: input.chars(),
        }
    }

    /// Peek the next char without consuming it.
    pub fn first(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Byte offset of the cursor from the start of the input.
    pub fn pos(&self) -> usize {
        self.input.len() - self.chars.as_str().len()
    }

    /// Input between `start` and the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.input[start..self.pos()]
    }

    pub fn take_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while self.first().is_some_and(&mut predicate) {
            self.bump();
        }
    }
}
