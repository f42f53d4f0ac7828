use std::collections::VecDeque;
use std::io::{stdin, IsTerminal, Read};

use console::Term;

use crate::output::Output;

/// Host side of the memory-mapped I/O ports.
pub trait Port {
    /// Block until one character is available. `None` once input is exhausted or unreadable.
    fn read_char(&mut self) -> Option<char>;
    /// Emit one character to the host.
    fn write_char(&mut self, ch: char);
}

/// Standard input and output of the running process.
#[derive(Debug, Default)]
pub struct ConsolePort;

impl Port for ConsolePort {
    fn read_char(&mut self) -> Option<char> {
        let term = Term::stdout();
        if reads_raw_terminal(stdin().is_terminal(), term.is_term()) {
            term.read_char().ok()
        } else {
            read_utf8_char(&mut stdin().lock())
        }
    }

    fn write_char(&mut self, ch: char) {
        Output::Normal.print_char(ch);
    }
}

/// Raw key reads go through the terminal attached to stdout, so both ends must be terminals.
fn reads_raw_terminal(stdin_is_term: bool, stdout_is_term: bool) -> bool {
    stdin_is_term && stdout_is_term
}

/// Read a single UTF-8 encoded character.
fn read_utf8_char(reader: &mut impl Read) -> Option<char> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf[..1]).ok()?;
    let width = match buf[0] {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return None,
    };
    reader.read_exact(&mut buf[1..width]).ok()?;
    std::str::from_utf8(&buf[..width]).ok()?.chars().next()
}

/// In-memory port with a fixed input script, capturing everything written.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPort {
    input: VecDeque<char>,
    output: String,
}

impl ScriptedPort {
    pub fn new(input: &str) -> Self {
        ScriptedPort {
            input: input.chars().collect(),
            output: String::new(),
        }
    }

    /// Everything written so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Input not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

impl Port for ScriptedPort {
    fn read_char(&mut self) -> Option<char> {
        self.input.pop_front()
    }

    fn write_char(&mut self, ch: char) {
        self.output.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_utf8_chars() {
        let mut input = "aé€😀".as_bytes();
        assert_eq!(read_utf8_char(&mut input), Some('a'));
        assert_eq!(read_utf8_char(&mut input), Some('é'));
        assert_eq!(read_utf8_char(&mut input), Some('€'));
        assert_eq!(read_utf8_char(&mut input), Some('😀'));
        assert_eq!(read_utf8_char(&mut input), None);
    }

    #[test]
    fn invalid_utf8_is_end_of_input() {
        let mut input: &[u8] = &[0xFF, b'a'];
        assert_eq!(read_utf8_char(&mut input), None);
        let mut truncated: &[u8] = &[0xE2, 0x82];
        assert_eq!(read_utf8_char(&mut truncated), None);
    }

    #[test]
    fn raw_terminal_only_when_fully_interactive() {
        assert!(reads_raw_terminal(true, true));
        // Output redirected to a file, keyboard still attached
        assert!(!reads_raw_terminal(true, false));
        assert!(!reads_raw_terminal(false, true));
        assert!(!reads_raw_terminal(false, false));
    }

    #[test]
    fn scripted_port() {
        let mut port = ScriptedPort::new("hi");
        assert_eq!(port.read_char(), Some('h'));
        assert_eq!(port.remaining(), 1);
        port.write_char('!');
        assert_eq!(port.read_char(), Some('i'));
        assert_eq!(port.read_char(), None);
        assert_eq!(port.output(), "!");
    }
}
