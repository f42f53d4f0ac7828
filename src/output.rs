use std::cell::RefCell;
use std::io::{stderr, stdout, Write};
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::runtime::RunState;

#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Program output and reports, to stdout.
    Normal,
    /// Execution trace, to stderr.
    Trace,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_LINE_START: RefCell<bool> = const { RefCell::new(true) };
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_line_start(new_value: bool) -> bool {
        Self::IS_LINE_START.with(|value| value.replace(new_value))
    }
    /// Private. Use [`Output::start_new_line`].
    fn is_line_start() -> bool {
        Self::IS_LINE_START.with(|value| *value.borrow())
    }
    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    fn set_line_start_from_str(string: &str) {
        if let Some(ch) = Decolored::new(string).last() {
            Output::set_line_start(ch == '\n');
        }
    }

    /// Print a single character and flush, so that program output appears as it is produced.
    pub fn print_char(&self, ch: char) {
        match self {
            Self::Normal => {
                let mut out = stdout().lock();
                // A closed stdout is not the machine's problem
                let _ = write!(out, "{}", ch);
                let _ = out.flush();
            }
            Self::Trace => eprint!("{}", ch),
        }
        Output::set_line_start(ch == '\n');
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                print!("{}", string);
                Self::set_line_start_from_str(string);
            }
            Self::Trace => {
                if Self::is_minimal() {
                    eprint_colorless(string);
                } else {
                    eprint!("{}", ColoredString::from(string).blue());
                }
            }
        }
    }

    pub fn start_new_line(&self) {
        if !Self::is_line_start() {
            self.print_char('\n');
        }
    }

    pub fn print_registers<P>(&self, state: &RunState<P>) {
        if Self::is_minimal() {
            for (i, value) in state.registers().iter().enumerate() {
                self.print_str(&format!("R{} {}\n", i, value));
            }
            self.print_str(&format!("PC {}\n", state.pc()));
            self.print_str(&format!("Z {}\n", state.zero_flag() as u8));
            return;
        }

        self.print_str(&register_table(state));
    }
}

/// Boxed register dump. Every line has the same width once decolored.
fn register_table<P>(state: &RunState<P>) -> String {
    let mut table = String::new();
    table.push_str("\x1b[2m┌─────────────────────────────────────┐\x1b[0m\n");
    table.push_str("\x1b[2m│         \x1b[3mhex     int    uint    char\x1b[0m\x1b[2m │\x1b[0m\n");
    for (i, &value) in state.registers().iter().enumerate() {
        table.push_str("\x1b[2m│\x1b[0m");
        table.push_str(&format!(" \x1b[1m{:<3}\x1b[0m  ", format!("R{}", i)));
        table.push_str(&format_integer(value));
        table.push_str("   \x1b[2m│\x1b[0m\n");
    }
    table.push_str("\x1b[2m│\x1b[0m");
    table.push_str(&format!(" \x1b[1mPC\x1b[0m   0x{:04x}", state.pc()));
    table.push_str("                 ");
    table.push_str(&format!(" \x1b[1mZ\x1b[0m  {}", state.zero_flag() as u8));
    table.push_str("   \x1b[2m│\x1b[0m\n");
    table.push_str("\x1b[2m└─────────────────────────────────────┘\x1b[0m\n");
    table
}

fn format_integer(value: u16) -> String {
    format!(
        "0x{:04x}  {:-6}  {:-6}   {}",
        value,
        value as i16,
        value,
        char_display(value)
    )
}

/// Always 3 columns wide.
fn char_display(value: u16) -> String {
    match value {
        0x00 => "NUL".to_owned(),
        0x09 => "HT ".to_owned(),
        0x0a => "LF ".to_owned(),
        0x0d => "CR ".to_owned(),
        0x1b => "ESC".to_owned(),
        0x7f => "DEL".to_owned(),
        0x20 => "[_]".to_owned(),
        0x21..=0x7e => format!("{:<3}", value as u8 as char),
        // Remaining control characters
        0x00..=0x7f => "\x1b[2m───\x1b[0m".to_owned(),
        0x0080.. => "\x1b[2m┄┄┄\x1b[0m".to_owned(),
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let plain: String = Decolored::new(string).collect();
    let _ = stderr().lock().write_all(plain.as_bytes());
}
