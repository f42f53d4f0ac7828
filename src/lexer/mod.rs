use crate::lexer::cursor::Cursor;
use crate::span::{Idx, Span};

pub mod cursor;

/// Begins a comment line when it is the first non-whitespace character.
pub const COMMENT_MARKER: char = ';';
/// Separates a label from the rest of its line.
pub const LABEL_MARKER: char = ':';

/// A single whitespace or comma separated word of a line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// A source line that is neither blank nor a comment.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Raw line content, without line terminator.
    pub text: &'a str,
    /// Span of the whole line within the source.
    pub span: Span,
    pub label: Option<Token<'a>>,
    /// Mnemonic followed by operands. Empty for label-only lines.
    pub tokens: Vec<Token<'a>>,
}

impl Line<'_> {
    /// Whether this line produces an instruction, and so occupies an address.
    pub fn has_instruction(&self) -> bool {
        !self.tokens.is_empty()
    }
}

/// Test if a character separates tokens. Commas are essentially whitespace.
pub(crate) fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Iterate over every line of `src` which carries a label or an instruction.
pub fn lines(src: &str) -> impl Iterator<Item = Line<'_>> + '_ {
    let mut offs = 0;
    src.split('\n').enumerate().filter_map(move |(i, raw)| {
        let start = offs;
        offs += raw.len() + 1;
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        scan_line(i + 1, start, text)
    })
}

fn scan_line(number: usize, start: usize, text: &str) -> Option<Line<'_>> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
        return None;
    }

    let (label, body_offs) = match text.find(LABEL_MARKER) {
        Some(colon) => {
            let head = &text[..colon];
            let lead = head.len() - head.trim_start().len();
            let name = head.trim();
            let label = Token {
                text: name,
                span: span_at(start + lead, name.len()),
            };
            (Some(label), colon + LABEL_MARKER.len_utf8())
        }
        None => (None, 0),
    };

    Some(Line {
        number,
        text,
        span: span_at(start, text.len()),
        label,
        tokens: tokenize(&text[body_offs..], start + body_offs),
    })
}

/// Split `body` on separators. `base` is the offset of `body` within the whole source.
pub fn tokenize(body: &str, base: usize) -> Vec<Token<'_>> {
    let mut cursor = Cursor::new(body);
    let mut tokens = Vec::new();
    loop {
        cursor.take_while(is_separator);
        if cursor.is_eof() {
            break;
        }
        let tok_start = cursor.pos();
        cursor.take_while(|c| !is_separator(c));
        let text = cursor.slice_from(tok_start);
        tokens.push(Token {
            text,
            span: span_at(base + tok_start, text.len()),
        });
    }
    tokens
}

fn span_at(offs: usize, len: usize) -> Span {
    Span::new(Idx(offs as u32), len as u32)
}

/// Parse an integer literal: optional sign, then decimal digits or a `0x`, `0o` or `0b` prefixed
/// number. Underscores may separate digits. Decimal literals may not have leading zeros.
///
/// Literals of any width are accepted and reduced modulo 2^16, negative values in two's
/// complement.
pub fn parse_literal(text: &str) -> Option<u16> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = match body.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => (16, &body[2..]),
        Some(prefix) if prefix.eq_ignore_ascii_case("0o") => (8, &body[2..]),
        Some(prefix) if prefix.eq_ignore_ascii_case("0b") => (2, &body[2..]),
        _ => (10, body),
    };

    if digits.is_empty() || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    // A prefix may be followed by an underscore, a bare number may not start with one
    if radix == 10 && digits.starts_with('_') {
        return None;
    }
    let values: Vec<u32> = digits
        .chars()
        .filter(|&c| c != '_')
        .map(|c| c.to_digit(radix))
        .collect::<Option<_>>()?;
    if radix == 10 && values.first() == Some(&0) && values.iter().any(|&d| d != 0) {
        return None;
    }

    let magnitude = values.iter().fold(0u16, |acc, &digit| {
        acc.wrapping_mul(radix as u16).wrapping_add(digit as u16)
    });
    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|tok| tok.text).collect()
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let src = "\n   \n; comment\n    ; indented comment\nHALT\n";
        let lines: Vec<_> = lines(src).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 5);
        assert_eq!(texts(&lines[0].tokens), vec!["HALT"]);
    }

    #[test]
    fn splits_on_whitespace_and_commas() {
        let line = lines("  add R0,5\t,, r1  ").next().unwrap();
        assert_eq!(texts(&line.tokens), vec!["add", "R0", "5", "r1"]);
        assert_eq!(line.label, None);
    }

    #[test]
    fn label_prefix() {
        let src = "start: CLR R0\nend:\n  spaced  :  HALT";
        let lines: Vec<_> = lines(src).collect();

        assert_eq!(lines[0].label.unwrap().text, "start");
        assert_eq!(texts(&lines[0].tokens), vec!["CLR", "R0"]);
        assert!(lines[0].has_instruction());

        assert_eq!(lines[1].label.unwrap().text, "end");
        assert!(!lines[1].has_instruction());

        let label = lines[2].label.unwrap();
        assert_eq!(label.text, "spaced");
        assert_eq!(&src[label.span.as_range()], "spaced");
        assert_eq!(texts(&lines[2].tokens), vec!["HALT"]);
    }

    #[test]
    fn spans_point_into_source() {
        let src = "NOP\r\nloop: JMP loop\n";
        let lines: Vec<_> = lines(src).collect();
        assert_eq!(lines[0].text, "NOP");
        assert_eq!(lines[1].text, "loop: JMP loop");
        assert_eq!(lines[1].number, 2);
        for tok in &lines[1].tokens {
            assert_eq!(&src[tok.span.as_range()], tok.text);
        }
        assert_eq!(&src[lines[1].span.as_range()], "loop: JMP loop");
    }

    #[test]
    fn comments_are_only_stripped_by_line_prefix() {
        let line = lines("HALT ; stop here").next().unwrap();
        assert_eq!(texts(&line.tokens), vec!["HALT", ";", "stop", "here"]);
    }

    #[test]
    fn literals() {
        let cases: &[(&str, Option<u16>)] = &[
            ("0", Some(0)),
            ("00", Some(0)),
            ("42", Some(42)),
            ("+42", Some(42)),
            ("-1", Some(0xFFFF)),
            ("0xFF10", Some(0xFF10)),
            ("0Xff", Some(0xFF)),
            ("-0x10", Some(0xFFF0)),
            ("0o17", Some(0o17)),
            ("0b1010", Some(10)),
            ("0B11", Some(3)),
            ("1_000", Some(1000)),
            ("0x_ff", Some(0xFF)),
            ("65535", Some(0xFFFF)),
            ("65536", Some(0)),
            ("0x10001", Some(1)),
            // Wider than 64 bits
            ("99999999999999999999", Some(0xFFFF)),
            ("123456789012345678901234", Some(0xAFF2)),
            ("-123456789012345678901234", Some(0x500E)),
            ("0x123456789abcdef0123", Some(0x0123)),
            ("007", None),
            ("_1", None),
            ("1_", None),
            ("1__0", None),
            ("0x", None),
            ("0b102", None),
            ("0xG", None),
            ("12a", None),
            ("--1", None),
            ("+-1", None),
            ("-", None),
            ("", None),
            ("label", None),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_literal(text), *expected, "parse_literal({text:?})");
        }
    }
}
