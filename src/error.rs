use std::{error::Error, fmt};

use miette::{miette, LabeledSpan, Report, Severity, SourceCode};

use crate::lexer::Line;
use crate::span::Span;

/// Reason an assembly was aborted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsmErrorKind {
    UnknownMnemonic { mnemonic: String },
    InvalidRegister { token: String },
    /// Neither a known label nor a valid integer literal.
    UnresolvedOperand { token: String },
    MissingOperand {
        mnemonic: &'static str,
        expected_count: u8,
        actual_count: u8,
    },
    DuplicateLabel { label: String, first_addr: u32 },
}

/// First error found while assembling, with the line it was found on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsmError {
    kind: AsmErrorKind,
    line: usize,
    text: String,
    span: Span,
}

impl AsmError {
    pub(crate) fn new(kind: AsmErrorKind, line: &Line, span: Span) -> Self {
        AsmError {
            kind,
            line: line.number,
            text: line.text.to_owned(),
            span,
        }
    }

    pub fn kind(&self) -> &AsmErrorKind {
        &self.kind
    }

    /// 1-based number of the offending line.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Content of the offending line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Location of the offending token within the source.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Render as a diagnostic pointing into `src`.
    pub fn into_report(self, src: impl SourceCode + Send + Sync + 'static) -> Report {
        let (code, help, label) = match &self.kind {
            AsmErrorKind::UnknownMnemonic { .. } => (
                "asm::unknown_mnemonic",
                "check the list of available instructions in the documentation",
                "unknown instruction",
            ),
            AsmErrorKind::InvalidRegister { .. } => (
                "asm::bad_register",
                "registers are written R0 to R15",
                "invalid register",
            ),
            AsmErrorKind::UnresolvedOperand { .. } => (
                "asm::unresolved_operand",
                "operands must be a defined label or an integer literal like 42, 0x2A, 0o52 or 0b101010",
                "unresolved operand",
            ),
            AsmErrorKind::MissingOperand { .. } => (
                "asm::missing_operand",
                "check the operands for this instruction",
                "missing operand",
            ),
            AsmErrorKind::DuplicateLabel { .. } => (
                "asm::duplicate_label",
                "labels may only be defined once per file",
                "duplicate label",
            ),
        };
        miette!(
            severity = Severity::Error,
            code = code,
            help = help,
            labels = vec![LabeledSpan::at(self.span, label)],
            "{}",
            self
        )
        .with_source_code(src)
    }
}

impl Error for AsmError {}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}: `{}`)", self.kind, self.line, self.text.trim())
    }
}

impl fmt::Display for AsmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMnemonic { mnemonic } => write!(f, "Unknown instruction `{}`", mnemonic),
            Self::InvalidRegister { token } => write!(f, "Invalid register `{}`", token),
            Self::UnresolvedOperand { token } => {
                write!(f, "Operand `{}` is neither a label nor an integer", token)
            }
            Self::MissingOperand {
                mnemonic,
                expected_count,
                actual_count,
            } => write!(
                f,
                "`{}` expects {} operand{}, found {}",
                mnemonic,
                expected_count,
                if *expected_count == 1 { "" } else { "s" },
                actual_count
            ),
            Self::DuplicateLabel { label, first_addr } => write!(
                f,
                "Label `{}` is already defined at address 0x{:04x}",
                label, first_addr
            ),
        }
    }
}
