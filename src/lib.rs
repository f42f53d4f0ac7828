// Encoding
pub mod isa;

// Assembling
mod parser;
pub use parser::{assemble, AsmParser};
mod air;
pub use air::{Air, AirStmt};
mod error;
pub use error::{AsmError, AsmErrorKind};
mod lexer;
mod span;
pub use span::Span;
mod symbol;
pub use symbol::{Register, SymbolTable};

// Running
mod runtime;
pub use runtime::{Fault, RunState, Status};
pub mod clock;
mod port;
pub use port::{ConsolePort, Port, ScriptedPort};
pub mod output;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
