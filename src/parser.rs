use crate::{
    air::{Air, AirStmt},
    error::{AsmError, AsmErrorKind},
    isa::{Instruction, Opcode, OperandForm, INSTRUCTION_SIZE},
    lexer::{self, parse_literal, Line, Token},
    symbol::{Register, SymbolTable},
};

/// Assemble `src` into its binary instruction stream representation.
pub fn assemble(src: &str) -> Result<Air, AsmError> {
    AsmParser::new(src)?.parse()
}

/// Two-pass assembler. Construction runs the label pass, [`AsmParser::parse`] the encoding pass.
pub struct AsmParser<'a> {
    src: &'a str,
    symbols: SymbolTable,
}

impl<'a> AsmParser<'a> {
    /// Collect every label with the byte address of the instruction it precedes.
    ///
    /// Every line with an instruction advances the address by one instruction, even if it will
    /// later fail to assemble. Label-only lines do not advance it.
    pub fn new(src: &'a str) -> Result<Self, AsmError> {
        let mut symbols = SymbolTable::default();
        let mut addr: u32 = 0;

        for line in lexer::lines(src) {
            if let Some(label) = line.label {
                if let Err(first_addr) = symbols.insert(label.text, addr) {
                    return Err(AsmError::new(
                        AsmErrorKind::DuplicateLabel {
                            label: label.text.to_owned(),
                            first_addr,
                        },
                        &line,
                        label.span,
                    ));
                }
            }
            if line.has_instruction() {
                addr += INSTRUCTION_SIZE as u32;
            }
        }

        Ok(AsmParser { src, symbols })
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Encode every instruction line in source order. Stops at the first error.
    pub fn parse(self) -> Result<Air, AsmError> {
        let mut air = Air::new();
        for line in lexer::lines(self.src) {
            if !line.has_instruction() {
                continue;
            }
            let instr = self.parse_line(&line)?;
            air.add_stmt(AirStmt {
                line: line.number,
                instr,
            });
        }
        Ok(air)
    }

    fn parse_line(&self, line: &Line) -> Result<Instruction, AsmError> {
        let mnemonic = line.tokens[0];
        let Some(opcode) = Opcode::from_mnemonic(mnemonic.text) else {
            return Err(AsmError::new(
                AsmErrorKind::UnknownMnemonic {
                    mnemonic: mnemonic.text.to_ascii_uppercase(),
                },
                line,
                mnemonic.span,
            ));
        };
        let ops = Operands {
            parser: self,
            line,
            opcode,
        };
        let instr = Instruction::new(opcode);

        Ok(match opcode.form() {
            OperandForm::RegWord => {
                let rd = ops.reg(0)?;
                let word = ops.value(1)?;
                Instruction { op1: rd, ..instr }.with_word(word)
            }
            OperandForm::RegReg => {
                let rd = ops.reg(0)?;
                let rs = ops.reg(1)?;
                Instruction {
                    op1: rd,
                    op2: rs,
                    ..instr
                }
            }
            OperandForm::Reg => Instruction {
                op1: ops.reg(0)?,
                ..instr
            },
            OperandForm::RegNibble => {
                let rd = ops.reg(0)?;
                let amount = ops.value(1)? as u8 & 0x0F;
                Instruction {
                    op1: rd,
                    op2: amount,
                    ..instr
                }
            }
            // Target is the last operand, so `JMP 0, target` reads the same as `JMP target`
            OperandForm::Addr => instr.with_word(ops.last_value()?),
            OperandForm::Bare => instr,
        })
    }

    /// Label address if `text` is a known label, otherwise its integer literal value.
    fn resolve(&self, text: &str) -> Option<u16> {
        match self.symbols.get(text) {
            Some(addr) => Some(addr as u16),
            None => parse_literal(text),
        }
    }
}

/// Operand accessor for a single line. Surplus operands are ignored.
struct Operands<'p, 'a> {
    parser: &'p AsmParser<'a>,
    line: &'p Line<'p>,
    opcode: Opcode,
}

impl Operands<'_, '_> {
    fn expected_count(&self) -> u8 {
        match self.opcode.form() {
            OperandForm::RegWord | OperandForm::RegReg | OperandForm::RegNibble => 2,
            OperandForm::Reg | OperandForm::Addr => 1,
            OperandForm::Bare => 0,
        }
    }

    fn get(&self, idx: usize) -> Result<Token, AsmError> {
        let operands = &self.line.tokens[1..];
        match operands.get(idx) {
            Some(tok) => Ok(*tok),
            None => Err(AsmError::new(
                AsmErrorKind::MissingOperand {
                    mnemonic: self.opcode.mnemonic(),
                    expected_count: self.expected_count(),
                    actual_count: operands.len() as u8,
                },
                self.line,
                self.line.span,
            )),
        }
    }

    fn reg(&self, idx: usize) -> Result<u8, AsmError> {
        let tok = self.get(idx)?;
        match tok.text.parse::<Register>() {
            Ok(reg) => Ok(reg.index()),
            Err(()) => Err(AsmError::new(
                AsmErrorKind::InvalidRegister {
                    token: tok.text.to_owned(),
                },
                self.line,
                tok.span,
            )),
        }
    }

    fn value(&self, idx: usize) -> Result<u16, AsmError> {
        let tok = self.get(idx)?;
        self.resolve(tok)
    }

    fn last_value(&self) -> Result<u16, AsmError> {
        let count = self.line.tokens.len() - 1;
        let tok = self.get(count.max(1) - 1)?;
        self.resolve(tok)
    }

    fn resolve(&self, tok: Token) -> Result<u16, AsmError> {
        self.parser.resolve(tok.text).ok_or_else(|| {
            AsmError::new(
                AsmErrorKind::UnresolvedOperand {
                    token: tok.text.to_owned(),
                },
                self.line,
                tok.span,
            )
        })
    }
}
