//! The SOLAR-16 instruction format, shared by the assembler and the emulator.
//!
//! Every instruction is four bytes: an opcode followed by three operand bytes. What the operand
//! bytes mean depends on the opcode, see [`OperandForm`].

use std::fmt;

/// Size in bytes of every encoded instruction.
pub const INSTRUCTION_SIZE: usize = 4;
/// Amount of general purpose registers.
pub const REGISTER_COUNT: usize = 16;
/// Size of the byte-addressable data memory.
pub const MEMORY_SIZE: usize = 0x10000;
/// Storing to this address echoes the stored low byte to the host as a character.
pub const OUTPUT_PORT: u16 = 0xFF00;
/// Loading from this address blocks for one character from the host.
pub const INPUT_PORT: u16 = 0xFF10;

/// Every operation understood by the machine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    Add = 0x00,
    Sub = 0x01,
    Mul = 0x02,
    Radd = 0x03,
    Rsub = 0x04,
    Rmul = 0x05,
    Mov = 0x10,
    Ld = 0x11,
    St = 0x12,
    Clr = 0x13,
    Jmp = 0x20,
    Jz = 0x21,
    Jnz = 0x22,
    Halt = 0x23,
    Cmp = 0x30,
    And = 0x40,
    Not = 0x41,
    Or = 0x42,
    Xor = 0x43,
    Shl = 0x44,
    Shr = 0x45,
    Clz = 0xF0,
    Nop = 0xFF,
}

/// How an opcode lays out its operands, both in source and in the encoded operand bytes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandForm {
    /// `Rd, Imm16` or `Rd, Addr16`: `op1` is the register, `op2`/`op3` the little-endian word.
    RegWord,
    /// `Rd, Rs`: `op1` and `op2` are registers.
    RegReg,
    /// `Rd`: `op1` is the register.
    Reg,
    /// `Rd, Imm4`: `op1` is the register, `op2` the shift amount masked to 4 bits.
    RegNibble,
    /// `Addr16`: `op2`/`op3` are the little-endian target address.
    Addr,
    /// No operands.
    Bare,
}

impl Opcode {
    /// The mnemonic table, in opcode order.
    pub const ALL: [Opcode; 23] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Radd,
        Opcode::Rsub,
        Opcode::Rmul,
        Opcode::Mov,
        Opcode::Ld,
        Opcode::St,
        Opcode::Clr,
        Opcode::Jmp,
        Opcode::Jz,
        Opcode::Jnz,
        Opcode::Halt,
        Opcode::Cmp,
        Opcode::And,
        Opcode::Not,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Shl,
        Opcode::Shr,
        Opcode::Clz,
        Opcode::Nop,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Radd => "RADD",
            Opcode::Rsub => "RSUB",
            Opcode::Rmul => "RMUL",
            Opcode::Mov => "MOV",
            Opcode::Ld => "LD",
            Opcode::St => "ST",
            Opcode::Clr => "CLR",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Jnz => "JNZ",
            Opcode::Halt => "HALT",
            Opcode::Cmp => "CMP",
            Opcode::And => "AND",
            Opcode::Not => "NOT",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::Clz => "CLZ",
            Opcode::Nop => "NOP",
        }
    }

    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    pub fn form(self) -> OperandForm {
        match self {
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Ld | Opcode::St => {
                OperandForm::RegWord
            }
            Opcode::Radd
            | Opcode::Rsub
            | Opcode::Rmul
            | Opcode::Mov
            | Opcode::Cmp
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor => OperandForm::RegReg,
            Opcode::Clr | Opcode::Not => OperandForm::Reg,
            Opcode::Shl | Opcode::Shr => OperandForm::RegNibble,
            Opcode::Jmp | Opcode::Jz | Opcode::Jnz => OperandForm::Addr,
            Opcode::Halt | Opcode::Nop | Opcode::Clz => OperandForm::Bare,
        }
    }
}

impl TryFrom<u8> for Opcode {
    /// The unrecognised opcode byte.
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x00 => Opcode::Add,
            0x01 => Opcode::Sub,
            0x02 => Opcode::Mul,
            0x03 => Opcode::Radd,
            0x04 => Opcode::Rsub,
            0x05 => Opcode::Rmul,
            0x10 => Opcode::Mov,
            0x11 => Opcode::Ld,
            0x12 => Opcode::St,
            0x13 => Opcode::Clr,
            0x20 => Opcode::Jmp,
            0x21 => Opcode::Jz,
            0x22 => Opcode::Jnz,
            0x23 => Opcode::Halt,
            0x30 => Opcode::Cmp,
            0x40 => Opcode::And,
            0x41 => Opcode::Not,
            0x42 => Opcode::Or,
            0x43 => Opcode::Xor,
            0x44 => Opcode::Shl,
            0x45 => Opcode::Shr,
            0xF0 => Opcode::Clz,
            0xFF => Opcode::Nop,
            unknown => return Err(unknown),
        })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A single raw instruction. No validation happens here; the opcode byte may be unknown.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Instruction {
    pub opcode: u8,
    pub op1: u8,
    pub op2: u8,
    pub op3: u8,
}

impl Instruction {
    /// Instruction with all operand bytes zeroed.
    pub fn new(opcode: Opcode) -> Self {
        Instruction {
            opcode: opcode as u8,
            ..Default::default()
        }
    }

    /// Slice a 4-byte window into its fields.
    pub fn decode(bytes: [u8; INSTRUCTION_SIZE]) -> Self {
        let [opcode, op1, op2, op3] = bytes;
        Instruction {
            opcode,
            op1,
            op2,
            op3,
        }
    }

    pub fn encode(self) -> [u8; INSTRUCTION_SIZE] {
        [self.opcode, self.op1, self.op2, self.op3]
    }

    /// Little-endian 16-bit immediate or address held in `op2` (low) and `op3` (high).
    pub fn word(self) -> u16 {
        u16::from_le_bytes([self.op2, self.op3])
    }

    pub fn with_word(self, word: u16) -> Self {
        let [op2, op3] = word.to_le_bytes();
        Instruction { op2, op3, ..self }
    }
}

impl From<[u8; INSTRUCTION_SIZE]> for Instruction {
    fn from(bytes: [u8; INSTRUCTION_SIZE]) -> Self {
        Instruction::decode(bytes)
    }
}

/// Lowercase hex of the four encoded bytes, eg. `00000500`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.encode() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_table() {
        #[rustfmt::skip]
        let cases = [
            ("ADD", 0x00), ("SUB", 0x01), ("MUL", 0x02),
            ("RADD", 0x03), ("RSUB", 0x04), ("RMUL", 0x05),
            ("MOV", 0x10), ("LD", 0x11), ("ST", 0x12), ("CLR", 0x13),
            ("JMP", 0x20), ("JZ", 0x21), ("JNZ", 0x22), ("HALT", 0x23),
            ("CMP", 0x30),
            ("AND", 0x40), ("NOT", 0x41), ("OR", 0x42), ("XOR", 0x43),
            ("SHL", 0x44), ("SHR", 0x45),
            ("NOP", 0xFF), ("CLZ", 0xF0),
        ];
        assert_eq!(cases.len(), Opcode::ALL.len());
        for (mnemonic, byte) in cases {
            let op = Opcode::from_mnemonic(mnemonic).unwrap();
            assert_eq!(op as u8, byte, "{mnemonic}");
            assert_eq!(Opcode::try_from(byte), Ok(op));
            assert_eq!(op.mnemonic(), mnemonic);
        }
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        assert_eq!(Opcode::from_mnemonic("halt"), Some(Opcode::Halt));
        assert_eq!(Opcode::from_mnemonic("rAdD"), Some(Opcode::Radd));
        assert_eq!(Opcode::from_mnemonic("FOO"), None);
        assert_eq!(Opcode::from_mnemonic(""), None);
    }

    #[test]
    fn unknown_opcodes() {
        let known: Vec<u8> = Opcode::ALL.iter().map(|op| *op as u8).collect();
        for byte in 0..=u8::MAX {
            assert_eq!(Opcode::try_from(byte).is_ok(), known.contains(&byte));
        }
        assert_eq!(Opcode::try_from(0x7F), Err(0x7F));
    }

    #[test]
    fn decode_slices_bytes() {
        let instr = Instruction::decode([0x11, 0x02, 0x10, 0xFF]);
        assert_eq!(instr.opcode, 0x11);
        assert_eq!(instr.op1, 0x02);
        assert_eq!(instr.word(), INPUT_PORT);
        assert_eq!(instr.encode(), [0x11, 0x02, 0x10, 0xFF]);
        // Unknown opcodes still decode
        assert_eq!(Instruction::decode([0xAB, 0, 0, 0]).opcode, 0xAB);
    }

    #[test]
    fn word_is_little_endian() {
        let instr = Instruction::new(Opcode::Jmp).with_word(0x1234);
        assert_eq!(instr.encode(), [0x20, 0x00, 0x34, 0x12]);
        assert_eq!(instr.to_string(), "20003412");
    }
}
