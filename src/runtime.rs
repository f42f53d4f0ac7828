use std::{error::Error, fmt};

use crate::{
    clock::Pacer,
    isa::{
        Instruction, Opcode, INPUT_PORT, INSTRUCTION_SIZE, MEMORY_SIZE, OUTPUT_PORT,
        REGISTER_COUNT,
    },
    output::Output,
    port::{ConsolePort, Port},
    Air,
};

/// Represents complete machine state during runtime.
///
/// Every mutation goes through `&mut self`, so a `RunState` shared between threads needs
/// external synchronisation.
pub struct RunState<P = ConsolePort> {
    /// Instruction buffer. Never written to, and separate from data memory.
    code: Vec<u8>,
    /// Byte-addressable data memory - 64KB in size.
    mem: Box<[u8]>,
    /// 16x 16-bit registers
    reg: [u16; REGISTER_COUNT],
    /// Zero flag
    zero: bool,
    /// Program counter, as a byte offset into `code`
    pc: usize,
    /// Never reset once set
    halted: bool,
    port: P,
    trace: bool,
}

/// Whether the machine can keep executing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Running,
    Halted,
}

/// Terminal runtime error. The machine must not execute further after one of these.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fault {
    /// Opcode byte with no operation assigned.
    UnknownOpcode { opcode: u8, pc: usize },
    /// Instruction fetch reached past the end of the program.
    PcOutOfBounds { pc: usize, len: usize },
}

impl Error for Fault {}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { opcode, pc } => {
                write!(f, "Unknown opcode 0x{:02X} at PC 0x{:04X}", opcode, pc)
            }
            Self::PcOutOfBounds { pc, len } => write!(
                f,
                "PC 0x{:04X} is outside the program ({} bytes) with no HALT reached",
                pc, len
            ),
        }
    }
}

impl<P: Port> RunState<P> {
    pub fn new(code: Vec<u8>, port: P) -> Self {
        RunState {
            code,
            mem: vec![0; MEMORY_SIZE].into_boxed_slice(),
            reg: [0; REGISTER_COUNT],
            zero: false,
            pc: 0,
            halted: false,
            port,
            trace: false,
        }
    }

    pub fn from_air(air: &Air, port: P) -> Self {
        Self::new(air.to_bytes(), port)
    }

    /// Print every executed instruction to stderr.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Run until `HALT` or a fault, pacing each instruction.
    pub fn run(&mut self, pacer: &mut Pacer) -> Result<(), Fault> {
        while self.step()? == Status::Running {
            pacer.tick();
        }
        Ok(())
    }

    /// Fetch, decode and execute a single instruction.
    pub fn step(&mut self) -> Result<Status, Fault> {
        if self.halted {
            return Ok(Status::Halted);
        }
        let instr = self.fetch()?;
        let opcode = Opcode::try_from(instr.opcode).map_err(|opcode| Fault::UnknownOpcode {
            opcode,
            pc: self.pc,
        })?;
        if self.trace {
            Output::Trace.print_str(&format!("{:04x}  {}  {}\n", self.pc, instr, opcode));
        }
        self.execute(opcode, instr);
        Ok(if self.halted {
            Status::Halted
        } else {
            Status::Running
        })
    }

    fn fetch(&self) -> Result<Instruction, Fault> {
        match self.code.get(self.pc..self.pc + INSTRUCTION_SIZE) {
            Some(&[opcode, op1, op2, op3]) => Ok(Instruction::decode([opcode, op1, op2, op3])),
            _ => Err(Fault::PcOutOfBounds {
                pc: self.pc,
                len: self.code.len(),
            }),
        }
    }

    fn execute(&mut self, opcode: Opcode, instr: Instruction) {
        let rd = instr.op1;
        let rs = instr.op2;
        let word = instr.word();
        // Shift amounts only use the low nibble, so at most 15
        let amount = u32::from(instr.op2 & 0x0F);

        match opcode {
            Opcode::Add => self.alu(rd, |a| a.wrapping_add(word)),
            Opcode::Sub => self.alu(rd, |a| a.wrapping_sub(word)),
            Opcode::Mul => self.alu(rd, |a| a.wrapping_mul(word)),
            Opcode::Radd => {
                let b = self.reg(rs);
                self.alu(rd, |a| a.wrapping_add(b))
            }
            Opcode::Rsub => {
                let b = self.reg(rs);
                self.alu(rd, |a| a.wrapping_sub(b))
            }
            Opcode::Rmul => {
                let b = self.reg(rs);
                self.alu(rd, |a| a.wrapping_mul(b))
            }
            Opcode::And => {
                let b = self.reg(rs);
                self.alu(rd, |a| a & b)
            }
            Opcode::Or => {
                let b = self.reg(rs);
                self.alu(rd, |a| a | b)
            }
            Opcode::Xor => {
                let b = self.reg(rs);
                self.alu(rd, |a| a ^ b)
            }
            Opcode::Not => self.alu(rd, |a| !a),
            Opcode::Shl => self.alu(rd, |a| a << amount),
            Opcode::Shr => self.alu(rd, |a| a >> amount),
            Opcode::Mov => {
                *self.reg_mut(rd) = self.reg(rs);
                self.advance();
            }
            Opcode::Ld => {
                *self.reg_mut(rd) = self.load(word);
                self.advance();
            }
            Opcode::St => {
                self.store(word, self.reg(rd));
                self.advance();
            }
            Opcode::Clr => {
                *self.reg_mut(rd) = 0;
                self.zero = true;
                self.advance();
            }
            Opcode::Cmp => {
                self.zero = self.reg(rd) == self.reg(rs);
                self.advance();
            }
            Opcode::Jmp => self.jump(true, word),
            Opcode::Jz => self.jump(self.zero, word),
            Opcode::Jnz => self.jump(!self.zero, word),
            Opcode::Halt => self.halted = true,
            Opcode::Nop => self.advance(),
            Opcode::Clz => {
                self.zero = false;
                self.advance();
            }
        }
    }

    /// Apply `op` to `rd`, set the zero flag from the result and move to the next instruction.
    #[inline]
    fn alu(&mut self, rd: u8, op: impl FnOnce(u16) -> u16) {
        let res = op(self.reg(rd));
        *self.reg_mut(rd) = res;
        self.zero = res == 0;
        self.advance();
    }

    #[inline]
    fn jump(&mut self, taken: bool, addr: u16) {
        if taken {
            self.pc = usize::from(addr);
        } else {
            self.advance();
        }
    }

    #[inline]
    fn advance(&mut self) {
        self.pc += INSTRUCTION_SIZE;
    }

    fn load(&mut self, addr: u16) -> u16 {
        if addr == INPUT_PORT {
            return match self.port.read_char() {
                None | Some('\n') => 0,
                Some(ch) => (u32::from(ch) & 0xFFFF) as u16,
            };
        }
        u16::from_le_bytes([self.mem_at(addr), self.mem_at(addr.wrapping_add(1))])
    }

    fn store(&mut self, addr: u16, val: u16) {
        let [low, high] = val.to_le_bytes();
        self.mem[usize::from(addr)] = low;
        // Storing to 0xFFFF wraps the high byte around to 0x0000
        self.mem[usize::from(addr.wrapping_add(1))] = high;
        if addr == OUTPUT_PORT {
            self.port.write_char(char::from(low));
        }
    }

    // Registers are indexed by the low nibble of the operand byte
    #[inline]
    fn reg_mut(&mut self, reg: u8) -> &mut u16 {
        &mut self.reg[usize::from(reg & 0x0F)]
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}

impl<P> RunState<P> {
    #[inline]
    pub fn reg(&self, reg: u8) -> u16 {
        self.reg[usize::from(reg & 0x0F)]
    }

    pub fn registers(&self) -> &[u16; REGISTER_COUNT] {
        &self.reg
    }

    pub fn zero_flag(&self) -> bool {
        self.zero
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Read a single byte of data memory.
    #[inline]
    pub fn mem_at(&self, addr: u16) -> u8 {
        self.mem[usize::from(addr)]
    }
}
