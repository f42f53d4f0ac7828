use crate::isa::{Instruction, INSTRUCTION_SIZE};

/// Assembly intermediate representation: the encoded program in source order.
#[derive(Debug, Default)]
pub struct Air {
    stmts: Vec<AirStmt>,
}

/// One encoded instruction and the source line it came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AirStmt {
    /// 1-based source line.
    pub line: usize,
    pub instr: Instruction,
}

impl Air {
    pub fn new() -> Self {
        Air { stmts: Vec::new() }
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.stmts.push(stmt)
    }

    pub fn get(&self, idx: usize) -> &AirStmt {
        &self.stmts[idx]
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AirStmt> {
        self.stmts.iter()
    }

    /// The binary instruction stream: every instruction back to back, no header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.stmts.len() * INSTRUCTION_SIZE);
        for stmt in &self.stmts {
            bytes.extend_from_slice(&stmt.instr.encode());
        }
        bytes
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirStmt;
    type IntoIter = std::slice::Iter<'a, AirStmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.stmts.iter()
    }
}
