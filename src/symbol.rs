use std::str::FromStr;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::isa::REGISTER_COUNT;

// Symbol table of label -> byte address
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Labels collected during the first assembler pass, in definition order.
///
/// Scoped to a single assembly; read-only once the first pass completes.
#[derive(Debug, Default)]
pub struct SymbolTable {
    table: FxMap<String, u32>,
}

impl SymbolTable {
    /// Record a label at `addr`. Returns the existing address if the label was already defined.
    pub fn insert(&mut self, label: &str, addr: u32) -> Result<(), u32> {
        if let Some(&existing) = self.table.get(label) {
            return Err(existing);
        }
        self.table.insert(label.to_owned(), addr);
        Ok(())
    }

    /// Labels are case-sensitive.
    pub fn get(&self, label: &str) -> Option<u32> {
        self.table.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.table.iter().map(|(label, addr)| (label.as_str(), *addr))
    }
}

/// One of the 16 general purpose registers, written `R0`..`R15`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Register(u8);

impl Register {
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < REGISTER_COUNT).then_some(Register(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl FromStr for Register {
    type Err = ();

    /// Accepts `R<n>` or `r<n>`, where the whole remainder is a decimal number from 0 to 15.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('R')
            .or_else(|| s.strip_prefix('r'))
            .ok_or(())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(());
        }
        let index: u8 = digits.parse().map_err(|_| ())?;
        Register::new(index).ok_or(())
    }
}
