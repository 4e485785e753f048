//! Register map and access-control tables.
//!
//! Modelled on a kernel `regmap` configuration: two tables of inclusive
//! address ranges, one listing writable addresses and one listing readable
//! addresses. The [`RegisterMap`] is validated once at construction and never
//! changes afterwards; every register access is checked against it before it
//! reaches a gateway.

use crate::regs::{Access, Register, ALL};
use crate::platform;
use std::fmt;

/// Inclusive address range `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegRange {
    /// First address in the range.
    pub min: u32,
    /// Last address in the range.
    pub max: u32,
}

impl RegRange {
    /// Range covering a single register.
    #[must_use]
    pub const fn single(reg: Register) -> Self {
        Self {
            min: reg.offset(),
            max: reg.offset(),
        }
    }

    /// Whether `offset` falls inside the range.
    #[must_use]
    pub const fn contains(&self, offset: u32) -> bool {
        offset >= self.min && offset <= self.max
    }
}

/// A "yes" table of permitted address ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTable {
    ranges: Vec<RegRange>,
}

impl AccessTable {
    /// Build a table from explicit ranges.
    #[must_use]
    pub fn new(ranges: Vec<RegRange>) -> Self {
        Self { ranges }
    }

    /// Build a table with one single-register range per register.
    pub fn from_registers(regs: impl IntoIterator<Item = Register>) -> Self {
        Self {
            ranges: regs.into_iter().map(RegRange::single).collect(),
        }
    }

    /// Whether `offset` is permitted by any range.
    #[must_use]
    pub fn allows(&self, offset: u32) -> bool {
        self.ranges.iter().any(|r| r.contains(offset))
    }

    /// Ranges in the table.
    #[must_use]
    pub fn ranges(&self) -> &[RegRange] {
        &self.ranges
    }
}

/// Construction-time invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Two registers share an address.
    DuplicateAddress(u32),
    /// Address is not a multiple of the register stride.
    Misaligned(u32),
    /// Address lies outside the register window.
    OutOfWindow(u32),
    /// A declared register is missing from the read table.
    NotReadable(Register),
    /// A read-only register appears in the write table.
    ReadOnlyWritable(Register),
    /// A writable register is missing from the write table.
    WritableNotInTable(Register),
    /// The write table admits an address the read table does not.
    WriteNotReadable(u32),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAddress(a) => write!(f, "duplicate register address {a:#04x}"),
            Self::Misaligned(a) => write!(f, "register address {a:#04x} is not 4-byte aligned"),
            Self::OutOfWindow(a) => write!(f, "register address {a:#04x} is outside the window"),
            Self::NotReadable(r) => write!(f, "register {r} is not in the read table"),
            Self::ReadOnlyWritable(r) => write!(f, "read-only register {r} is in the write table"),
            Self::WritableNotInTable(r) => write!(f, "writable register {r} is not in the write table"),
            Self::WriteNotReadable(a) => {
                write!(f, "address {a:#04x} is writable but not readable")
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Refused register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessViolation {
    /// No register is declared at this address.
    Undeclared(u32),
    /// The register is not in the read table.
    ReadDenied(Register),
    /// The register is not in the write table.
    WriteDenied(Register),
}

impl fmt::Display for AccessViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undeclared(a) => write!(f, "no register declared at {a:#04x}"),
            Self::ReadDenied(r) => write!(f, "read of {r} not permitted"),
            Self::WriteDenied(r) => write!(f, "write to {r} not permitted"),
        }
    }
}

impl std::error::Error for AccessViolation {}

/// Validated register map: declared registers plus read/write tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMap {
    registers: Vec<Register>,
    wr_table: AccessTable,
    rd_table: AccessTable,
}

impl RegisterMap {
    /// Build and validate a register map.
    ///
    /// # Errors
    ///
    /// Returns the first [`MapError`] found.
    pub fn new(
        registers: Vec<Register>,
        wr_table: AccessTable,
        rd_table: AccessTable,
    ) -> Result<Self, MapError> {
        let mut seen: Vec<u32> = Vec::with_capacity(registers.len());
        for reg in &registers {
            let addr = reg.offset();
            if seen.contains(&addr) {
                return Err(MapError::DuplicateAddress(addr));
            }
            if addr % platform::REG_STRIDE != 0 {
                return Err(MapError::Misaligned(addr));
            }
            if addr + platform::REG_STRIDE > platform::REG_WINDOW_SIZE {
                return Err(MapError::OutOfWindow(addr));
            }
            seen.push(addr);

            if !rd_table.allows(addr) {
                return Err(MapError::NotReadable(*reg));
            }
            match reg.access() {
                Access::ReadOnly if wr_table.allows(addr) => {
                    return Err(MapError::ReadOnlyWritable(*reg));
                }
                Access::ReadWrite if !wr_table.allows(addr) => {
                    return Err(MapError::WritableNotInTable(*reg));
                }
                _ => {}
            }
        }

        // Every write-table address must also be readable
        for range in wr_table.ranges() {
            if let Some(addr) = first_unreadable(range, &rd_table) {
                return Err(MapError::WriteNotReadable(addr));
            }
        }

        Ok(Self {
            registers,
            wr_table,
            rd_table,
        })
    }

    /// The standard `AES_v1.0` map: all registers readable, status and
    /// ciphertext registers excluded from the write table.
    ///
    /// # Errors
    ///
    /// Only fails if the static register table is inconsistent, which the
    /// unit tests rule out.
    pub fn aes_v1() -> Result<Self, MapError> {
        let wr = AccessTable::from_registers(ALL.iter().copied().filter(|r| r.access().is_writable()));
        let rd = AccessTable::from_registers(ALL);
        Self::new(ALL.to_vec(), wr, rd)
    }

    /// Declared registers in address order.
    #[must_use]
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Whether `offset` may be read.
    #[must_use]
    pub fn is_readable(&self, offset: u32) -> bool {
        self.declared(offset).is_some() && self.rd_table.allows(offset)
    }

    /// Whether `offset` may be written.
    #[must_use]
    pub fn is_writable(&self, offset: u32) -> bool {
        self.declared(offset).is_some() && self.wr_table.allows(offset)
    }

    /// Resolve `offset` for a read.
    ///
    /// # Errors
    ///
    /// Returns [`AccessViolation`] if the address is undeclared or not readable.
    pub fn check_read(&self, offset: u32) -> Result<Register, AccessViolation> {
        let reg = self.declared(offset).ok_or(AccessViolation::Undeclared(offset))?;
        if self.rd_table.allows(offset) {
            Ok(reg)
        } else {
            Err(AccessViolation::ReadDenied(reg))
        }
    }

    /// Resolve `offset` for a write.
    ///
    /// # Errors
    ///
    /// Returns [`AccessViolation`] if the address is undeclared or read-only.
    pub fn check_write(&self, offset: u32) -> Result<Register, AccessViolation> {
        let reg = self.declared(offset).ok_or(AccessViolation::Undeclared(offset))?;
        if self.wr_table.allows(offset) {
            Ok(reg)
        } else {
            Err(AccessViolation::WriteDenied(reg))
        }
    }

    fn declared(&self, offset: u32) -> Option<Register> {
        self.registers.iter().copied().find(|r| r.offset() == offset)
    }
}

/// First register-aligned address of `range` that `rd` does not admit.
///
/// Jumps from one covering read range to the next, so the cost depends on the
/// number of ranges, not on their width.
fn first_unreadable(range: &RegRange, rd: &AccessTable) -> Option<u32> {
    let mut addr = range.min.checked_next_multiple_of(platform::REG_STRIDE)?;
    while addr <= range.max {
        let reach = rd
            .ranges()
            .iter()
            .filter(|r| r.contains(addr))
            .map(|r| r.max)
            .max();
        let Some(reach) = reach else {
            return Some(addr);
        };
        addr = reach
            .checked_add(1)?
            .checked_next_multiple_of(platform::REG_STRIDE)?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{CIPHERTEXT_WORDS, KEY_WORDS};

    fn map() -> RegisterMap {
        RegisterMap::aes_v1().expect("static map is valid")
    }

    #[test]
    fn standard_map_declares_every_register() {
        let m = map();
        assert_eq!(m.registers().len(), 20);
        for reg in ALL {
            assert!(m.is_readable(reg.offset()), "{reg} unreadable");
        }
    }

    #[test]
    fn write_table_excludes_status() {
        let m = map();
        assert!(!m.is_writable(Register::Done.offset()));
        assert!(!m.is_writable(Register::CompState.offset()));
        for reg in CIPHERTEXT_WORDS {
            assert_eq!(
                m.check_write(reg.offset()),
                Err(AccessViolation::WriteDenied(reg))
            );
        }
        for reg in KEY_WORDS {
            assert_eq!(m.check_write(reg.offset()), Ok(reg));
        }
    }

    #[test]
    fn hole_is_undeclared() {
        let m = map();
        for addr in [0x38, 0x3C, 0x40, 0x44, 0x60, 0x01] {
            assert_eq!(m.check_read(addr), Err(AccessViolation::Undeclared(addr)));
            assert_eq!(m.check_write(addr), Err(AccessViolation::Undeclared(addr)));
        }
    }

    #[test]
    fn rejects_read_only_in_write_table() {
        let wr = AccessTable::from_registers(ALL);
        let rd = AccessTable::from_registers(ALL);
        assert_eq!(
            RegisterMap::new(ALL.to_vec(), wr, rd),
            Err(MapError::ReadOnlyWritable(Register::Done))
        );
    }

    #[test]
    fn rejects_duplicates() {
        let regs = vec![Register::Enable, Register::Enable];
        let t = AccessTable::from_registers([Register::Enable]);
        assert_eq!(
            RegisterMap::new(regs, t.clone(), t),
            Err(MapError::DuplicateAddress(0))
        );
    }

    #[test]
    fn rejects_write_only_address() {
        let wr = AccessTable::new(vec![RegRange { min: 0x00, max: 0x04 }]);
        let rd = AccessTable::from_registers([Register::Enable]);
        assert_eq!(
            RegisterMap::new(vec![Register::Enable], wr, rd),
            Err(MapError::WriteNotReadable(0x04))
        );
    }

    #[test]
    fn top_of_address_space_ranges() {
        let top = RegRange {
            min: 0xFFFF_FFFC,
            max: u32::MAX,
        };
        let t = AccessTable::new(vec![top]);
        assert!(RegisterMap::new(vec![], t.clone(), t.clone()).is_ok());

        assert_eq!(
            RegisterMap::new(vec![], t, AccessTable::default()),
            Err(MapError::WriteNotReadable(0xFFFF_FFFC))
        );

        let all = AccessTable::new(vec![RegRange {
            min: 0,
            max: u32::MAX,
        }]);
        assert!(RegisterMap::new(vec![], all.clone(), all).is_ok());
    }

    #[test]
    fn write_range_may_span_several_read_ranges() {
        let wr = AccessTable::new(vec![RegRange { min: 0x00, max: 0x0C }]);
        let rd = AccessTable::new(vec![
            RegRange { min: 0x08, max: 0x0C },
            RegRange { min: 0x00, max: 0x04 },
        ]);
        assert!(RegisterMap::new(vec![], wr.clone(), rd).is_ok());

        let gap = AccessTable::new(vec![
            RegRange { min: 0x00, max: 0x04 },
            RegRange { min: 0x0C, max: 0x0C },
        ]);
        assert_eq!(
            RegisterMap::new(vec![], wr, gap),
            Err(MapError::WriteNotReadable(0x08))
        );
    }

    #[test]
    fn range_tables_cover_spans() {
        let t = AccessTable::new(vec![RegRange { min: 0x18, max: 0x34 }]);
        assert!(t.allows(0x18));
        assert!(t.allows(0x34));
        assert!(!t.allows(0x38));
    }
}
