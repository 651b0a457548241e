//! IEEE-754 exception flags.
//!
//! Bit layout matches the 5-bit `exceptionFlags` output of the FP units:
//!
//! | bit | flag | meaning           |
//! |-----|------|-------------------|
//! | 0   | NX   | inexact           |
//! | 1   | UF   | underflow         |
//! | 2   | OF   | overflow          |
//! | 3   | DZ   | divide by zero    |
//! | 4   | NV   | invalid operation |

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Accrued exception flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FpFlags(u8);

impl FpFlags {
    /// No exception.
    pub const NONE: FpFlags = FpFlags(0);
    /// Inexact.
    pub const NX: FpFlags = FpFlags(1 << 0);
    /// Underflow.
    pub const UF: FpFlags = FpFlags(1 << 1);
    /// Overflow.
    pub const OF: FpFlags = FpFlags(1 << 2);
    /// Never raised by add or FMA ops; present for the full IEEE set.
    pub const DZ: FpFlags = FpFlags(1 << 3);
    /// Invalid operation.
    pub const NV: FpFlags = FpFlags(1 << 4);

    const ALL_BITS: u8 = 0x1f;

    /// Builds flags from a wire value; bits above bit 4 are dropped.
    pub fn from_bits(bits: u8) -> Self {
        FpFlags(bits & Self::ALL_BITS)
    }

    /// Raw 5-bit mask.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    pub fn contains(self, other: FpFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Any flag other than inexact.
    pub fn has_primary(self) -> bool {
        self.0 & !Self::NX.0 != 0
    }
}

impl BitOr for FpFlags {
    type Output = FpFlags;

    fn bitor(self, rhs: FpFlags) -> FpFlags {
        FpFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FpFlags {
    fn bitor_assign(&mut self, rhs: FpFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for FpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        let names = [
            (FpFlags::NV, "NV"),
            (FpFlags::DZ, "DZ"),
            (FpFlags::OF, "OF"),
            (FpFlags::UF, "UF"),
            (FpFlags::NX, "NX"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", set.join("|"))
    }
}
