//! Lane configuration and operation types.
//!
//! These are the values a test case chooses before driving the DUT: how a
//! 128-bit register is split into lanes, how lanes are interpreted, and which
//! operation the unit performs. All wire encodings live here so the pin
//! structs never see an unvalidated value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::{HarnessError, Result};

/// Width of every vector register in bits.
pub const REGISTER_WIDTH: u32 = 128;

/// Configured lane width (SEW).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementWidth {
    E8,
    E16,
    E32,
    E64,
}

impl ElementWidth {
    /// All supported widths, narrowest first.
    pub const ALL: [ElementWidth; 4] = [
        ElementWidth::E8,
        ElementWidth::E16,
        ElementWidth::E32,
        ElementWidth::E64,
    ];

    /// Lane width in bits.
    pub fn bits(self) -> u32 {
        match self {
            ElementWidth::E8 => 8,
            ElementWidth::E16 => 16,
            ElementWidth::E32 => 32,
            ElementWidth::E64 => 64,
        }
    }

    /// Number of lanes in a register at this width.
    pub fn lane_count(self) -> usize {
        (REGISTER_WIDTH / self.bits()) as usize
    }

    /// Mask covering one lane.
    pub fn lane_mask(self) -> u128 {
        (1u128 << self.bits()) - 1
    }

    /// Mask with one bit per lane, as carried on the per-lane flag lines.
    pub fn lane_bit_mask(self) -> u64 {
        (1u64 << self.lane_count()) - 1
    }

    /// Smallest signed value of a lane.
    pub fn min_signed(self) -> i128 {
        -(1i128 << (self.bits() - 1))
    }

    /// Largest signed value of a lane.
    pub fn max_signed(self) -> i128 {
        (1i128 << (self.bits() - 1)) - 1
    }

    /// Largest unsigned value of a lane, which is also the all-ones pattern.
    pub fn max_unsigned(self) -> i128 {
        (1i128 << self.bits()) - 1
    }

    /// 2-bit `elementWidthSelect` encoding (00=8, 01=16, 10=32, 11=64).
    pub fn select(self) -> u8 {
        match self {
            ElementWidth::E8 => 0b00,
            ElementWidth::E16 => 0b01,
            ElementWidth::E32 => 0b10,
            ElementWidth::E64 => 0b11,
        }
    }

    /// Decodes the 2-bit select field. Upper bits are ignored, as on the wire.
    pub fn from_select(select: u8) -> Self {
        match select & 0b11 {
            0b00 => ElementWidth::E8,
            0b01 => ElementWidth::E16,
            0b10 => ElementWidth::E32,
            _ => ElementWidth::E64,
        }
    }
}

impl TryFrom<u32> for ElementWidth {
    type Error = HarnessError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(ElementWidth::E8),
            16 => Ok(ElementWidth::E16),
            32 => Ok(ElementWidth::E32),
            64 => Ok(ElementWidth::E64),
            other => Err(HarnessError::InvalidWidth(other)),
        }
    }
}

impl fmt::Display for ElementWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.bits())
    }
}

/// Two's-complement interpretation of lanes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signedness {
    #[default]
    Unsigned,
    Signed,
}

impl Signedness {
    /// Returns `true` for two's-complement lanes.
    pub fn is_signed(self) -> bool {
        matches!(self, Signedness::Signed)
    }

    /// 1-bit `signedSelect` encoding.
    pub fn select(self) -> bool {
        self.is_signed()
    }

    /// Decodes the `signedSelect` line.
    pub fn from_select(select: bool) -> Self {
        if select {
            Signedness::Signed
        } else {
            Signedness::Unsigned
        }
    }

    /// Short name used in logs and coverage marks.
    pub fn name(self) -> &'static str {
        match self {
            Signedness::Unsigned => "unsigned",
            Signedness::Signed => "signed",
        }
    }
}

/// IEEE-754 binary interchange formats handled by the FP units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FpFormat {
    F16,
    F32,
    F64,
}

impl FpFormat {
    /// Every supported format, narrowest first.
    pub const ALL: [FpFormat; 3] = [FpFormat::F16, FpFormat::F32, FpFormat::F64];

    /// Total encoding width in bits.
    pub fn bits(self) -> u32 {
        self.width().bits()
    }

    /// Lane width used to carry this format.
    pub fn width(self) -> ElementWidth {
        match self {
            FpFormat::F16 => ElementWidth::E16,
            FpFormat::F32 => ElementWidth::E32,
            FpFormat::F64 => ElementWidth::E64,
        }
    }

    /// Width of the biased exponent field.
    pub fn exponent_bits(self) -> u32 {
        match self {
            FpFormat::F16 => 5,
            FpFormat::F32 => 8,
            FpFormat::F64 => 11,
        }
    }

    /// Stored fraction bits (excluding the hidden bit).
    pub fn fraction_bits(self) -> u32 {
        match self {
            FpFormat::F16 => 10,
            FpFormat::F32 => 23,
            FpFormat::F64 => 52,
        }
    }

    /// Exponent bias.
    pub fn bias(self) -> i32 {
        (1 << (self.exponent_bits() - 1)) - 1
    }

    /// 2-bit `formatSelect` encoding, aligned with the element-width select.
    pub fn select(self) -> u8 {
        self.width().select()
    }

    /// Decodes `formatSelect`. `00` would mean an 8-bit float, which no unit supports.
    pub fn from_select(select: u8) -> Result<Self> {
        match select & 0b11 {
            0b01 => Ok(FpFormat::F16),
            0b10 => Ok(FpFormat::F32),
            0b11 => Ok(FpFormat::F64),
            other => Err(HarnessError::Configuration(format!(
                "format select {:#04b} has no floating-point format",
                other
            ))),
        }
    }

    /// Format whose encoding fills a lane of `width`.
    pub fn from_width(width: ElementWidth) -> Result<Self> {
        match width {
            ElementWidth::E16 => Ok(FpFormat::F16),
            ElementWidth::E32 => Ok(FpFormat::F32),
            ElementWidth::E64 => Ok(FpFormat::F64),
            ElementWidth::E8 => Err(HarnessError::Configuration(
                "8-bit lanes have no floating-point format".to_string(),
            )),
        }
    }
}

/// Functional unit an opcode is executed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Divider,
    FpAdder,
    FpFma,
}

/// Operations understood by the three units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Integer divide producing quotient and remainder.
    Div,
    Add,
    Sub,
    Min,
    Max,
    SgnJ,
    SgnJN,
    SgnJX,
    /// Quiet equality compare.
    Eq,
    /// Signaling less-than compare.
    Lt,
    /// Signaling less-or-equal compare.
    Le,
    /// Per-lane select: mask bit set picks operand B, clear picks operand A.
    Merge,
    /// Broadcast of operand A lane 0.
    Move,
    Mul,
    MAdd,
    MSub,
    NMAdd,
    NMSub,
}

impl Opcode {
    /// Unit that executes this opcode.
    pub fn unit(self) -> Unit {
        match self {
            Opcode::Div => Unit::Divider,
            Opcode::Mul | Opcode::MAdd | Opcode::MSub | Opcode::NMAdd | Opcode::NMSub => {
                Unit::FpFma
            }
            _ => Unit::FpAdder,
        }
    }

    /// 5-bit wire encoding on the FP units' `opcode` pins.
    pub fn encoding(self) -> Option<u8> {
        let code = match self {
            Opcode::Div => return None,
            Opcode::Add => 0x00,
            Opcode::Sub => 0x01,
            Opcode::Min => 0x02,
            Opcode::Max => 0x03,
            Opcode::SgnJ => 0x04,
            Opcode::SgnJN => 0x05,
            Opcode::SgnJX => 0x06,
            Opcode::Eq => 0x07,
            Opcode::Lt => 0x08,
            Opcode::Le => 0x09,
            Opcode::Merge => 0x0a,
            Opcode::Move => 0x0b,
            Opcode::Mul => 0x0c,
            Opcode::MAdd => 0x0d,
            Opcode::MSub => 0x0e,
            Opcode::NMAdd => 0x0f,
            Opcode::NMSub => 0x10,
        };
        Some(code)
    }

    /// Decodes a 5-bit FP opcode field.
    pub fn from_encoding(code: u8) -> Result<Self> {
        let op = match code & 0x1f {
            0x00 => Opcode::Add,
            0x01 => Opcode::Sub,
            0x02 => Opcode::Min,
            0x03 => Opcode::Max,
            0x04 => Opcode::SgnJ,
            0x05 => Opcode::SgnJN,
            0x06 => Opcode::SgnJX,
            0x07 => Opcode::Eq,
            0x08 => Opcode::Lt,
            0x09 => Opcode::Le,
            0x0a => Opcode::Merge,
            0x0b => Opcode::Move,
            0x0c => Opcode::Mul,
            0x0d => Opcode::MAdd,
            0x0e => Opcode::MSub,
            0x0f => Opcode::NMAdd,
            0x10 => Opcode::NMSub,
            other => {
                return Err(HarnessError::Configuration(format!(
                    "unknown FP opcode {:#04x}",
                    other
                )))
            }
        };
        Ok(op)
    }

    /// Selection ops pick or rebuild an operand instead of computing a new value,
    /// so a NaN operand never raises the invalid flag.
    pub fn is_selection(self) -> bool {
        matches!(
            self,
            Opcode::Min
                | Opcode::Max
                | Opcode::Merge
                | Opcode::Move
                | Opcode::SgnJ
                | Opcode::SgnJN
                | Opcode::SgnJX
        )
    }

    /// Compare ops yield 1 or 0 per lane.
    pub fn is_compare(self) -> bool {
        matches!(self, Opcode::Eq | Opcode::Lt | Opcode::Le)
    }

    /// Fused ops read the third operand.
    pub fn is_fused(self) -> bool {
        matches!(
            self,
            Opcode::MAdd | Opcode::MSub | Opcode::NMAdd | Opcode::NMSub
        )
    }
}
