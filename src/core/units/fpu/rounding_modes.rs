//! Rounding modes driven on the 3-bit `roundingMode` input.

use serde::{Deserialize, Serialize};

use crate::common::error::{HarnessError, Result};

/// IEEE-754 rounding direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingMode {
    /// Round to nearest, ties to even (000).
    #[default]
    Rne,
    /// Round towards zero (001).
    Rtz,
    /// Round down, towards -infinity (010).
    Rdn,
    /// Round up, towards +infinity (011).
    Rup,
    /// Round to nearest, ties to max magnitude (100).
    Rmm,
}

impl RoundingMode {
    /// Every rounding mode in encoding order.
    pub const ALL: [RoundingMode; 5] = [
        RoundingMode::Rne,
        RoundingMode::Rtz,
        RoundingMode::Rdn,
        RoundingMode::Rup,
        RoundingMode::Rmm,
    ];

    /// Value driven on the 3-bit `roundingMode` input.
    pub fn encoding(self) -> u8 {
        match self {
            RoundingMode::Rne => 0b000,
            RoundingMode::Rtz => 0b001,
            RoundingMode::Rdn => 0b010,
            RoundingMode::Rup => 0b011,
            RoundingMode::Rmm => 0b100,
        }
    }

    /// Decodes the 3-bit field; 101..111 are reserved.
    pub fn from_encoding(bits: u8) -> Result<Self> {
        match bits {
            0b000 => Ok(RoundingMode::Rne),
            0b001 => Ok(RoundingMode::Rtz),
            0b010 => Ok(RoundingMode::Rdn),
            0b011 => Ok(RoundingMode::Rup),
            0b100 => Ok(RoundingMode::Rmm),
            other => Err(HarnessError::Configuration(format!(
                "reserved rounding mode {:#05b}",
                other
            ))),
        }
    }
}
