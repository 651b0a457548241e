//! Vector Lane Codec.
//!
//! Converts between a packed 128-bit register and the ordered list of
//! scalar lanes it holds. Lane `i` occupies bits `[i*w, (i+1)*w)`, so lane 0
//! is the least significant element. Lane values are carried as `i128` so
//! that both the signed and the unsigned view of a 64-bit lane fit.

use crate::common::error::{HarnessError, Result};
use crate::common::types::{ElementWidth, Signedness};

/// Raw contents of one vector register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegisterBits(pub u128);

impl RegisterBits {
    /// All lanes zero.
    pub const ZERO: RegisterBits = RegisterBits(0);

    /// Raw register contents.
    pub fn val(self) -> u128 {
        self.0
    }

    /// Raw field of lane `index` at `width`, without sign extension.
    pub fn lane_raw(self, index: usize, width: ElementWidth) -> u128 {
        (self.0 >> (index as u32 * width.bits())) & width.lane_mask()
    }
}

/// Register contents together with the lane view used to interpret them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorValue {
    bits: RegisterBits,
    width: ElementWidth,
    signedness: Signedness,
}

impl VectorValue {
    /// Encodes `elements` into a new value. Missing upper lanes are zero.
    pub fn from_lanes(
        elements: &[i128],
        width: ElementWidth,
        signedness: Signedness,
    ) -> Result<Self> {
        let bits = encode(elements, width, signedness)?;
        Ok(Self {
            bits,
            width,
            signedness,
        })
    }

    /// Wraps already-packed bits.
    pub fn from_bits(bits: RegisterBits, width: ElementWidth, signedness: Signedness) -> Self {
        Self {
            bits,
            width,
            signedness,
        }
    }

    /// Packed register.
    pub fn bits(&self) -> RegisterBits {
        self.bits
    }

    /// Lane width the register was packed with.
    pub fn width(&self) -> ElementWidth {
        self.width
    }

    /// Lane interpretation the register was packed with.
    pub fn signedness(&self) -> Signedness {
        self.signedness
    }

    /// Unpacks every lane.
    pub fn lanes(&self) -> Vec<i128> {
        decode(self.bits, self.width, self.signedness)
    }
}

/// Checks that `value` fits one lane under the given interpretation.
pub fn fits(value: i128, width: ElementWidth, signedness: Signedness) -> bool {
    match signedness {
        Signedness::Unsigned => (0..=width.max_unsigned()).contains(&value),
        Signedness::Signed => (width.min_signed()..=width.max_signed()).contains(&value),
    }
}

/// Packs `elements` into a register.
///
/// Every element is range-checked before anything is packed, so a failing
/// call produces no partial register.
///
/// # Errors
///
/// `OperandRange` if an element does not fit, or if there are more elements
/// than lanes (the first surplus lane is reported).
pub fn encode(
    elements: &[i128],
    width: ElementWidth,
    signedness: Signedness,
) -> Result<RegisterBits> {
    let lanes = width.lane_count();
    for (lane, &value) in elements.iter().enumerate() {
        if lane >= lanes || !fits(value, width, signedness) {
            return Err(HarnessError::OperandRange {
                lane,
                value,
                width: width.bits(),
                signedness: signedness.name(),
            });
        }
    }

    Ok(pack_wrapping(elements, width))
}

/// Unpacks a register into `128 / width` lanes.
///
/// Signed decoding sign-extends each field.
pub fn decode(bits: RegisterBits, width: ElementWidth, signedness: Signedness) -> Vec<i128> {
    let w = width.bits();
    (0..width.lane_count())
        .map(|lane| {
            let raw = bits.lane_raw(lane, width);
            match signedness {
                Signedness::Unsigned => raw as i128,
                Signedness::Signed => {
                    let shift = 128 - w;
                    ((raw << shift) as i128) >> shift
                }
            }
        })
        .collect()
}

/// Replicates one element into every lane.
pub fn broadcast(value: i128, width: ElementWidth, signedness: Signedness) -> Result<RegisterBits> {
    encode(&vec![value; width.lane_count()], width, signedness)
}

/// Packs per-lane booleans into a lane bit mask (bit `i` = lane `i`).
pub fn pack_lane_mask(lanes: impl IntoIterator<Item = bool>) -> u64 {
    lanes
        .into_iter()
        .enumerate()
        .fold(0, |acc, (i, set)| acc | ((set as u64) << i))
}

/// Packs lane values without range checks; each value is truncated to its
/// lane. Used where lanes come from hardware-style computation rather than
/// from a test case.
pub fn pack_wrapping(elements: &[i128], width: ElementWidth) -> RegisterBits {
    let mask = width.lane_mask();
    let packed = elements
        .iter()
        .take(width.lane_count())
        .enumerate()
        .fold(0u128, |acc, (lane, &value)| {
            acc | (((value as u128) & mask) << (lane as u32 * width.bits()))
        });
    RegisterBits(packed)
}
