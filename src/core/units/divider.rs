//! Integer Divider Reference Model.
//!
//! Golden per-lane model of the vector integer divider. Two results do not
//! follow ordinary two's-complement arithmetic and mirror the hardware
//! under test instead:
//!
//! * a zero divisor yields an all-ones quotient, the dividend as remainder,
//!   and raises the lane's divide-by-zero flag;
//! * signed `minInt / -1` saturates to `(minInt, 0)` without trapping.

use crate::common::types::{ElementWidth, Signedness};
use crate::core::codec;

/// Result of dividing one lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneQuotient {
    pub quotient: i128,
    pub remainder: i128,
    /// Divisor was zero.
    pub divide_by_zero: bool,
}

impl LaneQuotient {
    /// Quotient as a raw `width`-bit pattern.
    pub fn quotient_bits(&self, width: ElementWidth) -> u128 {
        (self.quotient as u128) & width.lane_mask()
    }
}

/// Result of dividing a whole register.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VectorQuotient {
    pub quotients: Vec<i128>,
    pub remainders: Vec<i128>,
    /// Bit `i` set when lane `i` had a zero divisor.
    pub zero_mask: u64,
}

/// Reference divider.
pub struct Divider;

impl Divider {
    /// Divides one lane.
    ///
    /// Operands are lane values as produced by the codec: already reduced to
    /// `width`, and sign-extended when `signedness` is signed. Results use
    /// the same representation, so a zero-divisor quotient reads as `-1` in
    /// signed mode and as `2^width - 1` in unsigned mode. Both are the
    /// all-ones pattern.
    pub fn divide(
        dividend: i128,
        divisor: i128,
        width: ElementWidth,
        signedness: Signedness,
    ) -> LaneQuotient {
        if divisor == 0 {
            let all_ones = match signedness {
                Signedness::Unsigned => width.max_unsigned(),
                Signedness::Signed => -1,
            };
            return LaneQuotient {
                quotient: all_ones,
                remainder: dividend,
                divide_by_zero: true,
            };
        }

        match signedness {
            Signedness::Signed => {
                if dividend == width.min_signed() && divisor == -1 {
                    return LaneQuotient {
                        quotient: dividend,
                        remainder: 0,
                        divide_by_zero: false,
                    };
                }
                // i128 division truncates toward zero.
                let quotient = dividend / divisor;
                LaneQuotient {
                    quotient,
                    remainder: dividend - divisor * quotient,
                    divide_by_zero: false,
                }
            }
            Signedness::Unsigned => LaneQuotient {
                quotient: dividend / divisor,
                remainder: dividend % divisor,
                divide_by_zero: false,
            },
        }
    }

    /// Divides every lane of two equally-configured operand vectors.
    pub fn divide_lanes(
        dividends: &[i128],
        divisors: &[i128],
        width: ElementWidth,
        signedness: Signedness,
    ) -> VectorQuotient {
        let lanes: Vec<LaneQuotient> = dividends
            .iter()
            .zip(divisors)
            .map(|(&n, &d)| Self::divide(n, d, width, signedness))
            .collect();
        VectorQuotient {
            quotients: lanes.iter().map(|q| q.quotient).collect(),
            remainders: lanes.iter().map(|q| q.remainder).collect(),
            zero_mask: codec::pack_lane_mask(lanes.iter().map(|q| q.divide_by_zero)),
        }
    }

    /// Returns `true` for the signed `minInt / -1` lane.
    pub fn is_overflow(
        dividend: i128,
        divisor: i128,
        width: ElementWidth,
        signedness: Signedness,
    ) -> bool {
        signedness.is_signed() && dividend == width.min_signed() && divisor == -1
    }
}
