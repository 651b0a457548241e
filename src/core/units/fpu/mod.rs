//! Floating-Point Reference Model.
//!
//! Golden model for the vector FP adder and FMA unit. Scalar lanes are
//! evaluated by the bit-exact routines in [`softfloat`]; the vector entry
//! point adds the register-level ops (merge, move) and accrues flags across
//! lanes.
//!
//! Operations are organized into submodules:
//! - [`softfloat`]: unpacking, exact arithmetic and rounding.
//! - [`rounding_modes`]: the five rounding directions.
//! - [`exception_flags`]: the 5-bit IEEE flag set.

/// Exception flag set.
pub mod exception_flags;

/// Rounding mode definitions.
pub mod rounding_modes;

/// Bit-exact IEEE-754 arithmetic.
pub mod softfloat;

use crate::common::error::{HarnessError, Result};
use crate::common::types::{FpFormat, Opcode};

use self::exception_flags::FpFlags;
use self::rounding_modes::RoundingMode;
use self::softfloat::{Compare, SignInject};

/// Floating-point reference unit.
pub struct Fpu;

impl Fpu {
    /// Evaluates one lane.
    ///
    /// # Arguments
    ///
    /// * `op` - Any FP opcode. `Merge` evaluates the lane as if its mask bit
    ///   were set (it yields `b`); `Move` yields `a`.
    /// * `a`, `b` - Raw lane encodings in `fmt`
    /// * `c` - Addend for the fused ops; required for them, ignored otherwise
    /// * `fmt` - Lane format
    /// * `rm` - Rounding mode; only affects add, sub, mul and the fused ops
    ///
    /// # Returns
    ///
    /// The raw result encoding and the flags raised by this lane. Compare
    /// ops return 1 or 0.
    ///
    /// # Errors
    ///
    /// `Configuration` for `Div` or for a fused op without `c`.
    pub fn evaluate(
        op: Opcode,
        a: u64,
        b: u64,
        c: Option<u64>,
        fmt: FpFormat,
        rm: RoundingMode,
    ) -> Result<(u64, FpFlags)> {
        if op.is_fused() && c.is_none() {
            return Err(HarnessError::Configuration(format!(
                "{:?} requires operand C",
                op
            )));
        }

        // Every NaN operand of a non-selection op is invalid.
        if op != Opcode::Div && !op.is_selection() {
            let addend = if op.is_fused() { c } else { None };
            let any_nan = [Some(a), Some(b), addend]
                .into_iter()
                .flatten()
                .any(|x| softfloat::is_nan(x, fmt));
            if any_nan {
                let bits = if op.is_compare() {
                    0
                } else {
                    softfloat::canonical_nan(fmt)
                };
                return Ok((bits, FpFlags::NV));
            }
        }

        let fused = |neg_product: bool, neg_addend: bool| -> Result<(u64, FpFlags)> {
            let c = c.ok_or_else(|| {
                HarnessError::Configuration(format!("{:?} requires operand C", op))
            })?;
            Ok(softfloat::fused_mul_add(
                a, b, c, neg_product, neg_addend, fmt, rm,
            ))
        };

        let out = match op {
            Opcode::Div => {
                return Err(HarnessError::Configuration(
                    "integer divide is not an FP operation".to_string(),
                ))
            }
            Opcode::Add => softfloat::add(a, b, fmt, rm),
            Opcode::Sub => softfloat::sub(a, b, fmt, rm),
            Opcode::Mul => softfloat::mul(a, b, fmt, rm),
            Opcode::MAdd => fused(false, false)?,
            Opcode::MSub => fused(false, true)?,
            Opcode::NMAdd => fused(true, true)?,
            Opcode::NMSub => fused(true, false)?,
            Opcode::Min => softfloat::min_max(a, b, false, fmt),
            Opcode::Max => softfloat::min_max(a, b, true, fmt),
            Opcode::Eq => softfloat::compare(a, b, Compare::Eq, fmt),
            Opcode::Lt => softfloat::compare(a, b, Compare::Lt, fmt),
            Opcode::Le => softfloat::compare(a, b, Compare::Le, fmt),
            Opcode::SgnJ => (softfloat::sign_inject(a, b, SignInject::Copy, fmt), FpFlags::NONE),
            Opcode::SgnJN => (
                softfloat::sign_inject(a, b, SignInject::Negate, fmt),
                FpFlags::NONE,
            ),
            Opcode::SgnJX => (softfloat::sign_inject(a, b, SignInject::Xor, fmt), FpFlags::NONE),
            Opcode::Merge => (b & softfloat::format_mask(fmt), FpFlags::NONE),
            Opcode::Move => (a & softfloat::format_mask(fmt), FpFlags::NONE),
        };
        Ok(out)
    }

    /// Evaluates a whole register.
    ///
    /// `mask` bit `i` selects operand B for lane `i` of a `Merge`; it is
    /// ignored by every other op. `Move` broadcasts lane 0 of `a`. Flags
    /// are the OR of all lane flags, as reported on the unit's single
    /// `exceptionFlags` output.
    pub fn evaluate_lanes(
        op: Opcode,
        a: &[u64],
        b: &[u64],
        c: Option<&[u64]>,
        mask: u64,
        fmt: FpFormat,
        rm: RoundingMode,
    ) -> Result<(Vec<u64>, FpFlags)> {
        if op.is_fused() && c.is_none() {
            return Err(HarnessError::Configuration(format!(
                "{:?} requires operand C",
                op
            )));
        }

        let mut lanes = Vec::with_capacity(a.len());
        let mut flags = FpFlags::NONE;
        for i in 0..a.len() {
            let (bits, lane_flags) = match op {
                Opcode::Merge => {
                    let pick = if mask >> i & 1 == 1 { b[i] } else { a[i] };
                    (pick & softfloat::format_mask(fmt), FpFlags::NONE)
                }
                Opcode::Move => (a[0] & softfloat::format_mask(fmt), FpFlags::NONE),
                _ => Self::evaluate(op, a[i], b[i], c.map(|c| c[i]), fmt, rm)?,
            };
            lanes.push(bits);
            flags |= lane_flags;
        }
        Ok((lanes, flags))
    }
}
