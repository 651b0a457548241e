//! Bit-exact IEEE-754 arithmetic on raw encodings.
//!
//! Values are handled as raw bit patterns of the selected format held in a
//! `u64`. Finite operands are unpacked to an exact `sig * 2^exp` pair,
//! combined exactly in 128-bit integers (bits shifted out during alignment
//! are jammed into a sticky bit), and rounded once by [`round_pack`]. The
//! host FPU and its rounding state are never consulted.
//!
//! NaN results are always the canonical quiet NaN of the format. Any NaN
//! operand of an arithmetic or compare op raises NV, whether quiet or
//! signaling; `min_max` and sign injection never do.

use crate::common::types::FpFormat;

use super::exception_flags::FpFlags;
use super::rounding_modes::RoundingMode;

/// Bit position finite operands are normalized to before alignment.
///
/// Products carry at most 106 significant bits, so this leaves at least
/// 19 guard bits below the least significant product bit and headroom for
/// one carry out of the sum.
const ALIGN_MSB: u32 = 125;

/// Operand classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Zero,
    Finite,
    Inf,
    Nan,
}

/// Unpacked operand. For `Finite`, the value is `(-1)^sign * sig * 2^exp`.
#[derive(Clone, Copy, Debug)]
pub struct Unpacked {
    pub sign: bool,
    pub class: Class,
    pub sig: u128,
    pub exp: i32,
}

impl Unpacked {
    /// Returns `true` for either kind of NaN.
    pub fn is_nan(&self) -> bool {
        self.class == Class::Nan
    }
}

fn frac_mask(fmt: FpFormat) -> u64 {
    (1u64 << fmt.fraction_bits()) - 1
}

fn exp_field_max(fmt: FpFormat) -> u64 {
    (1u64 << fmt.exponent_bits()) - 1
}

/// Mask covering a whole encoding.
pub fn format_mask(fmt: FpFormat) -> u64 {
    if fmt.bits() == 64 {
        u64::MAX
    } else {
        (1u64 << fmt.bits()) - 1
    }
}

/// Mask of the sign bit.
pub fn sign_mask(fmt: FpFormat) -> u64 {
    1u64 << (fmt.bits() - 1)
}

/// Canonical quiet NaN: positive, quiet bit set, empty payload.
pub fn canonical_nan(fmt: FpFormat) -> u64 {
    (exp_field_max(fmt) << fmt.fraction_bits()) | (1u64 << (fmt.fraction_bits() - 1))
}

/// Infinity with the given sign.
pub fn infinity(sign: bool, fmt: FpFormat) -> u64 {
    ((sign as u64) << (fmt.bits() - 1)) | (exp_field_max(fmt) << fmt.fraction_bits())
}

/// Zero with the given sign.
pub fn zero(sign: bool, fmt: FpFormat) -> u64 {
    (sign as u64) << (fmt.bits() - 1)
}

/// Largest finite magnitude with the given sign.
pub fn max_finite(sign: bool, fmt: FpFormat) -> u64 {
    ((sign as u64) << (fmt.bits() - 1))
        | ((exp_field_max(fmt) - 1) << fmt.fraction_bits())
        | frac_mask(fmt)
}

/// Classifies an encoding and splits finite values into `sig * 2^exp`.
pub fn unpack(bits: u64, fmt: FpFormat) -> Unpacked {
    let fb = fmt.fraction_bits();
    let bits = bits & format_mask(fmt);
    let sign = bits & sign_mask(fmt) != 0;
    let biased = (bits >> fb) & exp_field_max(fmt);
    let frac = bits & frac_mask(fmt);

    let (class, sig, exp) = if biased == exp_field_max(fmt) {
        if frac == 0 {
            (Class::Inf, 0, 0)
        } else {
            (Class::Nan, 0, 0)
        }
    } else if biased == 0 {
        if frac == 0 {
            (Class::Zero, 0, 0)
        } else {
            (Class::Finite, frac as u128, 1 - fmt.bias() - fb as i32)
        }
    } else {
        (
            Class::Finite,
            (frac | (1u64 << fb)) as u128,
            biased as i32 - fmt.bias() - fb as i32,
        )
    };

    Unpacked {
        sign,
        class,
        sig,
        exp,
    }
}

/// True when `bits` encodes a NaN of either kind.
pub fn is_nan(bits: u64, fmt: FpFormat) -> bool {
    unpack(bits, fmt).is_nan()
}

fn msb(sig: u128) -> u32 {
    127 - sig.leading_zeros()
}

/// Shifts `sig` right by `shift`, returning the kept bits, the round bit
/// (first bit shifted out) and the sticky bit (OR of the rest).
fn shift_right_round(sig: u128, shift: i32) -> (u128, bool, bool) {
    if shift <= 0 {
        (sig << (-shift) as u32, false, false)
    } else if shift > 128 {
        (0, false, sig != 0)
    } else if shift == 128 {
        (0, sig >> 127 != 0, sig & (u128::MAX >> 1) != 0)
    } else {
        let shift = shift as u32;
        let rem = sig & ((1u128 << shift) - 1);
        let half = 1u128 << (shift - 1);
        (sig >> shift, rem & half != 0, rem & (half - 1) != 0)
    }
}

fn round_increment(mant: u128, round: bool, sticky: bool, sign: bool, rm: RoundingMode) -> bool {
    let inexact = round || sticky;
    match rm {
        RoundingMode::Rne => round && (sticky || mant & 1 == 1),
        RoundingMode::Rmm => round,
        RoundingMode::Rtz => false,
        RoundingMode::Rdn => inexact && sign,
        RoundingMode::Rup => inexact && !sign,
    }
}

/// Rounds the exact non-zero value `(-1)^sign * sig * 2^exp` to `fmt`.
///
/// Tininess is detected after rounding: a value below the normal range that
/// rounds up to the smallest normal does not raise UF.
pub fn round_pack(sign: bool, sig: u128, exp: i32, fmt: FpFormat, rm: RoundingMode) -> (u64, FpFlags) {
    debug_assert!(sig != 0);
    let fb = fmt.fraction_bits() as i32;
    let emin = 1 - fmt.bias();
    let e = exp + msb(sig) as i32;

    let mut lsb_exp = if e < emin { emin - fb } else { e - fb };
    let (mut mant, round, sticky) = shift_right_round(sig, lsb_exp - exp);
    let inexact = round || sticky;
    if round_increment(mant, round, sticky, sign, rm) {
        mant += 1;
    }
    if mant == 1u128 << (fb + 1) {
        mant >>= 1;
        lsb_exp += 1;
    }

    let mut tiny = e < emin;
    if e == emin - 1 {
        let (m, r, s) = shift_right_round(sig, e - fb - exp);
        let m = m + round_increment(m, r, s, sign, rm) as u128;
        if m == 1u128 << (fb + 1) {
            tiny = false;
        }
    }

    let mut flags = FpFlags::NONE;
    if inexact {
        flags |= FpFlags::NX;
    }
    if tiny && inexact {
        flags |= FpFlags::UF;
    }

    let biased = if mant >> fb != 0 {
        (lsb_exp + fb + fmt.bias()) as i64
    } else {
        0
    };

    if biased >= exp_field_max(fmt) as i64 {
        flags |= FpFlags::OF | FpFlags::NX;
        let to_inf = match rm {
            RoundingMode::Rne | RoundingMode::Rmm => true,
            RoundingMode::Rtz => false,
            RoundingMode::Rdn => sign,
            RoundingMode::Rup => !sign,
        };
        let bits = if to_inf {
            infinity(sign, fmt)
        } else {
            max_finite(sign, fmt)
        };
        return (bits, flags);
    }

    let bits = ((sign as u64) << (fmt.bits() - 1))
        | ((biased as u64) << fb)
        | (mant as u64 & frac_mask(fmt));
    (bits, flags)
}

/// Exact signed sum of two finite non-zero terms `(sign, sig, exp)`.
///
/// Returns `None` when the terms cancel exactly.
fn add_terms(a: (bool, u128, i32), b: (bool, u128, i32)) -> Option<(bool, u128, i32)> {
    let top = |t: &(bool, u128, i32)| t.2 + msb(t.1) as i32;
    let (big, small) = if top(&a) >= top(&b) { (a, b) } else { (b, a) };

    let lift = ALIGN_MSB - msb(big.1);
    let big_sig = big.1 << lift;
    let base_exp = big.2 - lift as i32;

    let shift = small.2 - base_exp;
    let small_sig = if shift >= 0 {
        small.1 << shift as u32
    } else if -shift >= 128 {
        1
    } else {
        let s = (-shift) as u32;
        let lost = small.1 & ((1u128 << s) - 1) != 0;
        (small.1 >> s) | lost as u128
    };

    if big.0 == small.0 {
        return Some((big.0, big_sig + small_sig, base_exp));
    }
    if big_sig == small_sig {
        return None;
    }
    if big_sig > small_sig {
        Some((big.0, big_sig - small_sig, base_exp))
    } else {
        Some((small.0, small_sig - big_sig, base_exp))
    }
}

/// Sign of an exact zero sum of opposite-signed terms.
fn cancel_sign(rm: RoundingMode) -> bool {
    rm == RoundingMode::Rdn
}

/// `a + b`, rounded once.
pub fn add(a: u64, b: u64, fmt: FpFormat, rm: RoundingMode) -> (u64, FpFlags) {
    let ua = unpack(a, fmt);
    let ub = unpack(b, fmt);

    if ua.is_nan() || ub.is_nan() {
        return (canonical_nan(fmt), FpFlags::NV);
    }
    match (ua.class, ub.class) {
        (Class::Inf, Class::Inf) if ua.sign != ub.sign => (canonical_nan(fmt), FpFlags::NV),
        (Class::Inf, _) => (a & format_mask(fmt), FpFlags::NONE),
        (_, Class::Inf) => (b & format_mask(fmt), FpFlags::NONE),
        (Class::Zero, Class::Zero) => {
            let sign = if ua.sign == ub.sign {
                ua.sign
            } else {
                cancel_sign(rm)
            };
            (zero(sign, fmt), FpFlags::NONE)
        }
        (Class::Zero, _) => (b & format_mask(fmt), FpFlags::NONE),
        (_, Class::Zero) => (a & format_mask(fmt), FpFlags::NONE),
        _ => match add_terms((ua.sign, ua.sig, ua.exp), (ub.sign, ub.sig, ub.exp)) {
            None => (zero(cancel_sign(rm), fmt), FpFlags::NONE),
            Some((sign, sig, exp)) => round_pack(sign, sig, exp, fmt, rm),
        },
    }
}

/// `a - b`, rounded once.
pub fn sub(a: u64, b: u64, fmt: FpFormat, rm: RoundingMode) -> (u64, FpFlags) {
    add(a, b ^ sign_mask(fmt), fmt, rm)
}

/// `a * b`, rounded once.
pub fn mul(a: u64, b: u64, fmt: FpFormat, rm: RoundingMode) -> (u64, FpFlags) {
    let ua = unpack(a, fmt);
    let ub = unpack(b, fmt);
    let sign = ua.sign ^ ub.sign;

    if ua.is_nan() || ub.is_nan() {
        return (canonical_nan(fmt), FpFlags::NV);
    }
    match (ua.class, ub.class) {
        (Class::Inf, Class::Zero) | (Class::Zero, Class::Inf) => (canonical_nan(fmt), FpFlags::NV),
        (Class::Inf, _) | (_, Class::Inf) => (infinity(sign, fmt), FpFlags::NONE),
        (Class::Zero, _) | (_, Class::Zero) => (zero(sign, fmt), FpFlags::NONE),
        _ => round_pack(sign, ua.sig * ub.sig, ua.exp + ub.exp, fmt, rm),
    }
}

/// Fused `(±a*b) ± c` with a single rounding.
///
/// `negate_product` and `negate_addend` select between the madd, msub,
/// nmadd and nmsub variants.
pub fn fused_mul_add(
    a: u64,
    b: u64,
    c: u64,
    negate_product: bool,
    negate_addend: bool,
    fmt: FpFormat,
    rm: RoundingMode,
) -> (u64, FpFlags) {
    let ua = unpack(a, fmt);
    let ub = unpack(b, fmt);
    let uc = unpack(c, fmt);
    let ps = ua.sign ^ ub.sign ^ negate_product;
    let cs = uc.sign ^ negate_addend;

    let inf_times_zero = matches!(
        (ua.class, ub.class),
        (Class::Inf, Class::Zero) | (Class::Zero, Class::Inf)
    );
    if inf_times_zero || ua.is_nan() || ub.is_nan() || uc.is_nan() {
        return (canonical_nan(fmt), FpFlags::NV);
    }

    let product_inf = ua.class == Class::Inf || ub.class == Class::Inf;
    if product_inf {
        if uc.class == Class::Inf && cs != ps {
            return (canonical_nan(fmt), FpFlags::NV);
        }
        return (infinity(ps, fmt), FpFlags::NONE);
    }
    if uc.class == Class::Inf {
        return (infinity(cs, fmt), FpFlags::NONE);
    }

    let product_zero = ua.class == Class::Zero || ub.class == Class::Zero;
    if product_zero {
        if uc.class == Class::Zero {
            let sign = if ps == cs { ps } else { cancel_sign(rm) };
            return (zero(sign, fmt), FpFlags::NONE);
        }
        let c_bits = if negate_addend {
            c ^ sign_mask(fmt)
        } else {
            c
        };
        return (c_bits & format_mask(fmt), FpFlags::NONE);
    }

    let product = (ps, ua.sig * ub.sig, ua.exp + ub.exp);
    if uc.class == Class::Zero {
        return round_pack(product.0, product.1, product.2, fmt, rm);
    }
    match add_terms(product, (cs, uc.sig, uc.exp)) {
        None => (zero(cancel_sign(rm), fmt), FpFlags::NONE),
        Some((sign, sig, exp)) => round_pack(sign, sig, exp, fmt, rm),
    }
}

/// Maps a non-NaN encoding onto a key that orders like the value, with
/// `+0` and `-0` equal.
fn order_key(bits: u64, fmt: FpFormat) -> i128 {
    let bits = bits & format_mask(fmt);
    let magnitude = (bits & !sign_mask(fmt)) as i128;
    if bits & sign_mask(fmt) != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Minimum or maximum. A single NaN operand is ignored; two NaNs give the
/// canonical NaN. `-0` orders below `+0`. No flag is ever raised.
pub fn min_max(a: u64, b: u64, want_max: bool, fmt: FpFormat) -> (u64, FpFlags) {
    let ua = unpack(a, fmt);
    let ub = unpack(b, fmt);
    let (a, b) = (a & format_mask(fmt), b & format_mask(fmt));

    let bits = match (ua.is_nan(), ub.is_nan()) {
        (true, true) => canonical_nan(fmt),
        (true, false) => b,
        (false, true) => a,
        _ if ua.class == Class::Zero && ub.class == Class::Zero => {
            // Signs may differ; max prefers +0, min prefers -0.
            if (ua.sign && !want_max) || (!ua.sign && want_max) {
                a
            } else {
                b
            }
        }
        _ => {
            let a_first = if want_max {
                order_key(a, fmt) >= order_key(b, fmt)
            } else {
                order_key(a, fmt) <= order_key(b, fmt)
            };
            if a_first {
                a
            } else {
                b
            }
        }
    };
    (bits, FpFlags::NONE)
}

/// Comparison flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compare {
    Eq,
    Lt,
    Le,
}

/// Compares two encodings, returning 1 or 0. Unordered operands compare
/// false and raise NV.
pub fn compare(a: u64, b: u64, cmp: Compare, fmt: FpFormat) -> (u64, FpFlags) {
    if is_nan(a, fmt) || is_nan(b, fmt) {
        return (0, FpFlags::NV);
    }
    let (ka, kb) = (order_key(a, fmt), order_key(b, fmt));
    let result = match cmp {
        Compare::Eq => ka == kb,
        Compare::Lt => ka < kb,
        Compare::Le => ka <= kb,
    };
    (result as u64, FpFlags::NONE)
}

/// Sign-injection flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignInject {
    /// Copy the sign of `b`.
    Copy,
    /// Copy the inverted sign of `b`.
    Negate,
    /// XOR the signs.
    Xor,
}

/// Magnitude of `a` with a sign derived from `b`.
pub fn sign_inject(a: u64, b: u64, kind: SignInject, fmt: FpFormat) -> u64 {
    let sign = sign_mask(fmt);
    let magnitude = a & format_mask(fmt) & !sign;
    let a_sign = a & sign;
    let b_sign = b & sign;
    match kind {
        SignInject::Copy => magnitude | b_sign,
        SignInject::Negate => magnitude | (b_sign ^ sign),
        SignInject::Xor => magnitude | (a_sign ^ b_sign),
    }
}
