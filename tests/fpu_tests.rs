//! Unit tests for the floating-point reference model.

use vpu_conformance::common::types::{FpFormat, Opcode};
use vpu_conformance::core::units::fpu::exception_flags::FpFlags;
use vpu_conformance::core::units::fpu::rounding_modes::RoundingMode;
use vpu_conformance::core::units::fpu::softfloat::{self, Compare};
use vpu_conformance::core::units::fpu::Fpu;

const RNE: RoundingMode = RoundingMode::Rne;

fn f32b(x: f32) -> u64 {
    x.to_bits() as u64
}

fn f64b(x: f64) -> u64 {
    x.to_bits()
}

fn eval(op: Opcode, a: u64, b: u64, fmt: FpFormat) -> (u64, FpFlags) {
    Fpu::evaluate(op, a, b, None, fmt, RNE).unwrap()
}

/// Tests 64-bit addition of exact operands.
#[test]
fn test_fpu_add_f64_exact() {
    let (bits, flags) = eval(Opcode::Add, f64b(2.0), f64b(3.0), FpFormat::F64);
    assert_eq!(bits, f64b(5.0));
    assert!(flags.is_empty());
}

/// Tests 32-bit subtraction.
#[test]
fn test_fpu_sub_f32() {
    let (bits, flags) = eval(Opcode::Sub, f32b(5.5), f32b(2.25), FpFormat::F32);
    assert_eq!(bits, f32b(3.25));
    assert!(flags.is_empty());
}

/// Tests half-precision addition.
#[test]
fn test_fpu_add_f16() {
    // 1.0 + 2.0 = 3.0
    let (bits, flags) = eval(Opcode::Add, 0x3C00, 0x4000, FpFormat::F16);
    assert_eq!(bits, 0x4200);
    assert!(flags.is_empty());
}

/// Tests an inexact sum against the host FPU.
#[test]
fn test_fpu_add_inexact() {
    let (bits, flags) = eval(Opcode::Add, f64b(0.1), f64b(0.2), FpFormat::F64);
    assert_eq!(bits, f64b(0.1 + 0.2));
    assert_eq!(flags, FpFlags::NX);
}

/// Tests multiplication.
#[test]
fn test_fpu_mul() {
    let (bits, flags) = Fpu::evaluate(Opcode::Mul, f32b(3.0), f32b(-4.0), None, FpFormat::F32, RNE).unwrap();
    assert_eq!(bits, f32b(-12.0));
    assert!(flags.is_empty());
}

/// Tests that a signaling NaN operand yields the canonical NaN and NV.
#[test]
fn test_fpu_signaling_nan_raises_invalid() {
    let snan = 0x7F80_0001;
    let (bits, flags) = eval(Opcode::Add, snan, f32b(1.0), FpFormat::F32);
    assert_eq!(bits, 0x7FC0_0000);
    assert_eq!(flags, FpFlags::NV);
}

/// Tests that a quiet NaN propagates as the canonical NaN and raises NV.
#[test]
fn test_fpu_quiet_nan_propagates() {
    let qnan = 0xFFC0_1234;
    let (bits, flags) = eval(Opcode::Add, f32b(1.0), qnan, FpFormat::F32);
    assert_eq!(bits, softfloat::canonical_nan(FpFormat::F32));
    assert_eq!(flags, FpFlags::NV);

    let f64_qnan = 0x7FF8_0000_0000_0000;
    let (bits, flags) = eval(Opcode::Add, f64_qnan, f64b(1.0), FpFormat::F64);
    assert_eq!(bits, f64_qnan);
    assert_eq!(flags.bits(), 0b10000);

    let (bits, flags) = eval(Opcode::Mul, 0x7E01, 0x3C00, FpFormat::F16);
    assert_eq!(bits, 0x7E00);
    assert_eq!(flags, FpFlags::NV);
    assert_eq!(softfloat::canonical_nan(FpFormat::F64), 0x7FF8_0000_0000_0000);
    assert_eq!(softfloat::canonical_nan(FpFormat::F16), 0x7E00);
}

/// Tests that opposite infinities are an invalid operation.
#[test]
fn test_fpu_inf_minus_inf() {
    let inf = f64b(f64::INFINITY);
    let (bits, flags) = eval(Opcode::Sub, inf, inf, FpFormat::F64);
    assert!(softfloat::is_nan(bits, FpFormat::F64));
    assert_eq!(flags, FpFlags::NV);

    let (bits, flags) = eval(Opcode::Add, inf, f64b(1e300), FpFormat::F64);
    assert_eq!(bits, inf);
    assert!(flags.is_empty());
}

/// Tests that zero times infinity is invalid.
#[test]
fn test_fpu_zero_times_inf() {
    let (bits, flags) = eval(Opcode::Mul, 0, f32b(f32::INFINITY), FpFormat::F32);
    assert_eq!(bits, 0x7FC0_0000);
    assert_eq!(flags, FpFlags::NV);
}

/// Tests signed-zero sums.
#[test]
fn test_fpu_signed_zero_sum() {
    let pz = f64b(0.0);
    let nz = f64b(-0.0);
    assert_eq!(eval(Opcode::Add, pz, nz, FpFormat::F64).0, pz);
    assert_eq!(eval(Opcode::Add, nz, nz, FpFormat::F64).0, nz);

    let rdn = Fpu::evaluate(Opcode::Add, pz, nz, None, FpFormat::F64, RoundingMode::Rdn).unwrap();
    assert_eq!(rdn.0, nz);
    let cancel = Fpu::evaluate(Opcode::Sub, f64b(1.5), f64b(1.5), None, FpFormat::F64, RoundingMode::Rdn).unwrap();
    assert_eq!(cancel.0, nz);
    assert_eq!(eval(Opcode::Sub, f64b(1.5), f64b(1.5), FpFormat::F64).0, pz);
}

/// Tests that min and max ignore a single quiet NaN.
#[test]
fn test_fpu_min_max_nan() {
    let qnan = softfloat::canonical_nan(FpFormat::F32);
    let (bits, flags) = eval(Opcode::Min, qnan, f32b(1.0), FpFormat::F32);
    assert_eq!(bits, f32b(1.0));
    assert!(flags.is_empty());

    let (bits, _) = eval(Opcode::Max, f32b(-3.0), qnan, FpFormat::F32);
    assert_eq!(bits, f32b(-3.0));

    let (bits, _) = eval(Opcode::Max, qnan, qnan, FpFormat::F32);
    assert_eq!(bits, qnan);
}

/// Tests that a signaling NaN is excluded from min and max without NV.
#[test]
fn test_fpu_min_signaling_nan() {
    let (bits, flags) = eval(Opcode::Min, 0x7F80_0001, f32b(2.0), FpFormat::F32);
    assert_eq!(bits, f32b(2.0));
    assert!(flags.is_empty());

    let (bits, flags) = eval(Opcode::Max, f32b(-5.0), 0xFF80_0001, FpFormat::F32);
    assert_eq!(bits, f32b(-5.0));
    assert!(flags.is_empty());
}

/// Tests that -0 orders below +0 for min and max.
#[test]
fn test_fpu_min_max_signed_zero() {
    let (pz, nz) = (f64b(0.0), f64b(-0.0));
    assert_eq!(eval(Opcode::Min, pz, nz, FpFormat::F64).0, nz);
    assert_eq!(eval(Opcode::Min, nz, pz, FpFormat::F64).0, nz);
    assert_eq!(eval(Opcode::Max, nz, pz, FpFormat::F64).0, pz);
    assert_eq!(eval(Opcode::Max, pz, nz, FpFormat::F64).0, pz);
}

/// Tests ordinary min and max over negatives.
#[test]
fn test_fpu_min_max_order() {
    assert_eq!(eval(Opcode::Min, f32b(-1.0), f32b(-2.0), FpFormat::F32).0, f32b(-2.0));
    assert_eq!(eval(Opcode::Max, f32b(-1.0), f32b(-2.0), FpFormat::F32).0, f32b(-1.0));
    assert_eq!(eval(Opcode::Max, f32b(0.5), f32b(-7.0), FpFormat::F32).0, f32b(0.5));
}

/// Tests compares and their NaN signaling behaviour.
#[test]
fn test_fpu_compare() {
    let fmt = FpFormat::F64;
    assert_eq!(eval(Opcode::Eq, f64b(0.0), f64b(-0.0), fmt), (1, FpFlags::NONE));
    assert_eq!(eval(Opcode::Lt, f64b(-1.0), f64b(1.0), fmt), (1, FpFlags::NONE));
    assert_eq!(eval(Opcode::Le, f64b(1.0), f64b(1.0), fmt), (1, FpFlags::NONE));
    assert_eq!(eval(Opcode::Lt, f64b(1.0), f64b(1.0), fmt), (0, FpFlags::NONE));

    let qnan = softfloat::canonical_nan(fmt);
    assert_eq!(eval(Opcode::Eq, qnan, f64b(1.0), fmt), (0, FpFlags::NV));
    assert_eq!(eval(Opcode::Lt, qnan, f64b(1.0), fmt), (0, FpFlags::NV));
    assert_eq!(softfloat::compare(qnan, qnan, Compare::Le, fmt), (0, FpFlags::NV));
}

/// Tests the three sign-injection flavours.
#[test]
fn test_fpu_sign_injection() {
    let fmt = FpFormat::F32;
    assert_eq!(eval(Opcode::SgnJ, f32b(1.0), f32b(-2.0), fmt).0, f32b(-1.0));
    assert_eq!(eval(Opcode::SgnJN, f32b(1.0), f32b(-2.0), fmt).0, f32b(1.0));
    assert_eq!(eval(Opcode::SgnJX, f32b(-1.0), f32b(-2.0), fmt).0, f32b(1.0));
    assert_eq!(eval(Opcode::SgnJX, f32b(-1.0), f32b(2.0), fmt).0, f32b(-1.0));

    let (bits, flags) = eval(Opcode::SgnJN, 0x7F80_0001, f32b(1.0), fmt);
    assert_eq!(bits, 0xFF80_0001);
    assert!(flags.is_empty());
}

/// Tests the four fused multiply-add variants.
#[test]
fn test_fpu_fused_variants() {
    let (a, b, c) = (f64b(2.0), f64b(3.0), f64b(1.0));
    let fma = |op| Fpu::evaluate(op, a, b, Some(c), FpFormat::F64, RNE).unwrap().0;
    assert_eq!(fma(Opcode::MAdd), f64b(7.0));
    assert_eq!(fma(Opcode::MSub), f64b(5.0));
    assert_eq!(fma(Opcode::NMAdd), f64b(-7.0));
    assert_eq!(fma(Opcode::NMSub), f64b(-5.0));
}

/// Tests that the fused op rounds once.
#[test]
fn test_fpu_fma_single_rounding() {
    let eps = f64::EPSILON;
    let (a, b, c) = (1.0 + eps, 1.0 - eps, -1.0);
    let (bits, flags) = Fpu::evaluate(
        Opcode::MAdd,
        f64b(a),
        f64b(b),
        Some(f64b(c)),
        FpFormat::F64,
        RNE,
    )
    .unwrap();
    assert_eq!(bits, f64b(-(eps * eps)));
    assert!(flags.is_empty());
    assert_eq!(bits, f64b(a.mul_add(b, c)));
}

/// Tests that inf * 0 is invalid even when the addend is a quiet NaN.
#[test]
fn test_fpu_fma_inf_zero_qnan() {
    let qnan = softfloat::canonical_nan(FpFormat::F32);
    let (bits, flags) = Fpu::evaluate(
        Opcode::MAdd,
        f32b(f32::INFINITY),
        0,
        Some(qnan),
        FpFormat::F32,
        RNE,
    )
    .unwrap();
    assert_eq!(bits, qnan);
    assert_eq!(flags, FpFlags::NV);

    let (bits, flags) = Fpu::evaluate(
        Opcode::NMSub,
        f32b(2.0),
        f32b(3.0),
        Some(qnan),
        FpFormat::F32,
        RNE,
    )
    .unwrap();
    assert_eq!(bits, qnan);
    assert_eq!(flags, FpFlags::NV);
}

/// Tests that fused ops without operand C and integer divide are rejected.
#[test]
fn test_fpu_rejects_bad_requests() {
    assert!(Fpu::evaluate(Opcode::MAdd, 0, 0, None, FpFormat::F32, RNE).is_err());
    assert!(Fpu::evaluate(Opcode::Div, 0, 0, None, FpFormat::F32, RNE).is_err());
    assert!(Fpu::evaluate_lanes(Opcode::NMSub, &[0], &[0], None, 0, FpFormat::F32, RNE).is_err());
}

/// Tests per-lane merge and move broadcast.
#[test]
fn test_fpu_merge_and_move() {
    let a = [1, 2, 3, 4];
    let b = [10, 20, 30, 40];
    let (lanes, flags) = Fpu::evaluate_lanes(Opcode::Merge, &a, &b, None, 0b0101, FpFormat::F32, RNE).unwrap();
    assert_eq!(lanes, vec![10, 2, 30, 4]);
    assert!(flags.is_empty());

    let (lanes, _) = Fpu::evaluate_lanes(Opcode::Move, &a, &b, None, 0, FpFormat::F32, RNE).unwrap();
    assert_eq!(lanes, vec![1, 1, 1, 1]);
}

/// Tests that vector flags are the OR of the lane flags.
#[test]
fn test_fpu_vector_flags_accrue() {
    let a = [f32b(1.0), 0x7F80_0001];
    let b = [f32b(f32::MAX), f32b(1.0)];
    let (_, flags) = Fpu::evaluate_lanes(Opcode::Add, &a, &b, None, 0, FpFormat::F32, RNE).unwrap();
    assert_eq!(flags, FpFlags::NV | FpFlags::NX);
}
