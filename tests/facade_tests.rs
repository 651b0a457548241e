//! End-to-end tests through the operation facade.

use vpu_conformance::common::error::{HandshakeSide, HarnessError};
use vpu_conformance::common::types::{ElementWidth, FpFormat, Opcode, Signedness, Unit};
use vpu_conformance::config::HarnessConfig;
use vpu_conformance::core::checker::InvariantChecker;
use vpu_conformance::core::codec::{RegisterBits, VectorValue};
use vpu_conformance::core::driver::HandshakeDriver;
use vpu_conformance::core::facade::OperationFacade;
use vpu_conformance::core::inspect::StatusInspector;
use vpu_conformance::core::pipeline::queue::BackpressurePolicy;
use vpu_conformance::core::pipeline::signals::RawOutput;
use vpu_conformance::core::pipeline::slot::OperationRequest;
use vpu_conformance::core::units::fpu::exception_flags::FpFlags;
use vpu_conformance::core::units::fpu::rounding_modes::RoundingMode;
use vpu_conformance::coverage::CoverageContext;
use vpu_conformance::sim::{DividerModel, FpUnitModel};

fn corrupt_quotient(mut raw: RawOutput) -> RawOutput {
    raw.primary = RegisterBits(raw.primary.val() ^ 1);
    raw
}

fn spurious_inexact(mut raw: RawOutput) -> RawOutput {
    raw.flags |= FpFlags::NX.bits() as u64;
    raw
}

fn f64b(x: f64) -> u64 {
    x.to_bits()
}

fn f32b(x: f32) -> u64 {
    x.to_bits() as u64
}

/// Tests the divide-by-zero convention end to end.
#[test]
fn test_facade_divide_by_zero() {
    let mut facade = OperationFacade::divider(&HarnessConfig::default());
    let mut cov = CoverageContext::new();

    let res = facade
        .divide(&[100], &[0], ElementWidth::E32, Signedness::Unsigned, &mut cov)
        .unwrap();
    assert_eq!(res.primary[0], 0xFFFF_FFFF);
    assert_eq!(res.secondary[0], 100);
    assert_eq!(res.flags & 1, 1);
    assert_eq!(res.flags, 0b1111);
    assert!(cov.is_covered("op.div"));
    assert!(cov.is_covered("check.div.zero_divisor"));
    assert!(cov.is_covered("flags.all_lanes"));
}

/// Tests signed overflow and ordinary signed division end to end.
#[test]
fn test_facade_signed_overflow() {
    let mut facade = OperationFacade::divider(&HarnessConfig::default());
    let mut cov = CoverageContext::new();
    let min = i32::MIN as i128;

    let res = facade
        .divide(&[min, -7, 7, 9], &[-1, 2, -2, 3], ElementWidth::E32, Signedness::Signed, &mut cov)
        .unwrap();
    assert_eq!(res.primary, vec![min, -3, -3, 3]);
    assert_eq!(res.secondary, vec![0, -1, 1, 0]);
    assert_eq!(res.flags, 0);
    assert!(cov.is_covered("check.div.overflow"));
    assert!(cov.is_covered("config.signed"));
    assert!(!facade.needs_reset());
}

/// Tests that an operand range error touches nothing and blocks nothing.
#[test]
fn test_facade_range_error() {
    let mut facade = OperationFacade::divider(&HarnessConfig::default());
    let mut cov = CoverageContext::new();

    let err = facade
        .divide(&[256], &[1], ElementWidth::E8, Signedness::Unsigned, &mut cov)
        .unwrap_err();
    assert!(matches!(err, HarnessError::OperandRange { lane: 0, value: 256, width: 8, .. }));
    assert_eq!(facade.driver().cycle(), 0);
    assert!(!facade.needs_reset());

    let res = facade
        .divide(&[255], &[5], ElementWidth::E8, Signedness::Unsigned, &mut cov)
        .unwrap();
    assert_eq!(res.primary[0], 51);
}

/// Tests that a corrupted result is caught and blocks the facade.
#[test]
fn test_facade_violation_blocks() {
    let config = HarnessConfig::default();
    let dut = DividerModel::new(&config.divider).with_fault(corrupt_quotient);
    let driver = HandshakeDriver::new(dut, Unit::Divider, &config.handshake);
    let mut facade = OperationFacade::new(driver, InvariantChecker::new());
    let mut cov = CoverageContext::new();

    let err = facade
        .divide(&[100, 1], &[25, 1], ElementWidth::E32, Signedness::Unsigned, &mut cov)
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::InvariantViolation {
            opcode: Opcode::Div,
            property: "division identity",
            lane: 0,
            ..
        }
    ));
    assert!(facade.needs_reset());
    assert!(!cov.is_covered("op.div"));

    let cycle = facade.driver().cycle();
    let err = facade
        .divide(&[4], &[2], ElementWidth::E32, Signedness::Unsigned, &mut cov)
        .unwrap_err();
    assert_eq!(err, HarnessError::ResetRequired);
    assert_eq!(facade.driver().cycle(), cycle);
}

/// Tests that reset recovers from a timeout.
#[test]
fn test_facade_timeout_then_reset() {
    let mut config = HarnessConfig::default();
    config.divider.backpressure = BackpressurePolicy::Stuck;
    let mut facade = OperationFacade::divider(&config);
    let mut cov = CoverageContext::new();

    let err = facade
        .divide(&[8], &[2], ElementWidth::E16, Signedness::Unsigned, &mut cov)
        .unwrap_err();
    assert_eq!(
        err,
        HarnessError::HandshakeTimeout {
            side: HandshakeSide::Input,
            steps: 100,
        }
    );
    assert!(facade.needs_reset());

    // A flush does not unblock.
    facade.flush(&mut cov);
    assert!(facade.needs_reset());

    facade
        .driver_mut()
        .dut_mut()
        .set_backpressure(BackpressurePolicy::None);
    facade.reset(&mut cov);
    assert!(!facade.needs_reset());
    assert!(facade.status().input_ready);

    let res = facade
        .divide(&[8], &[2], ElementWidth::E16, Signedness::Unsigned, &mut cov)
        .unwrap();
    assert_eq!(res.primary[0], 4);
}

/// Tests an exact f64 addition on the adder.
#[test]
fn test_facade_fp_add() {
    let config = HarnessConfig::default();
    let mut facade = OperationFacade::floating(Unit::FpAdder, &config).unwrap();
    let mut cov = CoverageContext::new();

    let res = facade
        .fp_binary(
            Opcode::Add,
            &[f64b(2.0)],
            &[f64b(3.0)],
            FpFormat::F64,
            RoundingMode::Rne,
            &mut cov,
        )
        .unwrap();
    assert_eq!(res.fp_lanes(), vec![f64b(5.0), 0]);
    assert_eq!(res.fp_flags(), FpFlags::NONE);
    assert!(res.secondary.is_empty());
    // One issue step plus the pipeline latency.
    assert_eq!(facade.driver().cycle(), 1 + config.fpu.latency);
    assert!(cov.is_covered("op.add"));
}

/// Tests a fused multiply-add on the FMA unit.
#[test]
fn test_facade_fp_fused() {
    let mut facade = OperationFacade::floating(Unit::FpFma, &HarnessConfig::default()).unwrap();
    let mut cov = CoverageContext::new();

    let res = facade
        .fp_fused(
            Opcode::MAdd,
            &[f32b(2.0), f32b(-1.5)],
            &[f32b(3.0), f32b(2.0)],
            &[f32b(1.0), f32b(0.5)],
            FpFormat::F32,
            RoundingMode::Rne,
            &mut cov,
        )
        .unwrap();
    assert_eq!(res.fp_lanes()[..2], [f32b(7.0), f32b(-2.5)]);
    assert!(cov.is_covered("op.madd"));

    let res = facade
        .fp_fused(
            Opcode::NMSub,
            &[f32b(2.0)],
            &[f32b(3.0)],
            &[f32b(1.0)],
            FpFormat::F32,
            RoundingMode::Rne,
            &mut cov,
        )
        .unwrap();
    assert_eq!(res.fp_lanes()[0], f32b(-5.0));
}

/// Tests a masked merge through the adder.
#[test]
fn test_facade_fp_merge() {
    let mut facade = OperationFacade::floating(Unit::FpAdder, &HarnessConfig::default()).unwrap();
    let mut cov = CoverageContext::new();
    let lanes = |v: &[u64]| {
        let v: Vec<i128> = v.iter().map(|&x| x as i128).collect();
        VectorValue::from_lanes(&v, ElementWidth::E32, Signedness::Unsigned).unwrap()
    };
    let a = lanes(&[1, 2, 3, 4]);
    let b = lanes(&[10, 20, 30, 40]);
    let request =
        OperationRequest::floating(Opcode::Merge, a, b, None, RoundingMode::Rne).with_mask(0b0101);

    let res = facade.compute(request, &mut cov).unwrap();
    assert_eq!(res.fp_lanes(), vec![10, 2, 30, 4]);
}

/// Tests that FP requests on the wrong unit and an FP facade over the
/// divider are rejected.
#[test]
fn test_facade_fp_rejections() {
    let config = HarnessConfig::default();
    assert!(matches!(
        OperationFacade::floating(Unit::Divider, &config),
        Err(HarnessError::Configuration(_))
    ));

    let mut facade = OperationFacade::floating(Unit::FpAdder, &config).unwrap();
    let mut cov = CoverageContext::new();
    let err = facade
        .fp_binary(Opcode::Mul, &[0], &[0], FpFormat::F32, RoundingMode::Rne, &mut cov)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Configuration(_)));
    assert!(!facade.needs_reset());
    assert_eq!(facade.driver().cycle(), 0);

    let mut fma = OperationFacade::floating(Unit::FpFma, &config).unwrap();
    let a = VectorValue::from_lanes(&[0], ElementWidth::E32, Signedness::Unsigned).unwrap();
    let err = fma
        .compute(OperationRequest::floating(Opcode::MAdd, a, a, None, RoundingMode::Rne), &mut cov)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Configuration(_)));
}

/// Tests that a spurious inexact flag from the FP unit is caught.
#[test]
fn test_facade_fp_flag_fault() {
    let config = HarnessConfig::default();
    let dut = FpUnitModel::new(Unit::FpAdder, &config.fpu).with_fault(spurious_inexact);
    let driver = HandshakeDriver::new(dut, Unit::FpAdder, &config.handshake)
        .with_fixed_latency(config.fpu.latency);
    let mut facade = OperationFacade::new(driver, InvariantChecker::new());
    let mut cov = CoverageContext::new();

    let err = facade
        .fp_binary(
            Opcode::Add,
            &[f32b(1.0)],
            &[f32b(1.0)],
            FpFormat::F32,
            RoundingMode::Rne,
            &mut cov,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::InvariantViolation {
            property: "exception flags",
            expected: 0,
            actual: 1,
            ..
        }
    ));
    assert!(facade.needs_reset());
}
