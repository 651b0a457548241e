//! Randomised conformance sweeps.
//!
//! A sweep draws requests from a seeded generator, runs each one through a
//! facade and tallies the outcome. Operands are biased towards the corner
//! cases each unit is known to get wrong: zero divisors and `minInt / -1`
//! for the divider; zeros, infinities, NaNs and subnormals for the FP units.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{error, info};

use crate::common::error::Result;
use crate::common::types::{ElementWidth, FpFormat, Opcode, Signedness, Unit};
use crate::core::codec::VectorValue;
use crate::core::facade::OperationFacade;
use crate::core::pipeline::slot::OperationRequest;
use crate::core::pipeline::traits::ClockedDut;
use crate::core::units::fpu::rounding_modes::RoundingMode;
use crate::core::units::fpu::softfloat;
use crate::coverage::CoverageContext;
use crate::stats::HarnessStats;

const ADDER_OPS: &[Opcode] = &[
    Opcode::Add,
    Opcode::Sub,
    Opcode::Min,
    Opcode::Max,
    Opcode::SgnJ,
    Opcode::SgnJN,
    Opcode::SgnJX,
    Opcode::Eq,
    Opcode::Lt,
    Opcode::Le,
    Opcode::Merge,
    Opcode::Move,
];

const FMA_OPS: &[Opcode] = &[
    Opcode::Mul,
    Opcode::MAdd,
    Opcode::MSub,
    Opcode::NMAdd,
    Opcode::NMSub,
];

/// Sweep parameters.
#[derive(Clone, Copy, Debug)]
pub struct SweepConfig {
    pub iterations: u64,
    /// Flush after every `flush_interval` operations; zero disables.
    pub flush_interval: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            flush_interval: 0,
        }
    }
}

/// Random divide request over a random width and signedness.
pub fn random_divide_request<R: Rng>(rng: &mut R) -> Result<OperationRequest> {
    let width = *ElementWidth::ALL.choose(rng).unwrap_or(&ElementWidth::E32);
    let signedness = if rng.gen_bool(0.5) {
        Signedness::Signed
    } else {
        Signedness::Unsigned
    };
    let (lo, hi) = match signedness {
        Signedness::Unsigned => (0, width.max_unsigned()),
        Signedness::Signed => (width.min_signed(), width.max_signed()),
    };

    let mut dividends = Vec::with_capacity(width.lane_count());
    let mut divisors = Vec::with_capacity(width.lane_count());
    for _ in 0..width.lane_count() {
        let roll = rng.gen_range(0..16);
        let (n, d) = match roll {
            0 | 1 => (rng.gen_range(lo..=hi), 0),
            2 if signedness.is_signed() => (width.min_signed(), -1),
            3 => {
                // Small divisors exercise large quotients.
                let d = rng.gen_range(1..=3);
                (rng.gen_range(lo..=hi), d)
            }
            _ => (rng.gen_range(lo..=hi), rng.gen_range(lo..=hi)),
        };
        dividends.push(n);
        divisors.push(d);
    }

    let a = VectorValue::from_lanes(&dividends, width, signedness)?;
    let b = VectorValue::from_lanes(&divisors, width, signedness)?;
    Ok(OperationRequest::divide(a, b))
}

/// Random or special encoding in `fmt`.
pub fn random_fp_operand<R: Rng>(rng: &mut R, fmt: FpFormat) -> u64 {
    let one = (fmt.bias() as u64) << fmt.fraction_bits();
    let specials = [
        softfloat::zero(false, fmt),
        softfloat::zero(true, fmt),
        softfloat::infinity(false, fmt),
        softfloat::infinity(true, fmt),
        softfloat::canonical_nan(fmt),
        softfloat::infinity(false, fmt) | 1,
        softfloat::max_finite(false, fmt),
        softfloat::max_finite(true, fmt),
        1,
        one,
        one | softfloat::sign_mask(fmt),
    ];
    if rng.gen_ratio(1, 4) {
        *specials.choose(rng).unwrap_or(&one)
    } else {
        rng.gen::<u64>() & softfloat::format_mask(fmt)
    }
}

/// Random FP request for `unit`.
pub fn random_fp_request<R: Rng>(rng: &mut R, unit: Unit) -> Result<OperationRequest> {
    let ops = match unit {
        Unit::FpFma => FMA_OPS,
        _ => ADDER_OPS,
    };
    let op = *ops.choose(rng).unwrap_or(&Opcode::Add);
    let fmt = *FpFormat::ALL.choose(rng).unwrap_or(&FpFormat::F32);
    let rm = *RoundingMode::ALL.choose(rng).unwrap_or(&RoundingMode::Rne);
    let width = fmt.width();

    let operand = |rng: &mut R| -> Result<VectorValue> {
        let lanes: Vec<i128> = (0..width.lane_count())
            .map(|_| random_fp_operand(rng, fmt) as i128)
            .collect();
        VectorValue::from_lanes(&lanes, width, Signedness::Unsigned)
    };
    let a = operand(rng)?;
    let b = operand(rng)?;
    let c = if op.is_fused() { Some(operand(rng)?) } else { None };

    Ok(OperationRequest::floating(op, a, b, c, rm).with_mask(rng.gen()))
}

/// Runs `sweep.iterations` random requests for the facade's unit.
///
/// Failures are counted, not returned; a failure that leaves the harness
/// blocked is followed by a reset.
pub fn run<D: ClockedDut, R: Rng>(
    facade: &mut OperationFacade<D>,
    sweep: &SweepConfig,
    rng: &mut R,
    stats: &mut HarnessStats,
    coverage: &mut CoverageContext,
) {
    let unit = facade.driver().unit();
    let start_cycle = facade.driver().cycle();
    info!(unit = ?unit, iterations = sweep.iterations, "sweep started");

    for i in 0..sweep.iterations {
        let request = match unit {
            Unit::Divider => random_divide_request(rng),
            Unit::FpAdder | Unit::FpFma => random_fp_request(rng, unit),
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                stats.record_error(&e);
                continue;
            }
        };

        stats.operations += 1;
        match unit {
            Unit::Divider => stats.op_divide += 1,
            Unit::FpAdder => stats.op_fp_add += 1,
            Unit::FpFma => stats.op_fp_fma += 1,
        }

        match facade.compute(request, coverage) {
            Ok(_) => stats.passed += 1,
            Err(e) => {
                error!(unit = ?unit, iteration = i, error = %e, "operation failed");
                stats.record_error(&e);
                if facade.needs_reset() {
                    facade.reset(coverage);
                    stats.resets += 1;
                }
            }
        }

        if sweep.flush_interval != 0 && (i + 1) % sweep.flush_interval == 0 {
            facade.flush(coverage);
            stats.flushes += 1;
        }
    }

    stats.cycles += facade.driver().cycle() - start_cycle;
    info!(unit = ?unit, passed = stats.passed, "sweep finished");
}
