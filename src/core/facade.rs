//! Operation Facade.
//!
//! The call test bodies use. A facade owns one driver and one checker and
//! runs every request through submit, await and check in that order.
//! After a timeout or a violation the facade refuses further work until
//! [`OperationFacade::reset`] is called.

use tracing::{debug, warn};

use crate::common::error::{HarnessError, Result};
use crate::common::types::{ElementWidth, FpFormat, Opcode, Signedness, Unit};
use crate::config::HarnessConfig;
use crate::core::checker::InvariantChecker;
use crate::core::codec::VectorValue;
use crate::core::driver::HandshakeDriver;
use crate::core::inspect::{StatusInspector, StatusSnapshot};
use crate::core::pipeline::slot::{OperationRequest, OperationResult};
use crate::core::pipeline::traits::ClockedDut;
use crate::core::units::fpu::rounding_modes::RoundingMode;
use crate::coverage::CoverageContext;
use crate::sim::{DividerModel, FpUnitModel};

/// Driver plus checker for one unit.
pub struct OperationFacade<D: ClockedDut> {
    driver: HandshakeDriver<D>,
    checker: InvariantChecker,
    needs_reset: bool,
}

impl OperationFacade<DividerModel> {
    /// Facade over the behavioural divider described by `config`.
    pub fn divider(config: &HarnessConfig) -> Self {
        let dut = DividerModel::new(&config.divider);
        let driver = HandshakeDriver::new(dut, Unit::Divider, &config.handshake)
            .with_trace(config.general.trace);
        Self::new(driver, InvariantChecker::new())
    }
}

impl OperationFacade<FpUnitModel> {
    /// Facade over the behavioural FP adder (`Unit::FpAdder`) or FMA unit
    /// (`Unit::FpFma`).
    ///
    /// # Errors
    ///
    /// `Configuration` if `unit` is the divider.
    pub fn floating(unit: Unit, config: &HarnessConfig) -> Result<Self> {
        if unit == Unit::Divider {
            return Err(HarnessError::Configuration(
                "the divider is not an FP unit".to_string(),
            ));
        }
        let dut = FpUnitModel::new(unit, &config.fpu);
        let driver = HandshakeDriver::new(dut, unit, &config.handshake)
            .with_fixed_latency(config.fpu.latency)
            .with_trace(config.general.trace);
        Ok(Self::new(driver, InvariantChecker::new()))
    }
}

impl<D: ClockedDut> OperationFacade<D> {
    /// Wraps a driver and checker.
    pub fn new(driver: HandshakeDriver<D>, checker: InvariantChecker) -> Self {
        Self {
            driver,
            checker,
            needs_reset: false,
        }
    }

    /// Replaces the checker.
    pub fn with_checker(mut self, checker: InvariantChecker) -> Self {
        self.checker = checker;
        self
    }

    /// The underlying driver.
    pub fn driver(&self) -> &HandshakeDriver<D> {
        &self.driver
    }

    /// Mutable access to the underlying driver.
    pub fn driver_mut(&mut self) -> &mut HandshakeDriver<D> {
        &mut self.driver
    }

    /// Returns `true` while a previous failure blocks [`compute`](Self::compute).
    pub fn needs_reset(&self) -> bool {
        self.needs_reset
    }

    /// Runs one request to completion and checks it.
    ///
    /// # Errors
    ///
    /// * `ResetRequired` if an earlier call failed after the clock advanced.
    /// * `Configuration` if the request does not suit this unit (no pin touched).
    /// * `HandshakeTimeout` or `InvariantViolation`; both block further
    ///   calls until `reset()`.
    pub fn compute(
        &mut self,
        request: OperationRequest,
        coverage: &mut CoverageContext,
    ) -> Result<OperationResult> {
        if self.needs_reset {
            return Err(HarnessError::ResetRequired);
        }
        let outcome = self.run(request, coverage);
        if let Err(e) = &outcome {
            if e.requires_reset() {
                warn!(error = %e, "harness needs reset");
                self.needs_reset = true;
            }
        }
        outcome
    }

    fn run(
        &mut self,
        request: OperationRequest,
        coverage: &mut CoverageContext,
    ) -> Result<OperationResult> {
        let slot = self.driver.submit(request, coverage)?;
        let result = self.driver.await_result(&slot, coverage)?;
        self.checker.check(&slot.request, &result, coverage)?;
        coverage.mark(opcode_mark(slot.request.opcode));
        Ok(result)
    }

    /// Resets the DUT and clears the blocked state.
    pub fn reset(&mut self, coverage: &mut CoverageContext) {
        self.driver.reset(coverage);
        if self.needs_reset {
            debug!("harness recovered by reset");
        }
        self.needs_reset = false;
    }

    /// Abandons whatever the DUT holds without clearing the blocked state.
    pub fn flush(&mut self, coverage: &mut CoverageContext) {
        self.driver.flush(coverage);
    }

    /// Divides two lane lists of the given width and signedness.
    pub fn divide(
        &mut self,
        dividends: &[i128],
        divisors: &[i128],
        width: ElementWidth,
        signedness: Signedness,
        coverage: &mut CoverageContext,
    ) -> Result<OperationResult> {
        let a = VectorValue::from_lanes(dividends, width, signedness)?;
        let b = VectorValue::from_lanes(divisors, width, signedness)?;
        self.compute(OperationRequest::divide(a, b), coverage)
    }

    /// Runs a two-operand FP op over raw lane encodings.
    pub fn fp_binary(
        &mut self,
        op: Opcode,
        a: &[u64],
        b: &[u64],
        fmt: FpFormat,
        rm: RoundingMode,
        coverage: &mut CoverageContext,
    ) -> Result<OperationResult> {
        let a = fp_vector(a, fmt)?;
        let b = fp_vector(b, fmt)?;
        self.compute(OperationRequest::floating(op, a, b, None, rm), coverage)
    }

    /// Runs a fused multiply-add family op over raw lane encodings.
    #[allow(clippy::too_many_arguments)]
    pub fn fp_fused(
        &mut self,
        op: Opcode,
        a: &[u64],
        b: &[u64],
        c: &[u64],
        fmt: FpFormat,
        rm: RoundingMode,
        coverage: &mut CoverageContext,
    ) -> Result<OperationResult> {
        let a = fp_vector(a, fmt)?;
        let b = fp_vector(b, fmt)?;
        let c = fp_vector(c, fmt)?;
        self.compute(OperationRequest::floating(op, a, b, Some(c), rm), coverage)
    }
}

impl<D: ClockedDut> StatusInspector for OperationFacade<D> {
    fn status(&self) -> StatusSnapshot {
        self.driver.status()
    }
}

fn fp_vector(lanes: &[u64], fmt: FpFormat) -> Result<VectorValue> {
    let lanes: Vec<i128> = lanes.iter().map(|&v| v as i128).collect();
    VectorValue::from_lanes(&lanes, fmt.width(), Signedness::Unsigned)
}

fn opcode_mark(op: Opcode) -> &'static str {
    match op {
        Opcode::Div => "op.div",
        Opcode::Add => "op.add",
        Opcode::Sub => "op.sub",
        Opcode::Min => "op.min",
        Opcode::Max => "op.max",
        Opcode::SgnJ => "op.sgnj",
        Opcode::SgnJN => "op.sgnjn",
        Opcode::SgnJX => "op.sgnjx",
        Opcode::Eq => "op.eq",
        Opcode::Lt => "op.lt",
        Opcode::Le => "op.le",
        Opcode::Merge => "op.merge",
        Opcode::Move => "op.move",
        Opcode::Mul => "op.mul",
        Opcode::MAdd => "op.madd",
        Opcode::MSub => "op.msub",
        Opcode::NMAdd => "op.nmadd",
        Opcode::NMSub => "op.nmsub",
    }
}
