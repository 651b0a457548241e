//! FP adder / FMA model.
//!
//! An operation is captured on every edge that sees `fire` high. Its result
//! and accrued flags appear on `fp_result` and `exception_flags` after the
//! edge `latency` cycles later and hold until the next result replaces them.
//! Undecodable opcode or format selects produce a zero result with the
//! invalid flag raised.

use tracing::{trace, warn};

use crate::common::error::Result;
use crate::common::types::{FpFormat, Opcode, Signedness, Unit};
use crate::config::FpuConfig;
use crate::core::codec::{self, RegisterBits};
use crate::core::pipeline::queue::PipelineQueue;
use crate::core::pipeline::signals::{FpPins, RawOutput};
use crate::core::pipeline::traits::ClockedDut;
use crate::core::units::fpu::exception_flags::FpFlags;
use crate::core::units::fpu::rounding_modes::RoundingMode;
use crate::core::units::fpu::Fpu;
use crate::sim::FaultHook;

/// Cycle-level model of the FP adder or the FMA unit.
pub struct FpUnitModel {
    unit: Unit,
    pins: FpPins,
    queue: PipelineQueue<RawOutput>,
    fault: Option<FaultHook>,
    cycle: u64,
}

impl FpUnitModel {
    /// Creates the model for `unit`, which must be `FpAdder` or `FpFma`.
    pub fn new(unit: Unit, config: &FpuConfig) -> Self {
        // One fire per cycle keeps at most `latency + 1` entries in flight.
        let capacity = config.latency as usize + 1;
        Self {
            unit,
            pins: FpPins::default(),
            queue: PipelineQueue::new(capacity, config.latency),
            fault: None,
            cycle: 0,
        }
    }

    /// Installs a hook that rewrites every computed result.
    pub fn with_fault(mut self, fault: FaultHook) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Unit this model stands in for.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Cycles from fire to result.
    pub fn latency(&self) -> u64 {
        self.queue.latency()
    }

    /// Clock edges seen so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    fn decode_and_evaluate(&self) -> Result<RawOutput> {
        let op = Opcode::from_encoding(self.pins.opcode)?;
        let fmt = FpFormat::from_select(self.pins.format_select)?;
        let rm = RoundingMode::from_encoding(self.pins.rounding_mode)?;
        let width = fmt.width();

        let lanes = |bits: u128| -> Vec<u64> {
            codec::decode(RegisterBits(bits), width, Signedness::Unsigned)
                .into_iter()
                .map(|v| v as u64)
                .collect()
        };
        let mut a = lanes(self.pins.fp_a);
        let mut b = lanes(self.pins.fp_b);
        let mut c = lanes(self.pins.fp_c);
        if !self.pins.is_vector_mode {
            a.truncate(1);
            b.truncate(1);
            c.truncate(1);
        }

        let (result, flags) = Fpu::evaluate_lanes(
            op,
            &a,
            &b,
            Some(c.as_slice()),
            self.pins.mask_vector as u64,
            fmt,
            rm,
        )?;
        let result: Vec<i128> = result.into_iter().map(|v| v as i128).collect();
        Ok(RawOutput {
            primary: codec::pack_wrapping(&result, width),
            secondary: RegisterBits::ZERO,
            flags: flags.bits() as u64,
        })
    }

    fn capture_operation(&self) -> RawOutput {
        let raw = match self.decode_and_evaluate() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(unit = ?self.unit, error = %e, "undecodable FP operation");
                RawOutput {
                    flags: FpFlags::NV.bits() as u64,
                    ..RawOutput::default()
                }
            }
        };
        match self.fault {
            Some(fault) => fault(raw),
            None => raw,
        }
    }
}

impl ClockedDut for FpUnitModel {
    type Pins = FpPins;

    fn pins(&self) -> &FpPins {
        &self.pins
    }

    fn pins_mut(&mut self) -> &mut FpPins {
        &mut self.pins
    }

    fn tick(&mut self) {
        self.cycle += 1;
        self.pins.control.clock = !self.pins.control.clock;

        if self.pins.control.reset {
            self.queue.clear();
            self.pins.fp_result = 0;
            self.pins.exception_flags = 0;
            return;
        }
        if self.pins.control.flush {
            if !self.queue.is_empty() {
                trace!(unit = ?self.unit, dropped = self.queue.len(), "fp flush");
            }
            self.queue.clear();
            return;
        }

        if self.pins.fire {
            let raw = self.capture_operation();
            if self.queue.push(raw, self.cycle).is_err() {
                warn!(unit = ?self.unit, cycle = self.cycle, "fp operation dropped, pipeline full");
            }
        }

        while let Some(raw) = self.queue.pop_ready(self.cycle) {
            self.pins.fp_result = raw.primary.val();
            self.pins.exception_flags = raw.flags as u8;
        }
    }
}
