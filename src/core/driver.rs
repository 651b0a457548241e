//! Handshake Driver.
//!
//! Issues requests into a clocked DUT and retrieves their results. Every
//! operation walks the states
//!
//! ```text
//! Idle -> InputWait -> Issued -> OutputWait -> Complete
//!              \                     \
//!               +-> TimedOut          +-> TimedOut
//! ```
//!
//! Waiting always means stepping the clock inside a bounded loop, so no
//! call can hang. Pins written by the driver take effect at the next step;
//! reads see the outputs registered by the last step.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::common::error::{HandshakeSide, HarnessError, Result};
use crate::common::types::{Signedness, Unit};
use crate::config::HandshakeConfig;
use crate::core::codec;
use crate::core::inspect::{StatusInspector, StatusSnapshot};
use crate::core::pipeline::signals::RawOutput;
use crate::core::pipeline::slot::{DriverState, OperationRequest, OperationResult, PipelineSlot};
use crate::core::pipeline::traits::{ClockedDut, UnitPins};
use crate::coverage::{CoverageContext, WatchPoint, STANDARD_WATCH_POINTS};

/// Bookkeeping for a slot the DUT has accepted.
#[derive(Clone, Copy, Debug)]
struct Pending {
    id: u64,
    issue_cycle: u64,
}

/// Clocked protocol driver for one unit.
pub struct HandshakeDriver<D: ClockedDut> {
    dut: D,
    unit: Unit,
    input_timeout: u32,
    output_timeout: u32,
    reset_cycles: u32,
    /// Set for units that present results a fixed number of cycles after
    /// issue instead of raising output valid.
    fixed_latency: Option<u64>,
    watch_points: Vec<WatchPoint>,
    pending: VecDeque<Pending>,
    next_id: u64,
    cycle: u64,
    state: DriverState,
    trace: bool,
}

impl<D: ClockedDut> HandshakeDriver<D> {
    /// Binds a driver to `dut`. The standard watch-points are installed.
    pub fn new(dut: D, unit: Unit, config: &HandshakeConfig) -> Self {
        Self {
            dut,
            unit,
            input_timeout: config.input_timeout,
            output_timeout: config.output_timeout,
            reset_cycles: config.reset_cycles,
            fixed_latency: None,
            watch_points: STANDARD_WATCH_POINTS.to_vec(),
            pending: VecDeque::new(),
            next_id: 0,
            cycle: 0,
            state: DriverState::Idle,
            trace: cfg!(feature = "always-trace"),
        }
    }

    /// Samples results `latency` cycles after issue instead of waiting for
    /// output valid.
    pub fn with_fixed_latency(mut self, latency: u64) -> Self {
        self.fixed_latency = Some(latency);
        self
    }

    /// Enables per-step trace events.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace || cfg!(feature = "always-trace");
        self
    }

    /// Unit this driver talks to.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Protocol state after the last call.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Clock steps taken since the driver was created.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Issued slots whose result has not been retrieved.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The driven DUT.
    pub fn dut(&self) -> &D {
        &self.dut
    }

    /// Mutable access to the driven DUT.
    pub fn dut_mut(&mut self) -> &mut D {
        &mut self.dut
    }

    /// Advances the clock one step and samples the watch-points.
    pub fn step(&mut self, coverage: &mut CoverageContext) {
        self.dut.tick();
        self.cycle += 1;

        let status = self.status();
        for wp in &self.watch_points {
            wp.sample(&status, coverage);
        }
        if self.trace {
            trace!(
                cycle = self.cycle,
                in_ready = status.input_ready,
                out_valid = status.output_valid,
                pending = status.pending,
                "clock step"
            );
        }
    }

    /// Issues `request` into the DUT.
    ///
    /// The request is validated before any pin is driven. Input valid is
    /// held while the clock steps; the first step that sees input ready
    /// completes the transfer and input valid drops straight away.
    ///
    /// # Errors
    ///
    /// * `Configuration` if the request does not suit this unit (no pin touched).
    /// * `HandshakeTimeout` on the input side after `input_timeout` steps.
    pub fn submit(
        &mut self,
        request: OperationRequest,
        coverage: &mut CoverageContext,
    ) -> Result<PipelineSlot> {
        request.validate_for(self.unit)?;

        let pins = self.dut.pins_mut();
        pins.drive(&request)?;
        pins.set_input_valid(true);
        self.state = DriverState::InputWait;

        for _ in 0..self.input_timeout {
            let ready = self.dut.pins().handshake().in_ready;
            self.step(coverage);
            if ready {
                self.dut.pins_mut().set_input_valid(false);
                let slot = PipelineSlot {
                    id: self.next_id,
                    request,
                    issue_cycle: self.cycle,
                };
                self.next_id += 1;
                self.pending.push_back(Pending {
                    id: slot.id,
                    issue_cycle: slot.issue_cycle,
                });
                self.state = DriverState::Issued;
                debug!(
                    slot = slot.id,
                    opcode = ?slot.request.opcode,
                    cycle = self.cycle,
                    "request issued"
                );
                return Ok(slot);
            }
        }

        self.dut.pins_mut().set_input_valid(false);
        self.state = DriverState::TimedOut;
        warn!(steps = self.input_timeout, "input handshake timed out");
        Err(HarnessError::HandshakeTimeout {
            side: HandshakeSide::Input,
            steps: self.input_timeout,
        })
    }

    /// Retrieves the result of `slot`, which must be the oldest pending slot.
    ///
    /// # Errors
    ///
    /// * `SlotAbandoned` if the slot was flushed, reset away, already
    ///   retired, or is not next in issue order. A fixed-latency slot whose
    ///   result a later slot has already replaced is retired with this error.
    /// * `HandshakeTimeout` on the output side after `output_timeout` steps.
    pub fn await_result(
        &mut self,
        slot: &PipelineSlot,
        coverage: &mut CoverageContext,
    ) -> Result<OperationResult> {
        let head = match self.pending.front() {
            Some(head) if head.id == slot.id => *head,
            _ => return Err(HarnessError::SlotAbandoned(slot.id)),
        };
        if let Some(latency) = self.fixed_latency {
            // The result lines hold one value; a later slot may already own it.
            if let Some(&next) = self.pending.get(1) {
                if self.cycle >= next.issue_cycle + latency {
                    self.pending.pop_front();
                    warn!(
                        slot = slot.id,
                        overwritten_by = next.id,
                        "fixed-latency result overwritten before capture"
                    );
                    return Err(HarnessError::SlotAbandoned(slot.id));
                }
            }
        }
        self.state = DriverState::OutputWait;

        let raw = match self.fixed_latency {
            Some(latency) => self.wait_fixed_latency(head.issue_cycle + latency, coverage)?,
            None => self.wait_output_valid(coverage)?,
        };

        self.pending.pop_front();
        self.state = DriverState::Complete;
        debug!(slot = slot.id, cycle = self.cycle, "result captured");
        Ok(self.decode(&slot.request, raw))
    }

    fn wait_output_valid(&mut self, coverage: &mut CoverageContext) -> Result<RawOutput> {
        self.dut.pins_mut().set_output_ready(true);
        for _ in 0..self.output_timeout {
            let valid = self.dut.pins().handshake().out_valid;
            let raw = self.dut.pins().capture();
            self.step(coverage);
            if valid {
                self.dut.pins_mut().set_output_ready(false);
                return Ok(raw);
            }
        }
        self.dut.pins_mut().set_output_ready(false);
        Err(self.output_timeout_error())
    }

    fn wait_fixed_latency(
        &mut self,
        ready_cycle: u64,
        coverage: &mut CoverageContext,
    ) -> Result<RawOutput> {
        let mut steps = 0;
        while self.cycle < ready_cycle {
            if steps == self.output_timeout {
                return Err(self.output_timeout_error());
            }
            self.step(coverage);
            steps += 1;
        }
        Ok(self.dut.pins().capture())
    }

    fn output_timeout_error(&mut self) -> HarnessError {
        self.state = DriverState::TimedOut;
        warn!(steps = self.output_timeout, "output handshake timed out");
        HarnessError::HandshakeTimeout {
            side: HandshakeSide::Output,
            steps: self.output_timeout,
        }
    }

    fn decode(&self, request: &OperationRequest, raw: RawOutput) -> OperationResult {
        let (primary, secondary) = match self.unit {
            Unit::Divider => (
                codec::decode(raw.primary, request.width, request.signedness),
                codec::decode(raw.secondary, request.width, request.signedness),
            ),
            Unit::FpAdder | Unit::FpFma => (
                codec::decode(raw.primary, request.width, Signedness::Unsigned),
                Vec::new(),
            ),
        };
        OperationResult {
            primary,
            secondary,
            flags: raw.flags,
            complete_cycle: self.cycle,
        }
    }

    /// Pulses flush for one step. Every pending slot is abandoned; whatever
    /// the result lines show afterwards must not be attributed to them.
    pub fn flush(&mut self, coverage: &mut CoverageContext) {
        let pins = self.dut.pins_mut();
        pins.set_input_valid(false);
        pins.set_output_ready(false);
        pins.control_mut().flush = true;
        self.step(coverage);
        self.dut.pins_mut().control_mut().flush = false;

        if !self.pending.is_empty() {
            debug!(abandoned = self.pending.len(), "flush discarded pending slots");
        }
        self.pending.clear();
        self.state = DriverState::Idle;
    }

    /// Holds reset for `reset_cycles` steps, releases it and lets the DUT
    /// settle for as many steps again. All inputs return to their inactive
    /// values and every pending slot is dropped.
    pub fn reset(&mut self, coverage: &mut CoverageContext) {
        let pins = self.dut.pins_mut();
        pins.clear_inputs();
        pins.control_mut().reset = true;
        for _ in 0..self.reset_cycles {
            self.step(coverage);
        }
        self.dut.pins_mut().control_mut().reset = false;
        for _ in 0..self.reset_cycles {
            self.step(coverage);
        }

        self.pending.clear();
        self.state = DriverState::Idle;
        debug!(cycles = self.reset_cycles, cycle = self.cycle, "reset complete");
    }
}

impl<D: ClockedDut> StatusInspector for HandshakeDriver<D> {
    fn status(&self) -> StatusSnapshot {
        StatusSnapshot::capture(self.dut.pins(), self.pending.len(), self.cycle)
    }
}
