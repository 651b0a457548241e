//! Divider model.
//!
//! Per rising edge, in order:
//!
//! 1. reset high: the queue and every output are cleared, ready stays low;
//! 2. flush high: in-flight operations are dropped;
//! 3. an output transfer (registered `out_valid` with `out_ready`) retires
//!    the head entry;
//! 4. an input transfer (`in_valid` with the registered `in_ready`)
//!    computes the result and enqueues it for `latency` cycles;
//! 5. `in_ready` and the result lines are registered for the next edge.

use tracing::{trace, warn};

use crate::common::types::{ElementWidth, Signedness};
use crate::config::DividerConfig;
use crate::core::codec::{self, RegisterBits};
use crate::core::pipeline::queue::{BackpressurePolicy, PipelineQueue};
use crate::core::pipeline::signals::{DividerPins, RawOutput};
use crate::core::pipeline::traits::ClockedDut;
use crate::core::units::divider::Divider;
use crate::sim::FaultHook;

/// Cycle-level model of the vector integer divider.
pub struct DividerModel {
    pins: DividerPins,
    queue: PipelineQueue<RawOutput>,
    policy: BackpressurePolicy,
    fault: Option<FaultHook>,
    cycle: u64,
}

impl DividerModel {
    /// Creates an idle divider with the configured timing.
    pub fn new(config: &DividerConfig) -> Self {
        let mut model = Self {
            pins: DividerPins::default(),
            queue: PipelineQueue::new(config.capacity, config.latency),
            policy: config.backpressure,
            fault: None,
            cycle: 0,
        };
        model.register_outputs();
        model
    }

    /// Installs a hook applied to every computed result.
    pub fn with_fault(mut self, fault: FaultHook) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Replaces the stall policy; input ready is recomputed at once.
    pub fn set_backpressure(&mut self, policy: BackpressurePolicy) {
        self.policy = policy;
        self.register_outputs();
    }

    /// Operations accepted and not yet retired.
    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    /// Clock edges seen so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    fn compute(&self) -> RawOutput {
        let width: ElementWidth = self.pins.control.element_width();
        let signedness: Signedness = self.pins.control.signedness();
        let dividends = codec::decode(RegisterBits(self.pins.dividend_vector), width, signedness);
        let divisors = codec::decode(RegisterBits(self.pins.divisor_vector), width, signedness);
        let result = Divider::divide_lanes(&dividends, &divisors, width, signedness);

        let raw = RawOutput {
            primary: codec::pack_wrapping(&result.quotients, width),
            secondary: codec::pack_wrapping(&result.remainders, width),
            flags: result.zero_mask,
        };
        match self.fault {
            Some(fault) => fault(raw),
            None => raw,
        }
    }

    fn register_outputs(&mut self) {
        if self.pins.control.reset {
            self.pins.div_in_ready = false;
            self.pins.div_out_valid = false;
            return;
        }
        self.pins.div_in_ready = !self.queue.is_full() && !self.policy.stalls(self.cycle + 1);

        match self.queue.peek_ready(self.cycle) {
            Some(raw) => {
                self.pins.div_out_valid = true;
                self.pins.quotient_vector = raw.primary.val();
                self.pins.remainder_vector = raw.secondary.val();
                self.pins.divide_by_zero_mask = raw.flags as u16;
            }
            None => self.pins.div_out_valid = false,
        }
    }

    fn clear_outputs(&mut self) {
        self.pins.div_out_valid = false;
        self.pins.quotient_vector = 0;
        self.pins.remainder_vector = 0;
        self.pins.divide_by_zero_mask = 0;
    }
}

impl ClockedDut for DividerModel {
    type Pins = DividerPins;

    fn pins(&self) -> &DividerPins {
        &self.pins
    }

    fn pins_mut(&mut self) -> &mut DividerPins {
        &mut self.pins
    }

    fn tick(&mut self) {
        self.cycle += 1;
        self.pins.control.clock = !self.pins.control.clock;

        if self.pins.control.reset {
            self.queue.clear();
            self.clear_outputs();
            self.register_outputs();
            return;
        }
        if self.pins.control.flush {
            if !self.queue.is_empty() {
                trace!(dropped = self.queue.len(), "divider flush");
            }
            self.queue.clear();
            self.clear_outputs();
        }

        if self.pins.div_out_valid && self.pins.div_out_ready {
            self.queue.pop_ready(self.cycle);
        }

        if self.pins.div_in_valid && self.pins.div_in_ready && !self.pins.control.flush {
            let raw = self.compute();
            if self.queue.push(raw, self.cycle).is_err() {
                warn!(cycle = self.cycle, "divider accepted an operation with a full queue");
            }
        }

        self.register_outputs();
    }
}
