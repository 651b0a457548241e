//! Status inspection.
//!
//! A [`StatusSnapshot`] is a plain copy of the signals the harness cares
//! about. Taking one never drives a pin and never advances the clock.

use serde::Serialize;

use crate::common::types::{ElementWidth, Signedness};
use crate::core::pipeline::traits::UnitPins;

/// Read-only copy of the DUT's interesting signals at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub input_ready: bool,
    pub output_valid: bool,
    pub element_width: ElementWidth,
    pub signedness: Signedness,
    /// Zero-divisor lane mask, or FP exception flags.
    pub flag_mask: u64,
    pub flush_active: bool,
    pub reset_active: bool,
    /// Slots accepted by the DUT and not yet retired.
    pub pending: usize,
    pub cycle: u64,
}

impl StatusSnapshot {
    /// Copies the status signals out of `pins`.
    pub fn capture<P: UnitPins>(pins: &P, pending: usize, cycle: u64) -> Self {
        let control = pins.control();
        let lines = pins.handshake();
        Self {
            input_ready: lines.in_ready,
            output_valid: lines.out_valid,
            element_width: control.element_width(),
            signedness: control.signedness(),
            flag_mask: pins.flag_lines(),
            flush_active: control.flush,
            reset_active: control.reset,
            pending,
            cycle,
        }
    }
}

/// Side-effect-free view of a harness component's current state.
pub trait StatusInspector {
    fn status(&self) -> StatusSnapshot;
}
