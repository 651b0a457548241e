//! Interfaces between the harness and a clocked DUT.
//!
//! A DUT exposes a pin bundle and a clock. The driver only ever writes
//! inputs and reads registered outputs through [`UnitPins`], and only
//! progresses time through [`ClockedDut::tick`].

use crate::common::error::Result;
use crate::core::pipeline::signals::{ControlPins, RawOutput};
use crate::core::pipeline::slot::OperationRequest;

/// Snapshot of the four handshake wires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandshakeLines {
    pub in_valid: bool,
    pub in_ready: bool,
    pub out_ready: bool,
    pub out_valid: bool,
}

/// Pin bundle of one unit.
pub trait UnitPins {
    fn control(&self) -> &ControlPins;

    fn control_mut(&mut self) -> &mut ControlPins;

    /// Drives the request's configuration and data lines.
    ///
    /// # Errors
    ///
    /// `Configuration` if the request cannot be expressed on these pins.
    fn drive(&mut self, request: &OperationRequest) -> Result<()>;

    /// Reads the registered result lines.
    fn capture(&self) -> RawOutput;

    fn handshake(&self) -> HandshakeLines;

    fn set_input_valid(&mut self, valid: bool);

    fn set_output_ready(&mut self, ready: bool);

    /// Current per-lane flag lines (zero-divisor mask or FP flags).
    fn flag_lines(&self) -> u64;

    /// Returns every input, control lines included, to its inactive value.
    fn clear_inputs(&mut self);
}

/// A clocked device under test.
pub trait ClockedDut {
    type Pins: UnitPins;

    fn pins(&self) -> &Self::Pins;

    fn pins_mut(&mut self) -> &mut Self::Pins;

    /// Advances one full clock cycle. Inputs are sampled at the rising edge
    /// and outputs are updated before this returns.
    fn tick(&mut self);
}
