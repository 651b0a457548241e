//! Pin-level signal bundles of the units under test.
//!
//! Each DUT is bound once to a struct whose fields are its named signals.
//! Inputs are written by the driver and sampled by the DUT at the next
//! clock edge; outputs are registered by the DUT at that edge and stay
//! stable until the following one.

use crate::common::error::Result;
use crate::common::types::{ElementWidth, FpFormat, Signedness};
use crate::core::codec::RegisterBits;
use crate::core::pipeline::slot::OperationRequest;
use crate::core::pipeline::traits::{HandshakeLines, UnitPins};
use crate::core::units::fpu::rounding_modes::RoundingMode;

/// Control inputs shared by every unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlPins {
    pub clock: bool,
    pub reset: bool,
    /// 2-bit lane width select (00=8, 01=16, 10=32, 11=64).
    pub element_width_select: u8,
    pub signed_select: bool,
    pub flush: bool,
}

impl ControlPins {
    /// Width currently selected on the control lines.
    pub fn element_width(&self) -> ElementWidth {
        ElementWidth::from_select(self.element_width_select)
    }

    /// Signedness currently selected on the control lines.
    pub fn signedness(&self) -> Signedness {
        Signedness::from_select(self.signed_select)
    }

    /// Drives the width and signedness selects.
    pub fn configure(&mut self, width: ElementWidth, signedness: Signedness) {
        self.element_width_select = width.select();
        self.signed_select = signedness.select();
    }

    /// Drops every control input to its inactive value. The clock is left alone.
    pub fn clear(&mut self) {
        let clock = self.clock;
        *self = ControlPins {
            clock,
            ..ControlPins::default()
        };
    }
}

/// Raw registered outputs captured by the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Quotient vector or FP result vector.
    pub primary: RegisterBits,
    /// Remainder vector; zero for FP units.
    pub secondary: RegisterBits,
    /// Divide-by-zero lane mask or 5-bit exception flags.
    pub flags: u64,
}

/// Signal bundle of the vector integer divider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DividerPins {
    pub control: ControlPins,

    pub dividend_vector: u128,
    pub divisor_vector: u128,
    pub div_in_valid: bool,
    /// Output: divider can accept an operation this cycle.
    pub div_in_ready: bool,
    pub div_out_ready: bool,
    /// Output: quotient and remainder lines hold a result.
    pub div_out_valid: bool,

    pub quotient_vector: u128,
    pub remainder_vector: u128,
    /// Output: one bit per lane whose divisor was zero.
    pub divide_by_zero_mask: u16,
}

impl UnitPins for DividerPins {
    fn control(&self) -> &ControlPins {
        &self.control
    }

    fn control_mut(&mut self) -> &mut ControlPins {
        &mut self.control
    }

    fn drive(&mut self, request: &OperationRequest) -> Result<()> {
        self.control.configure(request.width, request.signedness);
        self.dividend_vector = request.operand_a.bits().val();
        self.divisor_vector = request.operand_b.bits().val();
        Ok(())
    }

    fn capture(&self) -> RawOutput {
        RawOutput {
            primary: RegisterBits(self.quotient_vector),
            secondary: RegisterBits(self.remainder_vector),
            flags: self.divide_by_zero_mask as u64,
        }
    }

    fn handshake(&self) -> HandshakeLines {
        HandshakeLines {
            in_valid: self.div_in_valid,
            in_ready: self.div_in_ready,
            out_ready: self.div_out_ready,
            out_valid: self.div_out_valid,
        }
    }

    fn set_input_valid(&mut self, valid: bool) {
        self.div_in_valid = valid;
    }

    fn set_output_ready(&mut self, ready: bool) {
        self.div_out_ready = ready;
    }

    fn flag_lines(&self) -> u64 {
        self.divide_by_zero_mask as u64
    }

    fn clear_inputs(&mut self) {
        self.control.clear();
        self.dividend_vector = 0;
        self.divisor_vector = 0;
        self.div_in_valid = false;
        self.div_out_ready = false;
    }
}

/// Signal bundle of the vector FP adder and FMA unit.
///
/// The unit has no handshake: an operation is issued by pulsing `fire` and
/// the result lines are valid a fixed number of cycles later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FpPins {
    pub control: ControlPins,

    pub fp_a: u128,
    pub fp_b: u128,
    /// Addend; only read by the FMA unit.
    pub fp_c: u128,
    /// 5-bit operation encoding.
    pub opcode: u8,
    /// 2-bit format select (01=f16, 10=f32, 11=f64).
    pub format_select: u8,
    /// 3-bit rounding mode.
    pub rounding_mode: u8,
    pub fire: bool,
    pub mask_vector: u16,
    pub is_vector_mode: bool,

    pub fp_result: u128,
    /// Output: 5-bit accrued exception flags.
    pub exception_flags: u8,
}

impl Default for FpPins {
    fn default() -> Self {
        Self {
            control: ControlPins::default(),
            fp_a: 0,
            fp_b: 0,
            fp_c: 0,
            opcode: 0,
            format_select: FpFormat::F32.select(),
            rounding_mode: RoundingMode::Rne.encoding(),
            fire: false,
            mask_vector: u16::MAX,
            is_vector_mode: true,
            fp_result: 0,
            exception_flags: 0,
        }
    }
}

impl UnitPins for FpPins {
    fn control(&self) -> &ControlPins {
        &self.control
    }

    fn control_mut(&mut self) -> &mut ControlPins {
        &mut self.control
    }

    fn drive(&mut self, request: &OperationRequest) -> Result<()> {
        let format = FpFormat::from_width(request.width)?;
        self.control.configure(request.width, Signedness::Unsigned);
        self.fp_a = request.operand_a.bits().val();
        self.fp_b = request.operand_b.bits().val();
        self.fp_c = request.operand_c.map(|c| c.bits().val()).unwrap_or(0);
        self.opcode = request.opcode.encoding().unwrap_or(0);
        self.format_select = format.select();
        self.rounding_mode = request.rounding_mode.unwrap_or_default().encoding();
        self.mask_vector = request.mask;
        self.is_vector_mode = true;
        Ok(())
    }

    fn capture(&self) -> RawOutput {
        RawOutput {
            primary: RegisterBits(self.fp_result),
            secondary: RegisterBits::ZERO,
            flags: self.exception_flags as u64,
        }
    }

    /// `fire` stands in for input valid; the unit accepts every cycle and
    /// has no output handshake.
    fn handshake(&self) -> HandshakeLines {
        HandshakeLines {
            in_valid: self.fire,
            in_ready: true,
            out_ready: false,
            out_valid: false,
        }
    }

    fn set_input_valid(&mut self, valid: bool) {
        self.fire = valid;
    }

    fn set_output_ready(&mut self, _ready: bool) {}

    fn flag_lines(&self) -> u64 {
        self.exception_flags as u64
    }

    fn clear_inputs(&mut self) {
        let result = (self.fp_result, self.exception_flags);
        *self = FpPins {
            control: ControlPins {
                clock: self.control.clock,
                ..ControlPins::default()
            },
            fp_result: result.0,
            exception_flags: result.1,
            ..FpPins::default()
        };
    }
}
