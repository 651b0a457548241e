//! Requests, in-flight slots and results.

use crate::common::error::{HarnessError, Result};
use crate::common::types::{ElementWidth, FpFormat, Opcode, Signedness, Unit};
use crate::core::codec::VectorValue;
use crate::core::units::fpu::exception_flags::FpFlags;
use crate::core::units::fpu::rounding_modes::RoundingMode;

/// One operation as built by a test case.
///
/// The request is moved into a [`PipelineSlot`] when submitted and is never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationRequest {
    pub opcode: Opcode,
    pub operand_a: VectorValue,
    pub operand_b: VectorValue,
    pub operand_c: Option<VectorValue>,
    pub width: ElementWidth,
    pub signedness: Signedness,
    pub rounding_mode: Option<RoundingMode>,
    /// Per-lane merge mask; bit `i` selects operand B in lane `i`.
    pub mask: u16,
}

impl OperationRequest {
    /// Divide request over two operand vectors.
    pub fn divide(dividend: VectorValue, divisor: VectorValue) -> Self {
        Self {
            opcode: Opcode::Div,
            width: dividend.width(),
            signedness: dividend.signedness(),
            operand_a: dividend,
            operand_b: divisor,
            operand_c: None,
            rounding_mode: None,
            mask: u16::MAX,
        }
    }

    /// FP request. Operand C is only read by the fused ops.
    pub fn floating(
        opcode: Opcode,
        a: VectorValue,
        b: VectorValue,
        c: Option<VectorValue>,
        rounding_mode: RoundingMode,
    ) -> Self {
        Self {
            opcode,
            width: a.width(),
            signedness: Signedness::Unsigned,
            operand_a: a,
            operand_b: b,
            operand_c: c,
            rounding_mode: Some(rounding_mode),
            mask: u16::MAX,
        }
    }

    /// Sets the per-lane merge mask.
    pub fn with_mask(mut self, mask: u16) -> Self {
        self.mask = mask;
        self
    }

    /// FP format implied by the lane width.
    pub fn format(&self) -> Result<FpFormat> {
        FpFormat::from_width(self.width)
    }

    /// Checks that the request is self-consistent and targets `unit`.
    ///
    /// Run before any pin is driven.
    pub fn validate_for(&self, unit: Unit) -> Result<()> {
        if self.opcode.unit() != unit {
            return Err(HarnessError::Configuration(format!(
                "{:?} is not executed by the {:?} unit",
                self.opcode, unit
            )));
        }
        let operands = [Some(&self.operand_a), Some(&self.operand_b), self.operand_c.as_ref()];
        for operand in operands.into_iter().flatten() {
            if operand.width() != self.width {
                return Err(HarnessError::Configuration(format!(
                    "operand width {} does not match request width {}",
                    operand.width(),
                    self.width
                )));
            }
        }
        if unit == Unit::Divider {
            if self.operand_a.signedness() != self.signedness
                || self.operand_b.signedness() != self.signedness
            {
                return Err(HarnessError::Configuration(
                    "operand signedness does not match request".to_string(),
                ));
            }
            return Ok(());
        }
        self.format()?;
        if self.opcode.is_fused() && self.operand_c.is_none() {
            return Err(HarnessError::Configuration(format!(
                "{:?} requires operand C",
                self.opcode
            )));
        }
        Ok(())
    }
}

/// An accepted, not yet retired request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSlot {
    pub id: u64,
    pub request: OperationRequest,
    /// Cycle on which the input handshake completed.
    pub issue_cycle: u64,
}

/// Decoded outputs of one retired request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationResult {
    /// Quotient lanes, or FP result lanes as raw encodings.
    pub primary: Vec<i128>,
    /// Remainder lanes; empty for FP units.
    pub secondary: Vec<i128>,
    /// Divide-by-zero lane mask, or the 5-bit exception flags.
    pub flags: u64,
    /// Cycle the result handshake completed.
    pub complete_cycle: u64,
}

impl OperationResult {
    /// Flags as an FP exception set.
    pub fn fp_flags(&self) -> FpFlags {
        FpFlags::from_bits(self.flags as u8)
    }

    /// Result lanes as raw FP encodings.
    pub fn fp_lanes(&self) -> Vec<u64> {
        self.primary.iter().map(|&v| v as u64).collect()
    }
}

/// Per-operation protocol state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverState {
    #[default]
    Idle,
    /// Input valid asserted, waiting for ready.
    InputWait,
    /// Request accepted by the DUT.
    Issued,
    /// Output ready asserted, waiting for valid.
    OutputWait,
    Complete,
    TimedOut,
}
