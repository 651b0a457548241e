//! Harness Error Types.
//!
//! Every fallible harness operation returns [`HarnessError`]. The variants
//! split into two groups:
//!
//! * **Pre-drive errors** (`Configuration`, `InvalidWidth`, `OperandRange`)
//!   are detected before any pin is touched and leave the harness untouched.
//! * **Post-drive errors** (`HandshakeTimeout`, `InvariantViolation`) are
//!   raised after the clock has advanced. The harness must be reset before it
//!   is reused.

use std::fmt;

use thiserror::Error;

use crate::common::types::Opcode;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Side of the pipeline a bounded wait was spinning on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeSide {
    /// Waiting for input ready while input valid was held high.
    Input,
    /// Waiting for output valid while output ready was held high.
    Output,
}

impl fmt::Display for HandshakeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeSide::Input => write!(f, "input"),
            HandshakeSide::Output => write!(f, "output"),
        }
    }
}

/// Errors raised by the harness.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// Invalid configuration value (rounding mode, format, opcode/unit mismatch, config file).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Element width outside {8, 16, 32, 64}.
    #[error("invalid element width: {0} bits")]
    InvalidWidth(u32),

    /// Operand does not fit the declared width and signedness.
    #[error("operand out of range in lane {lane}: {value} does not fit {width} bits ({signedness})")]
    OperandRange {
        lane: usize,
        value: i128,
        width: u32,
        signedness: &'static str,
    },

    /// Bounded wait exceeded on one side of the handshake.
    #[error("handshake timeout on {side} side after {steps} steps")]
    HandshakeTimeout { side: HandshakeSide, steps: u32 },

    /// DUT output disagrees with the reference model.
    #[error("invariant violated for {opcode:?} ({property}) in lane {lane}: expected {expected:#x}, got {actual:#x}")]
    InvariantViolation {
        opcode: Opcode,
        property: &'static str,
        lane: usize,
        expected: i128,
        actual: i128,
    },

    /// Slot was discarded by a flush or reset, or is not at the head of the queue.
    #[error("pipeline slot {0} is no longer pending")]
    SlotAbandoned(u64),

    /// A previous timeout or violation left the harness in an unknown state.
    #[error("harness must be reset before reuse")]
    ResetRequired,

    /// Failure reading or parsing a configuration file.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(String),
}

impl HarnessError {
    /// Returns `true` if the error was raised after the clock advanced,
    /// which means the harness needs a `reset()` before it is reused.
    pub fn requires_reset(&self) -> bool {
        matches!(
            self,
            HarnessError::HandshakeTimeout { .. } | HarnessError::InvariantViolation { .. }
        )
    }
}
