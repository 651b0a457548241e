//! Common types used throughout the harness.
//!
//! This module provides the lane configuration enums, opcode definitions and
//! the harness error type shared by the codec, reference model, driver and
//! checker.

/// Error types and the harness `Result` alias.
pub mod error;

/// Lane configuration, FP format and opcode definitions.
pub mod types;

pub use error::{HandshakeSide, HarnessError, Result};
pub use types::{ElementWidth, FpFormat, Opcode, Signedness, Unit, REGISTER_WIDTH};
