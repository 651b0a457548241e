//! Reference models for the units under test.
//!
//! These compute the expected lanes and flags of an operation without any
//! hardware involved.

/// Integer divider reference.
pub mod divider;

/// IEEE-754 adder / FMA reference.
pub mod fpu;
