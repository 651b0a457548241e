//! Behavioural models of the units under test.
//!
//! Each model owns a pin bundle, implements [`ClockedDut`] and computes
//! its outputs with the reference units, so the harness can be exercised
//! end to end without an RTL simulator. Timing (latency, capacity and
//! backpressure) is configurable, and a fault hook can corrupt outputs to
//! prove that the checker notices.
//!
//! [`ClockedDut`]: crate::core::pipeline::traits::ClockedDut

/// Vector integer divider with a valid/ready handshake.
pub mod divider;

/// Vector FP adder and FMA unit with a fire pulse and fixed latency.
pub mod fpu;

/// Seeded random sweeps over a facade.
pub mod sweep;

use crate::core::pipeline::signals::RawOutput;

/// Rewrites a result before it reaches the output pins.
pub type FaultHook = fn(RawOutput) -> RawOutput;

pub use divider::DividerModel;
pub use fpu::FpUnitModel;
