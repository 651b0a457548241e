//! Pipeline plumbing shared by the driver and the DUT models.
//!
//! This module contains the pin bundles of the three units, the traits the
//! driver uses to reach a clocked DUT, the request/slot/result records that
//! flow through the harness, and the bounded queue the models are built on.

/// Bounded ring-buffer queue with latency and backpressure policy.
pub mod queue;

/// Pin bundles and captured outputs.
pub mod signals;

/// Requests, in-flight slots, results and driver states.
pub mod slot;

/// DUT and pin-bundle traits.
pub mod traits;
