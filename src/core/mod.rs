//! Harness core.
//!
//! The codec, the reference models, the handshake driver, the status
//! inspector, the invariant checker and the facade that composes them.

/// Result checking against the reference models.
pub mod checker;

/// Packing and unpacking of vector lanes.
pub mod codec;

/// Clocked valid/ready protocol driver.
pub mod driver;

/// Submit, await and check in one call.
pub mod facade;

/// Side-effect-free status reads.
pub mod inspect;

/// Pin bundles, DUT traits, requests and the pipeline queue.
pub mod pipeline;

/// Reference models of the divider and the FP units.
pub mod units;

pub use checker::InvariantChecker;
pub use driver::HandshakeDriver;
pub use facade::OperationFacade;
pub use inspect::{StatusInspector, StatusSnapshot};
