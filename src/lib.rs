//! Vector Arithmetic Conformance Harness Library.
//!
//! This crate drives clocked vector arithmetic units (an integer divider, an
//! FP adder and an FMA unit) through their pin-level protocols and checks
//! every result against bit-exact reference models.
//!
//! # Architecture
//!
//! * **Codec**: packs and unpacks 8/16/32/64-bit lanes of a 128-bit register.
//! * **Reference models**: golden integer division and IEEE-754 arithmetic
//!   with all five rounding modes and exception flags.
//! * **Driver**: bounded valid/ready handshakes, flush and reset on one clock.
//! * **Checker**: division identity, divide-by-zero and overflow contracts,
//!   bit-exact FP results.
//! * **Models**: behavioural DUTs with configurable latency and backpressure.
//!
//! # Modules
//!
//! * `common`: Shared types and error handling.
//! * `config`: Configuration loading and parsing.
//! * `core`: Codec, reference models, driver, checker and facade.
//! * `coverage`: Coverage counters and watch-points.
//! * `sim`: Behavioural DUT models.
//! * `stats`: Sweep statistics.

/// Shared types, constants and error handling.
///
/// Provides the lane configuration enums, opcodes and the error type used
/// throughout the harness.
pub mod common;

/// Configuration system for handshake bounds and model timing.
///
/// Loads and validates TOML files describing timeouts, reset length and
/// the latency, capacity and backpressure of each behavioural unit.
pub mod config;

/// Harness core: codec, reference models, driver, inspector, checker and facade.
pub mod core;

/// Coverage counters and the watch-points that feed them.
pub mod coverage;

/// Behavioural models of the divider and FP units.
///
/// Implement the same pin contracts as the hardware so the harness can run
/// without an RTL simulator.
pub mod sim;

/// Sweep statistics collection and reporting.
pub mod stats;
