//! Sweep statistics collection and reporting.
//!
//! Tracks operation counts, clock steps, failures and execution time of a
//! conformance sweep.

use std::time::Instant;

use serde::Serialize;

use crate::common::error::HarnessError;

/// Counters for one sweep.
#[derive(Serialize)]
pub struct HarnessStats {
    #[serde(skip)]
    start_time: Instant,
    pub cycles: u64,
    pub operations: u64,
    pub passed: u64,

    pub op_divide: u64,
    pub op_fp_add: u64,
    pub op_fp_fma: u64,

    pub timeouts: u64,
    pub violations: u64,
    pub rejected: u64,

    pub flushes: u64,
    pub resets: u64,
}

impl Default for HarnessStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            operations: 0,
            passed: 0,
            op_divide: 0,
            op_fp_add: 0,
            op_fp_fma: 0,
            timeouts: 0,
            violations: 0,
            rejected: 0,
            flushes: 0,
            resets: 0,
        }
    }
}

impl HarnessStats {
    /// Counts a failed operation under its error class.
    pub fn record_error(&mut self, error: &HarnessError) {
        match error {
            HarnessError::HandshakeTimeout { .. } => self.timeouts += 1,
            HarnessError::InvariantViolation { .. } => self.violations += 1,
            _ => self.rejected += 1,
        }
    }

    /// Operations that did not pass.
    pub fn failures(&self) -> u64 {
        self.timeouts + self.violations + self.rejected
    }

    /// Prints a formatted summary of the sweep.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let ops = if self.operations == 0 {
            1
        } else {
            self.operations
        };
        let khz = (self.cycles as f64 / seconds) / 1000.0;
        let cpo = self.cycles as f64 / ops as f64;

        println!("\n==========================================================");
        println!("VECTOR UNIT CONFORMANCE STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_freq                 {:.2} kHz", khz);
        println!("operations               {}", self.operations);
        println!("cycles_per_op            {:.2}", cpo);
        println!("----------------------------------------------------------");
        println!("OPERATION MIX");
        let total = ops as f64;
        println!(
            "  op.divide              {} ({:.2}%)",
            self.op_divide,
            (self.op_divide as f64 / total) * 100.0
        );
        println!(
            "  op.fp_add              {} ({:.2}%)",
            self.op_fp_add,
            (self.op_fp_add as f64 / total) * 100.0
        );
        println!(
            "  op.fp_fma              {} ({:.2}%)",
            self.op_fp_fma,
            (self.op_fp_fma as f64 / total) * 100.0
        );
        println!("----------------------------------------------------------");
        println!("OUTCOMES");
        println!(
            "  passed                 {} ({:.2}%)",
            self.passed,
            (self.passed as f64 / total) * 100.0
        );
        println!("  timeouts               {}", self.timeouts);
        println!("  violations             {}", self.violations);
        println!("  rejected               {}", self.rejected);
        println!("  flushes                {}", self.flushes);
        println!("  resets                 {}", self.resets);
        println!("==========================================================");
    }
}
