//! Coverage accumulation.
//!
//! Coverage is an explicit value: callers create a [`CoverageContext`], pass
//! it into every driver or facade call, and merge contexts from independent
//! runs. Watch-points are pure predicates over a [`StatusSnapshot`] so they
//! can be tested without a DUT.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::types::{ElementWidth, Signedness};
use crate::core::inspect::StatusSnapshot;

/// Named hit counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageContext {
    marks: BTreeMap<String, u64>,
}

impl CoverageContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one hit of `name`.
    pub fn mark(&mut self, name: &str) {
        *self.marks.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Hits recorded for `name` (zero if never marked).
    pub fn hits(&self, name: &str) -> u64 {
        self.marks.get(name).copied().unwrap_or(0)
    }

    /// Returns `true` once `name` has been hit at least once.
    pub fn is_covered(&self, name: &str) -> bool {
        self.hits(name) > 0
    }

    /// Adds every counter of `other` into `self`.
    pub fn merge(&mut self, other: &CoverageContext) {
        for (name, hits) in &other.marks {
            *self.marks.entry(name.clone()).or_insert(0) += hits;
        }
    }

    /// Clears all counters.
    pub fn reset(&mut self) {
        self.marks.clear();
    }

    /// Number of distinct marks.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Returns `true` if nothing has been marked.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks and their hit counts, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.marks.iter().map(|(name, hits)| (name.as_str(), *hits))
    }

    /// Names from `names` that were never hit.
    pub fn missing<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        names
            .iter()
            .copied()
            .filter(|name| !self.is_covered(name))
            .collect()
    }
}

/// Pure watch-point predicate.
pub type Predicate = fn(&StatusSnapshot) -> bool;

/// A named predicate evaluated on every clock step.
#[derive(Clone, Copy, Debug)]
pub struct WatchPoint {
    pub name: &'static str,
    pub predicate: Predicate,
}

impl WatchPoint {
    /// Creates a watch-point that marks `name` whenever `predicate` holds.
    pub const fn new(name: &'static str, predicate: Predicate) -> Self {
        Self { name, predicate }
    }

    /// Marks `coverage` if the predicate holds for `status`.
    pub fn sample(&self, status: &StatusSnapshot, coverage: &mut CoverageContext) {
        if (self.predicate)(status) {
            coverage.mark(self.name);
        }
    }
}

fn backpressure(s: &StatusSnapshot) -> bool {
    !s.input_ready && !s.reset_active
}

fn output_valid(s: &StatusSnapshot) -> bool {
    s.output_valid
}

fn flush_active(s: &StatusSnapshot) -> bool {
    s.flush_active
}

fn reset_active(s: &StatusSnapshot) -> bool {
    s.reset_active
}

fn flag_raised(s: &StatusSnapshot) -> bool {
    s.flag_mask != 0
}

fn all_lanes_flagged(s: &StatusSnapshot) -> bool {
    s.flag_mask != 0 && s.flag_mask == s.element_width.lane_bit_mask()
}

fn pipeline_busy(s: &StatusSnapshot) -> bool {
    s.pending > 0
}

fn signed_mode(s: &StatusSnapshot) -> bool {
    s.signedness == Signedness::Signed
}

fn width_e8(s: &StatusSnapshot) -> bool {
    s.element_width == ElementWidth::E8
}

fn width_e16(s: &StatusSnapshot) -> bool {
    s.element_width == ElementWidth::E16
}

fn width_e32(s: &StatusSnapshot) -> bool {
    s.element_width == ElementWidth::E32
}

fn width_e64(s: &StatusSnapshot) -> bool {
    s.element_width == ElementWidth::E64
}

/// Watch-points shared by every suite.
pub const STANDARD_WATCH_POINTS: &[WatchPoint] = &[
    WatchPoint::new("handshake.backpressure", backpressure),
    WatchPoint::new("handshake.output_valid", output_valid),
    WatchPoint::new("control.flush", flush_active),
    WatchPoint::new("control.reset", reset_active),
    WatchPoint::new("flags.any", flag_raised),
    WatchPoint::new("flags.all_lanes", all_lanes_flagged),
    WatchPoint::new("pipeline.busy", pipeline_busy),
    WatchPoint::new("config.signed", signed_mode),
    WatchPoint::new("config.e8", width_e8),
    WatchPoint::new("config.e16", width_e16),
    WatchPoint::new("config.e32", width_e32),
    WatchPoint::new("config.e64", width_e64),
];
