//! Coverage context and watch-point tests.

use vpu_conformance::common::types::{ElementWidth, Signedness};
use vpu_conformance::core::inspect::StatusSnapshot;
use vpu_conformance::coverage::{CoverageContext, WatchPoint, STANDARD_WATCH_POINTS};

fn idle() -> StatusSnapshot {
    StatusSnapshot {
        input_ready: true,
        output_valid: false,
        element_width: ElementWidth::E32,
        signedness: Signedness::Unsigned,
        flag_mask: 0,
        flush_active: false,
        reset_active: false,
        pending: 0,
        cycle: 7,
    }
}

fn sample_all(status: &StatusSnapshot) -> CoverageContext {
    let mut cov = CoverageContext::new();
    for wp in STANDARD_WATCH_POINTS {
        wp.sample(status, &mut cov);
    }
    cov
}

/// Tests that an idle snapshot only hits its width.
#[test]
fn test_watch_points_idle() {
    let cov = sample_all(&idle());
    let hit: Vec<&str> = cov.iter().map(|(name, _)| name).collect();
    assert_eq!(hit, vec!["config.e32"]);
}

/// Tests the handshake and pipeline predicates.
#[test]
fn test_watch_points_handshake() {
    let status = StatusSnapshot {
        input_ready: false,
        output_valid: true,
        pending: 2,
        ..idle()
    };
    let cov = sample_all(&status);
    assert!(cov.is_covered("handshake.backpressure"));
    assert!(cov.is_covered("handshake.output_valid"));
    assert!(cov.is_covered("pipeline.busy"));

    // Ready is expected to be low while reset is held.
    let status = StatusSnapshot {
        input_ready: false,
        reset_active: true,
        ..idle()
    };
    let cov = sample_all(&status);
    assert!(!cov.is_covered("handshake.backpressure"));
    assert!(cov.is_covered("control.reset"));
}

/// Tests the flag predicates against the lane count of the width.
#[test]
fn test_watch_points_flags() {
    let some = StatusSnapshot {
        flag_mask: 0b0010,
        ..idle()
    };
    let cov = sample_all(&some);
    assert!(cov.is_covered("flags.any"));
    assert!(!cov.is_covered("flags.all_lanes"));

    let all = StatusSnapshot {
        flag_mask: 0b11,
        element_width: ElementWidth::E64,
        signedness: Signedness::Signed,
        ..idle()
    };
    let cov = sample_all(&all);
    assert!(cov.is_covered("flags.all_lanes"));
    assert!(cov.is_covered("config.signed"));
    assert!(cov.is_covered("config.e64"));
}

/// Tests hit counting, merge and the missing list.
#[test]
fn test_coverage_merge_and_missing() {
    let mut a = CoverageContext::new();
    a.mark("op.div");
    a.mark("op.div");
    let mut b = CoverageContext::new();
    b.mark("op.div");
    b.mark("op.add");

    a.merge(&b);
    assert_eq!(a.hits("op.div"), 3);
    assert_eq!(a.hits("op.add"), 1);
    assert_eq!(a.hits("op.mul"), 0);
    assert_eq!(a.len(), 2);
    assert_eq!(a.missing(&["op.add", "op.mul", "op.sub"]), vec!["op.mul", "op.sub"]);

    a.reset();
    assert!(a.is_empty());
}

/// Tests a custom watch-point.
#[test]
fn test_custom_watch_point() {
    fn late(s: &StatusSnapshot) -> bool {
        s.cycle > 5
    }
    let wp = WatchPoint::new("custom.late", late);
    let mut cov = CoverageContext::new();
    wp.sample(&idle(), &mut cov);
    wp.sample(&StatusSnapshot { cycle: 1, ..idle() }, &mut cov);
    assert_eq!(cov.hits("custom.late"), 1);
}

/// Tests the serialized report shape.
#[test]
fn test_coverage_json() {
    let mut cov = CoverageContext::new();
    cov.mark("op.add");
    cov.mark("config.e8");
    let json = serde_json::to_value(&cov).unwrap();
    assert_eq!(json, serde_json::json!({ "marks": { "config.e8": 1, "op.add": 1 } }));

    let back: CoverageContext = serde_json::from_value(json).unwrap();
    assert_eq!(back, cov);
}
