//! Unit tests for the integer divider reference model.

use vpu_conformance::common::types::{ElementWidth, Signedness};
use vpu_conformance::core::units::divider::Divider;

const U: Signedness = Signedness::Unsigned;
const S: Signedness = Signedness::Signed;

/// Tests exact unsigned division.
#[test]
fn test_divide_exact() {
    let q = Divider::divide(100, 25, ElementWidth::E32, U);
    assert_eq!((q.quotient, q.remainder, q.divide_by_zero), (4, 0, false));
}

/// Tests signed division with a remainder.
#[test]
fn test_divide_signed_positive() {
    let q = Divider::divide(7, 3, ElementWidth::E32, S);
    assert_eq!((q.quotient, q.remainder), (2, 1));
}

/// Tests that signed division truncates toward zero and the remainder
/// takes the dividend's sign.
#[test]
fn test_divide_signed_truncates() {
    let q = Divider::divide(-7, 3, ElementWidth::E32, S);
    assert_eq!((q.quotient, q.remainder), (-2, -1));
    let q = Divider::divide(7, -3, ElementWidth::E32, S);
    assert_eq!((q.quotient, q.remainder), (-2, 1));
    let q = Divider::divide(-7, -3, ElementWidth::E32, S);
    assert_eq!((q.quotient, q.remainder), (2, -1));
}

/// Tests the divide-by-zero convention at 32 bits.
#[test]
fn test_divide_by_zero_unsigned() {
    let q = Divider::divide(100, 0, ElementWidth::E32, U);
    assert_eq!(q.quotient, 0xFFFF_FFFF);
    assert_eq!(q.remainder, 100);
    assert!(q.divide_by_zero);
    assert_eq!(q.quotient_bits(ElementWidth::E32), 0xFFFF_FFFF);
}

/// Tests that a signed zero divisor yields -1, the all-ones pattern.
#[test]
fn test_divide_by_zero_signed() {
    let q = Divider::divide(-5, 0, ElementWidth::E16, S);
    assert_eq!(q.quotient, -1);
    assert_eq!(q.remainder, -5);
    assert!(q.divide_by_zero);
    assert_eq!(q.quotient_bits(ElementWidth::E16), 0xFFFF);
}

/// Tests the saturating signed overflow case at every width.
#[test]
fn test_signed_overflow() {
    for width in ElementWidth::ALL {
        let min = width.min_signed();
        let q = Divider::divide(min, -1, width, S);
        assert_eq!((q.quotient, q.remainder), (min, 0), "{}", width);
        assert!(!q.divide_by_zero);
        assert!(Divider::is_overflow(min, -1, width, S));
    }
    assert_eq!(
        Divider::divide(-(1i128 << 31), -1, ElementWidth::E32, S).quotient,
        -(1i128 << 31)
    );
}

/// Tests that the overflow case does not exist for unsigned lanes.
#[test]
fn test_unsigned_never_overflows() {
    let w = ElementWidth::E8;
    assert!(!Divider::is_overflow(128, 255, w, U));
    let q = Divider::divide(255, 1, w, U);
    assert_eq!((q.quotient, q.remainder), (255, 0));
}

/// Tests that unsigned division is floor division at 64 bits.
#[test]
fn test_unsigned_wide() {
    let n = u64::MAX as i128;
    let q = Divider::divide(n, 10, ElementWidth::E64, U);
    assert_eq!(q.quotient, (u64::MAX / 10) as i128);
    assert_eq!(q.remainder, (u64::MAX % 10) as i128);
}

/// Tests the vector form and the zero-divisor mask.
#[test]
fn test_divide_lanes_zero_mask() {
    let out = Divider::divide_lanes(&[10, 20, 30, 40], &[2, 0, 3, 0], ElementWidth::E32, U);
    assert_eq!(out.quotients, vec![5, 0xFFFF_FFFF, 10, 0xFFFF_FFFF]);
    assert_eq!(out.remainders, vec![0, 20, 0, 40]);
    assert_eq!(out.zero_mask, 0b1010);
}
