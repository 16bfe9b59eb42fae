#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// finite_or_zero
// =============================================================

#[test]
fn finite_values_pass_through() {
    assert_eq!(finite_or_zero(12.5), 12.5);
    assert_eq!(finite_or_zero(-3.0), -3.0);
}

#[test]
fn non_finite_values_become_zero() {
    assert_eq!(finite_or_zero(f64::NAN), 0.0);
    assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
    assert_eq!(finite_or_zero(f64::NEG_INFINITY), 0.0);
}

#[test]
fn point_sanitized_replaces_each_axis() {
    let p = Point::new(f64::NAN, 7.0).sanitized();
    assert_eq!(p, Point::new(0.0, 7.0));
}

#[test]
fn point_offset_from_subtracts() {
    let p = Point::new(150.0, 90.0).offset_from(Point::new(100.0, 100.0));
    assert_eq!(p, Point::new(50.0, -10.0));
}

// =============================================================
// Size
// =============================================================

#[test]
fn size_at_least_grows_small_axes_only() {
    let s = Size::new(50.0, 300.0).at_least(Size::new(200.0, 200.0));
    assert_eq!(s, Size::new(200.0, 300.0));
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_contains_is_edge_inclusive() {
    let r = Rect::new(Point::new(10.0, 10.0), Size::new(100.0, 50.0));
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(r.contains(Point::new(110.0, 60.0)));
    assert!(r.contains(Point::new(50.0, 30.0)));
    assert!(!r.contains(Point::new(9.9, 30.0)));
    assert!(!r.contains(Point::new(50.0, 60.1)));
}

// =============================================================
// Surface
// =============================================================

#[test]
fn default_surface_is_unbounded() {
    assert!(!Surface::default().is_bounded());
}

#[test]
fn surface_with_size_is_bounded() {
    let s = Surface::new(Point::default(), Size::new(800.0, 600.0));
    assert!(s.is_bounded());
}

#[test]
fn surface_with_non_finite_size_is_unbounded() {
    let s = Surface::new(Point::default(), Size::new(f64::NAN, 600.0));
    assert!(!s.is_bounded());
}

#[test]
fn surface_to_board_subtracts_origin() {
    let s = Surface::new(Point::new(20.0, 64.0), Size::new(800.0, 600.0));
    assert_eq!(s.to_board(Point::new(120.0, 164.0)), Point::new(100.0, 100.0));
}
