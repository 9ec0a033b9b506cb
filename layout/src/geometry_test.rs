#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

#[test]
fn distance_is_euclidean() {
    let a = Position::new(10.0, 10.0);
    let b = Position::new(13.0, 14.0);
    assert!(approx_eq(a.distance(b), 5.0));
    assert!(approx_eq(b.distance(a), 5.0));
}

#[test]
fn distance_to_self_is_zero() {
    let p = Position::new(42.0, 17.5);
    assert_eq!(p.distance(p), 0.0);
}

#[test]
fn bounds_use_card_footprint() {
    let b = Position::new(10.0, 30.0).bounds();
    assert_eq!(b.top, 10.0);
    assert_eq!(b.left, 30.0);
    assert_eq!(b.right, 50.0);
    assert_eq!(b.bottom, 25.0);
}

#[test]
fn boxes_side_by_side_do_not_overlap() {
    let a = Position::new(10.0, 10.0).bounds();
    let b = Position::new(10.0, 31.0).bounds();
    assert!(!a.overlaps(&b));
    assert!(!b.overlaps(&a));
}

#[test]
fn stacked_boxes_do_not_overlap() {
    let a = Position::new(10.0, 10.0).bounds();
    let b = Position::new(26.0, 10.0).bounds();
    assert!(!a.overlaps(&b));
}

#[test]
fn touching_edges_overlap() {
    let a = Position::new(10.0, 10.0).bounds();
    let b = Position::new(10.0, 30.0).bounds();
    assert!(a.overlaps(&b));
}

#[test]
fn diagonal_intrusion_overlaps() {
    let a = Position::new(10.0, 10.0).bounds();
    let b = Position::new(20.0, 25.0).bounds();
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
}
