//! End-to-end runs of the fallback search over synthetic scenes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{GrayImage, Luma};
use tagsweep_aruco::{ArucoDetector, render_marker};
use tagsweep_pipeline::{DiscardSink, Point, PreprocessKind, ProfileKind, search};

#[test]
fn clean_marker_wins_on_first_attempt() {
    let detector = ArucoDetector::new();
    let scene = render_marker(detector.dictionary(), 7, 10, 3).unwrap();

    let outcome = search(&detector, &scene, &mut DiscardSink).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.winning_preprocess, Some(PreprocessKind::Original));
    assert_eq!(outcome.winning_profile, Some(ProfileKind::Default));
    assert_eq!(outcome.tags.len(), 1);
    assert_eq!(outcome.tags[0].id, 7);

    // The marker square spans pixels 30..=99 of the 130 px scene.
    let expected = [
        Point::new(30.0, 30.0),
        Point::new(99.0, 30.0),
        Point::new(99.0, 99.0),
        Point::new(30.0, 99.0),
    ];
    for (corner, want) in outcome.tags[0].corners.iter().zip(expected) {
        assert!(
            corner.distance(want) <= 2.5,
            "corner {corner:?} too far from {want:?}"
        );
    }
}

#[test]
fn quarter_turned_marker_keeps_its_id() {
    let detector = ArucoDetector::new();
    let upright = render_marker(detector.dictionary(), 7, 10, 3).unwrap();
    let scene = image::imageops::rotate90(&upright);

    let outcome = search(&detector, &scene, &mut DiscardSink).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.tags.len(), 1);
    assert_eq!(outcome.tags[0].id, 7);
    // Corner order starts at the marker's own top-left, which the
    // quarter turn moved to the scene's top-right.
    assert!(outcome.tags[0].corners[0].distance(Point::new(99.0, 30.0)) <= 2.5);
}

#[test]
fn featureless_scene_fails_with_empty_tags() {
    let detector = ArucoDetector::new();
    let scene = GrayImage::from_pixel(96, 96, Luma([128]));

    let outcome = search(&detector, &scene, &mut DiscardSink).unwrap();

    assert!(!outcome.success);
    assert!(outcome.tags.is_empty());
    assert!(outcome.winning_preprocess.is_none());
    assert!(outcome.winning_profile.is_none());
    assert!(outcome.rejected.is_empty());
}
