mod common;

use ndarray::{s, Array2};

use microstack_core::align::DriftOffset;
use microstack_core::background::{
    BackgroundConfig, BackgroundModel, BackgroundModelManager, RingStack, UpdateOutcome,
};
use microstack_core::buffer::{translate, BorderPolicy, Depth, ImageBuffer};
use microstack_core::error::MicrostackError;
use microstack_core::geometry::{Contour, Point};

use common::{disk_frame, grey_colour_frame, max_abs_diff, textured_plane};

fn config(stack_size: usize, selection_index: usize) -> BackgroundConfig {
    BackgroundConfig {
        stack_size,
        selection_index,
        ..BackgroundConfig::default()
    }
}

fn rgb_frame(width: usize, height: usize, rgb: [f32; 3]) -> ImageBuffer {
    let planes: Vec<Array2<f32>> = rgb
        .iter()
        .map(|&v| Array2::from_elem((height, width), v))
        .collect();
    ImageBuffer::from_planes(&planes, Depth::U8).unwrap()
}

fn square_contour(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
    Contour::new(vec![
        Point::new(x0, y0),
        Point::new(x0, y1),
        Point::new(x1, y1),
        Point::new(x1, y0),
    ])
}

// ---------------------------------------------------------------------------
// Model values
// ---------------------------------------------------------------------------

#[test]
fn test_identical_constant_frames_reproduce_frame() {
    for &(n, k) in &[(1, 0), (2, 1), (3, 0), (5, 2), (9, 4), (9, 8)] {
        let frame = disk_frame(24, 20, 117.0, 117.0, &[]);
        let mut model = BackgroundModel::new(0, 24, 20, config(n, k)).unwrap();
        for _ in 0..n {
            model.update(&frame, &[], None).unwrap();
        }
        let grey = model.greyscale_model();
        assert_eq!(grey.min_max(), (117.0, 117.0), "stack {n}, rank {k}");
        assert_eq!(*model.colour_model(), frame, "stack {n}, rank {k}");
    }
}

#[test]
fn test_identical_textured_frames_reproduce_frame() {
    let plane = textured_plane(32, 24, 11, 60.0, 200.0);
    let frame = grey_colour_frame(&plane);
    let expected = frame.greyscale_red_green();
    for &(n, k) in &[(3, 0), (3, 1), (4, 1), (9, 4), (9, 7)] {
        let mut model = BackgroundModel::new(0, 32, 24, config(n, k)).unwrap();
        for _ in 0..n {
            model.update(&frame, &[], None).unwrap();
        }
        assert_eq!(*model.greyscale_model(), expected, "stack {n}, rank {k}");
    }
}

#[test]
fn test_median_ignores_outlier_frame() {
    let (w, h) = (40, 30);
    let plain = disk_frame(w, h, 100.0, 100.0, &[]);
    let outlier = disk_frame(w, h, 100.0, 200.0, &[(20.0, 15.0, 5.0)]);
    let mut model = BackgroundModel::new(0, w, h, config(9, 4)).unwrap();
    for i in 0..9 {
        let frame = if i == 5 { &outlier } else { &plain };
        model.update(frame, &[], None).unwrap();
    }
    let grey = model.greyscale_model();
    assert_eq!(grey.get(0, 15, 20), 100.0);
    assert_eq!(grey.min_max(), (100.0, 100.0));
    let top = model.sorted_stack().last().unwrap();
    assert_eq!(top[[15, 20]], 200.0);
}

#[test]
fn test_recalculate_is_idempotent() {
    let mut model = BackgroundModel::new(0, 32, 24, config(5, 2)).unwrap();
    for seed in 0..4 {
        let frame = grey_colour_frame(&textured_plane(32, 24, seed, 60.0, 200.0));
        model.update(&frame, &[], None).unwrap();
    }
    model.recalculate_model();
    let grey = model.greyscale_model();
    let colour = model.colour_model();
    model.recalculate_model();
    assert_eq!(*model.greyscale_model(), *grey);
    assert_eq!(*model.colour_model(), *colour);
}

#[test]
fn test_colour_model_follows_greyscale_rank() {
    let mut model = BackgroundModel::new(0, 8, 8, config(3, 1)).unwrap();
    model.update(&rgb_frame(8, 8, [100.0, 100.0, 7.0]), &[], None).unwrap();
    model.update(&rgb_frame(8, 8, [150.0, 150.0, 9.0]), &[], None).unwrap();
    model.update(&rgb_frame(8, 8, [50.0, 50.0, 3.0]), &[], None).unwrap();

    // The seed frame is lifted to grey; it holds the middle rank.
    assert_eq!(model.greyscale_model().get(0, 4, 4), 100.0);
    assert_eq!(model.colour_model().get(2, 4, 4), 100.0);

    model.set_selection_index(2).unwrap();
    assert_eq!(model.greyscale_model().get(0, 4, 4), 150.0);
    assert_eq!(model.colour_model().get(2, 4, 4), 9.0);

    model.set_selection_index(0).unwrap();
    assert_eq!(model.colour_model().get(2, 4, 4), 3.0);
}

#[test]
fn test_excluded_regions_are_filled_from_model() {
    let (w, h) = (40, 40);
    let with_particle = disk_frame(w, h, 90.0, 240.0, &[(20.0, 20.0, 4.0)]);
    let excluded = [square_contour(14, 14, 26, 26)];
    let mut model = BackgroundModel::new(0, w, h, config(3, 1)).unwrap();

    assert_eq!(
        model.update(&with_particle, &excluded, None).unwrap(),
        UpdateOutcome::Seeded
    );
    assert_eq!(model.greyscale_model().get(0, 20, 20), 90.0);

    for _ in 0..3 {
        assert_eq!(
            model.update(&with_particle, &excluded, None).unwrap(),
            UpdateOutcome::Inserted
        );
    }
    assert_eq!(model.greyscale_model().min_max(), (90.0, 90.0));
}

// ---------------------------------------------------------------------------
// Difference
// ---------------------------------------------------------------------------

#[test]
fn test_difference_before_first_update_uses_dim_mean() {
    let model = BackgroundModel::new(0, 30, 30, BackgroundConfig::default()).unwrap();
    let frame = disk_frame(30, 30, 30.0, 200.0, &[(15.0, 15.0, 4.0)]);
    let (diff, offset) = model.difference(&frame).unwrap();
    assert!(offset.is_zero());
    assert_eq!(diff.get(0, 0, 0), 0.0);
    assert_eq!(diff.get(0, 15, 15), 170.0);
}

#[test]
fn test_difference_against_warm_model() {
    let mut model = BackgroundModel::new(0, 30, 30, BackgroundConfig::default()).unwrap();
    let empty = disk_frame(30, 30, 30.0, 30.0, &[]);
    model.update(&empty, &[], None).unwrap();
    let frame = disk_frame(30, 30, 30.0, 200.0, &[(10.0, 12.0, 3.0)]);
    let (diff, _) = model.difference(&frame).unwrap();
    assert_eq!(diff.get(0, 12, 10), 170.0);
    assert_eq!(diff.get(0, 25, 25), 0.0);
    let (colour_diff, _) = model.colour_difference(&frame).unwrap();
    assert_eq!(colour_diff.channels(), 1);
    assert_eq!(colour_diff.get(0, 12, 10), 170.0);
}

/// A model warmed with a textured frame that correlation can lock onto.
/// Truncation is off so the texture survives offset estimation.
fn warm_textured_model() -> (BackgroundModel, ImageBuffer) {
    let frame = grey_colour_frame(&textured_plane(96, 96, 21, 20.0, 230.0));
    let config = BackgroundConfig {
        initial_threshold: 255,
        ..config(3, 0)
    };
    let mut model = BackgroundModel::new(0, 96, 96, config).unwrap();
    assert_eq!(model.update(&frame, &[], None).unwrap(), UpdateOutcome::Seeded);
    assert_eq!(
        model.update(&frame, &[], Some(DriftOffset::zero())).unwrap(),
        UpdateOutcome::Inserted
    );
    (model, frame)
}

fn interior(plane: &Array2<f32>) -> Array2<f32> {
    plane.slice(s![12..84, 12..84]).to_owned()
}

fn mean_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    (a - b).mapv(f32::abs).mean().unwrap_or(0.0)
}

#[test]
fn test_difference_follows_textured_drift() {
    let (model, frame) = warm_textured_model();
    let expected = frame.greyscale_red_green().channel_array(0);
    assert_eq!(model.greyscale_model().channel_array(0), expected);

    let drifted = translate(&frame, 3.0, -2.0, BorderPolicy::Reflect101);
    let (diff, offset) = model.difference(&drifted).unwrap();
    assert!((offset.dx - 3.0).abs() < 0.5, "dx={} should be ~3", offset.dx);
    assert!((offset.dy + 2.0).abs() < 0.5, "dy={} should be ~-2", offset.dy);
    let residual = interior(&diff.channel_array(0));
    assert!(residual.iter().all(|&v| v <= 12.0), "residual {}", residual.fold(0.0f32, |m, &v| m.max(v)));
}

#[test]
fn test_drifted_frame_is_realigned_before_insert() {
    let (mut model, frame) = warm_textured_model();
    let expected = interior(&frame.greyscale_red_green().channel_array(0));

    let drifted = translate(&frame, 3.0, -2.0, BorderPolicy::Reflect101);
    assert_eq!(model.update(&drifted, &[], None).unwrap(), UpdateOutcome::Inserted);
    model.recalculate_model();

    // The minimum over the ring only stays on the texture if the new frame
    // was shifted back onto it.
    let got = interior(&model.greyscale_model().channel_array(0));
    assert!(mean_abs_diff(&got, &expected) < 1.5, "mean {}", mean_abs_diff(&got, &expected));
    assert!(max_abs_diff(&got, &expected) <= 12.0);

    let unaligned = interior(&drifted.greyscale_red_green().channel_array(0));
    assert!(mean_abs_diff(&unaligned, &expected) > 5.0);
}

#[test]
fn test_known_offset_realigns_textured_frame() {
    let (mut model, frame) = warm_textured_model();
    let expected = interior(&frame.greyscale_red_green().channel_array(0));

    let drifted = translate(&frame, 3.0, -2.0, BorderPolicy::Reflect101);
    let known = Some(DriftOffset::new(3.0, -2.0));
    assert_eq!(model.update(&drifted, &[], known).unwrap(), UpdateOutcome::Inserted);
    let got = interior(&model.greyscale_model().channel_array(0));
    assert!(max_abs_diff(&got, &expected) <= 1.0);
}

#[test]
fn test_difference_rejects_wrong_size() {
    let model = BackgroundModel::new(0, 30, 30, BackgroundConfig::default()).unwrap();
    let frame = disk_frame(31, 30, 30.0, 30.0, &[]);
    assert!(matches!(
        model.difference(&frame),
        Err(MicrostackError::DimensionMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// Configuration, resets and notifications
// ---------------------------------------------------------------------------

#[test]
fn test_invalid_selection_index_is_rejected() {
    assert!(matches!(
        BackgroundModel::new(0, 10, 10, config(5, 5)),
        Err(MicrostackError::InvalidSelectionIndex {
            index: 5,
            stack_size: 5
        })
    ));
    let mut model = BackgroundModel::new(0, 10, 10, config(5, 2)).unwrap();
    assert!(model.set_selection_index(7).is_err());
    assert_eq!(model.selection_index(), 2);
}

#[test]
fn test_repeated_large_offsets_reset_model() {
    let frame = disk_frame(20, 20, 80.0, 80.0, &[]);
    let mut model = BackgroundModel::new(3, 20, 20, BackgroundConfig::default()).unwrap();
    let updates = model.subscribe();
    model.update(&frame, &[], None).unwrap();
    assert!(model.is_initialised());

    let far = Some(DriftOffset::new(200.0, 0.0));
    assert_eq!(model.update(&frame, &[], far).unwrap(), UpdateOutcome::Inserted);
    assert_eq!(model.bad_offset_count(), 1);
    assert_eq!(model.update(&frame, &[], far).unwrap(), UpdateOutcome::Reset);
    assert!(!model.is_initialised());
    assert_eq!(model.bad_offset_count(), 0);

    let received: Vec<_> = updates.try_iter().collect();
    let last = received.last().unwrap();
    assert!(last.reset);
    assert_eq!(last.model_id, 3);
    assert_eq!(last.generation, model.generation());
    assert_eq!(last.greyscale.get(0, 0, 0), 40.0);
}

#[test]
fn test_good_offset_clears_bad_count() {
    let frame = disk_frame(20, 20, 80.0, 80.0, &[]);
    let mut model = BackgroundModel::new(0, 20, 20, BackgroundConfig::default()).unwrap();
    model.update(&frame, &[], None).unwrap();
    model
        .update(&frame, &[], Some(DriftOffset::new(0.0, 400.0)))
        .unwrap();
    model
        .update(&frame, &[], Some(DriftOffset::new(1.0, 1.0)))
        .unwrap();
    assert_eq!(model.bad_offset_count(), 0);
    assert!(model.is_initialised());
}

#[test]
fn test_generation_increases_with_every_publish() {
    let frame = disk_frame(12, 12, 70.0, 70.0, &[]);
    let mut model = BackgroundModel::new(0, 12, 12, config(3, 1)).unwrap();
    let rx = model.subscribe();
    let start = model.generation();
    model.update(&frame, &[], None).unwrap();
    model.update(&frame, &[], None).unwrap();
    let updates: Vec<_> = rx.try_iter().collect();
    let gens: Vec<u64> = updates.iter().map(|u| u.generation).collect();
    assert_eq!(gens, vec![start + 1, start + 2]);
    assert!(updates.iter().all(|u| !u.reset));
}

#[test]
fn test_dropped_subscriber_is_pruned() {
    let frame = disk_frame(12, 12, 70.0, 70.0, &[]);
    let mut model = BackgroundModel::new(0, 12, 12, config(3, 1)).unwrap();
    let rx = model.subscribe();
    assert_eq!(model.observer_count(), 1);
    drop(rx);
    model.update(&frame, &[], None).unwrap();
    assert_eq!(model.observer_count(), 0);
}

#[test]
fn test_stack_resize_keeps_model() {
    let frame = grey_colour_frame(&textured_plane(16, 16, 2, 60.0, 200.0));
    let mut model = BackgroundModel::new(0, 16, 16, config(3, 1)).unwrap();
    for _ in 0..3 {
        model.update(&frame, &[], None).unwrap();
    }
    let before = model.greyscale_model();
    model.set_stack_size(7).unwrap();
    assert_eq!(model.stack_size(), 7);
    assert_eq!(*model.greyscale_model(), *before);

    model.set_selection_index(6).unwrap();
    model.set_stack_size(2).unwrap();
    assert_eq!(model.selection_index(), 1);
    assert!(model.set_stack_size(0).is_err());
}

#[test]
fn test_manager_shares_parameters_and_notifications() {
    let mut manager = BackgroundModelManager::new(2, 10, 10, config(9, 4)).unwrap();
    assert_eq!(manager.len(), 2);
    let rx = manager.subscribe();

    let frame = disk_frame(10, 10, 60.0, 60.0, &[]);
    manager.model_mut(0).unwrap().update(&frame, &[], None).unwrap();
    manager.model_mut(1).unwrap().update(&frame, &[], None).unwrap();
    let ids: Vec<usize> = rx.try_iter().map(|u| u.model_id).collect();
    assert_eq!(ids, vec![0, 1]);

    manager.set_stack_size(3).unwrap();
    assert_eq!(manager.config().selection_index, 2);
    assert!(manager.models().iter().all(|m| m.selection_index() == 2));
    assert!(manager.set_selection_index(3).is_err());

    manager.initialise_all();
    assert!(manager.models().iter().all(|m| !m.is_initialised()));
}

// ---------------------------------------------------------------------------
// Ring buffer
// ---------------------------------------------------------------------------

#[test]
fn test_ring_stack_overwrites_oldest() {
    let mut ring = RingStack::filled(3, 0);
    for v in 1..=4 {
        ring.push(v);
    }
    let order: Vec<i32> = ring.chronological().copied().collect();
    assert_eq!(order, vec![2, 3, 4]);
    assert_eq!(ring.len(), 3);
}
