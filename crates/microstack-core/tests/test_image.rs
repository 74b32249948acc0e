mod common;

use approx::assert_relative_eq;
use ndarray::Array2;

use microstack_core::buffer::order::{argmax_along_stack, interpolate_from_index};
use microstack_core::buffer::{translate, BorderPolicy, Depth, ImageBuffer, ThresholdKind};
use microstack_core::error::MicrostackError;
use microstack_core::geometry::Rect;
use microstack_core::io::{load_image, load_image_greyscale, save_image};

use common::{max_abs_diff, textured_plane};

// ---------------------------------------------------------------------------
// Construction and channels
// ---------------------------------------------------------------------------

#[test]
fn test_u8_buffers_saturate() {
    let img = ImageBuffer::from_plane(Array2::from_elem((2, 2), 300.4), Depth::U8);
    assert_eq!(img.get(0, 0, 0), 255.0);
    let img = ImageBuffer::filled(2, 2, 1, Depth::U8, -5.0);
    assert_eq!(img.get(0, 1, 1), 0.0);
}

#[test]
fn test_extract_and_insert_channel() {
    let mut img = ImageBuffer::zeros(4, 3, 3, Depth::U8);
    let plane = Array2::from_elem((3, 4), 77.0f32);
    img.insert_channel(2, plane.view()).unwrap();
    let blue = img.extract_channel(2).unwrap();
    assert_eq!(blue.channels(), 1);
    assert_eq!(blue.get(0, 2, 3), 77.0);
    assert_eq!(img.get(0, 2, 3), 0.0);
}

#[test]
fn test_insert_channel_rejects_wrong_size() {
    let mut img = ImageBuffer::zeros(4, 3, 3, Depth::U8);
    let plane = Array2::from_elem((4, 4), 1.0f32);
    assert!(matches!(
        img.insert_channel(0, plane.view()),
        Err(MicrostackError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_greyscale_is_red_green_mean() {
    let mut img = ImageBuffer::zeros(2, 2, 3, Depth::U8);
    img.set(0, 0, 0, 100.0);
    img.set(1, 0, 0, 50.0);
    img.set(2, 0, 0, 250.0);
    let grey = img.greyscale_red_green();
    assert_eq!(grey.channels(), 1);
    assert_eq!(grey.get(0, 0, 0), 75.0);
}

#[test]
fn test_crop_copies_region() {
    let plane = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f32);
    let img = ImageBuffer::from_plane(plane, Depth::F32);
    let crop = img.crop(&Rect::new(3, 4, 2, 3));
    assert_eq!(crop.size(), (2, 3));
    assert_eq!(crop.get(0, 0, 0), 43.0);
    assert_eq!(crop.get(0, 2, 1), 64.0);
}

// ---------------------------------------------------------------------------
// Arithmetic and thresholds
// ---------------------------------------------------------------------------

#[test]
fn test_threshold_kinds() {
    let img = ImageBuffer::from_plane(
        Array2::from_shape_vec((1, 4), vec![10.0, 20.0, 21.0, 90.0]).unwrap(),
        Depth::U8,
    );
    let binary = img.threshold(20.0, 255.0, ThresholdKind::Binary);
    assert_eq!(binary.plane(0).iter().copied().collect::<Vec<f32>>(), vec![0.0, 0.0, 255.0, 255.0]);
    let inv = img.threshold(20.0, 255.0, ThresholdKind::BinaryInv);
    assert_eq!(inv.plane(0).iter().copied().collect::<Vec<f32>>(), vec![255.0, 255.0, 0.0, 0.0]);
    let trunc = img.threshold(20.0, 0.0, ThresholdKind::Trunc);
    assert_eq!(trunc.plane(0).iter().copied().collect::<Vec<f32>>(), vec![10.0, 20.0, 20.0, 20.0]);
    let zero = img.threshold(20.0, 0.0, ThresholdKind::ToZero);
    assert_eq!(zero.plane(0).iter().copied().collect::<Vec<f32>>(), vec![0.0, 0.0, 21.0, 90.0]);
}

#[test]
fn test_subtract_saturates_u8() {
    let a = ImageBuffer::filled(3, 3, 1, Depth::U8, 30.0);
    let b = ImageBuffer::filled(3, 3, 1, Depth::U8, 100.0);
    let diff = a.subtract(&b).unwrap();
    assert_eq!(diff.min_max(), (0.0, 0.0));
    let diff = b.subtract(&a).unwrap();
    assert_eq!(diff.min_max(), (70.0, 70.0));
}

#[test]
fn test_masked_mean() {
    let mut img = ImageBuffer::filled(4, 4, 1, Depth::U8, 10.0);
    img.set(0, 0, 0, 250.0);
    let mut mask = Array2::from_elem((4, 4), true);
    mask[[0, 0]] = false;
    let (mean, std) = img.mean_stddev(Some(&mask))[0];
    assert_relative_eq!(mean, 10.0);
    assert_relative_eq!(std, 0.0);
}

// ---------------------------------------------------------------------------
// Order statistics
// ---------------------------------------------------------------------------

#[test]
fn test_sort_channels_ascending() {
    let mut img = ImageBuffer::zeros(1, 1, 4, Depth::F32);
    for (c, v) in [5.0, 1.0, 9.0, 3.0].into_iter().enumerate() {
        img.set(c, 0, 0, v);
    }
    let sorted = img.sort_channels();
    let values: Vec<f32> = (0..4).map(|c| sorted.get(c, 0, 0)).collect();
    assert_eq!(values, vec![1.0, 3.0, 5.0, 9.0]);
}

#[test]
fn test_argmax_prefers_earliest_tie() {
    let planes = vec![
        Array2::from_elem((2, 2), 1.0f32),
        Array2::from_elem((2, 2), 4.0f32),
        Array2::from_elem((2, 2), 4.0f32),
    ];
    let idx = argmax_along_stack(&planes);
    assert!(idx.iter().all(|&i| i == 1));
}

#[test]
fn test_interpolate_between_bracketing_planes() {
    let planes: Vec<Array2<f32>> = (0..6)
        .map(|k| Array2::from_elem((1, 1), k as f32 * 10.0))
        .collect();
    let index = Array2::from_elem((1, 1), 4.2f32);
    let out = interpolate_from_index(&planes, &index);
    assert_relative_eq!(out[[0, 0]], 42.0, epsilon = 1e-4);
    let index = Array2::from_elem((1, 1), 9.0f32);
    assert_relative_eq!(interpolate_from_index(&planes, &index)[[0, 0]], 50.0);
}

// ---------------------------------------------------------------------------
// Warping
// ---------------------------------------------------------------------------

#[test]
fn test_translation_round_trip() {
    let plane = textured_plane(48, 40, 7, 50.0, 150.0);
    let img = ImageBuffer::from_plane(plane, Depth::F32);
    for &(dx, dy) in &[(2.0, -3.0), (0.5, 1.25), (-4.75, 0.0)] {
        let there = translate(&img, dx, dy, BorderPolicy::Reflect101);
        let back = translate(&there, -dx, -dy, BorderPolicy::Reflect101);
        let margin = 8;
        let inner = |b: &ImageBuffer| {
            b.channel_array(0)
                .slice(ndarray::s![margin..40 - margin, margin..48 - margin])
                .to_owned()
        };
        let err = max_abs_diff(&inner(&img), &inner(&back));
        assert!(err < 12.0, "round trip error {err} for ({dx}, {dy})");
    }
}

#[test]
fn test_integer_translation_is_exact() {
    let plane = textured_plane(32, 32, 3, 0.0, 255.0);
    let img = ImageBuffer::from_plane(plane, Depth::U8);
    let back = translate(
        &translate(&img, 3.0, -2.0, BorderPolicy::Constant(0.0)),
        -3.0,
        2.0,
        BorderPolicy::Constant(0.0),
    );
    for r in 2..30 {
        for c in 0..29 {
            assert_eq!(back.get(0, r, c), img.get(0, r, c));
        }
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

#[test]
fn test_png_round_trip_colour() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    let mut img = ImageBuffer::zeros(5, 4, 3, Depth::U8);
    img.set(0, 1, 2, 200.0);
    img.set(2, 3, 4, 17.0);
    save_image(&img, &path).unwrap();
    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded, img);
}

#[test]
fn test_png_round_trip_greyscale() {
    let dir = tempfile::tempdir().unwrap();
    let grey_path = dir.path().join("grey.png");
    let mut grey = ImageBuffer::zeros(6, 4, 1, Depth::U8);
    grey.set(0, 2, 5, 255.0);
    save_image(&grey, &grey_path).unwrap();
    assert_eq!(load_image(&grey_path).unwrap(), grey);

    let colour_path = dir.path().join("colour.png");
    save_image(&ImageBuffer::filled(6, 4, 3, Depth::U8, 90.0), &colour_path).unwrap();
    let luma = load_image_greyscale(&colour_path).unwrap();
    assert_eq!(luma.channels(), 1);
    assert!(luma.data().iter().all(|&v| (v - 90.0).abs() <= 1.0));
}

#[test]
fn test_save_rejects_two_channels() {
    let dir = tempfile::tempdir().unwrap();
    let img = ImageBuffer::zeros(3, 3, 2, Depth::U8);
    let result = save_image(&img, &dir.path().join("x.png"));
    assert!(matches!(result, Err(MicrostackError::ChannelMismatch { .. })));
}
