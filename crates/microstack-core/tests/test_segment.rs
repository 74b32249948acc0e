mod common;

use ndarray::Array2;

use microstack_core::buffer::{Depth, ImageBuffer};
use microstack_core::frame::StackedFrame;
use microstack_core::geometry::{Contour, Point, RectF};
use microstack_core::segment::{
    centre_region, check_for_particle, classify, find_binary_contours,
    find_binary_contours_opening, measure_region, segment, MaskedRegion, SegmentConfig,
};

use common::disk_frame;

fn circle_contour(cx: i32, cy: i32, radius: f64) -> Contour {
    let points = (0..64)
        .map(|i| {
            let t = i as f64 * std::f64::consts::TAU / 64.0;
            Point::new(
                cx + (radius * t.cos()).round() as i32,
                cy + (radius * t.sin()).round() as i32,
            )
        })
        .collect();
    Contour::new(points)
}

fn disk_pixel_count(radius: f64) -> usize {
    let r = radius.ceil() as i64;
    let mut n = 0;
    for y in -r..=r {
        for x in -r..=r {
            if ((x * x + y * y) as f64) <= radius * radius {
                n += 1;
            }
        }
    }
    n
}

fn plane_with(width: usize, height: usize, fill: impl Fn(usize, usize) -> bool) -> ImageBuffer {
    let plane = Array2::from_shape_fn((height, width), |(r, c)| if fill(r, c) { 200.0 } else { 0.0 });
    ImageBuffer::from_plane(plane, Depth::U8)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn test_circle_inside_region_is_valid() {
    let region = RectF::inset(100, 100, 10);
    let inside = circle_contour(50, 50, 20.0);
    let outside = circle_contour(9, 50, 20.0);
    assert!((outside.centroid_f().x - 9.0).abs() < 0.5);
    assert!(inside.convexity_ratio() > 0.9);
    assert!(inside.area() > 1000.0);

    let (valid, invalid) = classify(vec![inside.clone(), outside.clone()], 100.0, 0.9, &region);
    assert_eq!(valid, vec![inside]);
    assert_eq!(invalid, vec![outside]);
}

#[test]
fn test_small_and_concave_contours_are_invalid() {
    let region = RectF::inset(200, 200, 0);
    let small = circle_contour(100, 100, 4.0);
    let l_shape = Contour::new(vec![
        Point::new(20, 20),
        Point::new(20, 80),
        Point::new(80, 80),
        Point::new(80, 74),
        Point::new(26, 74),
        Point::new(26, 20),
    ]);
    assert!(l_shape.convexity_ratio() < 0.9);
    let (valid, invalid) = classify(vec![small, l_shape], 100.0, 0.9, &region);
    assert!(valid.is_empty());
    assert_eq!(invalid.len(), 2);
}

#[test]
fn test_partition_is_strict() {
    let (w, h) = (120, 100);
    let image = plane_with(w, h, |r, c| {
        let disk = |cx: f64, cy: f64, rad: f64| {
            let dx = c as f64 - cx;
            let dy = r as f64 - cy;
            dx * dx + dy * dy <= rad * rad
        };
        let big = disk(40.0, 40.0, 12.0);
        let edge = disk(3.0, 80.0, 6.0);
        let speck = (20..22).contains(&r) && (90..92).contains(&c);
        let l_arm = ((60..95).contains(&r) && (80..84).contains(&c))
            || ((91..95).contains(&r) && (80..115).contains(&c));
        big || edge || speck || l_arm
    });
    let config = SegmentConfig {
        search_buffer: 10,
        ..SegmentConfig::default()
    };
    let all = find_binary_contours(&image, config.threshold, config.closing_kernel_size);
    assert_eq!(all.len(), 4);

    let frame = StackedFrame::from_frame(&image).unwrap();
    let result = segment(&frame, None, &config).unwrap();
    assert_eq!(result.contours.len(), 1);
    assert_eq!(result.invalid.len(), 3);
    assert_eq!(result.contours.len() + result.invalid.len(), all.len());
    for c in &all {
        let in_valid = result.contours.contains(c);
        let in_invalid = result.invalid.contains(c);
        assert!(in_valid != in_invalid);
    }
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

#[test]
fn test_segment_single_particle() {
    let frame = StackedFrame::from_frame(&disk_frame(100, 100, 0.0, 200.0, &[(50.0, 50.0, 12.0)])).unwrap();
    let result = segment(&frame, None, &SegmentConfig::default()).unwrap();
    assert_eq!(result.contours.len(), 1);
    assert!(result.invalid.is_empty());
    assert_eq!(result.crops.len(), 1);
    assert_eq!(result.stacked_crops.len(), 1);

    let crop = &result.crops[0];
    assert_eq!(crop.image.channels(), 3);
    assert_eq!(crop.image.size(), crop.mask.size());
    assert_eq!(crop.image.size(), (29, 29));
    assert_eq!(crop.centroid, Point::new(14, 14));
    assert_eq!(crop.image.get(0, 14, 14), 200.0);

    let expected = disk_pixel_count(12.0) as i64;
    assert!((crop.mask_area() as i64 - expected).abs() <= 20, "mask area {}", crop.mask_area());

    let frame_area = result.frame_mask.to_mask(0).iter().filter(|&&m| m).count() as i64;
    assert!((frame_area - expected).abs() <= 20, "frame mask area {frame_area}");

    let stacked = &result.stacked_crops[0];
    assert_eq!(stacked.mask.as_ref(), Some(&crop.mask));
    assert_eq!(stacked.colour, crop.image);
}

#[test]
fn test_segment_clips_crop_at_border() {
    let image = disk_frame(60, 60, 0.0, 200.0, &[(5.0, 30.0, 8.0)]);
    let frame = StackedFrame::from_frame(&image).unwrap();
    let result = segment(&frame, None, &SegmentConfig::default()).unwrap();
    assert_eq!(result.crops.len(), 1);
    let crop = &result.crops[0];
    assert_eq!(crop.image.height(), crop.image.width().max(crop.image.height()));
    assert!(crop.image.width() < crop.image.height());
    assert_eq!(crop.centroid.x, result.contours[0].centroid().x);
}

#[test]
fn test_crop_contour_is_in_crop_coordinates() {
    let image = disk_frame(60, 60, 0.0, 200.0, &[(5.0, 5.0, 10.0)]);
    let frame = StackedFrame::from_frame(&image).unwrap();
    let result = segment(&frame, None, &SegmentConfig::default()).unwrap();
    assert_eq!(result.crops.len(), 1);
    let crop = &result.crops[0];
    let (width, height) = crop.image.size();

    let frame_centroid = result.contours[0].centroid();
    let origin = (frame_centroid.x - crop.centroid.x, frame_centroid.y - crop.centroid.y);
    assert_eq!(crop.contour, result.contours[0].translated(-origin.0, -origin.1));

    for p in crop.contour.points() {
        assert!(p.x >= 0 && (p.x as usize) < width, "x {} outside crop", p.x);
        assert!(p.y >= 0 && (p.y as usize) < height, "y {} outside crop", p.y);
        assert_eq!(crop.mask.get(0, p.y as usize, p.x as usize), 255.0);
    }
}

#[test]
fn test_segment_uses_difference_when_given() {
    let frame = StackedFrame::from_frame(&disk_frame(50, 50, 120.0, 120.0, &[])).unwrap();
    let difference = disk_frame(50, 50, 0.0, 90.0, &[(25.0, 25.0, 9.0)]).greyscale_red_green();
    let result = segment(&frame, Some(&difference), &SegmentConfig::default()).unwrap();
    assert_eq!(result.contours.len(), 1);
    assert_eq!(result.crops[0].image.get(0, 0, 0), 120.0);
}

#[test]
fn test_opening_removes_thin_bridges() {
    let image = plane_with(80, 60, |r, c| {
        let dx = c as f64 - 30.0;
        let dy = r as f64 - 30.0;
        dx * dx + dy * dy <= 100.0 || (r == 30 && (40..75).contains(&c))
    });
    let opened = find_binary_contours_opening(&image, 20.0, 3);
    assert_eq!(opened.len(), 1);
    assert!(opened[0].bounding_rect().width <= 23);

    let closed = find_binary_contours(&image, 20.0, 7);
    assert_eq!(closed.len(), 1);
    assert!(closed[0].bounding_rect().width > 40);
}

#[test]
fn test_check_for_particle() {
    let with = disk_frame(80, 80, 0.0, 200.0, &[(40.0, 40.0, 10.0)]).greyscale_red_green();
    assert!(check_for_particle(80, 80, &with, 20.0, 100.0, 0.9, 0));
    let near_edge = disk_frame(80, 80, 0.0, 200.0, &[(8.0, 40.0, 8.0)]).greyscale_red_green();
    assert!(check_for_particle(80, 80, &near_edge, 20.0, 100.0, 0.9, 0));
    assert!(!check_for_particle(80, 80, &near_edge, 20.0, 100.0, 0.9, 10));
    let empty = ImageBuffer::zeros(80, 80, 1, Depth::U8);
    assert!(!check_for_particle(80, 80, &empty, 20.0, 100.0, 0.9, 0));
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

fn bar_region(width: usize, height: usize) -> MaskedRegion {
    let (cw, ch) = (width + 10, height + 10);
    let mask = Array2::from_shape_fn((ch, cw), |(r, c)| {
        (5..5 + height).contains(&r) && (5..5 + width).contains(&c)
    });
    let (x1, y1) = (4 + width as i32, 4 + height as i32);
    MaskedRegion {
        image: ImageBuffer::filled(cw, ch, 3, Depth::U8, 90.0),
        mask: ImageBuffer::from_mask(&mask),
        contour: Contour::new(vec![
            Point::new(5, 5),
            Point::new(5, y1),
            Point::new(x1, y1),
            Point::new(x1, 5),
        ]),
        centroid: Point::new(cw as i32 / 2, ch as i32 / 2),
        area: ((width - 1) * (height - 1)) as f64,
    }
}

#[test]
fn test_measure_region_area_and_orientation() {
    let horizontal = measure_region(&bar_region(21, 7), 0.01);
    assert_eq!(horizontal.area_px, 147);
    assert!((horizontal.area_mm - 1.47).abs() < 1e-9);
    let d = 2.0 * (1.47 / std::f64::consts::PI).sqrt();
    assert!((horizontal.mean_diameter_mm - d).abs() < 1e-9);
    assert!((horizontal.centroid.x - 15.0).abs() < 1e-9);
    assert!((horizontal.centroid.y - 8.0).abs() < 1e-9);
    assert!(horizontal.orientation.abs() < 1e-9);

    let vertical = measure_region(&bar_region(7, 21), 0.01);
    assert!((vertical.orientation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn test_centre_region_size_and_content() {
    let frame = StackedFrame::from_frame(&disk_frame(100, 100, 0.0, 200.0, &[(50.0, 50.0, 12.0)])).unwrap();
    let result = segment(&frame, None, &SegmentConfig::default()).unwrap();
    let crop = &result.crops[0];
    let m = measure_region(crop, 1.0);
    let (max_radius, _) = crop.contour.max_radius(m.centroid);

    let centred = centre_region(crop, 1.5, false);
    let side = (max_radius * 2.0 * 1.5).round() as usize;
    assert_eq!(centred.size(), (side, side));
    assert_eq!(centred.channels(), 3);
    let mid = side / 2;
    assert!(centred.get(0, mid, mid) > 190.0);

    let rotated = centre_region(crop, 1.5, true);
    assert_eq!(rotated.size(), (side, side));
}
