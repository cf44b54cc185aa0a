//! Single-image watermarking through the public API.

use super::test_harness::{builtin_watermarker, write_png};
use image::{Rgba, RgbaImage};
use photomark::imaging::{Canvas, OutputFormat, ResizeSpec};
use photomark::watermark::{
    calculate_position, Anchor, Dimensions, PlacementPosition, Position, WatermarkSpec,
};
use rstest::rstest;

fn black(width: u32, height: u32) -> Canvas {
    Canvas::filled(width, height, Rgba([0, 0, 0, 255]))
}

/// Bounding box of pixels that differ from pure black.
fn changed_bounds(canvas: &Canvas) -> Option<(u32, u32, u32, u32)> {
    canvas
        .as_rgba()
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] != 0 || p[1] != 0 || p[2] != 0)
        .fold(None, |acc, (x, y, _)| match acc {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        })
}

#[rstest]
#[case(Anchor::TopLeft, (10, 10))]
#[case(Anchor::TopCenter, (200, 10))]
#[case(Anchor::Center, (200, 130))]
#[case(Anchor::BottomRight, (390, 250))]
#[case(Anchor::BottomLeft, (10, 250))]
fn test_anchor_placement_on_500x300(#[case] anchor: Anchor, #[case] expected: (i32, i32)) {
    let pos = calculate_position(
        anchor,
        Dimensions::new(500, 300),
        Dimensions::new(100, 40),
        10,
    );
    assert_eq!(pos, PlacementPosition::new(expected.0, expected.1));
}

#[rstest]
#[case(Anchor::TopLeft)]
#[case(Anchor::BottomRight)]
#[case(Anchor::Center)]
fn test_text_lands_in_expected_region(#[case] anchor: Anchor) {
    let spec = WatermarkSpec::text("MARK")
        .with_position(anchor)
        .with_opacity(100);
    let out = builtin_watermarker().apply(&black(400, 200), &spec).unwrap();
    let (x0, y0, x1, y1) = changed_bounds(&out).unwrap();

    match anchor {
        Anchor::TopLeft => assert!(x1 < 200 && y1 < 100),
        Anchor::BottomRight => assert!(x0 >= 200 && y0 >= 100),
        _ => assert!(x0 < 200 && x1 > 200),
    }
}

#[test]
fn test_explicit_offset_position() {
    let spec = WatermarkSpec::text("X")
        .with_position(Position::Point(150, 60))
        .with_opacity(100);
    let out = builtin_watermarker().apply(&black(300, 200), &spec).unwrap();
    let (x0, y0, _, _) = changed_bounds(&out).unwrap();
    // Glyphs start inside the 10px text padding
    assert!(x0 >= 160 && y0 >= 70);
}

#[test]
fn test_zero_opacity_leaves_image_unchanged() {
    let canvas = black(120, 80);
    let spec = WatermarkSpec::text("HIDDEN").with_opacity(0);
    let out = builtin_watermarker().apply(&canvas, &spec).unwrap();
    assert_eq!(out, canvas);
}

#[test]
fn test_tiled_text_covers_whole_canvas() {
    let spec = WatermarkSpec::text("T")
        .with_opacity(100)
        .with_tiling(5)
        .with_rotation(45.0);
    let out = builtin_watermarker().apply(&black(300, 300), &spec).unwrap();
    let (x0, y0, x1, y1) = changed_bounds(&out).unwrap();

    assert!(x0 < 50 && y0 < 50);
    assert!(x1 > 250 && y1 > 250);
}

#[test]
fn test_image_watermark_file_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_png(dir.path(), "photo.png", 200, 100);
    let logo = dir.path().join("logo.png");
    RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]))
        .save(&logo)
        .unwrap();
    let output = dir.path().join("result.png");

    let spec = WatermarkSpec::image(&logo)
        .with_position(Anchor::TopLeft)
        .with_opacity(100);
    let dims = builtin_watermarker()
        .apply_file(
            &photo,
            &output,
            &spec,
            OutputFormat::Png,
            95,
            &ResizeSpec::default(),
        )
        .unwrap();
    assert_eq!(dims, (200, 100));

    let written = image::open(&output).unwrap().into_rgba8();
    assert_eq!(written.get_pixel(20, 15), &Rgba([255, 0, 0, 255]));
    assert_eq!(written.get_pixel(150, 80), &Rgba([100, 100, 100, 255]));
}

#[test]
fn test_missing_watermark_image_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_png(dir.path(), "photo.png", 50, 50);
    let spec = WatermarkSpec::image(dir.path().join("no-such-logo.png"));

    let result = builtin_watermarker().apply_file(
        &photo,
        &dir.path().join("out.png"),
        &spec,
        OutputFormat::Png,
        95,
        &ResizeSpec::default(),
    );
    assert!(result.is_err());
    assert!(!dir.path().join("out.png").exists());
}

#[test]
fn test_spec_from_yaml_drives_rendering() {
    let yaml = r##"
type: text
text: "YAML"
font_size: 30
font_color: "#00FF00"
position: top-left
opacity: 100
"##;
    let spec: WatermarkSpec = serde_yaml::from_str(yaml).unwrap();
    let out = builtin_watermarker().apply(&black(200, 100), &spec).unwrap();

    let green = out
        .as_rgba()
        .pixels()
        .filter(|p| p[1] == 255 && p[0] == 0 && p[2] == 0)
        .count();
    assert!(green > 0);
}
