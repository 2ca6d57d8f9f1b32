use image::{Rgba, RgbaImage};
use photo_flatten::{
    Adjustment, Color, Configurable, CropRect, DisplaySize, EditProfile, EditSession, Editor,
    EditorConfig, EditorError, ExportFilters, FilterPreset, ImageHandoff, Point, RotationStep,
    SizePx, Tool, codec,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn handoff(image: &RgbaImage, mime: &str) -> ImageHandoff {
    let encoded = codec::encode(image, "image/png", 100).unwrap();
    ImageHandoff::new(encoded.bytes, mime)
}

fn open(image: &RgbaImage, config: EditorConfig) -> EditSession {
    EditSession::open(handoff(image, "image/png"), config).unwrap()
}

/// 200x100: black left quarter, green center band, black right quarter.
fn banded() -> RgbaImage {
    RgbaImage::from_fn(200, 100, |x, _| {
        if (50..150).contains(&x) {
            Rgba([0, 255, 0, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

#[test]
fn brightness_export_is_uniform() {
    init_tracing();
    let mut session = open(&RgbaImage::from_pixel(100, 100, Rgba([200, 0, 0, 255])), EditorConfig::default());
    session.set_adjustment(Adjustment::Brightness, 120.0);

    let out = session.flatten().unwrap();
    assert_eq!((out.width(), out.height()), (100, 100));
    assert!(out.pixels().all(|p| p.0 == [240, 0, 0, 255]));
}

#[test]
fn crop_then_export_keeps_center_band() {
    init_tracing();
    let mut session = open(&banded(), EditorConfig::default());
    session.begin_crop();
    session.set_crop_rect(CropRect::new(25.0, 0.0, 50.0, 100.0)).unwrap();
    assert_eq!(session.commit_crop().unwrap(), SizePx::new(100, 100));

    let out = session.flatten().unwrap();
    assert_eq!((out.width(), out.height()), (100, 100));
    assert!(out.pixels().all(|p| p.0 == [0, 255, 0, 255]));
}

#[test]
fn rotated_crop_uses_oriented_dimensions() {
    init_tracing();
    let mut session = open(&banded(), EditorConfig::default());
    session.rotate(RotationStep::Clockwise90);

    // oriented frame is 100x200; 50% of each side
    session.begin_crop();
    session.set_crop_rect(CropRect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
    assert_eq!(session.commit_crop().unwrap(), SizePx::new(50, 100));

    // the top half of the rotated frame holds the left half of the source
    let out = session.flatten().unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(25, 75).0, [0, 255, 0, 255]);
}

#[test]
fn rotation_without_crop_swaps_export_size() {
    let mut session = open(&banded(), EditorConfig::default());
    session.rotate(RotationStep::CounterClockwise90);
    let out = session.flatten().unwrap();
    assert_eq!((out.width(), out.height()), (100, 200));
}

#[test]
fn zoomed_crop_maps_about_center() {
    let mut session = open(&banded(), EditorConfig::default());
    session.begin_crop();
    session.set_crop_rect(CropRect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    session.set_crop_zoom(2.0).unwrap();
    assert_eq!(session.commit_crop().unwrap(), SizePx::new(100, 50));
}

#[test]
fn reset_restores_source_and_is_idempotent() {
    let mut session = open(&banded(), EditorConfig::default());
    session.set_adjustment(Adjustment::Saturation, 0.0);
    session.begin_crop();
    session.set_crop_rect(CropRect::new(25.0, 0.0, 50.0, 100.0)).unwrap();
    session.commit_crop().unwrap();

    session.reset().unwrap();
    let first = (session.export_profile(), session.flatten().unwrap());
    session.reset().unwrap();
    let second = (session.export_profile(), session.flatten().unwrap());

    assert_eq!(first, second);
    assert_eq!(second.1, banded());
}

#[test]
fn undecodable_bytes_fail_fast() {
    let err = EditSession::open(ImageHandoff::new(b"not an image".to_vec(), "image/png"), EditorConfig::default())
        .unwrap_err();
    assert!(matches!(err, EditorError::Decode(_)));

    let err = Editor::from_handoff(
        Some(ImageHandoff::new(vec![0u8; 16], "image/jpeg")),
        EditorConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EditorError::Decode(_)));
}

#[test]
fn editor_without_image_exports_nothing() {
    let editor = Editor::from_handoff(None, EditorConfig::default()).unwrap();
    assert!(!editor.has_image());
    assert!(editor.export().unwrap().is_none());
}

#[test]
fn export_encodes_session_mime() {
    let img = RgbaImage::from_pixel(8, 8, Rgba([10, 120, 200, 255]));

    let editor = Editor::from_handoff(Some(handoff(&img, "image/jpeg")), EditorConfig::default()).unwrap();
    let jpeg = editor.export().unwrap().unwrap();
    assert_eq!(jpeg.mime_type, "image/jpeg");
    assert_eq!(jpeg.file_name, "edited-image.jpeg");
    assert_eq!(&jpeg.bytes[..2], &[0xFF, 0xD8]);

    let editor = Editor::from_handoff(Some(handoff(&img, "image/x-unknown")), EditorConfig::default()).unwrap();
    let fallback = editor.export().unwrap().unwrap();
    assert_eq!(fallback.mime_type, "image/png");
    assert_eq!(fallback.file_name, "edited-image.png");
}

#[test]
fn tone_only_export_skips_preset() {
    let img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
    let profile = EditProfile::new().with_adjustments(
        photo_flatten::AdjustmentSet::new().with_preset(FilterPreset::Noir),
    );

    let mut full = open(&img, EditorConfig::default());
    full.apply_profile(&profile);
    let [r, g, b, _] = full.flatten().unwrap().get_pixel(0, 0).0;
    assert_eq!(r, g);
    assert_eq!(g, b);

    let mut tone = open(&img, EditorConfig::new().with_export_filters(ExportFilters::ToneOnly));
    tone.apply_profile(&profile);
    assert_eq!(tone.flatten().unwrap().get_pixel(0, 0).0, [255, 0, 0, 255]);

    // the preview always shows the whole stack
    assert!(tone.preview().filter.contains("grayscale(100%)"));
}

#[test]
fn strokes_are_flattened_with_rotation() {
    let img = RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 255]));
    let mut session = open(&img, EditorConfig::default());
    session.set_tool(Tool::Pen);
    session.set_brush(photo_flatten::Brush::new(Color::rgb(0, 0, 255), 4.0, 1.0));

    session.pointer_down(Point::new(5.0, 5.0));
    session.pointer_up();
    session.rotate(RotationStep::Clockwise90);

    let out = session.flatten().unwrap();
    assert_eq!((out.width(), out.height()), (20, 40));
    // natural (5, 5) lands at (20 - 5, 5) after a clockwise quarter turn
    assert_eq!(out.get_pixel(14, 5).0, [0, 0, 255, 255]);
    assert_eq!(out.get_pixel(5, 5).0, [255, 255, 255, 255]);
}

#[test]
fn text_positions_follow_display_scale() {
    let img = RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255]));
    let mut session = open(&img, EditorConfig::default());
    session.set_display_size(DisplaySize::new(200.0, 150.0)).unwrap();
    session.place_text(Point::new(20.0, 30.0), "first", Color::WHITE, 16.0).unwrap();
    session.place_text(Point::new(20.0, 30.0), "second", Color::WHITE, 16.0).unwrap();

    let scale = session.display_scale();
    let svg = photo_flatten::stage::text::build_text_svg(
        session.annotations().texts(),
        scale,
        resvg::tiny_skia::Transform::identity(),
        session.natural_size(),
        "sans-serif",
    );
    assert!(svg.contains(r#"x="40" y="60""#));
    assert!(svg.contains(r#"font-size="32""#));
    assert!(svg.find("first").unwrap() < svg.find("second").unwrap());

    let out = session.flatten().unwrap();
    assert_eq!((out.width(), out.height()), (400, 300));
}

#[test]
fn commit_bakes_annotations_and_clears_them() {
    let img = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
    let mut session = open(&img, EditorConfig::default());
    session.set_tool(Tool::Pen);
    session.pointer_down(Point::new(30.0, 30.0));
    session.pointer_up();

    session.begin_crop();
    session.set_crop_rect(CropRect::new(50.0, 50.0, 50.0, 50.0)).unwrap();
    session.commit_crop().unwrap();
    assert!(session.annotations().is_empty());

    let out = session.flatten().unwrap();
    assert_eq!((out.width(), out.height()), (20, 20));
    assert_eq!(out.get_pixel(10, 10).0, [255, 0, 0, 255]);
    assert_eq!(out.get_pixel(2, 2).0, [255, 255, 255, 255]);
}
