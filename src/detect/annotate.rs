use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::warn;

use crate::detect::dto::Detection;
use crate::detect::font;
use crate::detect::services::decode_data_url;

const OUTLINE_RINGS: i64 = 3;
const TEXT_SCALE: u32 = 2;

/// Draw labeled boxes onto the image and re-encode as a PNG data URL. On any
/// rendering failure the original image is returned unmodified; annotation
/// never fails a request.
pub fn draw_bounding_boxes(image_data_url: &str, detections: &[Detection]) -> String {
    match render(image_data_url, detections) {
        Ok(annotated) => annotated,
        Err(e) => {
            warn!(error = %e, "bounding box rendering failed, returning original image");
            image_data_url.to_string()
        }
    }
}

fn render(image_data_url: &str, detections: &[Detection]) -> anyhow::Result<String> {
    let bytes = decode_data_url(image_data_url)?;
    let mut img = image::load_from_memory(&bytes)?.to_rgba8();

    for detection in detections {
        draw_detection(&mut img, detection);
    }

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&out)))
}

/// Stable label -> color mapping (FNV-1a over the label bytes, channels kept
/// in 100..=255 so boxes stay visible on dark and light content).
fn label_color(label: &str) -> Rgba<u8> {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in label.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let channel = |shift: u32| 100 + ((h >> shift) as u8 % 156);
    Rgba([channel(0), channel(8), channel(16), 255])
}

fn draw_detection(img: &mut RgbaImage, detection: &Detection) {
    let color = label_color(&detection.label);

    let x1 = detection.bbox.x as i64;
    let y1 = detection.bbox.y as i64;
    let x2 = (detection.bbox.x + detection.bbox.width) as i64;
    let y2 = (detection.bbox.y + detection.bbox.height) as i64;

    for ring in 0..OUTLINE_RINGS {
        draw_rect_outline(img, x1 - ring, y1 - ring, x2 + ring, y2 + ring, color);
    }

    // Label tag directly above the top-left corner.
    let text = format!("{} ({:.2})", detection.label, detection.score);
    let text_w = font::text_width(&text, TEXT_SCALE) as i64;
    let text_h = font::text_height(TEXT_SCALE) as i64;
    fill_rect(img, x1, y1 - text_h - 8, x1 + text_w + 10, y1, color);
    font::draw_text(
        img,
        x1 + 5,
        y1 - text_h - 4,
        &text,
        TEXT_SCALE,
        Rgba([255, 255, 255, 255]),
    );
}

fn put_pixel_checked(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_rect_outline(img: &mut RgbaImage, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgba<u8>) {
    for x in x1..=x2 {
        put_pixel_checked(img, x, y1, color);
        put_pixel_checked(img, x, y2, color);
    }
    for y in y1..=y2 {
        put_pixel_checked(img, x1, y, color);
        put_pixel_checked(img, x2, y, color);
    }
}

fn fill_rect(img: &mut RgbaImage, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgba<u8>) {
    for y in y1..y2 {
        for x in x1..x2 {
            put_pixel_checked(img, x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::dto::BoundingBox;

    fn test_image_data_url(width: u32, height: u32) -> String {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(&out))
    }

    fn decode_png_data_url(data_url: &str) -> RgbaImage {
        assert!(data_url.starts_with("data:image/png;base64,"));
        let bytes = decode_data_url(data_url).unwrap();
        image::load_from_memory(&bytes).unwrap().to_rgba8()
    }

    #[test]
    fn empty_detections_round_trip_to_decodable_png() {
        let input = test_image_data_url(64, 48);
        let output = draw_bounding_boxes(&input, &[]);
        let img = decode_png_data_url(&output);
        assert_eq!(img.dimensions(), (64, 48));
        // No boxes drawn: content unchanged.
        assert!(img.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn boxes_change_pixels_and_keep_dimensions() {
        let input = test_image_data_url(200, 200);
        let detections = vec![Detection {
            label: "car".into(),
            score: 0.94,
            bbox: BoundingBox {
                x: 40.0,
                y: 60.0,
                width: 80.0,
                height: 50.0,
            },
        }];
        let output = draw_bounding_boxes(&input, &detections);
        let img = decode_png_data_url(&output);
        assert_eq!(img.dimensions(), (200, 200));
        assert!(img.pixels().any(|p| *p != Rgba([10, 20, 30, 255])));
        // Outline pixel on the top edge of the box.
        assert_eq!(*img.get_pixel(80, 60), label_color("car"));
    }

    #[test]
    fn rendering_failure_returns_original_input() {
        let bogus = "data:image/png;base64,bm90LWEtcG5n";
        let output = draw_bounding_boxes(bogus, &[]);
        assert_eq!(output, bogus);
    }

    #[test]
    fn label_color_is_deterministic_and_distinct() {
        assert_eq!(label_color("person"), label_color("person"));
        assert_ne!(label_color("person"), label_color("car"));
        for Rgba([r, g, b, a]) in [label_color("person"), label_color("car")] {
            assert!(r >= 100 && g >= 100 && b >= 100);
            assert_eq!(a, 255);
        }
    }

    #[test]
    fn detections_outside_canvas_do_not_panic() {
        let input = test_image_data_url(32, 32);
        let detections = vec![Detection {
            label: "tree".into(),
            score: 0.5,
            bbox: BoundingBox {
                x: -10.0,
                y: -10.0,
                width: 500.0,
                height: 500.0,
            },
        }];
        let output = draw_bounding_boxes(&input, &detections);
        assert!(output.starts_with("data:image/png;base64,"));
    }
}
