// src/pdf/photo.rs
//! Circular profile-photo compositing.
//!
//! Sources are either `data:` URIs or remote URLs fetched with a fixed
//! timeout. The pipeline crops to a square, resizes, applies a circular
//! mask and composites a blurred drop shadow plus a bordered ring onto a
//! white canvas. Every failure degrades to a photo-less header.

use anyhow::{Context, Result};
use image::{imageops, DynamicImage, Rgba, RgbaImage, RgbImage};
use std::time::Duration;
use tracing::warn;

use crate::image_ingest::decode_data_uri;

/// Rendered photo resolution before masking.
pub const PHOTO_SIZE_PX: u32 = 300;
const BORDER_PX: u32 = 8;
const SHADOW_OFFSET_PX: u32 = 4;
const SHADOW_BLUR_SIGMA: f32 = 3.0;
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Canvas edge: photo plus border and shadow allowance on both sides.
pub const CANVAS_SIZE_PX: u32 = PHOTO_SIZE_PX + 2 * BORDER_PX + 2 * SHADOW_OFFSET_PX;

const SHADOW_COLOR: Rgba<u8> = Rgba([200, 200, 200, 100]);
const RING_FILL: Rgba<u8> = Rgba([241, 245, 249, 255]);
const RING_OUTLINE: Rgba<u8> = Rgba([226, 232, 240, 255]);

/// Resolve a photo source into a composited canvas, or `None` when the
/// source is unusable. Never fails the surrounding document.
pub async fn load_profile_photo(source: &str) -> Option<RgbImage> {
    let bytes = match fetch_photo_bytes(source).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Profile photo unavailable, rendering without it: {:#}", e);
            return None;
        }
    };

    match compose_circular_photo(&bytes) {
        Ok(canvas) => Some(canvas),
        Err(e) => {
            warn!("Profile photo processing failed, rendering without it: {:#}", e);
            None
        }
    }
}

async fn fetch_photo_bytes(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("data:") {
        return decode_data_uri(source);
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build image fetch client")?;

        let response = client
            .get(source)
            .send()
            .await
            .context("Failed to fetch remote profile image")?
            .error_for_status()
            .context("Remote profile image request was rejected")?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to read remote profile image body")?;
        return Ok(bytes.to_vec());
    }

    anyhow::bail!("Unsupported profile image source")
}

/// Build the full circular composition from raw image bytes.
pub fn compose_circular_photo(bytes: &[u8]) -> Result<RgbImage> {
    let decoded =
        image::load_from_memory(bytes).context("Failed to decode profile image")?;

    let square = center_crop_square(&decoded);
    let resized = imageops::resize(
        &square,
        PHOTO_SIZE_PX,
        PHOTO_SIZE_PX,
        imageops::FilterType::Lanczos3,
    );
    let circle = apply_circular_mask(resized);

    Ok(composite_on_canvas(&circle))
}

fn center_crop_square(img: &DynamicImage) -> RgbaImage {
    let rgba = img.to_rgba8();
    let side = rgba.width().min(rgba.height());
    let left = (rgba.width() - side) / 2;
    let top = (rgba.height() - side) / 2;
    imageops::crop_imm(&rgba, left, top, side, side).to_image()
}

/// Zero out alpha outside the inscribed circle, with a one-pixel
/// antialiased rim.
fn apply_circular_mask(mut img: RgbaImage) -> RgbaImage {
    let radius = img.width() as f32 / 2.0;
    let center = radius - 0.5;

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        pixel.0[3] = (pixel.0[3] as f32 * coverage) as u8;
    }

    img
}

fn composite_on_canvas(circle: &RgbaImage) -> RgbImage {
    let mut canvas = RgbaImage::from_pixel(CANVAS_SIZE_PX, CANVAS_SIZE_PX, Rgba([255, 255, 255, 255]));

    let photo_radius = PHOTO_SIZE_PX as f32 / 2.0;
    let ring_center = (BORDER_PX + PHOTO_SIZE_PX / 2) as f32;
    let shadow_center = (BORDER_PX + SHADOW_OFFSET_PX + PHOTO_SIZE_PX / 2) as f32;

    // Offset gray disc, blurred into a soft drop shadow.
    let mut shadow = RgbaImage::from_pixel(CANVAS_SIZE_PX, CANVAS_SIZE_PX, Rgba([0, 0, 0, 0]));
    draw_disc(&mut shadow, shadow_center, shadow_center, photo_radius, SHADOW_COLOR);
    let shadow = imageops::blur(&shadow, SHADOW_BLUR_SIGMA);
    imageops::overlay(&mut canvas, &shadow, 0, 0);

    // Bordered ring under the photo edge.
    draw_disc(&mut canvas, ring_center, ring_center, photo_radius + 4.0, RING_OUTLINE);
    draw_disc(&mut canvas, ring_center, ring_center, photo_radius, RING_FILL);

    imageops::overlay(&mut canvas, circle, BORDER_PX as i64, BORDER_PX as i64);

    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Alpha-blend a filled disc into the target with antialiased edges.
fn draw_disc(target: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    for (x, y, pixel) in target.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        if coverage <= 0.0 {
            continue;
        }

        let src_alpha = color.0[3] as f32 / 255.0 * coverage;
        let dst_alpha = pixel.0[3] as f32 / 255.0;
        let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
        if out_alpha <= 0.0 {
            continue;
        }

        for c in 0..3 {
            let src = color.0[c] as f32;
            let dst = pixel.0[c] as f32;
            pixel.0[c] =
                ((src * src_alpha + dst * dst_alpha * (1.0 - src_alpha)) / out_alpha) as u8;
        }
        pixel.0[3] = (out_alpha * 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode sample png");
        bytes
    }

    #[test]
    fn composes_canvas_from_non_square_input() {
        let canvas = compose_circular_photo(&sample_png(64, 48)).unwrap();
        assert_eq!(canvas.width(), CANVAS_SIZE_PX);
        assert_eq!(canvas.height(), CANVAS_SIZE_PX);

        // Corners lie outside shadow, ring and photo: plain white canvas.
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255]);

        // The photo center keeps the source color.
        let center = canvas.get_pixel(CANVAS_SIZE_PX / 2, CANVAS_SIZE_PX / 2);
        assert!(center.0[2] > center.0[0]);
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(compose_circular_photo(b"definitely not an image").is_err());
    }

    #[tokio::test]
    async fn unreachable_url_degrades_to_none() {
        assert!(load_profile_photo("http://127.0.0.1:9/missing.jpg").await.is_none());
    }

    #[tokio::test]
    async fn bad_source_degrades_to_none() {
        assert!(load_profile_photo("ftp://example.com/photo.png").await.is_none());
        assert!(load_profile_photo("data:image/png;base64,!!!").await.is_none());
    }
}
