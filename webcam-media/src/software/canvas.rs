//! RGBA raster canvas

use super::video::SoftwareVideo;
use crate::error::{IntoMediaError, MediaError, MediaResult};
use crate::raster::{encode_data_url, CanvasSize, RasterSurface, Transform2D, EMPTY_DATA_URL};
use crate::screenshot::{ImageFormat, DEFAULT_QUALITY};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};

/// CPU raster surface with a canvas-style transform
pub struct SoftwareCanvas {
    pixels: RgbaImage,
    transform: Transform2D,
    smoothing: bool,
}

impl SoftwareCanvas {
    /// Transparent canvas of `size`
    pub fn new(size: CanvasSize) -> Self {
        Self {
            pixels: RgbaImage::new(size.width, size.height),
            transform: Transform2D::IDENTITY,
            smoothing: true,
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn image_smoothing_enabled(&self) -> bool {
        self.smoothing
    }

    fn encode(&self, format: ImageFormat, quality: f64) -> MediaResult<Vec<u8>> {
        let (width, height) = self.pixels.dimensions();
        let mut bytes = Vec::new();
        match format {
            ImageFormat::Png => PngEncoder::new(&mut bytes)
                .write_image(self.pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| e.into_media_error(format.mime_type()))?,
            ImageFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).into_rgb8();
                JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality))
                    .encode_image(&rgb)
                    .map_err(|e| e.into_media_error(format.mime_type()))?
            }
            // The encoder is lossless only; quality has no effect.
            ImageFormat::Webp => WebPEncoder::new_lossless(&mut bytes)
                .write_image(self.pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| e.into_media_error(format.mime_type()))?,
        }
        Ok(bytes)
    }
}

/// Map 0..=1 onto the JPEG 1..=100 scale; out-of-range values use the default
fn jpeg_quality(quality: f64) -> u8 {
    let quality = if (0.0..=1.0).contains(&quality) {
        quality
    } else {
        DEFAULT_QUALITY
    };
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn sample_nearest(frame: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let px = (x.floor().max(0.0) as u32).min(frame.width() - 1);
    let py = (y.floor().max(0.0) as u32).min(frame.height() - 1);
    *frame.get_pixel(px, py)
}

fn sample_bilinear(frame: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let max_x = (frame.width() - 1) as f64;
    let max_y = (frame.height() - 1) as f64;
    let fx = (x - 0.5).clamp(0.0, max_x);
    let fy = (y - 0.5).clamp(0.0, max_y);
    let (x0, y0) = (fx.floor(), fy.floor());
    let (x1, y1) = ((x0 + 1.0).min(max_x), (y0 + 1.0).min(max_y));
    let (tx, ty) = (fx - x0, fy - y0);

    let p00 = frame.get_pixel(x0 as u32, y0 as u32).0;
    let p10 = frame.get_pixel(x1 as u32, y0 as u32).0;
    let p01 = frame.get_pixel(x0 as u32, y1 as u32).0;
    let p11 = frame.get_pixel(x1 as u32, y1 as u32).0;

    let mut out = [0u8; 4];
    for channel in 0..4 {
        let top = p00[channel] as f64 * (1.0 - tx) + p10[channel] as f64 * tx;
        let bottom = p01[channel] as f64 * (1.0 - tx) + p11[channel] as f64 * tx;
        out[channel] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

impl RasterSurface for SoftwareCanvas {
    type Source = SoftwareVideo;

    fn size(&self) -> CanvasSize {
        let (width, height) = self.pixels.dimensions();
        CanvasSize::new(width, height)
    }

    fn transform(&self) -> Transform2D {
        self.transform
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.transform = self.transform.translate(x, y);
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.transform = self.transform.scale(x, y);
    }

    fn set_image_smoothing_enabled(&mut self, enabled: bool) {
        self.smoothing = enabled;
    }

    fn draw_video(&mut self, source: &SoftwareVideo, width: f64, height: f64) -> MediaResult<()> {
        let frame = source.current_frame().ok_or_else(|| MediaError::InvalidState {
            message: "video has no decoded frame".to_string(),
        })?;
        if width <= 0.0 || height <= 0.0 || frame.width() == 0 || frame.height() == 0 {
            return Ok(());
        }
        // A singular transform draws nothing, like a 2D context does.
        let Some(inverse) = self.transform.invert() else {
            return Ok(());
        };

        let scale_x = frame.width() as f64 / width;
        let scale_y = frame.height() as f64 / height;
        let smoothing = self.smoothing;

        for (px, py, pixel) in self.pixels.enumerate_pixels_mut() {
            let (ux, uy) = inverse.apply(px as f64 + 0.5, py as f64 + 0.5);
            if ux < 0.0 || uy < 0.0 || ux >= width || uy >= height {
                continue;
            }
            let (sx, sy) = (ux * scale_x, uy * scale_y);
            *pixel = if smoothing {
                sample_bilinear(frame, sx, sy)
            } else {
                sample_nearest(frame, sx, sy)
            };
        }
        Ok(())
    }

    fn to_data_url(&self, format: ImageFormat, quality: f64) -> MediaResult<String> {
        if self.size().is_empty() {
            return Ok(EMPTY_DATA_URL.to_string());
        }
        let bytes = self.encode(format, quality)?;
        Ok(encode_data_url(format.mime_type(), &bytes))
    }
}
