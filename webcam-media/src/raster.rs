//! 2D raster surface used to rasterize a video frame
//!
//! Follows the `CanvasRenderingContext2D` model: a current affine transform
//! that `translate`/`scale` post-multiply, an image smoothing switch, a draw
//! call and serialization to a data URL.

use crate::error::MediaResult;
use crate::screenshot::ImageFormat;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Affine transform `[a c e; b d f; 0 0 1]`, laid out like `DOMMatrix`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(self, tx: f64, ty: f64) -> Self {
        Self {
            e: self.a * tx + self.c * ty + self.e,
            f: self.b * tx + self.d * ty + self.f,
            ..self
        }
    }

    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self {
            a: self.a * sx,
            b: self.b * sx,
            c: self.c * sy,
            d: self.d * sy,
            ..self
        }
    }

    /// Map a point through the transform
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Inverse transform, `None` when singular
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Pixel size of a raster surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Offscreen raster surface together with its drawing context
pub trait RasterSurface {
    /// What can be drawn onto this surface
    type Source;

    fn size(&self) -> CanvasSize;

    /// Current transform of the drawing context
    fn transform(&self) -> Transform2D;

    fn translate(&mut self, x: f64, y: f64);

    fn scale(&mut self, x: f64, y: f64);

    fn set_image_smoothing_enabled(&mut self, enabled: bool);

    /// Draw the source's current frame at the origin, scaled to `width` x `height`
    fn draw_video(&mut self, source: &Self::Source, width: f64, height: f64) -> MediaResult<()>;

    /// Serialize the surface (`toDataURL`)
    fn to_data_url(&self, format: ImageFormat, quality: f64) -> MediaResult<String>;
}

/// Data URL of an empty surface, as canvases report it
pub const EMPTY_DATA_URL: &str = "data:,";

/// Build a base64 data URL
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_sequence_is_net_zero() {
        let width = 641.0;
        let mirrored = Transform2D::IDENTITY.translate(width, 0.0).scale(-1.0, 1.0);
        assert_eq!(mirrored.apply(0.0, 3.0), (width, 3.0));
        assert_eq!(mirrored.apply(width, 3.0), (0.0, 3.0));

        let restored = mirrored.scale(-1.0, 1.0).translate(-width, 0.0);
        assert_eq!(restored, Transform2D::IDENTITY);
    }

    #[test]
    fn test_invert() {
        let transform = Transform2D::IDENTITY.translate(10.0, 4.0).scale(2.0, 0.5);
        let inverse = transform.invert().unwrap();
        let (x, y) = transform.apply(3.0, 8.0);
        let (bx, by) = inverse.apply(x, y);
        assert!((bx - 3.0).abs() < 1e-9);
        assert!((by - 8.0).abs() < 1e-9);

        assert!(Transform2D::IDENTITY.scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_data_url_encoding() {
        assert_eq!(encode_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }
}
