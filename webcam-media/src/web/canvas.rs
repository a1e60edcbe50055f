//! `<canvas>` 2D raster surface

use super::video::WebVideo;
use crate::error::{IntoMediaError, MediaResult};
use crate::raster::{CanvasSize, RasterSurface, Transform2D};
use crate::screenshot::ImageFormat;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct WebCanvas {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl WebCanvas {
    pub(crate) fn new(canvas: HtmlCanvasElement, context: CanvasRenderingContext2d) -> Self {
        Self { canvas, context }
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl RasterSurface for WebCanvas {
    type Source = WebVideo;

    fn size(&self) -> CanvasSize {
        CanvasSize::new(self.canvas.width(), self.canvas.height())
    }

    fn transform(&self) -> Transform2D {
        match self.context.get_transform() {
            Ok(matrix) => Transform2D {
                a: matrix.a(),
                b: matrix.b(),
                c: matrix.c(),
                d: matrix.d(),
                e: matrix.e(),
                f: matrix.f(),
            },
            Err(_) => Transform2D::IDENTITY,
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        let _ = self.context.translate(x, y);
    }

    fn scale(&mut self, x: f64, y: f64) {
        let _ = self.context.scale(x, y);
    }

    fn set_image_smoothing_enabled(&mut self, enabled: bool) {
        self.context.set_image_smoothing_enabled(enabled);
    }

    fn draw_video(&mut self, source: &WebVideo, width: f64, height: f64) -> MediaResult<()> {
        self.context
            .draw_image_with_html_video_element_and_dw_and_dh(&source.element, 0.0, 0.0, width, height)
            .map_err(|e| e.into_media_error("drawImage"))
    }

    fn to_data_url(&self, format: ImageFormat, quality: f64) -> MediaResult<String> {
        self.canvas
            .to_data_url_with_type_and_encoder_options(format.mime_type(), &JsValue::from_f64(quality))
            .map_err(|e| e.into_media_error("toDataURL"))
    }
}
