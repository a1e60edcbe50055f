//! Browser platform
//!
//! Bindings to `navigator.mediaDevices`, the prefixed `getUserMedia`
//! functions, `MediaStreamTrack.getSources`, `HTMLVideoElement` and the canvas
//! 2D context. Callback-style APIs are bridged into promises and awaited
//! through `wasm-bindgen-futures`.

mod canvas;
mod capture;
mod video;

pub use canvas::WebCanvas;
pub use capture::{WebProbe, WebSourceEnumerator, WebStream, WebTrack};
pub use video::WebVideo;

use crate::capture::{ExecutionContext, ProbeKind, UserMediaManager, VendorPrefix};
use crate::error::{IntoMediaError, MediaError, MediaResult};
use crate::platform::Platform;
use crate::raster::CanvasSize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, DomException, HtmlCanvasElement};

impl IntoMediaError for JsValue {
    fn into_media_error(self, context: &str) -> MediaError {
        if let Some(exception) = self.dyn_ref::<DomException>() {
            return MediaError::from_platform(&exception.name(), &exception.message());
        }
        if let Some(error) = self.dyn_ref::<js_sys::Error>() {
            return MediaError::from_platform(
                &String::from(error.name()),
                &String::from(error.message()),
            );
        }
        // Legacy prefixed implementations reject with plain objects or strings.
        if let Ok(name) = js_sys::Reflect::get(&self, &JsValue::from_str("name")) {
            if let Some(name) = name.as_string() {
                let message = js_sys::Reflect::get(&self, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|message| message.as_string())
                    .unwrap_or_default();
                return MediaError::from_platform(&name, &message);
            }
        }
        MediaError::Platform {
            name: context.to_string(),
            message: self.as_string().unwrap_or_else(|| format!("{self:?}")),
        }
    }
}

/// Platform backed by the browser window
pub struct WebPlatform {
    document: Option<Document>,
    user_media: UserMediaManager<WebStream>,
}

impl WebPlatform {
    pub fn new() -> Self {
        let window = web_sys::window();
        let context = if window.is_some() {
            ExecutionContext::Window
        } else {
            ExecutionContext::Headless
        };

        let mut user_media =
            UserMediaManager::new(context).with_probe(Box::new(WebProbe::new(ProbeKind::Standard)));
        for prefix in VendorPrefix::ALL {
            user_media = user_media.with_probe(Box::new(WebProbe::new(ProbeKind::Prefixed(prefix))));
        }

        Self {
            document: window.and_then(|window| window.document()),
            user_media: user_media.with_source_enumerator(Box::new(WebSourceEnumerator)),
        }
    }
}

impl Default for WebPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for WebPlatform {
    type Stream = WebStream;
    type Video = WebVideo;
    type Raster = WebCanvas;

    fn user_media(&self) -> &UserMediaManager<WebStream> {
        &self.user_media
    }

    fn create_raster(&self, size: CanvasSize) -> MediaResult<WebCanvas> {
        let document = self.document.as_ref().ok_or_else(|| MediaError::UnsupportedPlatform {
            platform: "no document".to_string(),
        })?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| e.into_media_error("createElement"))?
            .dyn_into()
            .map_err(|_| MediaError::Raster {
                message: "created element is not a canvas".to_string(),
            })?;
        canvas.set_width(size.width);
        canvas.set_height(size.height);

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| e.into_media_error("getContext"))?
            .ok_or_else(|| MediaError::Raster {
                message: "2d context unavailable".to_string(),
            })?
            .dyn_into()
            .map_err(|_| MediaError::Raster {
                message: "unexpected 2d context type".to_string(),
            })?;

        Ok(WebCanvas::new(canvas, context))
    }
}
