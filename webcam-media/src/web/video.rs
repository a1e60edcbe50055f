//! `HTMLVideoElement` display surface

use super::capture::WebStream;
use crate::error::{IntoMediaError, MediaError, MediaResult};
use crate::tracks::CaptureHandle;
use crate::video_surface::{Presentation, VideoDimensions, VideoSurface};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlVideoElement, Url};

pub struct WebVideo {
    pub(crate) element: HtmlVideoElement,
}

impl WebVideo {
    pub fn new(element: HtmlVideoElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }

    fn as_stream(handle: &CaptureHandle<WebStream>) -> MediaResult<web_sys::MediaStream> {
        match handle {
            CaptureHandle::Stream(stream) => Ok(stream.inner.clone()),
            CaptureHandle::Track(track) => {
                web_sys::MediaStream::new_with_tracks(&Array::of1(&track.inner))
                    .map_err(|e| e.into_media_error("MediaStream"))
            }
        }
    }
}

impl VideoSurface for WebVideo {
    type Stream = WebStream;

    fn dimensions(&self) -> VideoDimensions {
        VideoDimensions {
            video_width: self.element.video_width(),
            video_height: self.element.video_height(),
            client_width: self.element.client_width().max(0) as u32,
        }
    }

    fn bind_stream(&mut self, handle: &CaptureHandle<WebStream>) -> MediaResult<()> {
        let has_src_object = Reflect::has(&self.element, &JsValue::from_str("srcObject")).unwrap_or(false);
        if !has_src_object {
            return Err(MediaError::InvalidState {
                message: "srcObject is not supported by this element".to_string(),
            });
        }
        let stream = Self::as_stream(handle)?;
        self.element.set_src_object(Some(&stream));
        Ok(())
    }

    fn create_object_url(&mut self, handle: &CaptureHandle<WebStream>) -> MediaResult<String> {
        let stream = Self::as_stream(handle)?;
        // `Url::create_object_url_with_source` only takes a MediaSource.
        let url_ctor = Reflect::get(&js_sys::global(), &JsValue::from_str("URL"))
            .map_err(|e| e.into_media_error("URL"))?;
        let create: Function = Reflect::get(&url_ctor, &JsValue::from_str("createObjectURL"))
            .map_err(|e| e.into_media_error("createObjectURL"))?
            .dyn_into()
            .map_err(|e: JsValue| e.into_media_error("createObjectURL"))?;
        create
            .call1(&url_ctor, &stream)
            .map_err(|e| e.into_media_error("createObjectURL"))?
            .as_string()
            .ok_or_else(|| MediaError::Platform {
                name: "TypeError".to_string(),
                message: "createObjectURL returned a non-string".to_string(),
            })
    }

    fn set_source_url(&mut self, url: Option<&str>) {
        match url {
            Some(url) => self.element.set_src(url),
            None => {
                if let Err(e) = self.element.remove_attribute("src") {
                    tracing::debug!("src not cleared: {:?}", e);
                }
            }
        }
    }

    fn revoke_object_url(&mut self, url: &str) {
        if let Err(e) = Url::revoke_object_url(url) {
            tracing::warn!("Failed to revoke object URL {}: {:?}", url, e);
        }
    }

    fn detach(&mut self) {
        self.element.set_src_object(None);
    }

    fn apply_presentation(&mut self, presentation: &Presentation) {
        self.element.set_autoplay(presentation.autoplay);
        self.element.set_muted(presentation.muted);

        let inline = if presentation.plays_inline {
            self.element.set_attribute("playsinline", "")
        } else {
            self.element.remove_attribute("playsinline")
        };
        if let Err(e) = inline {
            tracing::debug!("playsinline not applied: {:?}", e);
        }

        let style = self.element.style();
        let transform = match presentation.transform.as_deref() {
            Some(transform) => style.set_property("transform", transform),
            None => style.remove_property("transform").map(|_| ()),
        };
        if let Err(e) = transform {
            tracing::debug!("transform not applied: {:?}", e);
        }

        for (name, value) in &presentation.attributes {
            if let Err(e) = self.element.set_attribute(name, value) {
                tracing::debug!("attribute {} not applied: {:?}", name, e);
            }
        }
    }
}
