//! In-memory video display surface

use super::stream::SoftwareStream;
use crate::error::{MediaError, MediaResult};
use crate::tracks::{CaptureHandle, MediaStream, MediaTrack};
use crate::video_surface::{Presentation, VideoDimensions, VideoSurface};
use image::RgbaImage;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

/// Video surface that "decodes" frames from the bound software stream
pub struct SoftwareVideo {
    client_width: u32,
    supports_src_object: bool,
    src_object: Option<CaptureHandle<SoftwareStream>>,
    src: Option<String>,
    object_urls: HashMap<String, CaptureHandle<SoftwareStream>>,
    revoked_urls: Vec<String>,
    frame: Option<Rc<RgbaImage>>,
    presentation: Presentation,
}

impl SoftwareVideo {
    /// Surface rendered `client_width` pixels wide
    pub fn new(client_width: u32) -> Self {
        Self {
            client_width,
            supports_src_object: true,
            src_object: None,
            src: None,
            object_urls: HashMap::new(),
            revoked_urls: Vec::new(),
            frame: None,
            presentation: Presentation::default(),
        }
    }

    /// Surface that rejects `srcObject`, forcing the object URL fallback
    pub fn without_src_object(mut self) -> Self {
        self.supports_src_object = false;
        self
    }

    pub fn set_client_width(&mut self, client_width: u32) {
        self.client_width = client_width;
    }

    /// Pull the next frame from the first live video track of whatever is
    /// bound. Returns whether a frame is now available.
    pub fn decode_frame(&mut self) -> bool {
        let bound = self
            .src_object
            .as_ref()
            .or_else(|| self.src.as_ref().and_then(|url| self.object_urls.get(url)));

        self.frame = bound.and_then(|handle| match handle {
            CaptureHandle::Stream(stream) => stream
                .video_tracks()
                .into_iter()
                .find_map(|track| track.frame()),
            CaptureHandle::Track(track) => track.frame(),
        });
        self.frame.is_some()
    }

    pub fn current_frame(&self) -> Option<&RgbaImage> {
        self.frame.as_deref()
    }

    /// ID of the directly bound stream
    pub fn bound_stream_id(&self) -> Option<String> {
        self.src_object.as_ref().map(CaptureHandle::id)
    }

    pub fn source_url(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn revoked_urls(&self) -> &[String] {
        &self.revoked_urls
    }

    /// Object URLs created and not yet revoked
    pub fn live_object_urls(&self) -> usize {
        self.object_urls.len()
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }
}

impl VideoSurface for SoftwareVideo {
    type Stream = SoftwareStream;

    fn dimensions(&self) -> VideoDimensions {
        let (video_width, video_height) = self
            .frame
            .as_ref()
            .map(|frame| frame.dimensions())
            .unwrap_or((0, 0));
        VideoDimensions {
            video_width,
            video_height,
            client_width: self.client_width,
        }
    }

    fn bind_stream(&mut self, handle: &CaptureHandle<SoftwareStream>) -> MediaResult<()> {
        if !self.supports_src_object {
            return Err(MediaError::InvalidState {
                message: "srcObject is not supported by this surface".to_string(),
            });
        }
        self.src_object = Some(handle.clone());
        self.frame = None;
        Ok(())
    }

    fn create_object_url(&mut self, handle: &CaptureHandle<SoftwareStream>) -> MediaResult<String> {
        let url = format!("blob:software/{}", Uuid::new_v4());
        self.object_urls.insert(url.clone(), handle.clone());
        Ok(url)
    }

    fn set_source_url(&mut self, url: Option<&str>) {
        self.src = url.map(str::to_string);
        self.frame = None;
    }

    fn revoke_object_url(&mut self, url: &str) {
        if self.object_urls.remove(url).is_some() {
            self.revoked_urls.push(url.to_string());
        }
    }

    fn detach(&mut self) {
        self.src_object = None;
        self.frame = None;
    }

    fn apply_presentation(&mut self, presentation: &Presentation) {
        self.presentation = presentation.clone();
    }
}
