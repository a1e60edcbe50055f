//! Video display surface
//!
//! The surface a capture stream is bound to for live preview, and the source
//! screenshots are drawn from.

use crate::error::MediaResult;
use crate::tracks::{CaptureHandle, MediaStream};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transform appended to the display style when the preview is mirrored
pub const MIRROR_TRANSFORM: &str = "scaleX(-1)";

/// Decoded and rendered dimensions of a video surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoDimensions {
    /// Native width of the decoded frame (0 until a frame is decoded)
    pub video_width: u32,
    /// Native height of the decoded frame (0 until a frame is decoded)
    pub video_height: u32,
    /// Width the surface is rendered at
    pub client_width: u32,
}

impl VideoDimensions {
    /// Whether a frame has been decoded
    pub fn has_frame(&self) -> bool {
        self.video_width > 0 && self.video_height > 0
    }

    /// Native aspect ratio (width / height)
    pub fn aspect_ratio(&self) -> f64 {
        self.video_width as f64 / self.video_height as f64
    }
}

/// Presentation attributes applied to the display surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Presentation {
    pub autoplay: bool,
    pub plays_inline: bool,
    /// Local playback muted; set whenever audio is captured to avoid echo
    pub muted: bool,
    /// CSS transform of the surface
    pub transform: Option<String>,
    /// Pass-through attributes (`id`, `class`, `width`, ...)
    pub attributes: BTreeMap<String, String>,
}

impl Presentation {
    /// Append the mirror flip to a caller-supplied transform
    pub fn mirrored_transform(base: Option<&str>, mirrored: bool) -> Option<String> {
        let base = base.map(str::trim).filter(|base| !base.is_empty());
        match (base, mirrored) {
            (Some(base), true) => Some(format!("{base} {MIRROR_TRANSFORM}")),
            (None, true) => Some(MIRROR_TRANSFORM.to_string()),
            (base, false) => base.map(str::to_string),
        }
    }
}

/// Display surface a capture stream is bound to
pub trait VideoSurface {
    type Stream: MediaStream;

    /// Current decoded/rendered dimensions
    fn dimensions(&self) -> VideoDimensions;

    /// Bind the live object directly (`srcObject`). Fails when the surface
    /// does not support direct binding.
    fn bind_stream(&mut self, handle: &CaptureHandle<Self::Stream>) -> MediaResult<()>;

    /// Derive a revocable object URL for the stream
    fn create_object_url(&mut self, handle: &CaptureHandle<Self::Stream>) -> MediaResult<String>;

    /// Set or clear the URL source (`src`)
    fn set_source_url(&mut self, url: Option<&str>);

    /// Release an object URL created by [`VideoSurface::create_object_url`]
    fn revoke_object_url(&mut self, url: &str);

    /// Drop any bound live object
    fn detach(&mut self);

    fn apply_presentation(&mut self, presentation: &Presentation);
}
