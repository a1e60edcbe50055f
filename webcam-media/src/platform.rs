//! Platform bundle tying acquisition, display and rasterization together

use crate::capture::UserMediaManager;
use crate::error::MediaResult;
use crate::raster::{CanvasSize, RasterSurface};
use crate::tracks::MediaStream;
use crate::video_surface::VideoSurface;

/// Capability provider the webcam component runs on
pub trait Platform {
    type Stream: MediaStream;
    type Video: VideoSurface<Stream = Self::Stream>;
    type Raster: RasterSurface<Source = Self::Video>;

    /// Acquisition capabilities of this platform
    fn user_media(&self) -> &UserMediaManager<Self::Stream>;

    /// Create an offscreen raster surface of `size`
    fn create_raster(&self, size: CanvasSize) -> MediaResult<Self::Raster>;
}
