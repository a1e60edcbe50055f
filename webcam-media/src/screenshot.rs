//! Still-frame capture
//!
//! Rasterizes the current frame of a [`VideoSurface`] into a cached
//! [`RasterSurface`] and serializes it as a data URL.

use crate::error::{MediaError, MediaResult};
use crate::raster::{CanvasSize, RasterSurface};
use crate::video_surface::{VideoDimensions, VideoSurface};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Default encoder quality for lossy formats
pub const DEFAULT_QUALITY: f64 = 0.92;

/// Encoded image format of a screenshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Webp => "image/webp",
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Whether the encoder quality setting has any effect
    pub fn is_lossy(self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Webp)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl FromStr for ImageFormat {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image/webp" => Ok(ImageFormat::Webp),
            "image/png" => Ok(ImageFormat::Png),
            "image/jpeg" => Ok(ImageFormat::Jpeg),
            other => Err(MediaError::InvalidConfiguration {
                message: format!("unsupported screenshot format {other}"),
            }),
        }
    }
}

/// Per-call screenshot settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenshotOptions {
    pub format: ImageFormat,
    /// Encoder quality in 0..=1, lossy formats only
    pub quality: f64,
    pub image_smoothing: bool,
    pub mirrored: bool,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            quality: DEFAULT_QUALITY,
            image_smoothing: true,
            mirrored: false,
        }
    }
}

/// Settings that decide the raster size. Changing any of them invalidates
/// the raster cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenshotSizing {
    /// Use the native decoded size of the video
    pub force_source_size: bool,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
}

impl ScreenshotSizing {
    /// Raster size for a video with the given dimensions.
    ///
    /// Without `force_source_size` the native aspect ratio is kept: width is
    /// the minimum width (or the rendered width), and when the resulting
    /// height falls below the minimum height the height is raised and the
    /// width recomputed from it.
    pub fn canvas_size(&self, dims: VideoDimensions) -> CanvasSize {
        if self.force_source_size {
            return CanvasSize::new(dims.video_width, dims.video_height);
        }

        let aspect_ratio = dims.aspect_ratio();
        let mut width = self
            .min_width
            .filter(|width| *width > 0)
            .unwrap_or(dims.client_width) as f64;
        let mut height = width / aspect_ratio;

        if let Some(min_height) = self.min_height.filter(|height| *height > 0) {
            if height < min_height as f64 {
                height = min_height as f64;
                width = height * aspect_ratio;
            }
        }

        // Canvas dimensions are whole pixels; fractions truncate.
        CanvasSize::new(width as u32, height as u32)
    }
}

struct CachedRaster<R> {
    surface: R,
    size: CanvasSize,
}

/// Lazily created raster surface, reused across captures until invalidated
pub struct RasterCache<R> {
    entry: Option<CachedRaster<R>>,
    builds: u64,
}

impl<R> RasterCache<R> {
    pub fn new() -> Self {
        Self {
            entry: None,
            builds: 0,
        }
    }

    pub fn is_built(&self) -> bool {
        self.entry.is_some()
    }

    /// Size of the cached surface
    pub fn size(&self) -> Option<CanvasSize> {
        self.entry.as_ref().map(|entry| entry.size)
    }

    /// How many times a surface has been created
    pub fn builds(&self) -> u64 {
        self.builds
    }

    /// Drop the cached surface; the next capture recomputes the size
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("Screenshot raster cache invalidated");
        }
    }

    /// Cached surface, creating it with `create` on first use
    pub fn get_or_try_init<F>(&mut self, size: impl FnOnce() -> CanvasSize, create: F) -> MediaResult<&mut R>
    where
        F: FnOnce(CanvasSize) -> MediaResult<R>,
    {
        if self.entry.is_none() {
            let size = size();
            let surface = create(size)?;
            debug!("Created {}x{} screenshot raster", size.width, size.height);
            self.builds += 1;
            self.entry = Some(CachedRaster { surface, size });
        }

        match self.entry.as_mut() {
            Some(entry) => Ok(&mut entry.surface),
            None => Err(MediaError::InvalidState {
                message: "raster cache empty after initialization".to_string(),
            }),
        }
    }
}

impl<R> Default for RasterCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Screenshot pipeline: sizing configuration plus the raster cache
pub struct ScreenshotCapturer<R> {
    sizing: ScreenshotSizing,
    cache: RasterCache<R>,
}

impl<R> ScreenshotCapturer<R>
where
    R: RasterSurface,
    R::Source: VideoSurface,
{
    pub fn new(sizing: ScreenshotSizing) -> Self {
        Self {
            sizing,
            cache: RasterCache::new(),
        }
    }

    pub fn sizing(&self) -> ScreenshotSizing {
        self.sizing
    }

    /// Update sizing; invalidates the cache when it changed
    pub fn set_sizing(&mut self, sizing: ScreenshotSizing) -> bool {
        if sizing == self.sizing {
            return false;
        }
        self.sizing = sizing;
        self.cache.invalidate();
        true
    }

    pub fn cache(&self) -> &RasterCache<R> {
        &self.cache
    }

    /// Capture the current frame of `video`.
    ///
    /// Returns `None` while no frame has been decoded, or when rasterizing or
    /// encoding fails.
    pub fn capture<F>(&mut self, video: &R::Source, options: &ScreenshotOptions, create: F) -> Option<String>
    where
        F: FnOnce(CanvasSize) -> MediaResult<R>,
    {
        let dims = video.dimensions();
        if !dims.has_frame() {
            debug!("Screenshot requested before the first frame was decoded");
            return None;
        }

        let sizing = self.sizing;
        let raster = match self.cache.get_or_try_init(|| sizing.canvas_size(dims), create) {
            Ok(raster) => raster,
            Err(error) => {
                warn!("Could not create screenshot raster: {}", error);
                return None;
            }
        };

        match draw_frame(raster, video, options) {
            Ok(data_url) => Some(data_url),
            Err(error) => {
                warn!("Screenshot failed: {}", error);
                None
            }
        }
    }
}

/// Draw one frame and encode it. The raster transform is left as found.
pub fn draw_frame<R: RasterSurface>(
    raster: &mut R,
    video: &R::Source,
    options: &ScreenshotOptions,
) -> MediaResult<String> {
    let size = raster.size();
    let (width, height) = (size.width as f64, size.height as f64);

    if options.mirrored {
        raster.translate(width, 0.0);
        raster.scale(-1.0, 1.0);
    }

    raster.set_image_smoothing_enabled(options.image_smoothing);
    let drawn = raster.draw_video(video, width, height);

    if options.mirrored {
        raster.scale(-1.0, 1.0);
        raster.translate(-width, 0.0);
    }

    drawn?;
    raster.to_data_url(options.format, options.quality)
}
