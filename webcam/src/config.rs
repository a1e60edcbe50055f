//! Component configuration and defaults

use crate::{WebcamError, WebcamResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use webcam_media::{
    ImageFormat, Presentation, ScreenshotOptions, ScreenshotSizing, TrackConstraints,
    UserMediaRequest, DEFAULT_QUALITY,
};

/// Webcam component configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebcamConfig {
    /// Capture audio. When false the request carries no audio member at all.
    pub audio: bool,
    /// Audio constraints (defaults to `true`)
    pub audio_constraints: Option<TrackConstraints>,
    /// Video constraints (defaults to `true`)
    pub video_constraints: Option<TrackConstraints>,
    /// Mirror the preview and screenshots horizontally
    pub mirrored: bool,
    /// Interpolate when scaling frames into a screenshot
    pub image_smoothing: bool,
    /// Screenshot encoding
    pub screenshot_format: ImageFormat,
    /// Screenshot encoder quality in 0..=1
    pub screenshot_quality: f64,
    /// Minimum screenshot width; zero is treated as unset
    pub min_screenshot_width: Option<u32>,
    /// Minimum screenshot height; zero is treated as unset
    pub min_screenshot_height: Option<u32>,
    /// Screenshot at the native decoded size instead of the rendered size
    pub force_screenshot_source_size: bool,
    /// Caller-supplied CSS transform of the preview
    pub style_transform: Option<String>,
    /// Attributes passed through to the preview surface
    pub attributes: BTreeMap<String, String>,
}

impl Default for WebcamConfig {
    fn default() -> Self {
        Self {
            audio: true,
            audio_constraints: None,
            video_constraints: None,
            mirrored: false,
            image_smoothing: true,
            screenshot_format: ImageFormat::Webp,
            screenshot_quality: DEFAULT_QUALITY,
            min_screenshot_width: None,
            min_screenshot_height: None,
            force_screenshot_source_size: false,
            style_transform: None,
            attributes: BTreeMap::new(),
        }
    }
}

impl WebcamConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> WebcamResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> WebcamResult<()> {
        if !(0.0..=1.0).contains(&self.screenshot_quality) {
            return Err(WebcamError::InvalidConfiguration {
                field: "screenshot_quality".to_string(),
                reason: format!("{} is outside 0..=1", self.screenshot_quality),
            });
        }
        Ok(())
    }

    /// What to ask the platform for
    pub fn request(&self) -> UserMediaRequest {
        UserMediaRequest::new(self.audio_constraints.clone(), self.video_constraints.clone())
    }

    /// Whether switching to `other` requires a new stream
    pub fn acquisition_changed(&self, other: &WebcamConfig) -> bool {
        self.audio != other.audio
            || self.audio_constraints != other.audio_constraints
            || self.video_constraints != other.video_constraints
    }

    /// Settings that decide the screenshot raster size
    pub fn screenshot_sizing(&self) -> ScreenshotSizing {
        ScreenshotSizing {
            force_source_size: self.force_screenshot_source_size,
            min_width: self.min_screenshot_width,
            min_height: self.min_screenshot_height,
        }
    }

    /// Per-capture settings
    pub fn screenshot_options(&self) -> ScreenshotOptions {
        ScreenshotOptions {
            format: self.screenshot_format,
            quality: self.screenshot_quality,
            image_smoothing: self.image_smoothing,
            mirrored: self.mirrored,
        }
    }

    /// Preview attributes. Local playback is muted whenever audio is
    /// captured.
    pub fn presentation(&self) -> Presentation {
        Presentation {
            autoplay: true,
            plays_inline: true,
            muted: self.audio,
            transform: Presentation::mirrored_transform(self.style_transform.as_deref(), self.mirrored),
            attributes: self.attributes.clone(),
        }
    }
}
