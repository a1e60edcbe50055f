//! # Webcam Media
//!
//! User media acquisition with vendor and legacy fallbacks, the display
//! surface a capture stream is bound to, and still-frame capture encoded as
//! data URLs. Platform backends implement the traits in [`platform`],
//! [`video_surface`] and [`raster`]; an in-memory [`software`] platform is
//! always available and a browser backend is compiled with the `web` feature
//! on `wasm32`.

#![warn(clippy::all)]

pub mod capture;
pub mod constraints;
pub mod error;
pub mod platform;
pub mod raster;
pub mod screenshot;
pub mod software;
pub mod tracks;
pub mod video_surface;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod web;

// Re-export main types
pub use capture::{
    CaptureProbe, ExecutionContext, ProbeKind, SourceEnumerator, SourceInfo, UserMediaManager,
    VendorPrefix,
};
pub use constraints::{
    ConstrainDomString, ConstrainDouble, ConstrainULong, MediaTrackConstraints, SourceConstraint,
    StreamConstraints, TrackConstraints, UserMediaRequest,
};
pub use error::{ErrorCategory, IntoMediaError, MediaError, MediaResult};
pub use platform::Platform;
pub use raster::{CanvasSize, RasterSurface, Transform2D};
pub use screenshot::{
    ImageFormat, RasterCache, ScreenshotCapturer, ScreenshotOptions, ScreenshotSizing,
    DEFAULT_QUALITY,
};
pub use software::{SoftwareEnvironment, SoftwarePlatform};
pub use tracks::{CaptureHandle, MediaKind, MediaStream, MediaTrack};
pub use video_surface::{Presentation, VideoDimensions, VideoSurface};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use web::WebPlatform;
