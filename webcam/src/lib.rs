//! # Webcam
//!
//! A webcam component: binds a camera stream to a preview surface and captures
//! still frames as data URLs.
//!
//! ## Key Features
//!
//! - **Fallback acquisition**: standard `getUserMedia`, vendor-prefixed
//!   variants and legacy source enumeration, with one relaxed retry when
//!   constraints cannot be met
//! - **Lifecycle aware**: reacquires when constraints change, releases every
//!   track on unmount, discards superseded streams
//! - **Screenshots**: WebP, PNG or JPEG data URLs, optionally mirrored
//! - **Pluggable platforms**: browser bindings behind the `web` feature and an
//!   in-memory software platform everywhere
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use webcam::software::SoftwareVideo;
//! use webcam::{SoftwarePlatform, Webcam};
//!
//! # async fn example() -> Result<(), webcam::WebcamError> {
//! let webcam = Webcam::builder(SoftwarePlatform::default())
//!     .audio(false)
//!     .mirrored(true)
//!     .on_user_media_error(|message| eprintln!("camera unavailable: {message}"))
//!     .build(SoftwareVideo::new(640))?;
//!
//! webcam.mount().await;
//! webcam.with_video(|video| video.decode_frame());
//! if let Some(data_url) = webcam.get_screenshot() {
//!     println!("{} bytes", data_url.len());
//! }
//! webcam.unmount();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod component;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;

// Re-export main API types
pub use component::{Webcam, WebcamBuilder, WebcamCallbacks, WebcamState, UNSUPPORTED_MESSAGE};
pub use config::WebcamConfig;
pub use error::{WebcamError, WebcamResult};
pub use event::{EventStream, WebcamEvent};

// Re-export media types for easy access
pub use webcam_media::{
    software, CaptureHandle, ErrorCategory, ImageFormat, MediaError, MediaKind, MediaStream,
    MediaTrack, MediaTrackConstraints, Platform, ScreenshotOptions, SoftwareEnvironment,
    SoftwarePlatform, TrackConstraints, UserMediaRequest, VendorPrefix,
};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use webcam_media::web;
