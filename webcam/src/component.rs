//! The webcam component
//!
//! Owns one preview surface, acquires a capture stream for it when mounted,
//! reacquires when the acquisition settings change and releases everything on
//! unmount. Screenshots are taken from whatever frame the preview currently
//! shows.
//!
//! All state sits behind a `RefCell` that is never borrowed across an
//! `.await`, so `update()` and `unmount()` can run while an acquisition is
//! still pending. Every acquisition is tagged with a generation; a stream
//! that arrives for an outdated generation is stopped and discarded.

use crate::event::EventBus;
use crate::{EventStream, WebcamConfig, WebcamEvent, WebcamResult};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};
use webcam_media::{
    CaptureHandle, MediaError, MediaResult, Platform, ScreenshotCapturer, ScreenshotOptions,
    VideoSurface,
};

/// Message reported when no capture capability exists
pub const UNSUPPORTED_MESSAGE: &str = "getUserMedia not supported";

/// Component lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebcamState {
    /// Created, not mounted
    Idle,
    /// First acquisition in flight
    Acquiring,
    /// A stream is bound to the preview
    Live,
    /// Previous stream released, new acquisition in flight
    Reacquiring,
    /// Unmounted
    Stopped,
    /// Last acquisition failed
    Failed,
}

impl fmt::Display for WebcamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WebcamState::Idle => "idle",
            WebcamState::Acquiring => "acquiring",
            WebcamState::Live => "live",
            WebcamState::Reacquiring => "reacquiring",
            WebcamState::Stopped => "stopped",
            WebcamState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Success and failure callbacks
#[derive(Clone, Default)]
pub struct WebcamCallbacks {
    /// Invoked once per successful acquisition
    pub on_user_media: Option<Rc<dyn Fn()>>,
    /// Invoked once per failed acquisition with the error message
    pub on_user_media_error: Option<Rc<dyn Fn(&str)>>,
}

impl fmt::Debug for WebcamCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebcamCallbacks")
            .field("on_user_media", &self.on_user_media.is_some())
            .field("on_user_media_error", &self.on_user_media_error.is_some())
            .finish()
    }
}

/// Callback to run once the state borrow is released
enum Notification {
    Success(Option<Rc<dyn Fn()>>),
    Failure(Option<Rc<dyn Fn(&str)>>, String),
}

impl Notification {
    fn deliver(self) {
        match self {
            Notification::Success(Some(callback)) => callback(),
            Notification::Failure(Some(callback), message) => callback(message.as_str()),
            Notification::Success(None) | Notification::Failure(None, _) => {}
        }
    }
}

struct WebcamInner<P: Platform> {
    config: WebcamConfig,
    callbacks: WebcamCallbacks,
    video: P::Video,
    state: WebcamState,
    mounted: bool,
    generation: u64,
    stream: Option<CaptureHandle<P::Stream>>,
    object_url: Option<String>,
    has_user_media: bool,
    capturer: ScreenshotCapturer<P::Raster>,
    events: EventBus,
}

impl<P: Platform> WebcamInner<P> {
    fn set_state(&mut self, to: WebcamState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!("Webcam state {} -> {}", from, to);
        self.events.emit(WebcamEvent::StateChanged { from, to });
    }

    fn apply_presentation(&mut self) {
        let presentation = self.config.presentation();
        self.video.apply_presentation(&presentation);
    }

    /// Bind `handle` to the preview, falling back to an object URL
    fn bind(&mut self, handle: &CaptureHandle<P::Stream>) -> MediaResult<()> {
        match self.video.bind_stream(handle) {
            Ok(()) => Ok(()),
            Err(error) => {
                debug!("srcObject binding unavailable ({}), using an object URL", error);
                let url = self.video.create_object_url(handle)?;
                self.video.set_source_url(Some(&url));
                self.object_url = Some(url);
                Ok(())
            }
        }
    }

    /// Stop every held track and revoke any derived object URL.
    /// Returns whether a stream was held.
    fn release_stream(&mut self) -> bool {
        let released = match self.stream.take() {
            Some(handle) => {
                let stream_id = handle.id();
                let tracks_stopped = handle.stop();
                info!("Released stream {} ({} tracks stopped)", stream_id, tracks_stopped);
                self.events.emit(WebcamEvent::StreamReleased {
                    stream_id,
                    tracks_stopped,
                });
                true
            }
            None => false,
        };

        if let Some(url) = self.object_url.take() {
            self.video.set_source_url(None);
            self.video.revoke_object_url(&url);
        }
        self.video.detach();
        self.has_user_media = false;
        released
    }

    fn fail(&mut self, error: &MediaError) -> Notification {
        let message = error.to_string();
        warn!("User media request failed: {}", message);
        self.has_user_media = false;
        self.set_state(WebcamState::Failed);
        self.events.emit(WebcamEvent::UserMediaError {
            message: message.clone(),
            category: error.category(),
        });
        Notification::Failure(self.callbacks.on_user_media_error.clone(), message)
    }

    fn fail_unsupported(&mut self) -> Notification {
        warn!("No capture capability available");
        self.has_user_media = false;
        self.set_state(WebcamState::Failed);
        self.events.emit(WebcamEvent::UserMediaError {
            message: UNSUPPORTED_MESSAGE.to_string(),
            category: webcam_media::ErrorCategory::Platform,
        });
        Notification::Failure(
            self.callbacks.on_user_media_error.clone(),
            UNSUPPORTED_MESSAGE.to_string(),
        )
    }

    /// Settle an acquisition. Returns the callback to run, if any.
    fn settle(
        &mut self,
        generation: u64,
        result: MediaResult<CaptureHandle<P::Stream>>,
    ) -> Option<Notification> {
        if !self.mounted || generation != self.generation {
            match result {
                Ok(handle) => {
                    let stopped = handle.stop();
                    debug!(
                        "Discarded superseded stream {} ({} tracks stopped)",
                        handle.id(),
                        stopped
                    );
                }
                Err(error) => debug!("Ignoring failure of superseded request: {}", error),
            }
            return None;
        }

        let handle = match result {
            Ok(handle) => handle,
            Err(error) => return Some(self.fail(&error)),
        };

        if let Err(error) = self.bind(&handle) {
            handle.stop();
            return Some(self.fail(&error));
        }

        let stream_id = handle.id();
        self.stream = Some(handle);
        self.has_user_media = true;
        self.set_state(WebcamState::Live);
        self.events.emit(WebcamEvent::UserMedia { stream_id });
        Some(Notification::Success(self.callbacks.on_user_media.clone()))
    }
}

/// Live camera preview with screenshot support
pub struct Webcam<P: Platform> {
    platform: P,
    inner: RefCell<WebcamInner<P>>,
}

impl<P: Platform> Webcam<P> {
    /// Start building a component on `platform`
    pub fn builder(platform: P) -> WebcamBuilder<P> {
        WebcamBuilder::new(platform)
    }

    /// Create a component around the preview surface `video`
    pub fn new(
        platform: P,
        video: P::Video,
        config: WebcamConfig,
        callbacks: WebcamCallbacks,
    ) -> WebcamResult<Self> {
        config.validate()?;
        let capturer = ScreenshotCapturer::new(config.screenshot_sizing());
        Ok(Self {
            platform,
            inner: RefCell::new(WebcamInner {
                config,
                callbacks,
                video,
                state: WebcamState::Idle,
                mounted: false,
                generation: 0,
                stream: None,
                object_url: None,
                has_user_media: false,
                capturer,
                events: EventBus::default(),
            }),
        })
    }

    /// Attach the component: configure the preview and acquire media
    pub async fn mount(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.mounted {
                debug!("Webcam already mounted");
                return;
            }
            inner.mounted = true;
            inner.apply_presentation();
        }
        self.request_user_media(WebcamState::Acquiring).await;
    }

    /// Apply a new configuration.
    ///
    /// A change of the audio flag or of either constraint set stops every held
    /// track and acquires again. Other changes only reconfigure the preview
    /// and the screenshot pipeline.
    pub async fn update(&self, config: WebcamConfig) -> WebcamResult<()> {
        config.validate()?;

        let next_state = {
            let mut inner = self.inner.borrow_mut();
            let reacquire = inner.mounted && inner.config.acquisition_changed(&config);
            if inner.capturer.set_sizing(config.screenshot_sizing()) {
                debug!("Screenshot sizing changed");
            }
            inner.config = config;
            inner.apply_presentation();

            if reacquire {
                info!("Acquisition settings changed, reacquiring user media");
                Some(if inner.release_stream() {
                    WebcamState::Reacquiring
                } else {
                    WebcamState::Acquiring
                })
            } else {
                None
            }
        };

        if let Some(state) = next_state {
            self.request_user_media(state).await;
        }
        Ok(())
    }

    /// Replace the success and failure callbacks
    pub fn set_callbacks(&self, callbacks: WebcamCallbacks) {
        self.inner.borrow_mut().callbacks = callbacks;
    }

    /// Detach the component, stopping every held track
    pub fn unmount(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.mounted {
            return;
        }
        inner.mounted = false;
        // Invalidates any acquisition still in flight.
        inner.generation += 1;
        inner.release_stream();
        inner.set_state(WebcamState::Stopped);
    }

    async fn request_user_media(&self, state: WebcamState) {
        let user_media = self.platform.user_media();

        let pending = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            if user_media.can_get_user_media() {
                inner.set_state(state);
                Ok((inner.generation, inner.config.request(), !inner.config.audio))
            } else {
                Err(inner.fail_unsupported())
            }
        };

        let (generation, request, muted) = match pending {
            Ok(pending) => pending,
            Err(notification) => {
                notification.deliver();
                return;
            }
        };

        let result = user_media.request_user_media(&request, muted).await;

        let notification = self.inner.borrow_mut().settle(generation, result);
        if let Some(notification) = notification {
            notification.deliver();
        }
    }

    /// Capture the current frame with the configured options.
    ///
    /// `None` until a stream is bound and its first frame decoded.
    pub fn get_screenshot(&self) -> Option<String> {
        let options = self.inner.borrow().config.screenshot_options();
        self.get_screenshot_with(&options)
    }

    /// Capture the current frame with per-call options
    pub fn get_screenshot_with(&self, options: &ScreenshotOptions) -> Option<String> {
        let mut inner = self.inner.borrow_mut();
        if !inner.has_user_media {
            return None;
        }
        let WebcamInner { video, capturer, .. } = &mut *inner;
        let platform = &self.platform;
        capturer.capture(video, options, |size| platform.create_raster(size))
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> EventStream {
        self.inner.borrow_mut().events.subscribe()
    }

    /// Current lifecycle state
    pub fn state(&self) -> WebcamState {
        self.inner.borrow().state
    }

    /// Whether a stream is currently bound to the preview
    pub fn has_user_media(&self) -> bool {
        self.inner.borrow().has_user_media
    }

    /// Whether the component is mounted
    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().mounted
    }

    /// Current configuration
    pub fn config(&self) -> WebcamConfig {
        self.inner.borrow().config.clone()
    }

    /// ID of the bound stream
    pub fn stream_id(&self) -> Option<String> {
        self.inner.borrow().stream.as_ref().map(CaptureHandle::id)
    }

    /// Object URL the preview is reading from, when `srcObject` was unavailable
    pub fn object_url(&self) -> Option<String> {
        self.inner.borrow().object_url.clone()
    }

    /// Platform the component acquires from
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Run `f` against the preview surface
    pub fn with_video<R>(&self, f: impl FnOnce(&mut P::Video) -> R) -> R {
        f(&mut self.inner.borrow_mut().video)
    }
}

impl<P: Platform> Drop for Webcam<P> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.mounted {
            inner.mounted = false;
            inner.release_stream();
        }
    }
}

impl<P: Platform> fmt::Debug for Webcam<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Webcam")
                .field("state", &inner.state)
                .field("mounted", &inner.mounted)
                .field("generation", &inner.generation)
                .field("has_user_media", &inner.has_user_media)
                .finish(),
            Err(_) => f.debug_struct("Webcam").finish_non_exhaustive(),
        }
    }
}

/// Fluent builder for a [`Webcam`]
pub struct WebcamBuilder<P: Platform> {
    platform: P,
    config: WebcamConfig,
    callbacks: WebcamCallbacks,
}

impl<P: Platform> WebcamBuilder<P> {
    /// Builder with the default configuration
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            config: WebcamConfig::default(),
            callbacks: WebcamCallbacks::default(),
        }
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: WebcamConfig) -> Self {
        self.config = config;
        self
    }

    /// Capture audio
    pub fn audio(mut self, enabled: bool) -> Self {
        self.config.audio = enabled;
        self
    }

    /// Audio constraints
    pub fn audio_constraints(mut self, constraints: impl Into<webcam_media::TrackConstraints>) -> Self {
        self.config.audio_constraints = Some(constraints.into());
        self
    }

    /// Video constraints
    pub fn video_constraints(mut self, constraints: impl Into<webcam_media::TrackConstraints>) -> Self {
        self.config.video_constraints = Some(constraints.into());
        self
    }

    /// Mirror preview and screenshots
    pub fn mirrored(mut self, mirrored: bool) -> Self {
        self.config.mirrored = mirrored;
        self
    }

    /// Interpolate when scaling screenshots
    pub fn image_smoothing(mut self, enabled: bool) -> Self {
        self.config.image_smoothing = enabled;
        self
    }

    /// Screenshot encoding
    pub fn screenshot_format(mut self, format: webcam_media::ImageFormat) -> Self {
        self.config.screenshot_format = format;
        self
    }

    /// Screenshot encoder quality in 0..=1
    pub fn screenshot_quality(mut self, quality: f64) -> Self {
        self.config.screenshot_quality = quality;
        self
    }

    /// Minimum screenshot width
    pub fn min_screenshot_width(mut self, width: u32) -> Self {
        self.config.min_screenshot_width = Some(width);
        self
    }

    /// Minimum screenshot height
    pub fn min_screenshot_height(mut self, height: u32) -> Self {
        self.config.min_screenshot_height = Some(height);
        self
    }

    /// Screenshot at the native decoded size
    pub fn force_screenshot_source_size(mut self, force: bool) -> Self {
        self.config.force_screenshot_source_size = force;
        self
    }

    /// Base CSS transform of the preview; the mirror flip is appended to it
    pub fn style_transform(mut self, transform: &str) -> Self {
        self.config.style_transform = Some(transform.to_string());
        self
    }

    /// Pass an attribute through to the preview surface
    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.config.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Callback for each successful acquisition
    pub fn on_user_media(mut self, callback: impl Fn() + 'static) -> Self {
        self.callbacks.on_user_media = Some(Rc::new(callback));
        self
    }

    /// Callback for each failed acquisition
    pub fn on_user_media_error(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.callbacks.on_user_media_error = Some(Rc::new(callback));
        self
    }

    /// Validate the configuration and create the component
    pub fn build(self, video: P::Video) -> WebcamResult<Webcam<P>> {
        Webcam::new(self.platform, video, self.config, self.callbacks)
    }
}

impl<P: Platform> fmt::Debug for WebcamBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebcamBuilder")
            .field("config", &self.config)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

