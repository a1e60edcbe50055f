//! In-memory platform
//!
//! Simulated cameras and microphones, a video surface fed by their frames and
//! an RGBA raster canvas that encodes real PNG/JPEG/WebP images. Used as the
//! native platform and by the test suites; the [`SoftwareEnvironment`] handle
//! scripts capabilities, permission and failures and records every request.

pub mod canvas;
pub mod devices;
pub mod stream;
pub mod video;

pub use canvas::SoftwareCanvas;
pub use devices::{test_pattern, SoftwareDevice, SoftwareProbe, SoftwareSourceEnumerator};
pub use stream::{SoftwareStream, SoftwareTrack};
pub use video::SoftwareVideo;

use crate::capture::{ExecutionContext, ProbeKind, UserMediaManager, VendorPrefix};
use crate::constraints::StreamConstraints;
use crate::error::{MediaError, MediaResult};
use crate::platform::Platform;
use crate::raster::CanvasSize;
use crate::tracks::{CaptureHandle, MediaKind, MediaTrack};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;

/// One request seen by a software probe
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub probe: ProbeKind,
    pub constraints: StreamConstraints,
}

struct EnvironmentState {
    context: ExecutionContext,
    standard_api: bool,
    prefixed_apis: Vec<VendorPrefix>,
    legacy_sources: bool,
    permission_granted: bool,
    bare_tracks: bool,
    devices: Vec<SoftwareDevice>,
    scripted_failures: VecDeque<MediaError>,
    requests: Vec<RecordedRequest>,
    issued_tracks: Vec<SoftwareTrack>,
    paused: bool,
    pending: VecDeque<oneshot::Sender<()>>,
}

/// Shared handle onto a simulated device environment
#[derive(Clone)]
pub struct SoftwareEnvironment {
    state: Rc<RefCell<EnvironmentState>>,
}

impl SoftwareEnvironment {
    /// Window context with the standard API, one 640x480 camera and one
    /// microphone, permission granted
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(EnvironmentState {
                context: ExecutionContext::Window,
                standard_api: true,
                prefixed_apis: Vec::new(),
                legacy_sources: false,
                permission_granted: true,
                bare_tracks: false,
                devices: vec![
                    SoftwareDevice::camera("camera-0", 640, 480),
                    SoftwareDevice::microphone("microphone-0"),
                ],
                scripted_failures: VecDeque::new(),
                requests: Vec::new(),
                issued_tracks: Vec::new(),
                paused: false,
                pending: VecDeque::new(),
            })),
        }
    }

    /// No window at all
    pub fn headless(self) -> Self {
        self.state.borrow_mut().context = ExecutionContext::Headless;
        self
    }

    pub fn without_standard_api(self) -> Self {
        self.state.borrow_mut().standard_api = false;
        self
    }

    pub fn with_prefixed_api(self, prefix: VendorPrefix) -> Self {
        self.state.borrow_mut().prefixed_apis.push(prefix);
        self
    }

    /// Expose `MediaStreamTrack.getSources`
    pub fn with_legacy_sources(self) -> Self {
        self.state.borrow_mut().legacy_sources = true;
        self
    }

    pub fn without_devices(self) -> Self {
        self.state.borrow_mut().devices.clear();
        self
    }

    pub fn with_device(self, device: SoftwareDevice) -> Self {
        self.state.borrow_mut().devices.push(device);
        self
    }

    pub fn deny_permission(self) -> Self {
        self.state.borrow_mut().permission_granted = false;
        self
    }

    /// Resolve single-track requests with a bare track instead of a stream
    pub fn resolve_bare_tracks(self) -> Self {
        self.state.borrow_mut().bare_tracks = true;
        self
    }

    pub fn context(&self) -> ExecutionContext {
        self.state.borrow().context
    }

    pub fn devices(&self) -> Vec<SoftwareDevice> {
        self.state.borrow().devices.clone()
    }

    pub fn set_permission(&self, granted: bool) {
        self.state.borrow_mut().permission_granted = granted;
    }

    /// Fail the next acquisition with `error`, ahead of any device checks
    pub fn fail_next(&self, error: MediaError) {
        self.state.borrow_mut().scripted_failures.push_back(error);
    }

    /// Hold subsequent requests until [`SoftwareEnvironment::release_next`]
    pub fn pause_requests(&self) {
        self.state.borrow_mut().paused = true;
    }

    /// Let the oldest held request proceed
    pub fn release_next(&self) -> bool {
        let sender = self.state.borrow_mut().pending.pop_front();
        match sender {
            Some(sender) => sender.send(()).is_ok(),
            None => false,
        }
    }

    pub fn pending_requests(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.borrow().requests.clone()
    }

    /// Every track handed out so far
    pub fn issued_tracks(&self) -> Vec<SoftwareTrack> {
        self.state.borrow().issued_tracks.clone()
    }

    /// Tracks still holding a device
    pub fn live_tracks(&self) -> usize {
        self.state
            .borrow()
            .issued_tracks
            .iter()
            .filter(|track| track.is_live())
            .count()
    }

    pub(crate) fn exposes(&self, kind: ProbeKind) -> bool {
        let state = self.state.borrow();
        if state.context == ExecutionContext::Headless {
            return false;
        }
        match kind {
            ProbeKind::Standard => state.standard_api,
            ProbeKind::Prefixed(prefix) => state.prefixed_apis.contains(&prefix),
        }
    }

    pub(crate) fn exposes_legacy_sources(&self) -> bool {
        let state = self.state.borrow();
        state.context == ExecutionContext::Window && state.legacy_sources
    }

    pub(crate) fn record_request(
        &self,
        probe: ProbeKind,
        constraints: &StreamConstraints,
    ) -> Option<oneshot::Receiver<()>> {
        let mut state = self.state.borrow_mut();
        state.requests.push(RecordedRequest {
            probe,
            constraints: constraints.clone(),
        });
        if state.paused {
            let (sender, receiver) = oneshot::channel();
            state.pending.push_back(sender);
            Some(receiver)
        } else {
            None
        }
    }

    pub(crate) fn grant(&self, constraints: &StreamConstraints) -> MediaResult<CaptureHandle<SoftwareStream>> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.scripted_failures.pop_front() {
            return Err(error);
        }
        if !state.permission_granted {
            return Err(MediaError::from_platform("NotAllowedError", "Permission denied"));
        }
        if !constraints.requests_audio() && !constraints.requests_video() {
            return Err(MediaError::from_platform(
                "TypeError",
                "At least one of audio and video must be requested",
            ));
        }

        let mut tracks = Vec::new();
        for (kind, requested) in [
            (MediaKind::Video, constraints.video.as_ref()),
            (MediaKind::Audio, constraints.audio.as_ref()),
        ] {
            if let Some(requested) = requested.filter(|c| c.is_enabled()) {
                let device = devices::select_device(&state.devices, kind, requested)?;
                tracks.push(device.open());
            }
        }

        debug!("Software environment granted {} tracks", tracks.len());
        state.issued_tracks.extend(tracks.iter().cloned());

        if state.bare_tracks && tracks.len() == 1 {
            return Ok(CaptureHandle::Track(tracks.remove(0)));
        }
        Ok(CaptureHandle::Stream(SoftwareStream::new(tracks)))
    }
}

impl Default for SoftwareEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform backed by a [`SoftwareEnvironment`]
pub struct SoftwarePlatform {
    env: SoftwareEnvironment,
    user_media: UserMediaManager<SoftwareStream>,
}

impl SoftwarePlatform {
    pub fn new(env: SoftwareEnvironment) -> Self {
        let mut user_media = UserMediaManager::new(env.context())
            .with_probe(Box::new(SoftwareProbe::new(ProbeKind::Standard, env.clone())));
        for prefix in VendorPrefix::ALL {
            user_media = user_media.with_probe(Box::new(SoftwareProbe::new(
                ProbeKind::Prefixed(prefix),
                env.clone(),
            )));
        }
        let user_media =
            user_media.with_source_enumerator(Box::new(SoftwareSourceEnumerator::new(env.clone())));

        Self { env, user_media }
    }

    pub fn environment(&self) -> &SoftwareEnvironment {
        &self.env
    }
}

impl Default for SoftwarePlatform {
    fn default() -> Self {
        Self::new(SoftwareEnvironment::default())
    }
}

impl Platform for SoftwarePlatform {
    type Stream = SoftwareStream;
    type Video = SoftwareVideo;
    type Raster = SoftwareCanvas;

    fn user_media(&self) -> &UserMediaManager<SoftwareStream> {
        &self.user_media
    }

    fn create_raster(&self, size: CanvasSize) -> MediaResult<SoftwareCanvas> {
        Ok(SoftwareCanvas::new(size))
    }
}
