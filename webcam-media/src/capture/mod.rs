//! User media acquisition
//!
//! The platform exposes its capture capability through an ordered list of
//! probes: the standard `mediaDevices.getUserMedia`, then the vendor-prefixed
//! callback APIs. The legacy `MediaStreamTrack.getSources` enumeration is a
//! separate capability used to pick source ids when the standard API is
//! missing. [`UserMediaManager`] evaluates them in priority order and gives
//! every path the same `MediaResult` contract.

pub mod legacy;

use crate::constraints::{StreamConstraints, UserMediaRequest};
use crate::error::{MediaError, MediaResult};
use crate::tracks::{CaptureHandle, MediaKind, MediaStream};
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info, warn};

/// Vendor prefix of a legacy `getUserMedia` implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorPrefix {
    Moz,
    Webkit,
    Ms,
}

impl VendorPrefix {
    /// Prefixes in the order they are tried
    pub const ALL: [VendorPrefix; 3] = [VendorPrefix::Moz, VendorPrefix::Webkit, VendorPrefix::Ms];

    /// Name of the prefixed function on `navigator`
    pub fn function_name(self) -> &'static str {
        match self {
            VendorPrefix::Moz => "mozGetUserMedia",
            VendorPrefix::Webkit => "webkitGetUserMedia",
            VendorPrefix::Ms => "msGetUserMedia",
        }
    }
}

/// Identifies a capture capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// `navigator.mediaDevices.getUserMedia`
    Standard,
    /// `navigator.<prefix>GetUserMedia`
    Prefixed(VendorPrefix),
}

impl ProbeKind {
    fn priority(self) -> u8 {
        match self {
            ProbeKind::Standard => 0,
            ProbeKind::Prefixed(VendorPrefix::Moz) => 1,
            ProbeKind::Prefixed(VendorPrefix::Webkit) => 2,
            ProbeKind::Prefixed(VendorPrefix::Ms) => 3,
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Standard => f.write_str("mediaDevices.getUserMedia"),
            ProbeKind::Prefixed(prefix) => f.write_str(prefix.function_name()),
        }
    }
}

/// Execution context the component runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A window (and navigator) exists
    Window,
    /// No window, e.g. server-side rendering
    Headless,
}

/// One capture capability
#[async_trait(?Send)]
pub trait CaptureProbe {
    type Stream: MediaStream;

    fn kind(&self) -> ProbeKind;

    /// Whether the platform exposes this capability
    fn is_available(&self) -> bool;

    /// Ask the platform for a stream; suspends until access is granted or denied
    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> MediaResult<CaptureHandle<Self::Stream>>;
}

/// Source reported by legacy device enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: String,
    pub kind: MediaKind,
    pub label: String,
}

/// Legacy device enumeration capability (`MediaStreamTrack.getSources`)
#[async_trait(?Send)]
pub trait SourceEnumerator {
    fn is_available(&self) -> bool;

    async fn get_sources(&self) -> MediaResult<Vec<SourceInfo>>;
}

/// Negotiates user media across the available capabilities
pub struct UserMediaManager<S: MediaStream> {
    context: ExecutionContext,
    probes: Vec<Box<dyn CaptureProbe<Stream = S>>>,
    enumerator: Option<Box<dyn SourceEnumerator>>,
}

impl<S: MediaStream> UserMediaManager<S> {
    /// Create a manager with no capabilities registered
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            probes: Vec::new(),
            enumerator: None,
        }
    }

    /// Register a capture probe. Probes are kept in priority order.
    pub fn with_probe(mut self, probe: Box<dyn CaptureProbe<Stream = S>>) -> Self {
        self.probes.push(probe);
        self.probes.sort_by_key(|probe| probe.kind().priority());
        self
    }

    /// Register the legacy source enumerator
    pub fn with_source_enumerator(mut self, enumerator: Box<dyn SourceEnumerator>) -> Self {
        self.enumerator = Some(enumerator);
        self
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Whether any capture capability exists in this context
    pub fn can_get_user_media(&self) -> bool {
        self.context == ExecutionContext::Window && self.active_probe().is_some()
    }

    /// Capability acquisition goes through, if any
    pub fn active_probe_kind(&self) -> Option<ProbeKind> {
        self.active_probe().map(|probe| probe.kind())
    }

    fn active_probe(&self) -> Option<&dyn CaptureProbe<Stream = S>> {
        self.probes
            .iter()
            .find(|probe| probe.is_available())
            .map(|probe| probe.as_ref())
    }

    fn has_standard_api(&self) -> bool {
        self.probes
            .iter()
            .any(|probe| probe.kind() == ProbeKind::Standard && probe.is_available())
    }

    fn legacy_enumerator(&self) -> Option<&dyn SourceEnumerator> {
        self.enumerator
            .as_deref()
            .filter(|enumerator| enumerator.is_available())
    }

    /// Acquire a capture stream for `request`.
    ///
    /// Audio is only requested when `muted` is false. A constraint failure is
    /// retried once with video relaxed to a plain `true`.
    pub async fn request_user_media(
        &self,
        request: &UserMediaRequest,
        muted: bool,
    ) -> MediaResult<CaptureHandle<S>> {
        if !self.can_get_user_media() {
            return Err(MediaError::UnsupportedPlatform {
                platform: match self.context {
                    ExecutionContext::Headless => "headless context".to_string(),
                    ExecutionContext::Window => "no getUserMedia implementation".to_string(),
                },
            });
        }

        if !self.has_standard_api() {
            if let Some(enumerator) = self.legacy_enumerator() {
                debug!("Standard getUserMedia missing, selecting sources through getSources");
                let legacy_request = legacy::request_legacy_sources(enumerator, request, muted).await?;
                return self.source_selected(&legacy_request, muted).await;
            }
        }

        self.source_selected(request, muted).await
    }

    async fn source_selected(
        &self,
        request: &UserMediaRequest,
        muted: bool,
    ) -> MediaResult<CaptureHandle<S>> {
        let constraints = StreamConstraints::effective(request, muted);
        self.get_any_user_media(&constraints).await
    }

    /// Acquire with `constraints`, relaxing video once on a constraint failure
    pub async fn get_any_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> MediaResult<CaptureHandle<S>> {
        match self.get_user_media(constraints).await {
            Ok(handle) => Ok(handle),
            Err(error) if error.is_constraint_failure() => {
                let dropped_device = constraints
                    .video
                    .as_ref()
                    .and_then(|video| video.as_constrained())
                    .is_some_and(|video| video.device_id.is_some() || !video.optional.is_empty());
                if dropped_device {
                    warn!(
                        "Video device constraint could not be satisfied ({}), retrying with any camera",
                        error
                    );
                } else {
                    info!("Constraints not satisfiable ({}), retrying with video=true", error);
                }
                self.get_user_media(&constraints.with_video_forced()).await
            }
            Err(error) => Err(error),
        }
    }

    async fn get_user_media(&self, constraints: &StreamConstraints) -> MediaResult<CaptureHandle<S>> {
        let probe = self.active_probe().ok_or_else(|| MediaError::UnsupportedPlatform {
            platform: "no getUserMedia implementation".to_string(),
        })?;

        debug!(probe = %probe.kind(), ?constraints, "Requesting user media");
        let handle = probe.get_user_media(constraints).await?;
        info!(
            "User media granted via {} (stream {}, {} video / {} audio tracks)",
            probe.kind(),
            handle.id(),
            handle.track_count(MediaKind::Video),
            handle.track_count(MediaKind::Audio)
        );
        Ok(handle)
    }
}

impl<S: MediaStream> fmt::Debug for UserMediaManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserMediaManager")
            .field("context", &self.context)
            .field(
                "probes",
                &self.probes.iter().map(|probe| probe.kind()).collect::<Vec<_>>(),
            )
            .field("legacy_enumerator", &self.enumerator.is_some())
            .finish()
    }
}
