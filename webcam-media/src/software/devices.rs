//! Simulated capture devices and the probes that hand them out

use super::stream::{SoftwareStream, SoftwareTrack};
use super::SoftwareEnvironment;
use crate::capture::{CaptureProbe, ProbeKind, SourceEnumerator, SourceInfo};
use crate::constraints::{StreamConstraints, TrackConstraints};
use crate::error::{MediaError, MediaResult};
use crate::tracks::{CaptureHandle, MediaKind};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::rc::Rc;

/// A simulated camera or microphone
#[derive(Clone)]
pub struct SoftwareDevice {
    pub id: String,
    pub kind: MediaKind,
    pub label: String,
    /// Capture resolution (video only)
    pub width: u32,
    pub height: u32,
    frame: Option<Rc<RgbaImage>>,
}

impl SoftwareDevice {
    /// Camera producing a gradient test pattern of `width` x `height`
    pub fn camera(id: &str, width: u32, height: u32) -> Self {
        Self {
            id: id.to_string(),
            kind: MediaKind::Video,
            label: format!("Software Camera ({id})"),
            width,
            height,
            frame: Some(Rc::new(test_pattern(width, height))),
        }
    }

    pub fn microphone(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: MediaKind::Audio,
            label: format!("Software Microphone ({id})"),
            width: 0,
            height: 0,
            frame: None,
        }
    }

    pub(crate) fn open(&self) -> SoftwareTrack {
        SoftwareTrack::new(self.kind, &self.id, &self.label, self.frame.clone())
    }

    fn admits(&self, constraints: &TrackConstraints) -> MediaResult<()> {
        let Some(constraints) = constraints.as_constrained() else {
            return Ok(());
        };
        if let Some(width) = constraints.width {
            if !width.admits(self.width) {
                return Err(MediaError::ConstraintNotSatisfiable {
                    constraint: "width".to_string(),
                });
            }
        }
        if let Some(height) = constraints.height {
            if !height.admits(self.height) {
                return Err(MediaError::ConstraintNotSatisfiable {
                    constraint: "height".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SoftwareDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareDevice")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Horizontal red ramp, vertical green ramp. Asymmetric in both axes so
/// flips are observable.
pub fn test_pattern(width: u32, height: u32) -> RgbaImage {
    let x_span = width.saturating_sub(1).max(1);
    let y_span = height.saturating_sub(1).max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / x_span) as u8,
            (y * 255 / y_span) as u8,
            64,
            255,
        ])
    })
}

/// Pick the device for one side of a request
pub(crate) fn select_device<'a>(
    devices: &'a [SoftwareDevice],
    kind: MediaKind,
    constraints: &TrackConstraints,
) -> MediaResult<&'a SoftwareDevice> {
    let mut candidates = devices.iter().filter(|device| device.kind == kind).peekable();
    if candidates.peek().is_none() {
        return Err(MediaError::DeviceNotFound {
            device_id: kind.to_string(),
        });
    }

    let structured = constraints.as_constrained();
    let device = if let Some(required) = structured.and_then(|c| c.required_device_id()) {
        candidates
            .find(|device| device.id == required)
            .ok_or_else(|| MediaError::ConstraintNotSatisfiable {
                constraint: "deviceId".to_string(),
            })?
    } else {
        let preferred = constraints
            .preferred_device_id()
            .or_else(|| structured.and_then(|c| c.optional_source_id()));
        let candidates: Vec<&SoftwareDevice> = candidates.collect();
        preferred
            .and_then(|id| candidates.iter().copied().find(|device| device.id == id))
            .unwrap_or(candidates[0])
    };

    device.admits(constraints)?;
    Ok(device)
}

/// Capture probe served by a [`SoftwareEnvironment`]
pub struct SoftwareProbe {
    kind: ProbeKind,
    env: SoftwareEnvironment,
}

impl SoftwareProbe {
    pub fn new(kind: ProbeKind, env: SoftwareEnvironment) -> Self {
        Self { kind, env }
    }
}

#[async_trait(?Send)]
impl CaptureProbe for SoftwareProbe {
    type Stream = SoftwareStream;

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.env.exposes(self.kind)
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> MediaResult<CaptureHandle<SoftwareStream>> {
        if let Some(gate) = self.env.record_request(self.kind, constraints) {
            // A dropped sender still lets the request proceed.
            let _ = gate.await;
        }
        self.env.grant(constraints)
    }
}

/// Callback-style source listing served by a [`SoftwareEnvironment`]
pub struct SoftwareSourceEnumerator {
    env: SoftwareEnvironment,
}

impl SoftwareSourceEnumerator {
    pub fn new(env: SoftwareEnvironment) -> Self {
        Self { env }
    }
}

#[async_trait(?Send)]
impl SourceEnumerator for SoftwareSourceEnumerator {
    fn is_available(&self) -> bool {
        self.env.exposes_legacy_sources()
    }

    async fn get_sources(&self) -> MediaResult<Vec<SourceInfo>> {
        Ok(self
            .env
            .devices()
            .into_iter()
            .map(|device| SourceInfo {
                id: device.id,
                kind: device.kind,
                label: device.label,
            })
            .collect())
    }
}
