//! In-memory streams and tracks

use crate::tracks::{MediaKind, MediaStream, MediaTrack};
use image::RgbaImage;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

struct TrackInner {
    id: String,
    kind: MediaKind,
    device_id: String,
    label: String,
    live: Cell<bool>,
    frame: Option<Rc<RgbaImage>>,
}

/// Track backed by a simulated device. Clones share state.
#[derive(Clone)]
pub struct SoftwareTrack {
    inner: Rc<TrackInner>,
}

impl SoftwareTrack {
    pub(crate) fn new(
        kind: MediaKind,
        device_id: &str,
        label: &str,
        frame: Option<Rc<RgbaImage>>,
    ) -> Self {
        Self {
            inner: Rc::new(TrackInner {
                id: Uuid::new_v4().to_string(),
                kind,
                device_id: device_id.to_string(),
                label: label.to_string(),
                live: Cell::new(true),
                frame,
            }),
        }
    }

    /// Device this track captures from
    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Frame the device is producing; `None` once stopped
    pub fn frame(&self) -> Option<Rc<RgbaImage>> {
        if self.inner.live.get() {
            self.inner.frame.clone()
        } else {
            None
        }
    }
}

impl MediaTrack for SoftwareTrack {
    fn id(&self) -> String {
        self.inner.id.clone()
    }

    fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    fn stop(&self) {
        self.inner.live.set(false);
    }

    fn is_live(&self) -> bool {
        self.inner.live.get()
    }
}

impl fmt::Debug for SoftwareTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("device_id", &self.inner.device_id)
            .field("live", &self.inner.live.get())
            .finish()
    }
}

/// Stream of simulated tracks
#[derive(Debug, Clone)]
pub struct SoftwareStream {
    id: String,
    tracks: Vec<SoftwareTrack>,
}

impl SoftwareStream {
    pub fn new(tracks: Vec<SoftwareTrack>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracks,
        }
    }

    pub fn tracks(&self) -> &[SoftwareTrack] {
        &self.tracks
    }

    fn tracks_of(&self, kind: MediaKind) -> Vec<SoftwareTrack> {
        self.tracks
            .iter()
            .filter(|track| track.kind() == kind)
            .cloned()
            .collect()
    }
}

impl MediaStream for SoftwareStream {
    type Track = SoftwareTrack;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn video_tracks(&self) -> Vec<SoftwareTrack> {
        self.tracks_of(MediaKind::Video)
    }

    fn audio_tracks(&self) -> Vec<SoftwareTrack> {
        self.tracks_of(MediaKind::Audio)
    }
}
