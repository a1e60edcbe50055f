//! Track and stream abstractions

use std::fmt;

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl MediaKind {
    /// String form used by the platform (`MediaStreamTrack.kind`)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live capture track holding a camera or microphone
pub trait MediaTrack: fmt::Debug {
    /// Track ID
    fn id(&self) -> String;

    /// Track kind
    fn kind(&self) -> MediaKind;

    /// Release the underlying device. Idempotent.
    fn stop(&self);

    /// Whether the track still holds its device
    fn is_live(&self) -> bool;
}

/// A live capture stream grouping audio and video tracks
pub trait MediaStream: fmt::Debug {
    type Track: MediaTrack;

    /// Stream ID
    fn id(&self) -> String;

    fn video_tracks(&self) -> Vec<Self::Track>;

    fn audio_tracks(&self) -> Vec<Self::Track>;
}

/// What an acquisition hands back: normally a stream, but some legacy
/// implementations resolve with a single bare track.
#[derive(Debug)]
pub enum CaptureHandle<S: MediaStream> {
    /// Full stream
    Stream(S),
    /// Bare track
    Track(S::Track),
}

impl<S: MediaStream> CaptureHandle<S> {
    /// Handle ID
    pub fn id(&self) -> String {
        match self {
            Self::Stream(stream) => stream.id(),
            Self::Track(track) => track.id(),
        }
    }

    /// Stop every held track and return how many were stopped
    pub fn stop(&self) -> usize {
        match self {
            Self::Stream(stream) => {
                let tracks: Vec<S::Track> = stream
                    .video_tracks()
                    .into_iter()
                    .chain(stream.audio_tracks())
                    .collect();
                for track in &tracks {
                    track.stop();
                }
                tracks.len()
            }
            Self::Track(track) => {
                track.stop();
                1
            }
        }
    }

    /// Whether any held track is still live
    pub fn is_live(&self) -> bool {
        match self {
            Self::Stream(stream) => stream
                .video_tracks()
                .into_iter()
                .chain(stream.audio_tracks())
                .any(|track| track.is_live()),
            Self::Track(track) => track.is_live(),
        }
    }

    /// Number of held tracks of `kind`
    pub fn track_count(&self, kind: MediaKind) -> usize {
        match self {
            Self::Stream(stream) => match kind {
                MediaKind::Video => stream.video_tracks().len(),
                MediaKind::Audio => stream.audio_tracks().len(),
            },
            Self::Track(track) => usize::from(track.kind() == kind),
        }
    }
}

impl<S> Clone for CaptureHandle<S>
where
    S: MediaStream + Clone,
    S::Track: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Self::Stream(stream) => Self::Stream(stream.clone()),
            Self::Track(track) => Self::Track(track.clone()),
        }
    }
}
