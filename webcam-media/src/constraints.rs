//! Capture constraint model
//!
//! Mirrors the shape of `MediaStreamConstraints` from the Media Capture and
//! Streams API closely enough that the serialized JSON can be handed to the
//! platform unchanged. Absent members are omitted, never sent as `null`.

use serde::{Deserialize, Serialize};

/// Constraint for one side (audio or video) of a capture request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackConstraints {
    /// Plain on/off request
    Enabled(bool),
    /// Structured constraint set
    Constrained(MediaTrackConstraints),
}

impl TrackConstraints {
    /// Request a specific device by id
    pub fn device(id: impl Into<String>) -> Self {
        Self::Constrained(MediaTrackConstraints {
            device_id: Some(ConstrainDomString::Value(id.into())),
            ..Default::default()
        })
    }

    /// Legacy `{optional: [{sourceId}]}` constraint selecting a source
    pub fn optional_source(source_id: impl Into<String>) -> Self {
        Self::Constrained(MediaTrackConstraints {
            optional: vec![SourceConstraint {
                source_id: source_id.into(),
            }],
            ..Default::default()
        })
    }

    /// Keep the caller's structured constraints and select `source_id`
    /// through the legacy `optional` list
    pub fn with_optional_source(self, source_id: impl Into<String>) -> Self {
        match self {
            Self::Enabled(_) => Self::optional_source(source_id),
            Self::Constrained(mut constraints) => {
                constraints.optional = vec![SourceConstraint {
                    source_id: source_id.into(),
                }];
                Self::Constrained(constraints)
            }
        }
    }

    /// Whether this constraint asks for a track at all
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }

    /// Structured constraints, if any
    pub fn as_constrained(&self) -> Option<&MediaTrackConstraints> {
        match self {
            Self::Constrained(constraints) => Some(constraints),
            Self::Enabled(_) => None,
        }
    }

    /// Device id the caller expressed a preference for.
    ///
    /// A plain id is taken as is, a list yields its first entry and a
    /// parameter object yields its `ideal` hint.
    pub fn preferred_device_id(&self) -> Option<&str> {
        self.as_constrained()?.device_id.as_ref()?.preferred()
    }
}

impl Default for TrackConstraints {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl From<bool> for TrackConstraints {
    fn from(enabled: bool) -> Self {
        Self::Enabled(enabled)
    }
}

impl From<MediaTrackConstraints> for TrackConstraints {
    fn from(constraints: MediaTrackConstraints) -> Self {
        Self::Constrained(constraints)
    }
}

/// Structured track constraints (`MediaTrackConstraints`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTrackConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<ConstrainDomString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing_mode: Option<ConstrainDomString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<ConstrainULong>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<ConstrainULong>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<ConstrainDouble>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<ConstrainDouble>,
    /// Legacy optional source list understood by prefixed implementations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<SourceConstraint>,
}

impl MediaTrackConstraints {
    /// Ideal capture resolution
    pub fn with_ideal_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = Some(ConstrainULong::Range(ULongRange {
            ideal: Some(width),
            ..Default::default()
        }));
        self.height = Some(ConstrainULong::Range(ULongRange {
            ideal: Some(height),
            ..Default::default()
        }));
        self
    }

    /// Require one exact device
    pub fn with_exact_device(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(ConstrainDomString::Parameters(DomStringParameters {
            exact: Some(id.into()),
            ideal: None,
        }));
        self
    }

    /// Camera facing mode hint ("user", "environment")
    pub fn with_facing_mode(mut self, mode: impl Into<String>) -> Self {
        self.facing_mode = Some(ConstrainDomString::Value(mode.into()));
        self
    }

    /// Device id that must match exactly, if one was demanded
    pub fn required_device_id(&self) -> Option<&str> {
        match self.device_id.as_ref()? {
            ConstrainDomString::Parameters(params) => params.exact.as_deref(),
            _ => None,
        }
    }

    /// Legacy source selected through the `optional` list
    pub fn optional_source_id(&self) -> Option<&str> {
        self.optional.first().map(|source| source.source_id.as_str())
    }
}

/// `ConstrainDOMString`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstrainDomString {
    Value(String),
    List(Vec<String>),
    Parameters(DomStringParameters),
}

impl ConstrainDomString {
    fn preferred(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::List(values) => values.first().map(String::as_str),
            Self::Parameters(params) => params.ideal.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomStringParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal: Option<String>,
}

/// `ConstrainULong`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstrainULong {
    Value(u32),
    Range(ULongRange),
}

impl ConstrainULong {
    /// Whether `available` can satisfy the mandatory part of this constraint
    pub fn admits(&self, available: u32) -> bool {
        match self {
            Self::Value(_) => true,
            Self::Range(range) => {
                range.exact.map_or(true, |exact| exact <= available)
                    && range.min.map_or(true, |min| min <= available)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ULongRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal: Option<u32>,
}

/// `ConstrainDouble`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstrainDouble {
    Value(f64),
    Range(DoubleRange),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DoubleRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal: Option<f64>,
}

/// Entry of the legacy `optional` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConstraint {
    pub source_id: String,
}

/// What the caller asked for, before defaults are applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMediaRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<TrackConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<TrackConstraints>,
}

impl UserMediaRequest {
    pub fn new(audio: Option<TrackConstraints>, video: Option<TrackConstraints>) -> Self {
        Self { audio, video }
    }
}

/// Constraints actually sent to the platform (`MediaStreamConstraints`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<TrackConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<TrackConstraints>,
}

impl StreamConstraints {
    /// Apply request defaults: video is on unless specified, audio is only
    /// present when not muted and is on unless specified.
    pub fn effective(request: &UserMediaRequest, muted: bool) -> Self {
        let video = request.video.clone().unwrap_or_default();
        let audio = if muted {
            None
        } else {
            Some(request.audio.clone().unwrap_or_default())
        };

        Self {
            audio,
            video: Some(video),
        }
    }

    /// Same request with video forced to a plain `true`, dropping any
    /// device-specific video constraint
    pub fn with_video_forced(&self) -> Self {
        Self {
            audio: self.audio.clone(),
            video: Some(TrackConstraints::Enabled(true)),
        }
    }

    /// Whether an audio track is requested
    pub fn requests_audio(&self) -> bool {
        self.audio.as_ref().is_some_and(TrackConstraints::is_enabled)
    }

    /// Whether a video track is requested
    pub fn requests_video(&self) -> bool {
        self.video.as_ref().is_some_and(TrackConstraints::is_enabled)
    }

    /// JSON form handed to the platform
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
