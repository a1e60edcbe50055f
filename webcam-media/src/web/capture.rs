//! `getUserMedia` probes and legacy source enumeration

use crate::capture::{CaptureProbe, ProbeKind, SourceEnumerator, SourceInfo};
use crate::constraints::StreamConstraints;
use crate::error::{IntoMediaError, MediaError, MediaResult};
use crate::tracks::{CaptureHandle, MediaKind, MediaStream, MediaTrack};
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{MediaStreamConstraints, MediaStreamTrackState, Navigator};

/// `MediaStreamTrack` wrapper
#[derive(Debug, Clone)]
pub struct WebTrack {
    pub(crate) inner: web_sys::MediaStreamTrack,
}

impl MediaTrack for WebTrack {
    fn id(&self) -> String {
        self.inner.id()
    }

    fn kind(&self) -> MediaKind {
        match self.inner.kind().as_str() {
            "audio" => MediaKind::Audio,
            _ => MediaKind::Video,
        }
    }

    fn stop(&self) {
        self.inner.stop();
    }

    fn is_live(&self) -> bool {
        self.inner.ready_state() == MediaStreamTrackState::Live
    }
}

/// `MediaStream` wrapper
#[derive(Debug, Clone)]
pub struct WebStream {
    pub(crate) inner: web_sys::MediaStream,
}

fn tracks_from(array: Array) -> Vec<WebTrack> {
    array
        .iter()
        .filter_map(|value| value.dyn_into::<web_sys::MediaStreamTrack>().ok())
        .map(|inner| WebTrack { inner })
        .collect()
}

impl MediaStream for WebStream {
    type Track = WebTrack;

    fn id(&self) -> String {
        self.inner.id()
    }

    fn video_tracks(&self) -> Vec<WebTrack> {
        tracks_from(self.inner.get_video_tracks())
    }

    fn audio_tracks(&self) -> Vec<WebTrack> {
        tracks_from(self.inner.get_audio_tracks())
    }
}

fn navigator() -> Option<Navigator> {
    web_sys::window().map(|window| window.navigator())
}

fn is_function(target: &JsValue, name: &str) -> bool {
    Reflect::get(target, &JsValue::from_str(name))
        .map(|value| value.is_function())
        .unwrap_or(false)
}

fn into_handle(value: JsValue) -> MediaResult<CaptureHandle<WebStream>> {
    let value = match value.dyn_into::<web_sys::MediaStream>() {
        Ok(inner) => return Ok(CaptureHandle::Stream(WebStream { inner })),
        Err(value) => value,
    };
    value
        .dyn_into::<web_sys::MediaStreamTrack>()
        .map(|inner| CaptureHandle::Track(WebTrack { inner }))
        .map_err(|_| MediaError::Platform {
            name: "TypeError".to_string(),
            message: "getUserMedia resolved with neither a stream nor a track".to_string(),
        })
}

/// One `getUserMedia` entry point on `navigator`
pub struct WebProbe {
    kind: ProbeKind,
}

impl WebProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self { kind }
    }
}

#[async_trait(?Send)]
impl CaptureProbe for WebProbe {
    type Stream = WebStream;

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        let Some(navigator) = navigator() else {
            return false;
        };
        match self.kind {
            ProbeKind::Standard => navigator
                .media_devices()
                .map(|devices| is_function(&devices, "getUserMedia"))
                .unwrap_or(false),
            ProbeKind::Prefixed(prefix) => is_function(&navigator, prefix.function_name()),
        }
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> MediaResult<CaptureHandle<WebStream>> {
        let navigator = navigator().ok_or_else(|| MediaError::UnsupportedPlatform {
            platform: "no navigator".to_string(),
        })?;
        let js_constraints = js_sys::JSON::parse(&constraints.to_json()?)
            .map_err(|e| e.into_media_error("JSON.parse"))?;

        let promise = match self.kind {
            ProbeKind::Standard => navigator
                .media_devices()
                .map_err(|e| e.into_media_error("mediaDevices"))?
                .get_user_media_with_constraints(js_constraints.unchecked_ref::<MediaStreamConstraints>())
                .map_err(|e| e.into_media_error("getUserMedia"))?,
            ProbeKind::Prefixed(prefix) => {
                let function: Function = Reflect::get(&navigator, &JsValue::from_str(prefix.function_name()))
                    .map_err(|e| e.into_media_error(prefix.function_name()))?
                    .dyn_into()
                    .map_err(|e: JsValue| e.into_media_error(prefix.function_name()))?;
                Promise::new(&mut |resolve, reject| {
                    if let Err(error) = function.call3(&navigator, &js_constraints, &resolve, &reject) {
                        let _ = reject.call1(&JsValue::UNDEFINED, &error);
                    }
                })
            }
        };

        let value = JsFuture::from(promise)
            .await
            .map_err(|e| e.into_media_error("getUserMedia"))?;
        into_handle(value)
    }
}

/// `MediaStreamTrack.getSources`
pub struct WebSourceEnumerator;

impl WebSourceEnumerator {
    fn get_sources_function() -> Option<(JsValue, Function)> {
        let track_ctor = Reflect::get(&js_sys::global(), &JsValue::from_str("MediaStreamTrack")).ok()?;
        let function = Reflect::get(&track_ctor, &JsValue::from_str("getSources"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some((track_ctor, function))
    }
}

fn string_field(value: &JsValue, name: &str) -> String {
    Reflect::get(value, &JsValue::from_str(name))
        .ok()
        .and_then(|field| field.as_string())
        .unwrap_or_default()
}

#[async_trait(?Send)]
impl SourceEnumerator for WebSourceEnumerator {
    fn is_available(&self) -> bool {
        Self::get_sources_function().is_some()
    }

    async fn get_sources(&self) -> MediaResult<Vec<SourceInfo>> {
        let (track_ctor, function) =
            Self::get_sources_function().ok_or_else(|| MediaError::DeviceEnumerationFailed {
                reason: "MediaStreamTrack.getSources is not available".to_string(),
            })?;

        let promise = Promise::new(&mut |resolve, reject| {
            if let Err(error) = function.call1(&track_ctor, &resolve) {
                let _ = reject.call1(&JsValue::UNDEFINED, &error);
            }
        });
        let sources = JsFuture::from(promise)
            .await
            .map_err(|e| MediaError::DeviceEnumerationFailed {
                reason: e.as_string().unwrap_or_else(|| format!("{e:?}")),
            })?;

        Ok(Array::from(&sources)
            .iter()
            .filter_map(|source| {
                let kind = match string_field(&source, "kind").as_str() {
                    "audio" => MediaKind::Audio,
                    "video" => MediaKind::Video,
                    _ => return None,
                };
                Some(SourceInfo {
                    id: string_field(&source, "id"),
                    kind,
                    label: string_field(&source, "label"),
                })
            })
            .collect())
    }
}
