//! Legacy source selection through `MediaStreamTrack.getSources`
//!
//! Old mobile browsers expose the vendor-prefixed `getUserMedia` together with
//! a callback-based source listing and only understand
//! `{optional: [{sourceId}]}` style constraints.

use super::{SourceEnumerator, SourceInfo};
use crate::constraints::{TrackConstraints, UserMediaRequest};
use crate::error::{MediaError, MediaResult};
use crate::tracks::MediaKind;
use tracing::debug;

/// Enumerate sources and turn the caller's request into legacy
/// optional-source constraints.
pub async fn request_legacy_sources(
    enumerator: &dyn SourceEnumerator,
    request: &UserMediaRequest,
    muted: bool,
) -> MediaResult<UserMediaRequest> {
    let sources = enumerator.get_sources().await?;
    debug!("getSources reported {} sources", sources.len());
    select_sources(&sources, request, muted)
}

/// Pick one source per kind: an explicit device id from the request wins,
/// otherwise the first enumerated source of that kind. The chosen source is
/// added to the caller's constraints; a side switched off stays off.
pub fn select_sources(
    sources: &[SourceInfo],
    request: &UserMediaRequest,
    muted: bool,
) -> MediaResult<UserMediaRequest> {
    let video = select_source(sources, request.video.clone(), MediaKind::Video)?;
    let audio = if muted {
        None
    } else {
        Some(select_source(sources, request.audio.clone(), MediaKind::Audio)?)
    };

    Ok(UserMediaRequest {
        audio,
        video: Some(video),
    })
}

fn select_source(
    sources: &[SourceInfo],
    constraint: Option<TrackConstraints>,
    kind: MediaKind,
) -> MediaResult<TrackConstraints> {
    let constraint = constraint.unwrap_or_default();
    if !constraint.is_enabled() {
        return Ok(constraint);
    }

    let source_id = resolve_source(sources, &constraint, kind)?;
    Ok(constraint.with_optional_source(source_id))
}

fn resolve_source(
    sources: &[SourceInfo],
    constraint: &TrackConstraints,
    kind: MediaKind,
) -> MediaResult<String> {
    if let Some(id) = constraint.preferred_device_id() {
        return Ok(id.to_string());
    }

    sources
        .iter()
        .find(|source| source.kind == kind)
        .map(|source| source.id.clone())
        .ok_or_else(|| MediaError::DeviceNotFound {
            device_id: kind.to_string(),
        })
}
