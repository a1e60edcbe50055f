//! Integration tests for user media acquisition
//!
//! Exercises the probe fallback chain, the constraint relaxation retry and
//! legacy source selection against the software platform.

use webcam_media::software::{SoftwareDevice, SoftwareStream};
use webcam_media::*;

fn platform(env: SoftwareEnvironment) -> SoftwarePlatform {
    SoftwarePlatform::new(env)
}

fn constraint_failure() -> MediaError {
    MediaError::ConstraintNotSatisfiable {
        constraint: "width".to_string(),
    }
}

fn granted_device(handle: &CaptureHandle<SoftwareStream>, kind: MediaKind) -> Option<String> {
    match handle {
        CaptureHandle::Stream(stream) => stream
            .tracks()
            .iter()
            .find(|track| track.kind() == kind)
            .map(|track| track.device_id().to_string()),
        CaptureHandle::Track(track) if track.kind() == kind => Some(track.device_id().to_string()),
        CaptureHandle::Track(_) => None,
    }
}

// ============================================================================
// REQUEST DEFAULTS
// ============================================================================

#[tokio::test]
async fn test_unspecified_request_captures_audio_and_video() {
    let env = SoftwareEnvironment::new();
    let platform = platform(env.clone());

    let handle = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap();

    assert_eq!(handle.track_count(MediaKind::Video), 1);
    assert_eq!(handle.track_count(MediaKind::Audio), 1);

    let requests = env.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].probe, ProbeKind::Standard);
    assert_eq!(requests[0].constraints.video, Some(TrackConstraints::Enabled(true)));
    assert_eq!(requests[0].constraints.audio, Some(TrackConstraints::Enabled(true)));
}

#[tokio::test]
async fn test_muted_request_omits_audio() {
    let env = SoftwareEnvironment::new();
    let platform = platform(env.clone());
    let request = UserMediaRequest::new(Some(TrackConstraints::Enabled(true)), None);

    let handle = platform.user_media().request_user_media(&request, true).await.unwrap();

    assert_eq!(handle.track_count(MediaKind::Audio), 0);
    assert_eq!(handle.track_count(MediaKind::Video), 1);
    assert_eq!(env.requests()[0].constraints.to_json().unwrap(), r#"{"video":true}"#);
}

#[tokio::test]
async fn test_audio_only_request() {
    let env = SoftwareEnvironment::new();
    let platform = platform(env.clone());
    let request = UserMediaRequest::new(None, Some(TrackConstraints::Enabled(false)));

    let handle = platform.user_media().request_user_media(&request, false).await.unwrap();

    assert_eq!(handle.track_count(MediaKind::Video), 0);
    assert_eq!(handle.track_count(MediaKind::Audio), 1);
    assert_eq!(
        env.requests()[0].constraints.to_json().unwrap(),
        r#"{"audio":true,"video":false}"#
    );
}

#[tokio::test]
async fn test_explicit_device_is_granted() {
    let env = SoftwareEnvironment::new().with_device(SoftwareDevice::camera("camera-1", 320, 240));
    let platform = platform(env.clone());
    let request = UserMediaRequest::new(None, Some(TrackConstraints::device("camera-1")));

    let handle = platform.user_media().request_user_media(&request, true).await.unwrap();

    assert_eq!(granted_device(&handle, MediaKind::Video).as_deref(), Some("camera-1"));
}

// ============================================================================
// CONSTRAINT RELAXATION
// ============================================================================

#[tokio::test]
async fn test_constraint_failure_retries_once_with_plain_video() {
    let env = SoftwareEnvironment::new();
    let platform = platform(env.clone());
    env.fail_next(constraint_failure());

    let video = MediaTrackConstraints::default().with_ideal_resolution(1280, 720);
    let request = UserMediaRequest::new(Some(TrackConstraints::Enabled(true)), Some(video.into()));
    let handle = platform.user_media().request_user_media(&request, false).await;

    assert!(handle.is_ok());
    let requests = env.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].constraints.video.as_ref().unwrap().as_constrained().is_some());
    assert_eq!(requests[1].constraints.video, Some(TrackConstraints::Enabled(true)));
    // Audio is carried over unchanged
    assert_eq!(requests[1].constraints.audio, requests[0].constraints.audio);
}

#[tokio::test]
async fn test_second_constraint_failure_propagates() {
    let env = SoftwareEnvironment::new();
    let platform = platform(env.clone());
    env.fail_next(constraint_failure());
    env.fail_next(constraint_failure());

    let error = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap_err();

    assert!(error.is_constraint_failure());
    assert_eq!(env.requests().len(), 2);
}

#[tokio::test]
async fn test_missing_exact_device_falls_back_to_any_camera() {
    let env = SoftwareEnvironment::new();
    let platform = platform(env.clone());
    let video = MediaTrackConstraints::default().with_exact_device("camera-9");
    let request = UserMediaRequest::new(None, Some(video.into()));

    let handle = platform.user_media().request_user_media(&request, true).await.unwrap();

    assert_eq!(granted_device(&handle, MediaKind::Video).as_deref(), Some("camera-0"));
    assert_eq!(env.requests().len(), 2);
}

#[tokio::test]
async fn test_permission_denied_is_not_retried() {
    let env = SoftwareEnvironment::new().deny_permission();
    let platform = platform(env.clone());

    let error = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap_err();

    assert!(matches!(error, MediaError::PermissionDenied { .. }));
    assert_eq!(error.category(), ErrorCategory::Permission);
    assert_eq!(env.requests().len(), 1);
}

#[tokio::test]
async fn test_missing_camera_is_device_not_found() {
    let env = SoftwareEnvironment::new().without_devices();
    let platform = platform(env.clone());

    let error = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), true)
        .await
        .unwrap_err();

    assert!(matches!(error, MediaError::DeviceNotFound { .. }));
}

// ============================================================================
// CAPABILITY DETECTION
// ============================================================================

#[tokio::test]
async fn test_headless_context_is_unsupported() {
    let env = SoftwareEnvironment::new().headless();
    let platform = platform(env.clone());

    assert!(!platform.user_media().can_get_user_media());
    let error = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap_err();

    assert!(matches!(error, MediaError::UnsupportedPlatform { .. }));
    assert!(env.requests().is_empty());
}

#[tokio::test]
async fn test_no_implementation_is_unsupported() {
    let env = SoftwareEnvironment::new().without_standard_api();
    let platform = platform(env.clone());

    assert!(!platform.user_media().can_get_user_media());
    assert_eq!(platform.user_media().active_probe_kind(), None);

    let error = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap_err();
    assert!(matches!(error, MediaError::UnsupportedPlatform { .. }));
}

#[tokio::test]
async fn test_prefixed_fallback_order() {
    let env = SoftwareEnvironment::new()
        .without_standard_api()
        .with_prefixed_api(VendorPrefix::Ms)
        .with_prefixed_api(VendorPrefix::Webkit);
    let platform = platform(env.clone());

    assert!(platform.user_media().can_get_user_media());
    assert_eq!(
        platform.user_media().active_probe_kind(),
        Some(ProbeKind::Prefixed(VendorPrefix::Webkit))
    );

    platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), true)
        .await
        .unwrap();
    assert_eq!(env.requests()[0].probe, ProbeKind::Prefixed(VendorPrefix::Webkit));
}

#[tokio::test]
async fn test_standard_api_preferred_over_prefixed() {
    let env = SoftwareEnvironment::new().with_prefixed_api(VendorPrefix::Moz);
    let platform = platform(env);

    assert_eq!(platform.user_media().active_probe_kind(), Some(ProbeKind::Standard));
}

// ============================================================================
// LEGACY SOURCE SELECTION
// ============================================================================

fn legacy_env() -> SoftwareEnvironment {
    SoftwareEnvironment::new()
        .without_standard_api()
        .with_prefixed_api(VendorPrefix::Webkit)
        .with_legacy_sources()
        .with_device(SoftwareDevice::camera("camera-1", 1280, 720))
}

#[tokio::test]
async fn test_legacy_sources_select_first_of_each_kind() {
    let env = legacy_env();
    let platform = platform(env.clone());

    let handle = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap();

    let constraints = &env.requests()[0].constraints;
    let video = constraints.video.as_ref().unwrap().as_constrained().unwrap();
    let audio = constraints.audio.as_ref().unwrap().as_constrained().unwrap();
    assert_eq!(video.optional_source_id(), Some("camera-0"));
    assert_eq!(audio.optional_source_id(), Some("microphone-0"));
    assert_eq!(
        constraints.to_json().unwrap(),
        r#"{"audio":{"optional":[{"sourceId":"microphone-0"}]},"video":{"optional":[{"sourceId":"camera-0"}]}}"#
    );
    assert_eq!(granted_device(&handle, MediaKind::Video).as_deref(), Some("camera-0"));
}

#[tokio::test]
async fn test_legacy_sources_honor_requested_device() {
    let env = legacy_env();
    let platform = platform(env.clone());
    let request = UserMediaRequest::new(None, Some(TrackConstraints::device("camera-1")));

    let handle = platform.user_media().request_user_media(&request, true).await.unwrap();

    assert!(env.requests()[0].constraints.audio.is_none());
    assert_eq!(granted_device(&handle, MediaKind::Video).as_deref(), Some("camera-1"));
}

#[tokio::test]
async fn test_legacy_sources_keep_structured_constraints() {
    let env = legacy_env();
    let platform = platform(env.clone());
    let requested: MediaTrackConstraints = serde_json::from_str(
        r#"{"facingMode":"user","width":{"ideal":1280}}"#,
    )
    .unwrap();
    let request = UserMediaRequest::new(None, Some(requested.clone().into()));

    let handle = platform.user_media().request_user_media(&request, true).await.unwrap();

    let constraints = &env.requests()[0].constraints;
    let video = constraints.video.as_ref().unwrap().as_constrained().unwrap();
    assert_eq!(video.facing_mode, requested.facing_mode);
    assert_eq!(video.width, requested.width);
    assert_eq!(video.optional_source_id(), Some("camera-0"));
    assert_eq!(
        constraints.to_json().unwrap(),
        r#"{"video":{"facingMode":"user","width":{"ideal":1280},"optional":[{"sourceId":"camera-0"}]}}"#
    );
    assert_eq!(granted_device(&handle, MediaKind::Video).as_deref(), Some("camera-0"));
}

#[tokio::test]
async fn test_legacy_sources_audio_only() {
    let env = legacy_env();
    let platform = platform(env.clone());
    let request = UserMediaRequest::new(None, Some(TrackConstraints::Enabled(false)));

    let handle = platform.user_media().request_user_media(&request, false).await.unwrap();

    assert_eq!(handle.track_count(MediaKind::Video), 0);
    assert_eq!(handle.track_count(MediaKind::Audio), 1);
    assert_eq!(
        env.requests()[0].constraints.to_json().unwrap(),
        r#"{"audio":{"optional":[{"sourceId":"microphone-0"}]},"video":false}"#
    );
}

#[tokio::test]
async fn test_legacy_sources_without_microphone() {
    let env = SoftwareEnvironment::new()
        .without_standard_api()
        .with_prefixed_api(VendorPrefix::Webkit)
        .with_legacy_sources()
        .without_devices()
        .with_device(SoftwareDevice::camera("camera-0", 640, 480));
    let platform = platform(env.clone());

    let error = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap_err();
    assert!(matches!(error, MediaError::DeviceNotFound { .. }));
    assert!(env.requests().is_empty());

    // Muted capture does not need a microphone
    assert!(platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), true)
        .await
        .is_ok());
}

// ============================================================================
// HANDLE LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_bare_track_resolution() {
    let env = SoftwareEnvironment::new().resolve_bare_tracks();
    let platform = platform(env.clone());

    let handle = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), true)
        .await
        .unwrap();

    assert!(matches!(handle, CaptureHandle::Track(_)));
    assert_eq!(handle.track_count(MediaKind::Video), 1);
}

#[tokio::test]
async fn test_stop_releases_every_track() {
    let env = SoftwareEnvironment::new();
    let platform = platform(env.clone());

    let handle = platform
        .user_media()
        .request_user_media(&UserMediaRequest::default(), false)
        .await
        .unwrap();
    assert_eq!(env.live_tracks(), 2);
    assert!(handle.is_live());

    assert_eq!(handle.stop(), 2);
    assert_eq!(env.live_tracks(), 0);
    assert!(!handle.is_live());
}
