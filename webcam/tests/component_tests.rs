//! Integration tests for the webcam component lifecycle
//!
//! Drives mount, update and unmount against the software platform and checks
//! callbacks, events, track release and screenshots.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::cell::RefCell;
use std::rc::Rc;
use tokio_test::{assert_pending, assert_ready, task};
use webcam::software::SoftwareVideo;
use webcam::*;

/// Records every callback invocation
#[derive(Clone, Default)]
struct CallbackLog {
    successes: Rc<RefCell<u32>>,
    errors: Rc<RefCell<Vec<String>>>,
}

impl CallbackLog {
    fn successes(&self) -> u32 {
        *self.successes.borrow()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

fn build(env: &SoftwareEnvironment, video: SoftwareVideo, config: WebcamConfig) -> (Webcam<SoftwarePlatform>, CallbackLog) {
    let log = CallbackLog::default();
    let successes = log.successes.clone();
    let errors = log.errors.clone();

    let webcam = Webcam::builder(SoftwarePlatform::new(env.clone()))
        .config(config)
        .on_user_media(move || *successes.borrow_mut() += 1)
        .on_user_media_error(move |message| errors.borrow_mut().push(message.to_string()))
        .build(video)
        .unwrap();
    (webcam, log)
}

fn default_webcam(env: &SoftwareEnvironment) -> (Webcam<SoftwarePlatform>, CallbackLog) {
    build(env, SoftwareVideo::new(320), WebcamConfig::default())
}

fn decode_png(data_url: &str) -> image::RgbaImage {
    let payload = data_url.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = STANDARD.decode(payload).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

// ============================================================================
// MOUNT
// ============================================================================

#[tokio::test]
async fn test_mount_binds_stream_and_reports_success() {
    let env = SoftwareEnvironment::new();
    let (webcam, log) = default_webcam(&env);
    let mut events = webcam.subscribe();

    assert_eq!(webcam.state(), WebcamState::Idle);
    webcam.mount().await;

    assert_eq!(webcam.state(), WebcamState::Live);
    assert!(webcam.has_user_media());
    assert_eq!(log.successes(), 1);
    assert!(log.errors().is_empty());

    let stream_id = webcam.stream_id().unwrap();
    assert_eq!(
        webcam.with_video(|video| video.bound_stream_id()),
        Some(stream_id.clone())
    );
    assert_eq!(
        events.drain(),
        vec![
            WebcamEvent::StateChanged {
                from: WebcamState::Idle,
                to: WebcamState::Acquiring,
            },
            WebcamEvent::StateChanged {
                from: WebcamState::Acquiring,
                to: WebcamState::Live,
            },
            WebcamEvent::UserMedia { stream_id },
        ]
    );
}

#[tokio::test]
async fn test_mount_configures_preview() {
    let env = SoftwareEnvironment::new();
    let config = WebcamConfig {
        mirrored: true,
        style_transform: Some("rotate(180deg)".to_string()),
        attributes: [("class".to_string(), "preview".to_string())].into_iter().collect(),
        ..Default::default()
    };
    let (webcam, _log) = build(&env, SoftwareVideo::new(320), config);

    webcam.mount().await;

    let presentation = webcam.with_video(|video| video.presentation().clone());
    assert!(presentation.autoplay);
    assert!(presentation.plays_inline);
    // Audio is captured, so local playback is muted
    assert!(presentation.muted);
    assert_eq!(presentation.transform.as_deref(), Some("rotate(180deg) scaleX(-1)"));
    assert_eq!(presentation.attributes.get("class").map(String::as_str), Some("preview"));
}

#[tokio::test]
async fn test_mount_twice_acquires_once() {
    let env = SoftwareEnvironment::new();
    let (webcam, log) = default_webcam(&env);

    webcam.mount().await;
    webcam.mount().await;

    assert_eq!(env.requests().len(), 1);
    assert_eq!(log.successes(), 1);
}

// ============================================================================
// FAILURES
// ============================================================================

#[tokio::test]
async fn test_unsupported_platform_reports_fixed_message() {
    let env = SoftwareEnvironment::new().headless();
    let (webcam, log) = default_webcam(&env);
    let mut events = webcam.subscribe();

    webcam.mount().await;

    assert_eq!(webcam.state(), WebcamState::Failed);
    assert!(!webcam.has_user_media());
    assert_eq!(log.errors(), vec![UNSUPPORTED_MESSAGE.to_string()]);
    assert_eq!(log.successes(), 0);
    assert!(env.requests().is_empty());
    assert!(events.drain().contains(&WebcamEvent::UserMediaError {
        message: "getUserMedia not supported".to_string(),
        category: ErrorCategory::Platform,
    }));
}

#[tokio::test]
async fn test_permission_denied_reports_error_once() {
    let env = SoftwareEnvironment::new().deny_permission();
    let (webcam, log) = default_webcam(&env);

    webcam.mount().await;

    assert_eq!(webcam.state(), WebcamState::Failed);
    assert_eq!(log.errors().len(), 1);
    assert!(log.errors()[0].starts_with("Permission denied"));
    assert!(webcam.get_screenshot().is_none());
}

#[tokio::test]
async fn test_constraint_failure_retries_before_reporting() {
    let env = SoftwareEnvironment::new();
    let unsatisfiable = || MediaError::ConstraintNotSatisfiable {
        constraint: "height".to_string(),
    };
    env.fail_next(unsatisfiable());
    env.fail_next(unsatisfiable());
    let (webcam, log) = default_webcam(&env);

    webcam.mount().await;

    assert_eq!(env.requests().len(), 2);
    assert_eq!(log.errors(), vec!["Constraint not satisfiable: height".to_string()]);
}

// ============================================================================
// UPDATE
// ============================================================================

#[tokio::test]
async fn test_constraint_change_stops_tracks_and_reacquires() {
    let env = SoftwareEnvironment::new();
    let (webcam, log) = default_webcam(&env);
    webcam.mount().await;
    let first_tracks = env.issued_tracks();
    let first_stream = webcam.stream_id().unwrap();
    let mut events = webcam.subscribe();

    webcam
        .update(WebcamConfig {
            audio: false,
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(first_tracks.iter().all(|track| !track.is_live()));
    assert_eq!(env.live_tracks(), 1);
    assert_eq!(log.successes(), 2);
    assert_eq!(webcam.state(), WebcamState::Live);

    let requests = env.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].constraints.to_json().unwrap(), r#"{"video":true}"#);

    let events = events.drain();
    assert_eq!(
        events[0],
        WebcamEvent::StreamReleased {
            stream_id: first_stream,
            tracks_stopped: 2,
        }
    );
    assert_eq!(
        events[1],
        WebcamEvent::StateChanged {
            from: WebcamState::Live,
            to: WebcamState::Reacquiring,
        }
    );
}

async fn assert_reacquires_with_tracks_stopped_first(changed: WebcamConfig) {
    let env = SoftwareEnvironment::new();
    let (webcam, log) = default_webcam(&env);
    webcam.mount().await;
    let first_tracks = env.issued_tracks();
    assert_eq!(first_tracks.len(), 2);

    env.pause_requests();
    let mut update = task::spawn(webcam.update(changed.clone()));
    assert_pending!(update.poll());

    // The old stream is gone before the new request is answered
    assert!(first_tracks.iter().all(|track| !track.is_live()));
    assert_eq!(env.live_tracks(), 0);
    assert_eq!(env.pending_requests(), 1);
    assert_eq!(webcam.state(), WebcamState::Reacquiring);

    assert!(env.release_next());
    assert_ready!(update.poll()).unwrap();
    drop(update);

    assert_eq!(webcam.state(), WebcamState::Live);
    assert_eq!(log.successes(), 2);
    let requests = env.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].constraints.audio, changed.audio_constraints.or(Some(true.into())));
    assert_eq!(requests[1].constraints.video, changed.video_constraints.or(Some(true.into())));
}

#[tokio::test]
async fn test_audio_constraint_change_reacquires() {
    assert_reacquires_with_tracks_stopped_first(WebcamConfig {
        audio_constraints: Some(TrackConstraints::device("microphone-0")),
        ..Default::default()
    })
    .await;
}

#[tokio::test]
async fn test_video_constraint_change_reacquires() {
    assert_reacquires_with_tracks_stopped_first(WebcamConfig {
        video_constraints: Some(TrackConstraints::device("camera-0")),
        ..Default::default()
    })
    .await;
}

#[tokio::test]
async fn test_audio_only_capture() {
    let env = SoftwareEnvironment::new();
    let log = CallbackLog::default();
    let successes = log.successes.clone();
    let webcam = Webcam::builder(SoftwarePlatform::new(env.clone()))
        .video_constraints(false)
        .on_user_media(move || *successes.borrow_mut() += 1)
        .build(SoftwareVideo::new(320))
        .unwrap();

    webcam.mount().await;

    assert_eq!(webcam.state(), WebcamState::Live);
    assert_eq!(log.successes(), 1);
    assert_eq!(
        env.requests()[0].constraints.to_json().unwrap(),
        r#"{"audio":true,"video":false}"#
    );
    assert_eq!(env.live_tracks(), 1);
    assert!(!webcam.with_video(|video| video.decode_frame()));
    assert!(webcam.get_screenshot().is_none());
}

#[tokio::test]
async fn test_cosmetic_change_keeps_stream() {
    let env = SoftwareEnvironment::new();
    let (webcam, _log) = default_webcam(&env);
    webcam.mount().await;
    let stream_id = webcam.stream_id();

    webcam
        .update(WebcamConfig {
            mirrored: true,
            screenshot_format: ImageFormat::Png,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(env.requests().len(), 1);
    assert_eq!(webcam.stream_id(), stream_id);
    assert_eq!(
        webcam.with_video(|video| video.presentation().transform.clone()),
        Some("scaleX(-1)".to_string())
    );
}

#[tokio::test]
async fn test_invalid_update_is_rejected() {
    let env = SoftwareEnvironment::new();
    let (webcam, _log) = default_webcam(&env);

    let result = webcam
        .update(WebcamConfig {
            screenshot_quality: 2.0,
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(WebcamError::InvalidConfiguration { .. })));
    assert_eq!(webcam.config(), WebcamConfig::default());
}

// ============================================================================
// UNMOUNT AND SUPERSEDED ACQUISITIONS
// ============================================================================

#[tokio::test]
async fn test_unmount_stops_every_track() {
    let env = SoftwareEnvironment::new();
    let (webcam, _log) = default_webcam(&env);
    webcam.mount().await;
    assert_eq!(env.live_tracks(), 2);

    webcam.unmount();

    assert_eq!(env.live_tracks(), 0);
    assert_eq!(webcam.state(), WebcamState::Stopped);
    assert!(!webcam.has_user_media());
    assert!(webcam.get_screenshot().is_none());
    assert_eq!(webcam.with_video(|video| video.bound_stream_id()), None);
}

#[tokio::test]
async fn test_object_url_fallback_is_revoked_on_unmount() {
    let env = SoftwareEnvironment::new();
    let (webcam, log) = build(
        &env,
        SoftwareVideo::new(320).without_src_object(),
        WebcamConfig::default(),
    );

    webcam.mount().await;
    assert_eq!(log.successes(), 1);
    let url = webcam.object_url().unwrap();
    assert_eq!(webcam.with_video(|video| video.source_url().map(str::to_string)), Some(url.clone()));
    assert!(webcam.with_video(|video| video.decode_frame()));

    webcam.unmount();

    assert_eq!(webcam.object_url(), None);
    webcam.with_video(|video| {
        assert_eq!(video.revoked_urls(), [url.clone()]);
        assert_eq!(video.live_object_urls(), 0);
        assert_eq!(video.source_url(), None);
    });
}

#[tokio::test]
async fn test_superseded_stream_is_stopped() {
    let env = SoftwareEnvironment::new();
    env.pause_requests();
    let (webcam, log) = default_webcam(&env);

    let mut mount = task::spawn(webcam.mount());
    assert_pending!(mount.poll());

    let mut update = task::spawn(webcam.update(WebcamConfig {
        audio: false,
        ..Default::default()
    }));
    assert_pending!(update.poll());
    assert_eq!(env.pending_requests(), 2);

    // The first acquisition resolves after it has been superseded
    assert!(env.release_next());
    assert_ready!(mount.poll());
    assert_eq!(env.live_tracks(), 0);
    assert!(!webcam.has_user_media());

    assert!(env.release_next());
    assert_ready!(update.poll()).unwrap();

    assert_eq!(webcam.state(), WebcamState::Live);
    assert_eq!(env.issued_tracks().len(), 3);
    assert_eq!(env.live_tracks(), 1);
    assert_eq!(log.successes(), 1);
}

#[tokio::test]
async fn test_stream_arriving_after_unmount_is_stopped() {
    let env = SoftwareEnvironment::new();
    env.pause_requests();
    let (webcam, log) = default_webcam(&env);

    let mut mount = task::spawn(webcam.mount());
    assert_pending!(mount.poll());
    webcam.unmount();
    assert_eq!(webcam.state(), WebcamState::Stopped);

    assert!(env.release_next());
    assert_ready!(mount.poll());

    assert_eq!(env.issued_tracks().len(), 2);
    assert_eq!(env.live_tracks(), 0);
    assert_eq!(webcam.state(), WebcamState::Stopped);
    assert_eq!(log.successes(), 0);
}

// ============================================================================
// SCREENSHOTS
// ============================================================================

#[tokio::test]
async fn test_screenshot_requires_decoded_frame() {
    let env = SoftwareEnvironment::new();
    let (webcam, _log) = default_webcam(&env);
    assert!(webcam.get_screenshot().is_none());

    webcam.mount().await;
    assert!(webcam.get_screenshot().is_none());

    assert!(webcam.with_video(|video| video.decode_frame()));
    let shot = webcam.get_screenshot().unwrap();
    assert!(shot.starts_with("data:image/webp;base64,"));
}

#[tokio::test]
async fn test_mirrored_screenshot_flips_image() {
    let env = SoftwareEnvironment::new();
    let (webcam, _log) = default_webcam(&env);
    webcam.mount().await;
    webcam.with_video(|video| video.decode_frame());

    let options = ScreenshotOptions {
        format: ImageFormat::Png,
        ..Default::default()
    };
    let plain = decode_png(&webcam.get_screenshot_with(&options).unwrap());
    let mirrored = decode_png(
        &webcam
            .get_screenshot_with(&ScreenshotOptions {
                mirrored: true,
                ..options
            })
            .unwrap(),
    );

    assert_eq!(plain.dimensions(), (320, 240));
    assert_eq!(image::imageops::flip_horizontal(&plain), mirrored);
}

#[tokio::test]
async fn test_sizing_update_resizes_screenshots() {
    let env = SoftwareEnvironment::new();
    let config = WebcamConfig {
        screenshot_format: ImageFormat::Png,
        ..Default::default()
    };
    let (webcam, _log) = build(&env, SoftwareVideo::new(320), config.clone());
    webcam.mount().await;
    webcam.with_video(|video| video.decode_frame());
    assert_eq!(decode_png(&webcam.get_screenshot().unwrap()).dimensions(), (320, 240));

    webcam
        .update(WebcamConfig {
            min_screenshot_height: Some(600),
            ..config.clone()
        })
        .await
        .unwrap();
    assert_eq!(decode_png(&webcam.get_screenshot().unwrap()).dimensions(), (800, 600));

    webcam
        .update(WebcamConfig {
            force_screenshot_source_size: true,
            ..config
        })
        .await
        .unwrap();
    assert_eq!(decode_png(&webcam.get_screenshot().unwrap()).dimensions(), (640, 480));
}
