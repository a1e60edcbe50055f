//! Screenshot Demo
//!
//! Mounts a webcam on the software platform, takes plain and mirrored
//! screenshots in every format, switches constraints and unmounts.
//!
//! Run with `RUST_LOG=debug` to see the acquisition negotiation.

use webcam::software::{SoftwareDevice, SoftwareVideo};
use webcam::{
    diagnostics, ImageFormat, ScreenshotOptions, SoftwareEnvironment, SoftwarePlatform,
    TrackConstraints, Webcam, WebcamConfig, WebcamEvent,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    diagnostics::init_logging()?;

    println!("📷 Webcam Screenshot Demo");
    println!("=========================");

    let env = SoftwareEnvironment::new().with_device(SoftwareDevice::camera("camera-hd", 1280, 720));
    let webcam = Webcam::builder(SoftwarePlatform::new(env.clone()))
        .audio(false)
        .min_screenshot_width(480)
        .on_user_media(|| println!("✅ Camera stream bound"))
        .on_user_media_error(|message| println!("❌ Camera unavailable: {message}"))
        .build(SoftwareVideo::new(640))?;
    let mut events = webcam.subscribe();

    // Demo 1: Mount and capture
    println!("\n🎥 Demo 1: Mount and capture");
    webcam.mount().await;
    webcam.with_video(|video| video.decode_frame());

    for format in [ImageFormat::Webp, ImageFormat::Png, ImageFormat::Jpeg] {
        for mirrored in [false, true] {
            let options = ScreenshotOptions {
                format,
                mirrored,
                ..Default::default()
            };
            match webcam.get_screenshot_with(&options) {
                Some(data_url) => println!(
                    "   {:<10} mirrored={:<5} {} bytes",
                    format.mime_type(),
                    mirrored,
                    data_url.len()
                ),
                None => println!("   {} not ready", format.mime_type()),
            }
        }
    }

    // Demo 2: Switch camera
    println!("\n🔄 Demo 2: Switch to the HD camera");
    webcam
        .update(WebcamConfig {
            audio: false,
            min_screenshot_width: Some(480),
            force_screenshot_source_size: true,
            video_constraints: Some(TrackConstraints::device("camera-hd")),
            ..Default::default()
        })
        .await?;
    webcam.with_video(|video| video.decode_frame());
    if let Some(data_url) = webcam.get_screenshot() {
        println!("   Native-size screenshot: {} bytes", data_url.len());
    }

    // Demo 3: Unmount
    println!("\n🛑 Demo 3: Unmount");
    webcam.unmount();
    println!("   Live tracks after unmount: {}", env.live_tracks());

    println!("\n📋 Events:");
    while let Ok(Some(event)) = events.try_next() {
        match event {
            WebcamEvent::StateChanged { from, to } => println!("   state {from} -> {to}"),
            other => println!("   {}", other.event_type()),
        }
    }

    println!("\n✨ Screenshot demo completed!");
    Ok(())
}
