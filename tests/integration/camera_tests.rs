use std::fs;
use std::time::Duration;

use filetime::FileTime;
use rollcall::notify::MemoryNotifier;
use rollcall::scanner::{
    AcquisitionError, Camera, CaptureConstraints, ControllerConfig, Decoder, DirectoryCamera,
    Frame, QrDecoder, ScanCommand, ScanController, SnapshotCamera, VideoStream,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::common::{qr_image, ScriptedLogger};

fn blank_image() -> image::RgbaImage {
    image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]))
}

#[test]
fn test_qr_decoder_reads_rendered_code() {
    let image = qr_image("INTERN-42", 4);
    let frame = Frame::from_image(&image::DynamicImage::ImageRgba8(image), 1);

    let decoded = QrDecoder::new().decode(&frame.pixels, frame.width, frame.height);
    assert_eq!(decoded.as_deref(), Some("INTERN-42"));
}

#[test]
fn test_qr_decoder_ignores_blank_frame() {
    let frame = Frame::from_image(&image::DynamicImage::ImageRgba8(blank_image()), 1);
    assert_eq!(
        QrDecoder::new().decode(&frame.pixels, frame.width, frame.height),
        None
    );
}

#[tokio::test]
async fn test_directory_camera_replays_frames_in_name_order() {
    let dir = TempDir::new().unwrap();
    qr_image("SECOND", 3).save(dir.path().join("b.png")).unwrap();
    qr_image("FIRST", 3).save(dir.path().join("a.png")).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

    let mut camera = DirectoryCamera::new(dir.path());
    let mut stream = camera
        .acquire(&CaptureConstraints::default())
        .await
        .unwrap();
    assert_eq!(stream.remaining(), 2);

    let decoder = QrDecoder::new();
    let mut decoded = Vec::new();
    while let Some(frame) = stream.read_frame().unwrap() {
        decoded.push(decoder.decode(&frame.pixels, frame.width, frame.height));
    }
    assert_eq!(
        decoded,
        vec![Some("FIRST".to_string()), Some("SECOND".to_string())]
    );

    stream.stop();
    assert!(!stream.is_live());
}

#[tokio::test]
async fn test_directory_camera_rejects_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("frame.png");
    blank_image().save(&file).unwrap();

    let err = DirectoryCamera::new(&file)
        .acquire(&CaptureConstraints::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::Unsupported { .. }));
}

#[tokio::test]
async fn test_snapshot_camera_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = SnapshotCamera::new(dir.path().join("webcam.jpg"))
        .acquire(&CaptureConstraints::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::NotFound(_)));
}

#[tokio::test]
async fn test_snapshot_camera_only_yields_changed_frames() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("webcam.png");
    qr_image("FIRST", 3).save(&path).unwrap();

    let mut stream = SnapshotCamera::new(&path)
        .acquire(&CaptureConstraints::default())
        .await
        .unwrap();

    let first = stream.read_frame().unwrap().unwrap();
    assert_eq!(first.sequence, 1);
    // Same modification time means no new frame
    assert!(stream.read_frame().unwrap().is_none());

    // Bump the mtime explicitly; some filesystems have coarse timestamps
    qr_image("SECOND", 3).save(&path).unwrap();
    let later = fs::metadata(&path).unwrap().modified().unwrap() + Duration::from_secs(5);
    filetime::set_file_mtime(&path, FileTime::from_system_time(later)).unwrap();

    let second = stream.read_frame().unwrap().unwrap();
    assert_eq!(second.sequence, 2);
    assert_eq!(
        QrDecoder::new()
            .decode(&second.pixels, second.width, second.height)
            .as_deref(),
        Some("SECOND")
    );

    stream.stop();
    assert!(stream.read_frame().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_scan_loop_over_frame_directory() {
    let dir = TempDir::new().unwrap();
    blank_image().save(dir.path().join("000.png")).unwrap();
    qr_image("ABC123", 3).save(dir.path().join("001.png")).unwrap();
    qr_image("ABC123", 3).save(dir.path().join("002.png")).unwrap();

    let logger = ScriptedLogger::new().success("ABC123", "Jane", "I42");
    let calls = logger.calls();
    let notifier = MemoryNotifier::new();
    let controller = ScanController::new(
        DirectoryCamera::new(dir.path()),
        QrDecoder::new(),
        logger,
        notifier.clone(),
        ControllerConfig {
            exit_on_success: true,
            ..ControllerConfig::default()
        },
    );

    let (tx, rx) = mpsc::channel(4);
    tx.send(ScanCommand::Start).await.unwrap();
    let report = controller.run(rx).await;

    assert_eq!(*calls.lock().unwrap(), vec!["ABC123".to_string()]);
    assert_eq!(report.logged.len(), 1);
    assert_eq!(
        notifier.messages(),
        vec!["QR Detected: ABC123", "Entry logged for Jane (I42)"]
    );
    drop(tx);
}
