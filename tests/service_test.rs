//! End-to-end tests: synthetic camera -> publisher -> served directory ->
//! embedded HTTP server.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use camcast::config::{CamcastConfig, CameraConfig, ServerConfig, StorageConfig};
use camcast::publisher::SegmentPublisher;
use camcast::service::StreamService;
use camcast::testing::{synthetic_segment_bytes, SyntheticCamera};
use camcast::types::{CameraEvent, CameraFacing, FlashMode, SegmentNotification};

fn test_config(served_dir: &Path, port: u16) -> CamcastConfig {
    CamcastConfig {
        server: ServerConfig {
            port,
            bind_addr: "127.0.0.1".to_string(),
        },
        storage: StorageConfig {
            served_dir: served_dir.to_string_lossy().to_string(),
            playlist_name: "playlist.m3u8".to_string(),
        },
        camera: CameraConfig {
            default_flash: FlashMode::Auto,
            default_facing: CameraFacing::Back,
            segment_duration_secs: 1,
        },
    }
}

/// Poll until `predicate` holds or the timeout elapses.
async fn wait_for<F: Fn() -> bool>(predicate: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    predicate()
}

#[tokio::test]
async fn test_recording_publishes_and_serves_segments() {
    let served = tempdir().unwrap();
    let work = tempdir().unwrap();
    let config = test_config(served.path(), 18090);

    let camera = Arc::new(SyntheticCamera::new(work.path(), Duration::from_millis(30)));
    let service = StreamService::init(&config, camera).await.unwrap();

    service.start_recording().await;
    assert!(service.is_recording());

    let playlist_path = served.path().join("playlist.m3u8");
    let seg_path = served.path().join("seg1.ts");
    assert!(
        wait_for(
            || playlist_path.exists() && seg_path.exists(),
            Duration::from_secs(5)
        )
        .await,
        "publisher should have republished manifest and segments"
    );

    // The served bytes over HTTP match what the publisher wrote on disk.
    let url = format!("{}/seg0.ts", service.base_url());
    let over_http = reqwest::get(&url).await.unwrap().bytes().await.unwrap();
    assert_eq!(over_http.as_ref(), synthetic_segment_bytes(0, 16));

    let url = format!("{}/playlist.m3u8", service.base_url());
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    let manifest = response.text().await.unwrap();
    assert!(manifest.starts_with("#EXTM3U"));
    assert!(manifest.contains("seg0.ts"));

    service.stop_recording().await;
    assert!(!service.is_recording());
    service.shutdown().await;
}

#[tokio::test]
async fn test_segments_while_not_recording_are_discarded() {
    let served = tempdir().unwrap();
    let work = tempdir().unwrap();
    let source = tempdir().unwrap();
    let config = test_config(served.path(), 18091);

    let camera = Arc::new(SyntheticCamera::new(work.path(), Duration::from_millis(30)));
    let injector = camera.clone();
    let service = StreamService::init(&config, camera).await.unwrap();

    let manifest_path = source.path().join("live.m3u8");
    let segment_path = source.path().join("seg0.ts");
    tokio::fs::write(&manifest_path, "#EXTM3U").await.unwrap();
    tokio::fs::write(&segment_path, "bytes").await.unwrap();

    // Fired after recording stopped; the handler must discard it silently.
    let n = SegmentNotification::new(&manifest_path, &segment_path, "seg0.ts").unwrap();
    injector.inject(CameraEvent::Segment(n)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!served.path().join("playlist.m3u8").exists());
    assert!(!served.path().join("seg0.ts").exists());
    // Static assets are still provisioned, nothing else.
    assert!(served.path().join("index.html").exists());

    service.shutdown().await;
}

#[tokio::test]
async fn test_stream_start_event_is_informational_only() {
    let served = tempdir().unwrap();
    let work = tempdir().unwrap();
    let config = test_config(served.path(), 18092);

    let camera = Arc::new(SyntheticCamera::new(work.path(), Duration::from_millis(30)));
    let injector = camera.clone();
    let service = StreamService::init(&config, camera).await.unwrap();

    injector
        .inject(CameraEvent::StreamStarted {
            stream_id: uuid::Uuid::new_v4(),
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!served.path().join("playlist.m3u8").exists());

    service.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_publishes_do_not_interleave() {
    let source = tempdir().unwrap();
    let served = tempdir().unwrap();
    let publisher = Arc::new(SegmentPublisher::new(
        served.path(),
        "playlist.m3u8",
        Arc::new(AtomicBool::new(true)),
    ));

    // Each writer publishes a large single-character manifest; if two
    // publishes ever overlapped, the served manifest could mix characters
    // or be truncated mid-replace.
    const SIZE: usize = 256 * 1024;
    let mut tasks = Vec::new();
    for (i, ch) in [b'A', b'B', b'C', b'D', b'E'].into_iter().enumerate() {
        let manifest_path = source.path().join(format!("m{}.m3u8", i));
        let segment_path = source.path().join(format!("s{}.ts", i));
        tokio::fs::write(&manifest_path, vec![ch; SIZE]).await.unwrap();
        tokio::fs::write(&segment_path, vec![ch; SIZE]).await.unwrap();

        let n = SegmentNotification::new(&manifest_path, &segment_path, format!("seg{}.ts", i))
            .unwrap();
        let publisher = publisher.clone();
        tasks.push(tokio::spawn(async move {
            publisher.publish(&n).await.unwrap();
        }));
    }
    futures::future::join_all(tasks).await;

    let manifest = tokio::fs::read(served.path().join("playlist.m3u8"))
        .await
        .unwrap();
    assert_eq!(manifest.len(), SIZE, "manifest must not be torn");
    let first = manifest[0];
    assert!(manifest.iter().all(|&b| b == first), "manifest must be uniform");

    // Every writer's segment landed intact under its own name.
    for (i, ch) in [b'A', b'B', b'C', b'D', b'E'].into_iter().enumerate() {
        let segment = tokio::fs::read(served.path().join(format!("seg{}.ts", i)))
            .await
            .unwrap();
        assert_eq!(segment, vec![ch; SIZE]);
    }
}

#[tokio::test]
async fn test_first_publish_notice_once_through_the_service() {
    let served = tempdir().unwrap();
    let work = tempdir().unwrap();
    let source = tempdir().unwrap();
    let config = test_config(served.path(), 18093);

    let camera = Arc::new(SyntheticCamera::new(work.path(), Duration::from_millis(30)));
    let service = StreamService::init(&config, camera).await.unwrap();

    let manifest_path = source.path().join("live.m3u8");
    let segment_path = source.path().join("seg.ts");
    tokio::fs::write(&manifest_path, "#EXTM3U").await.unwrap();
    tokio::fs::write(&segment_path, "bytes").await.unwrap();

    let n1 = SegmentNotification::new(&manifest_path, &segment_path, "seg0.ts").unwrap();
    let n2 = SegmentNotification::new(&manifest_path, &segment_path, "seg1.ts").unwrap();

    let publisher = service.publisher();
    assert!(publisher.publish(&n1).await.unwrap().first_publish);
    assert!(!publisher.publish(&n2).await.unwrap().first_publish);

    service.shutdown().await;
}

#[tokio::test]
async fn test_stale_playlist_cleared_on_init() {
    let served = tempdir().unwrap();
    let work = tempdir().unwrap();
    std::fs::create_dir_all(served.path()).unwrap();
    std::fs::write(served.path().join("playlist.m3u8"), "stale").unwrap();

    let config = test_config(served.path(), 18094);
    let camera = Arc::new(SyntheticCamera::new(work.path(), Duration::from_millis(30)));
    let service = StreamService::init(&config, camera).await.unwrap();

    assert!(!served.path().join("playlist.m3u8").exists());
    service.shutdown().await;
}

#[tokio::test]
async fn test_stale_playlist_never_served_during_init() {
    // The stale playlist is removed before the listener binds, so no request
    // racing against init can ever read the previous run's manifest. Hammer
    // the playlist URL across several inits to catch an ordering regression.
    let client = reqwest::Client::new();
    let url = "http://127.0.0.1:18095/playlist.m3u8".to_string();

    for _ in 0..5 {
        let served = tempdir().unwrap();
        let work = tempdir().unwrap();
        std::fs::write(served.path().join("playlist.m3u8"), "stale").unwrap();

        let saw_stale = Arc::new(AtomicBool::new(false));
        let hammer = {
            let client = client.clone();
            let url = url.clone();
            let saw_stale = saw_stale.clone();
            tokio::spawn(async move {
                loop {
                    // Refused connections just mean the server is not up yet.
                    if let Ok(response) = client.get(&url).send().await {
                        if response.status() == 200 {
                            if let Ok(body) = response.text().await {
                                if body == "stale" {
                                    saw_stale.store(true, std::sync::atomic::Ordering::SeqCst);
                                }
                            }
                        }
                    }
                }
            })
        };

        let config = test_config(served.path(), 18095);
        let camera = Arc::new(SyntheticCamera::new(work.path(), Duration::from_millis(30)));
        let service = StreamService::init(&config, camera).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        hammer.abort();
        assert!(
            !saw_stale.load(std::sync::atomic::Ordering::SeqCst),
            "a request observed the previous run's playlist during init"
        );
        service.shutdown().await;
    }
}
