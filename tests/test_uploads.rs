mod support;

use crate::support::{
    dashboard_with, file_of_mib, instant_services, memory_persistence, tracing_init, GatedTransport,
};
use dashdeck::drag::KeyboardCommand;
use dashdeck::notifications::{NotificationLevel, UPLOAD_TOAST_ID};
use dashdeck::persistence::{KeyValueStore, ASSETS_KEY};
use dashdeck::upload::{FileSource, PipelineStatus, RawFile, UploadError};
use dashdeck::Surface;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_size_policy_admits_only_files_under_the_ceiling() {
    tracing_init();
    let (_store, persistence) = memory_persistence();
    let mut dashboard = dashboard_with(persistence, instant_services().0).await;
    let mut warnings = dashboard.notifier().subscribe();

    let report = dashboard.stage_files(vec![
        file_of_mib("one.pdf", "application/pdf", 1),
        file_of_mib("six.pdf", "application/pdf", 6),
        file_of_mib("four.pdf", "application/pdf", 4),
        file_of_mib("ten.pdf", "application/pdf", 10),
    ]);

    let staged: Vec<_> = dashboard
        .upload()
        .unwrap()
        .staged()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(staged, vec!["one.pdf", "four.pdf"]);
    assert_eq!(report.rejected, vec!["six.pdf", "ten.pdf"]);

    // Verify rejections are reported as one batched warning
    let warning = warnings.try_recv().unwrap();
    assert_eq!(warning.level, NotificationLevel::Warning);
    assert!(warning.message.contains("six.pdf"));
    assert!(warning.message.contains("ten.pdf"));
    assert!(warnings.try_recv().is_err());
}

#[tokio::test]
async fn test_scenario_stage_two_images_and_commit() {
    tracing_init();
    let (store, persistence) = memory_persistence();
    let (services, previews) = instant_services();
    let mut dashboard = dashboard_with(persistence, services).await;
    let mut notifications = dashboard.notifier().subscribe();

    let report = dashboard.stage_files(vec![
        file_of_mib("beach.png", "image/png", 2),
        file_of_mib("forest.jpg", "image/jpeg", 3),
        file_of_mib("huge.png", "image/png", 8),
    ]);
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.rejected, vec!["huge.png"]);
    assert_eq!(previews.outstanding(), 2);

    let rejection = notifications.try_recv().unwrap();
    assert_eq!(rejection.level, NotificationLevel::Warning);

    let added = dashboard.commit_upload().await.unwrap();
    assert_eq!(added, 2);

    let names: Vec<_> = dashboard.assets().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["beach.png", "forest.jpg"]);
    assert!(dashboard.assets()[0].data_url.starts_with("data:image/png;base64,"));
    assert_eq!(dashboard.assets()[1].size, 3 * 1024 * 1024);

    // Verify the dialog closed and nothing was left behind
    assert!(dashboard.upload().is_none());
    assert_eq!(previews.outstanding(), 0);
    assert_eq!(previews.released(), 2);

    let stored = store.get(ASSETS_KEY).await.unwrap().unwrap();
    assert!(stored.contains("forest.jpg"));

    // Only one rejection warning for the whole scenario
    let rest: Vec<_> = std::iter::from_fn(|| notifications.try_recv().ok()).collect();
    assert!(rest.iter().all(|n| n.level != NotificationLevel::Warning));
}

#[tokio::test]
async fn test_every_preview_released_exactly_once() {
    tracing_init();
    let (_store, persistence) = memory_persistence();
    let (services, previews) = instant_services();
    let mut dashboard = dashboard_with(persistence, services).await;

    // Unstage one, commit the rest
    let report = dashboard.stage_files(vec![
        file_of_mib("a.png", "image/png", 1),
        file_of_mib("b.png", "image/png", 1),
        file_of_mib("notes.txt", "text/plain", 1),
    ]);
    assert!(dashboard.unstage_file(&report.accepted[1]));
    assert!(!dashboard.unstage_file(&report.accepted[1]));
    dashboard.commit_upload().await.unwrap();

    // Stage more and walk away from the dialog
    dashboard.stage_files(vec![
        file_of_mib("c.png", "image/png", 1),
        file_of_mib("d.png", "image/png", 1),
    ]);
    dashboard.close_upload();

    assert_eq!(previews.created(), 4);
    assert_eq!(previews.released(), 4);
    assert_eq!(previews.outstanding(), 0);
    assert_eq!(previews.stale_releases(), 0);
}

#[tokio::test]
async fn test_encode_failure_commits_nothing_and_keeps_staged_files() {
    tracing_init();
    let temp_dir = TempDir::new().unwrap();
    let (store, persistence) = memory_persistence();
    let (services, previews) = instant_services();
    let mut dashboard = dashboard_with(persistence, services).await;
    let mut toasts = dashboard.notifier().subscribe_toast(UPLOAD_TOAST_ID);

    let on_disk = temp_dir.path().join("photo.png");
    std::fs::write(&on_disk, b"not really a png").unwrap();
    let good = RawFile::from_path(&on_disk, "image/png").await.unwrap();
    let vanished = RawFile::new(
        "gone.png",
        "image/png",
        12,
        FileSource::Path(temp_dir.path().join("gone.png")),
    );
    let report = dashboard.stage_files(vec![good, vanished]);

    let result = dashboard.commit_upload().await;
    assert!(matches!(result, Err(UploadError::Read { ref name, .. }) if name == "gone.png"));

    // Verify nothing was committed and the dialog is ready for a retry
    assert!(dashboard.assets().is_empty());
    assert_eq!(store.write_count(), 0);
    let pipeline = dashboard.upload().unwrap();
    assert_eq!(pipeline.staged().len(), 2);
    assert_eq!(pipeline.status(), PipelineStatus::Staging);
    assert_eq!(previews.outstanding(), 2);

    assert_eq!(toasts.try_recv().unwrap().level, NotificationLevel::Loading);
    assert_eq!(toasts.try_recv().unwrap().level, NotificationLevel::Error);

    // Drop the broken file and retry
    assert!(dashboard.unstage_file(&report.accepted[1]));
    assert_eq!(dashboard.commit_upload().await.unwrap(), 1);
    assert_eq!(dashboard.assets()[0].name, "photo.png");
    assert_eq!(previews.outstanding(), 0);

    assert_eq!(toasts.try_recv().unwrap().level, NotificationLevel::Loading);
    assert_eq!(toasts.try_recv().unwrap().level, NotificationLevel::Success);
}

#[tokio::test]
async fn test_widgets_can_be_reordered_while_upload_is_in_flight() {
    tracing_init();
    let (store, persistence) = memory_persistence();
    let (mut services, _previews) = instant_services();
    let (transport, gate) = GatedTransport::new();
    services.transport = Arc::new(transport);
    let mut dashboard = dashboard_with(persistence, services).await;

    dashboard.stage_files(vec![file_of_mib("late.png", "image/png", 1)]);
    let ticket = dashboard.begin_upload().unwrap();
    let transfer = tokio::spawn(ticket.run());

    assert!(dashboard.upload().unwrap().is_uploading());
    assert!(dashboard.begin_upload().is_none());

    // Verify a keyboard reorder goes through while the transfer is parked
    dashboard
        .keyboard(Surface::Widgets, KeyboardCommand::PickUp("productivity".into()))
        .await;
    dashboard
        .keyboard(Surface::Widgets, KeyboardCommand::MoveTo("cloud".into()))
        .await;
    assert!(dashboard.keyboard(Surface::Widgets, KeyboardCommand::Drop).await);
    assert_eq!(dashboard.widgets()[0].id, "productivity");
    assert_eq!(store.write_count(), 1);

    gate.notify_one();
    let outcome = transfer.await.unwrap();
    assert_eq!(dashboard.finish_upload(outcome).await.unwrap(), 1);

    assert_eq!(dashboard.assets()[0].name, "late.png");
    assert_eq!(dashboard.widgets()[0].id, "productivity");
}

#[tokio::test]
async fn test_new_batch_goes_in_front_of_older_assets() {
    tracing_init();
    let (_store, persistence) = memory_persistence();
    let mut dashboard = dashboard_with(persistence, instant_services().0).await;

    dashboard.stage_files(vec![RawFile::from_bytes("first.txt", "text/plain", b"1".to_vec())]);
    dashboard.commit_upload().await.unwrap();
    dashboard.stage_files(vec![
        RawFile::from_bytes("second.txt", "text/plain", b"2".to_vec()),
        RawFile::from_bytes("third.txt", "text/plain", b"3".to_vec()),
    ]);
    dashboard.commit_upload().await.unwrap();

    let names: Vec<_> = dashboard.assets().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["second.txt", "third.txt", "first.txt"]);
}
