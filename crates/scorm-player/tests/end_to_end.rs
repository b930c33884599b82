use std::io::{Cursor, Write};
use std::sync::Arc;

use scorm_core::{ProgressStatus, import_package};
use scorm_player::{HeadlessHost, LearnerConfig, Phase, Player, ResourceRegistry};
use scorm_store::CourseStore;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="demo" version="1.2" xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2">
  <organizations>
    <organization identifier="org">
      <title>Safety Basics</title>
    </organization>
  </organizations>
  <resources>
    <resource identifier="r1" type="webcontent" adlcp:scormtype="sco" href="start.html"/>
  </resources>
</manifest>"#;

const START: &str = r#"<html>
<head><title>Start</title><link rel="stylesheet" href="style.css"></head>
<body><img src="logo.png"><img src="https://x/y.png"></body>
</html>"#;

const LOGO: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00];

fn course_zip() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let entries: [(&str, &[u8]); 4] = [
        ("imsmanifest.xml", MANIFEST.as_bytes()),
        ("start.html", START.as_bytes()),
        ("style.css", b"body { margin: 0 }"),
        ("logo.png", LOGO),
    ];
    for (name, data) in entries {
        writer.start_file(name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

async fn imported(store: &CourseStore) -> String {
    let package = import_package(&course_zip(), "safety.zip").unwrap();
    store.save(&package.record, &package.files).await.unwrap();
    package.record.id
}

fn handle_urls(html: &str) -> Vec<&str> {
    html.match_indices("blob:scorm-player/")
        .map(|(start, _)| {
            let rest = &html[start..];
            let end = rest.find(['"', '\'']).unwrap_or(rest.len());
            &rest[..end]
        })
        .collect()
}

#[tokio::test]
async fn import_play_and_complete_a_course() {
    let store = CourseStore::in_memory();
    let course_id = imported(&store).await;

    let record = store.record(&course_id).await.unwrap().unwrap();
    assert_eq!(record.title, "Safety Basics");
    assert_eq!(record.entry_path.as_deref(), Some("start.html"));
    assert_eq!(record.file_count, 4);

    let host = Arc::new(HeadlessHost::new());
    let mut player = Player::new(store.clone(), host.clone(), LearnerConfig::default());
    let shim = player.load(&course_id).await.unwrap();

    let document = host.document().unwrap();
    assert_eq!(document.rewritten, 2);
    assert!(!document.html.contains("style.css"));
    assert!(!document.html.contains("\"logo.png\""));
    assert!(document.html.contains(r#"src="https://x/y.png""#));

    let registry: &ResourceRegistry = player.virtualizer().registry();
    let served: Vec<_> = handle_urls(&document.html)
        .into_iter()
        .map(|url| registry.fetch(url).unwrap())
        .collect();
    assert_eq!(served.len(), 2);
    assert_eq!(served[0].media_type, "text/css");
    assert_eq!(served[1].media_type, "image/png");
    assert_eq!(served[1].bytes.as_slice(), LOGO);

    assert_eq!(shim.invoke("LMSInitialize", &[""]).await, "true");
    assert_eq!(
        shim.invoke("LMSGetValue", &["cmi.core.lesson_status"]).await,
        "not attempted"
    );
    assert_eq!(
        shim.invoke("LMSSetValue", &["cmi.core.lesson_status", "completed"]).await,
        "true"
    );
    assert_eq!(shim.invoke("LMSCommit", &[""]).await, "true");

    let record = store.record(&course_id).await.unwrap().unwrap();
    assert_eq!(record.progress.status, ProgressStatus::Completed);
    assert!(record.last_accessed.is_some());

    assert_eq!(shim.invoke("LMSFinish", &[""]).await, "true");
    assert_eq!(shim.phase().await, Phase::Terminated);
}

#[tokio::test]
async fn stored_data_survives_sessions_and_merges() {
    let store = CourseStore::in_memory();
    let course_id = imported(&store).await;
    let mut player = Player::new(
        store.clone(),
        Arc::new(HeadlessHost::new()),
        LearnerConfig::default(),
    );

    let shim = player.load(&course_id).await.unwrap();
    shim.invoke("Initialize", &[""]).await;
    shim.invoke("SetValue", &["cmi.location", "page-3"]).await;
    shim.invoke("Terminate", &[""]).await;
    player.stop().await.unwrap();

    let shim = player.load(&course_id).await.unwrap();
    assert_eq!(shim.invoke("GetValue", &["cmi.location"]).await, "page-3");
    shim.invoke("SetValue", &["cmi.score.raw", "88"]).await;
    shim.invoke("Commit", &[""]).await;

    let data = store.runtime_data(&course_id).await.unwrap();
    assert_eq!(data["cmi.location"], "page-3");
    assert_eq!(data["cmi.score.raw"], "88");

    let first = data.clone();
    shim.invoke("Commit", &[""]).await;
    assert_eq!(store.runtime_data(&course_id).await.unwrap(), first);
}

#[tokio::test]
async fn stop_racing_a_commit_keeps_the_data() {
    let store = CourseStore::in_memory();
    let course_id = imported(&store).await;
    let mut player = Player::new(
        store.clone(),
        Arc::new(HeadlessHost::new()),
        LearnerConfig::default(),
    );

    let shim = player.load(&course_id).await.unwrap();
    shim.invoke("LMSInitialize", &[""]).await;
    shim.invoke("LMSSetValue", &["cmi.core.lesson_status", "passed"]).await;

    let pending = {
        let shim = shim.clone();
        tokio::spawn(async move { shim.invoke("LMSCommit", &[""]).await })
    };
    let progress = player.stop().await.unwrap().unwrap();
    assert_eq!(pending.await.unwrap(), "true");

    assert_eq!(progress.status, ProgressStatus::Passed);
    let data = store.runtime_data(&course_id).await.unwrap();
    assert_eq!(data["cmi.core.lesson_status"], "passed");
    let record = store.record(&course_id).await.unwrap().unwrap();
    assert_eq!(record.progress.status, ProgressStatus::Passed);
}

#[tokio::test]
async fn deleting_a_course_removes_everything() {
    let dir = TempDir::new().unwrap();
    let store = CourseStore::on_disk(dir.path().to_path_buf()).await.unwrap();
    let course_id = imported(&store).await;
    let mut player = Player::new(
        store.clone(),
        Arc::new(HeadlessHost::new()),
        LearnerConfig::default(),
    );

    let shim = player.load(&course_id).await.unwrap();
    shim.invoke("LMSSetValue", &["cmi.suspend_data", "x"]).await;
    player.stop().await.unwrap();
    assert!(!store.runtime_data(&course_id).await.unwrap().is_empty());

    assert!(store.delete(&course_id).await.unwrap());

    assert!(store.record(&course_id).await.unwrap().is_none());
    assert!(store.get(&course_id).await.unwrap().is_none());
    assert!(store.runtime_data(&course_id).await.unwrap().is_empty());
    assert!(player.load(&course_id).await.is_err());
}

#[tokio::test]
async fn course_without_html_cannot_be_played() {
    let store = CourseStore::in_memory();
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("notes.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"nothing to launch").unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let package = import_package(&bytes, "notes.zip").unwrap();
    assert_eq!(package.record.title, "notes");
    assert!(package.record.entry_path.is_none());
    store.save(&package.record, &package.files).await.unwrap();

    let mut player = Player::new(store, Arc::new(HeadlessHost::new()), LearnerConfig::default());
    let err = player.load(&package.record.id).await.unwrap_err();
    assert!(err.to_string().contains("no entry point"));
}
