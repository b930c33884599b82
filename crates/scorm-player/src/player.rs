use std::sync::Arc;

use scorm_core::{CourseRecord, ProgressState};
use scorm_store::CourseStore;

use crate::config::LearnerConfig;
use crate::error::PlayerError;
use crate::host::PlaybackHost;
use crate::shim::RuntimeShim;
use crate::virtualizer::{ContentVirtualizer, PreparedDocument};

struct ActiveCourse {
    record: CourseRecord,
    document: PreparedDocument,
    shim: Arc<RuntimeShim>,
}

/// Plays one course at a time through a [`PlaybackHost`].
pub struct Player {
    store: CourseStore,
    virtualizer: ContentVirtualizer,
    host: Arc<dyn PlaybackHost>,
    learner: LearnerConfig,
    active: Option<ActiveCourse>,
}

impl Player {
    pub fn new(store: CourseStore, host: Arc<dyn PlaybackHost>, learner: LearnerConfig) -> Self {
        Self::with_virtualizer(store, host, learner, ContentVirtualizer::default())
    }

    pub fn with_virtualizer(
        store: CourseStore,
        host: Arc<dyn PlaybackHost>,
        learner: LearnerConfig,
        virtualizer: ContentVirtualizer,
    ) -> Self {
        Self {
            store,
            virtualizer,
            host,
            learner,
            active: None,
        }
    }

    /// Start playing a course, stopping whatever was playing before.
    ///
    /// A host that cannot expose the runtime API is logged and tolerated:
    /// the course still plays, it just cannot report progress.
    pub async fn load(&mut self, course_id: &str) -> Result<Arc<RuntimeShim>, PlayerError> {
        if self.active.is_some() {
            self.stop().await?;
        }

        let course = self
            .store
            .get(course_id)
            .await?
            .ok_or_else(|| PlayerError::CourseNotFound(course_id.to_string()))?;
        let document = self.virtualizer.prepare(&course)?;
        let data = self.store.runtime_data(course_id).await?;

        let shim = Arc::new(RuntimeShim::new(
            course_id,
            self.store.clone(),
            self.learner.clone(),
            data,
        ));

        if let Err(e) = self.host.mount(&document, shim.clone()) {
            tracing::warn!(course_id, error = %e, "Runtime API not injected; progress will not be tracked");
        }

        tracing::info!(
            course_id,
            title = %course.record.title,
            entry_path = %document.entry_path,
            "Course loaded"
        );

        self.active = Some(ActiveCourse {
            record: course.record,
            document,
            shim: shim.clone(),
        });
        Ok(shim)
    }

    /// Stop the active course and write its final commit.
    ///
    /// In-memory session state is cleared and the host unmounted before the
    /// commit is written, from a snapshot taken first. Returns the persisted
    /// progress, or `None` when nothing was playing.
    pub async fn stop(&mut self) -> Result<Option<ProgressState>, PlayerError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };

        let snapshot = active.shim.close().await;
        active.shim.clear().await;
        self.host.unmount();

        let progress = active.shim.write_snapshot(snapshot).await?;
        tracing::info!(
            course_id = %active.record.id,
            status = %progress.status,
            "Course stopped"
        );
        Ok(Some(progress))
    }

    pub fn active_course(&self) -> Option<&CourseRecord> {
        self.active.as_ref().map(|active| &active.record)
    }

    pub fn shim(&self) -> Option<Arc<RuntimeShim>> {
        self.active.as_ref().map(|active| active.shim.clone())
    }

    pub fn document(&self) -> Option<&PreparedDocument> {
        self.active.as_ref().map(|active| &active.document)
    }

    pub fn store(&self) -> &CourseStore {
        &self.store
    }

    pub fn virtualizer(&self) -> &ContentVirtualizer {
        &self.virtualizer
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use scorm_core::{FileRecord, FileTable, ProgressStatus};

    use super::*;
    use crate::error::InjectionError;
    use crate::host::{ApiHandle, HeadlessHost};
    use crate::shim::Phase;

    async fn seed(store: &CourseStore, id: &str, entry_path: Option<&str>) {
        let mut files = FileTable::new();
        files.insert(FileRecord::text("index.html", "<html><head></head></html>"));
        let record = CourseRecord {
            id: id.into(),
            title: format!("Course {id}"),
            description: String::new(),
            manifest: None,
            entry_path: entry_path.map(str::to_string),
            uploaded_at: Utc::now(),
            last_accessed: None,
            progress: ProgressState::default(),
            archive_sha256: String::new(),
            file_count: files.len(),
        };
        store.save(&record, &files).await.unwrap();
    }

    struct CrossOriginHost;

    impl PlaybackHost for CrossOriginHost {
        fn mount(&self, _: &PreparedDocument, _: ApiHandle) -> Result<(), InjectionError> {
            Err(InjectionError::Unreachable("cross-origin frame".into()))
        }

        fn unmount(&self) {}
    }

    #[tokio::test]
    async fn load_mounts_document_and_api() {
        let store = CourseStore::in_memory();
        seed(&store, "c1", Some("index.html")).await;
        let host = Arc::new(HeadlessHost::new());
        let mut player = Player::new(store, host.clone(), LearnerConfig::default());

        let shim = player.load("c1").await.unwrap();

        assert_eq!(player.active_course().unwrap().id, "c1");
        assert_eq!(host.document().unwrap().course_id, "c1");
        assert!(Arc::ptr_eq(&host.api().unwrap(), &shim));
        assert!(player.document().unwrap().html.contains("API_1484_11"));
    }

    #[tokio::test]
    async fn load_unknown_course_fails() {
        let mut player = Player::new(
            CourseStore::in_memory(),
            Arc::new(HeadlessHost::new()),
            LearnerConfig::default(),
        );
        let err = player.load("nope").await.unwrap_err();
        assert!(matches!(err, PlayerError::CourseNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn load_without_entry_point_fails() {
        let store = CourseStore::in_memory();
        seed(&store, "c1", None).await;
        let mut player = Player::new(store, Arc::new(HeadlessHost::new()), LearnerConfig::default());

        let err = player.load("c1").await.unwrap_err();
        assert!(matches!(err, PlayerError::Virtualize(_)));
        assert!(player.active_course().is_none());
    }

    #[tokio::test]
    async fn injection_failure_is_not_fatal() {
        let store = CourseStore::in_memory();
        seed(&store, "c1", Some("index.html")).await;
        let mut player = Player::new(store, Arc::new(CrossOriginHost), LearnerConfig::default());

        assert!(player.load("c1").await.is_ok());
        assert!(player.active_course().is_some());
    }

    #[tokio::test]
    async fn loading_another_course_stops_the_first() {
        let store = CourseStore::in_memory();
        seed(&store, "c1", Some("index.html")).await;
        seed(&store, "c2", Some("index.html")).await;
        let host = Arc::new(HeadlessHost::new());
        let mut player = Player::new(store.clone(), host.clone(), LearnerConfig::default());

        let first = player.load("c1").await.unwrap();
        first.initialize().await;
        first.set_value("cmi.core.lesson_status", "incomplete").await;
        let second = player.load("c2").await.unwrap();

        assert_eq!(first.phase().await, Phase::Terminated);
        assert_eq!(second.phase().await, Phase::Uninitialized);
        assert_eq!(player.active_course().unwrap().id, "c2");
        assert_eq!(host.mount_count(), 2);
        let record = store.record("c1").await.unwrap().unwrap();
        assert_eq!(record.progress.status, ProgressStatus::Incomplete);
    }

    #[tokio::test]
    async fn stop_commits_and_unmounts() {
        let store = CourseStore::in_memory();
        seed(&store, "c1", Some("index.html")).await;
        let host = Arc::new(HeadlessHost::new());
        let mut player = Player::new(store.clone(), host.clone(), LearnerConfig::default());

        let shim = player.load("c1").await.unwrap();
        shim.invoke("Initialize", &[""]).await;
        shim.invoke("SetValue", &["cmi.completion_status", "completed"]).await;
        let progress = player.stop().await.unwrap().unwrap();

        assert_eq!(progress.status, ProgressStatus::Completed);
        assert!(host.document().is_none());
        assert!(host.api().is_none());
        assert!(player.active_course().is_none());
        assert!(shim.data().await.is_empty());
        assert_eq!(
            store.runtime_data("c1").await.unwrap()["cmi.completion_status"],
            "completed"
        );
        assert!(player.stop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn course_deleted_during_playback_stays_deleted() {
        let store = CourseStore::in_memory();
        seed(&store, "c1", Some("index.html")).await;
        let mut player = Player::new(
            store.clone(),
            Arc::new(HeadlessHost::new()),
            LearnerConfig::default(),
        );

        let shim = player.load("c1").await.unwrap();
        shim.set_value("cmi.suspend_data", "x").await;
        assert!(store.delete("c1").await.unwrap());

        player.stop().await.unwrap();
        assert_eq!(shim.finish().await, "true");

        assert!(store.list().await.unwrap().is_empty());
        assert!(store.runtime_data("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reload_sees_previous_session_data() {
        let store = CourseStore::in_memory();
        seed(&store, "c1", Some("index.html")).await;
        let mut player = Player::new(store, Arc::new(HeadlessHost::new()), LearnerConfig::default());

        let shim = player.load("c1").await.unwrap();
        shim.set_value("cmi.suspend_data", "slide=7").await;
        player.stop().await.unwrap();

        let shim = player.load("c1").await.unwrap();
        assert_eq!(shim.get_value("cmi.suspend_data").await, "slide=7");
    }
}
