use std::path::{Path, PathBuf};

use scorm_store::{CourseStore, DiskBackend};
use serde::Deserialize;

use crate::error::PlayerError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub learner: LearnerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Base directory for the disk backend. Defaults to `~/.scorm-player`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum StorageBackendKind {
    #[default]
    #[serde(rename = "disk")]
    Disk,
    #[serde(rename = "memory")]
    Memory,
}

/// Identity reported to course content. There is no real learner behind it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LearnerConfig {
    #[serde(default = "default_learner_id")]
    pub id: String,
    #[serde(default = "default_learner_name")]
    pub name: String,
}

fn default_learner_id() -> String {
    "student_001".into()
}
fn default_learner_name() -> String {
    "Student".into()
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            id: default_learner_id(),
            name: default_learner_name(),
        }
    }
}

impl ViewerConfig {
    pub fn from_file(path: &Path) -> Result<Self, PlayerError> {
        let content = std::fs::read_to_string(path).map_err(PlayerError::IoError)?;
        toml::from_str(&content)
            .map_err(|e| PlayerError::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Directory the disk backend would use. `SCORM_STORAGE_PATH` overrides
    /// the configured path.
    pub fn storage_path(&self) -> PathBuf {
        std::env::var_os("SCORM_STORAGE_PATH")
            .map(PathBuf::from)
            .or_else(|| self.storage.path.clone())
            .unwrap_or_else(DiskBackend::default_path)
    }

    pub async fn build_store(&self) -> Result<CourseStore, PlayerError> {
        let store = match self.storage.backend {
            StorageBackendKind::Disk => CourseStore::on_disk(self.storage_path()).await?,
            StorageBackendKind::Memory => CourseStore::in_memory(),
        };
        tracing::debug!(backend = store.backend_name(), "Course store ready");
        Ok(store)
    }
}
