//! Playback side of the SCORM player: content virtualization and runtime
//! API emulation.
//!
//! [`Player`] is the single entry point for a playback host. It owns the
//! [`CourseStore`](scorm_store::CourseStore), prepares the course's entry
//! document through the [`ContentVirtualizer`], and hands the host one
//! [`RuntimeShim`] per active course. The host exposes that shim to the
//! sandboxed document under both historical API names.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scorm_player::{HeadlessHost, Player, ViewerConfig};
//!
//! # async fn run() -> Result<(), scorm_player::PlayerError> {
//! let config = ViewerConfig::default();
//! let store = config.build_store().await?;
//! let host = Arc::new(HeadlessHost::new());
//! let mut player = Player::new(store, host, config.learner.clone());
//!
//! let shim = player.load("course_0123").await?;
//! shim.invoke("LMSInitialize", &[""]).await;
//! shim.invoke("LMSSetValue", &["cmi.core.lesson_status", "completed"]).await;
//! player.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod player;
pub mod resources;
pub mod shim;
pub mod virtualizer;

pub use api::{ApiMethod, Element};
pub use clock::SessionClock;
pub use config::{LearnerConfig, StorageBackendKind, StorageConfig, ViewerConfig};
pub use error::{InjectionError, PlayerError, VirtualizeError};
pub use host::{ApiHandle, HeadlessHost, PlaybackHost};
pub use player::Player;
pub use resources::{Resource, ResourceHandle, ResourceRegistry};
pub use shim::{CommitSnapshot, DisplayState, Phase, RuntimeShim};
pub use virtualizer::{ContentVirtualizer, PreparedDocument};
