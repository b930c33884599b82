use scorm_core::timefmt::ZERO_TIME;
use scorm_core::{DataElements, ProgressState, ProgressStatus, Score, format_time, parse_time};
use scorm_store::{CourseStore, StorageError};
use tokio::sync::Mutex;

use crate::api::{ApiMethod, Element};
use crate::clock::SessionClock;
use crate::config::LearnerConfig;

const TRUE: &str = "true";
const FALSE: &str = "false";
const NO_ERROR: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Active,
    Terminated,
}

/// Status and score as the presentation layer should show them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub status: String,
    pub score: String,
}

struct SessionState {
    phase: Phase,
    data: DataElements,
    clock: SessionClock,
    display: DisplayState,
}

impl SessionState {
    fn new(data: DataElements) -> Self {
        let display = DisplayState {
            status: lookup(&data, Element::Status)
                .unwrap_or(ProgressStatus::NotAttempted.as_str())
                .to_string(),
            score: lookup(&data, Element::ScoreRaw).unwrap_or("").to_string(),
        };
        Self {
            phase: Phase::Uninitialized,
            data,
            clock: SessionClock::new(),
            display,
        }
    }
}

/// First stored value of a recognised element under either generation's key.
fn lookup(data: &DataElements, element: Element) -> Option<&str> {
    element
        .keys()
        .into_iter()
        .find_map(|key| data.get(key).map(String::as_str))
}

/// State captured for a commit before any storage call suspends.
#[derive(Debug, Clone)]
pub struct CommitSnapshot {
    course_id: String,
    data: DataElements,
    session_secs: u64,
}

impl CommitSnapshot {
    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn data(&self) -> &DataElements {
        &self.data
    }
}

/// Emulated runtime API for one course.
///
/// Lifecycle is `Uninitialized → Active → Terminated`, but out-of-order
/// calls are tolerated rather than rejected, and the error channel always
/// reports "no error". Every result is a string, as course content expects.
pub struct RuntimeShim {
    course_id: String,
    store: CourseStore,
    learner: LearnerConfig,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for RuntimeShim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeShim")
            .field("course_id", &self.course_id)
            .field("learner", &self.learner)
            .finish_non_exhaustive()
    }
}

impl RuntimeShim {
    /// Build a shim seeded with the course's previously stored data elements.
    pub fn new(
        course_id: impl Into<String>,
        store: CourseStore,
        learner: LearnerConfig,
        data: DataElements,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            store,
            learner,
            state: Mutex::new(SessionState::new(data)),
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    pub async fn display(&self) -> DisplayState {
        self.state.lock().await.display.clone()
    }

    /// Data elements held by the current session.
    pub async fn data(&self) -> DataElements {
        self.state.lock().await.data.clone()
    }

    /// Dispatch a call by either generation's method name.
    pub async fn invoke(&self, method: &str, args: &[&str]) -> String {
        let Some(api_method) = ApiMethod::from_name(method) else {
            tracing::warn!(course_id = %self.course_id, method, "Unknown runtime API method");
            return FALSE.into();
        };
        let arg = |i: usize| args.get(i).copied().unwrap_or("");

        match api_method {
            ApiMethod::Initialize => self.initialize().await,
            ApiMethod::Finish => self.finish().await,
            ApiMethod::GetValue => self.get_value(arg(0)).await,
            ApiMethod::SetValue => {
                if args.is_empty() {
                    return FALSE.into();
                }
                self.set_value(arg(0), arg(1)).await
            }
            ApiMethod::Commit => self.commit().await,
            ApiMethod::GetLastError => self.get_last_error(),
            ApiMethod::GetErrorString => self.get_error_string(arg(0)),
            ApiMethod::GetDiagnostic => self.get_diagnostic(arg(0)),
        }
    }

    /// Start the session. Repeated calls succeed without effect.
    pub async fn initialize(&self) -> String {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Uninitialized {
            tracing::debug!(course_id = %self.course_id, phase = ?state.phase, "Initialize ignored");
            return TRUE.into();
        }

        state.phase = Phase::Active;
        state.clock.start();
        if lookup(&state.data, Element::Status).is_none() {
            state.display.status = ProgressStatus::Incomplete.as_str().into();
        }

        tracing::info!(course_id = %self.course_id, "Runtime session initialized");
        TRUE.into()
    }

    /// End the session, fold its length into the total time, and commit.
    pub async fn finish(&self) -> String {
        {
            let mut state = self.state.lock().await;
            if state.phase == Phase::Terminated {
                tracing::debug!(course_id = %self.course_id, "Finish ignored after termination");
                return TRUE.into();
            }
            state.phase = Phase::Terminated;
            let session_secs = state.clock.stop();
            let previous = lookup(&state.data, Element::TotalTime)
                .map(parse_time)
                .unwrap_or(0);
            state.data.insert(
                Element::TotalTime.keys()[0].into(),
                format_time(previous + session_secs),
            );

            tracing::info!(course_id = %self.course_id, session_secs, "Runtime session finished");
        }
        self.commit().await
    }

    pub async fn get_value(&self, key: &str) -> String {
        let state = self.state.lock().await;
        let stored = |element| lookup(&state.data, element).map(str::to_string);

        let value = match Element::classify(key) {
            Some(Element::Status) => {
                stored(Element::Status).unwrap_or_else(|| ProgressStatus::NotAttempted.to_string())
            }
            Some(Element::ScoreRaw) => stored(Element::ScoreRaw).unwrap_or_default(),
            Some(Element::ScoreMin) => stored(Element::ScoreMin).unwrap_or_else(|| "0".into()),
            Some(Element::ScoreMax) => stored(Element::ScoreMax).unwrap_or_else(|| "100".into()),
            Some(Element::SessionTime) => format_time(state.clock.elapsed_secs()),
            Some(Element::TotalTime) => {
                stored(Element::TotalTime).unwrap_or_else(|| ZERO_TIME.into())
            }
            Some(Element::LearnerId) => self.learner.id.clone(),
            Some(Element::LearnerName) => self.learner.name.clone(),
            None => state.data.get(key).cloned().unwrap_or_default(),
        };

        tracing::trace!(course_id = %self.course_id, key, %value, "GetValue");
        value
    }

    /// Store a data element. Always succeeds.
    pub async fn set_value(&self, key: &str, value: &str) -> String {
        let mut state = self.state.lock().await;
        state.data.insert(key.to_string(), value.to_string());

        match Element::classify(key) {
            Some(Element::Status) => state.display.status = value.to_string(),
            Some(Element::ScoreRaw) => state.display.score = value.to_string(),
            _ => {}
        }

        tracing::trace!(course_id = %self.course_id, key, value, "SetValue");
        TRUE.into()
    }

    /// Persist the session's data elements and derived progress.
    ///
    /// Returns `"false"` when storage fails; the error channel still reports
    /// no error.
    pub async fn commit(&self) -> String {
        let snapshot = self.snapshot().await;
        match self.write_snapshot(snapshot).await {
            Ok(_) => TRUE.into(),
            Err(e) => {
                tracing::error!(course_id = %self.course_id, error = %e, "Commit failed");
                FALSE.into()
            }
        }
    }

    pub fn get_last_error(&self) -> String {
        NO_ERROR.into()
    }

    pub fn get_error_string(&self, code: &str) -> String {
        if code == NO_ERROR {
            "No Error".into()
        } else {
            "Unknown Error".into()
        }
    }

    pub fn get_diagnostic(&self, code: &str) -> String {
        self.get_error_string(code)
    }

    /// Copy everything a commit needs so no lock is held across storage calls.
    pub async fn snapshot(&self) -> CommitSnapshot {
        let state = self.state.lock().await;
        CommitSnapshot {
            course_id: self.course_id.clone(),
            data: state.data.clone(),
            session_secs: state.clock.elapsed_secs(),
        }
    }

    /// Stop the clock and snapshot, for a host tearing playback down.
    pub async fn close(&self) -> CommitSnapshot {
        let mut state = self.state.lock().await;
        state.clock.stop();
        CommitSnapshot {
            course_id: self.course_id.clone(),
            data: state.data.clone(),
            session_secs: state.clock.elapsed_secs(),
        }
    }

    /// Drop all in-memory session state. Later calls see an ended session.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::new(DataElements::new());
        state.phase = Phase::Terminated;
    }

    /// Merge a snapshot into storage and update the course's progress.
    ///
    /// Nothing is written when the course no longer exists, so a course
    /// deleted during playback stays deleted.
    pub async fn write_snapshot(
        &self,
        snapshot: CommitSnapshot,
    ) -> Result<ProgressState, StorageError> {
        let CommitSnapshot {
            course_id,
            data,
            session_secs,
        } = snapshot;

        if self.store.record(&course_id).await?.is_none() {
            tracing::warn!(course_id = %course_id, "Course deleted while playing; commit dropped");
            return Ok(derive_progress(&data, session_secs));
        }

        let merged = self.store.merge_runtime_data(&course_id, &data).await?;
        let progress = derive_progress(&merged, session_secs);
        self.store
            .update_progress(&course_id, progress.clone())
            .await?;

        tracing::debug!(
            course_id = %course_id,
            elements = merged.len(),
            status = %progress.status,
            "Runtime data committed"
        );
        Ok(progress)
    }
}

fn derive_progress(data: &DataElements, session_secs: u64) -> ProgressState {
    let number = |element| lookup(data, element).and_then(|v| v.trim().parse::<f64>().ok());
    ProgressState {
        status: lookup(data, Element::Status)
            .map(ProgressStatus::from_cmi)
            .unwrap_or_default(),
        score: Score {
            raw: number(Element::ScoreRaw),
            min: number(Element::ScoreMin),
            max: number(Element::ScoreMax),
        },
        session_time: format_time(session_secs),
        total_time: lookup(data, Element::TotalTime)
            .unwrap_or(ZERO_TIME)
            .to_string(),
    }
}
