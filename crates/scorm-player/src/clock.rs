use tokio::time::Instant;

/// Wall time of the active runtime session, in whole seconds.
#[derive(Debug, Default, Clone)]
pub struct SessionClock {
    started_at: Option<Instant>,
    session_secs: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.session_secs = 0;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Seconds since `start`, or the recorded session length once stopped.
    pub fn elapsed_secs(&self) -> u64 {
        match self.started_at {
            Some(started) => started.elapsed().as_secs(),
            None => self.session_secs,
        }
    }

    /// Record the session length. Zero if the clock was never started;
    /// stopping twice keeps the first measurement.
    pub fn stop(&mut self) -> u64 {
        if let Some(started) = self.started_at.take() {
            self.session_secs = started.elapsed().as_secs();
        }
        self.session_secs
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
