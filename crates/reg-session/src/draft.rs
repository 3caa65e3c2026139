use chrono::{DateTime, Utc};

/// Lifecycle of the best-effort remote draft for one form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// No answers have changed since mount or the last submission.
    Empty,
    /// Answers changed; a save is pending the debounce window.
    Dirty,
    /// A save is in flight.
    Saving,
    /// The latest answers reached the server.
    Saved,
    /// The last save failed; the next debounce window retries.
    SaveFailed,
}

impl DraftState {
    /// True while the server is still owed a save.
    pub fn wants_save(&self) -> bool {
        matches!(self, DraftState::Dirty | DraftState::SaveFailed)
    }
}

/// Draft state plus the instant of the last successful save, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftStatus {
    pub state: DraftState,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl DraftStatus {
    pub(crate) fn new() -> Self {
        Self {
            state: DraftState::Empty,
            last_saved_at: None,
        }
    }
}
