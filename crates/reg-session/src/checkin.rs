use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use reg_client::{ApiError, CheckinApi, CheckinRecord, ProblemDetails};

use crate::store::QueueStore;

fn queue_key(event_id: &str) -> String {
    format!("checkin_queue_{event_id}")
}

/// Result of one scan handed to [`CheckinSession::submit_or_queue`].
#[derive(Debug)]
pub enum ScanOutcome {
    /// The attendee was checked in.
    CheckedIn(CheckinRecord),
    /// Same token as the immediately preceding scan; nothing was attempted.
    DuplicateScan,
    /// The attendee already checked in earlier.
    AlreadyCheckedIn,
    /// The token was rejected as malformed.
    InvalidCode,
    /// Another definitive rejection.
    Rejected(ProblemDetails),
    /// No server decision was reached; the token is persisted for a later
    /// flush.
    Queued,
}

/// Counters from one flush pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub processed: usize,
    pub remaining: usize,
}

/// Scan intake for one event: immediate submission with an offline queue
/// fallback, duplicate-scan debounce, and single-flight replay.
pub struct CheckinSession<A, S> {
    event_id: String,
    api: A,
    store: S,
    last_token: Mutex<Option<String>>,
    flushing: AtomicBool,
    online: AtomicBool,
}

impl<A: CheckinApi, S: QueueStore> CheckinSession<A, S> {
    pub fn new(event_id: impl Into<String>, api: A, store: S) -> Self {
        Self {
            event_id: event_id.into(),
            api,
            store,
            last_token: Mutex::new(None),
            flushing: AtomicBool::new(false),
            online: AtomicBool::new(true),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Tokens currently persisted for this event, in scan order.
    pub fn pending(&self) -> Vec<String> {
        self.store.load(&queue_key(&self.event_id))
    }

    /// Replays the persisted queue once when the session starts.
    pub async fn start(&self) -> Option<FlushReport> {
        self.flush().await
    }

    /// Connectivity signal; flushes exactly on the offline-to-online
    /// transition.
    pub async fn set_online(&self, online: bool) -> Option<FlushReport> {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if online && !was_online {
            self.flush().await
        } else {
            None
        }
    }

    /// Submits a scanned token, falling back to the persisted queue when no
    /// server decision can be reached.
    pub async fn submit_or_queue(&self, token: &str) -> ScanOutcome {
        {
            let mut last = self.last_token.lock();
            if last.as_deref() == Some(token) {
                debug!(token, "duplicate scan debounced");
                return ScanOutcome::DuplicateScan;
            }
            *last = Some(token.to_string());
        }

        match self.api.scan(&self.event_id, token).await {
            Ok(record) => ScanOutcome::CheckedIn(record),
            Err(ApiError::Rejected { status: 409, .. }) => ScanOutcome::AlreadyCheckedIn,
            Err(ApiError::Rejected { status: 400, .. }) => ScanOutcome::InvalidCode,
            Err(ApiError::Rejected { problem, .. }) => ScanOutcome::Rejected(problem),
            Err(error) => {
                debug!(token, %error, "no server decision, queueing scan");
                let key = queue_key(&self.event_id);
                let mut queue = self.store.load(&key);
                queue.push(token.to_string());
                self.store.save(&key, &queue);
                info!(token, pending = queue.len(), "scan queued for later sync");
                ScanOutcome::Queued
            }
        }
    }

    /// Manual check-in by user id. Never queued.
    pub async fn manual_checkin(&self, user_id: &str) -> Result<CheckinRecord, ApiError> {
        self.api.manual(&self.event_id, user_id).await
    }

    /// Sequentially replays the persisted queue. Successful tokens are
    /// dropped permanently; failed ones survive in their original relative
    /// order. Returns `None` when a flush is already running.
    pub async fn flush(&self) -> Option<FlushReport> {
        if self.flushing.swap(true, Ordering::SeqCst) {
            return None;
        }
        let _guard = FlushGuard(&self.flushing);

        let key = queue_key(&self.event_id);
        let queue = self.store.load(&key);
        if queue.is_empty() {
            return Some(FlushReport {
                processed: 0,
                remaining: 0,
            });
        }

        let mut processed = 0;
        let mut remaining = Vec::new();
        for token in queue {
            match self.api.scan(&self.event_id, &token).await {
                Ok(_) => processed += 1,
                Err(error) => {
                    warn!(token, %error, "queued scan still failing");
                    remaining.push(token);
                }
            }
        }

        self.store.save(&key, &remaining);
        info!(processed, remaining = remaining.len(), "check-in queue flushed");
        Some(FlushReport {
            processed,
            remaining: remaining.len(),
        })
    }
}

struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
