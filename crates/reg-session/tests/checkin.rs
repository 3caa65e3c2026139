use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;

use reg_client::{ApiError, CheckinApi, CheckinMethod, CheckinRecord, ProblemDetails};
use reg_session::{CheckinSession, FlushReport, MemoryStore, QueueStore, ScanOutcome};

const KEY: &str = "checkin_queue_evt-42";

#[derive(Clone, Default)]
struct FakeCheckinApi {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    scans: Mutex<Vec<String>>,
    offline: AtomicBool,
    transport_fail: Mutex<HashSet<String>>,
    reject: Mutex<HashMap<String, u16>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeCheckinApi {
    fn scans(&self) -> Vec<String> {
        self.inner.scans.lock().clone()
    }

    fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn fail_token(&self, token: &str) {
        self.inner.transport_fail.lock().insert(token.to_string());
    }

    fn reject_token(&self, token: &str, status: u16) {
        self.inner.reject.lock().insert(token.to_string(), status);
    }

    /// Makes every scan wait on the returned gate before resolving.
    fn hold_scans(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl CheckinApi for FakeCheckinApi {
    async fn scan(&self, event_id: &str, qr_code: &str) -> Result<CheckinRecord, ApiError> {
        self.inner.scans.lock().push(qr_code.to_string());
        let gate = self.inner.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.inner.offline.load(Ordering::SeqCst)
            || self.inner.transport_fail.lock().contains(qr_code)
        {
            return Err(ApiError::transport(std::io::Error::other(
                "connection reset",
            )));
        }
        if let Some(status) = self.inner.reject.lock().get(qr_code).copied() {
            return Err(ApiError::Rejected {
                status,
                problem: ProblemDetails::from_status(status, "rejected"),
            });
        }
        Ok(CheckinRecord {
            id: format!("chk-{qr_code}"),
            event_id: event_id.to_string(),
            user_id: format!("user-{qr_code}"),
            method: CheckinMethod::Qr,
            at: Utc::now(),
        })
    }

    async fn manual(&self, event_id: &str, user_id: &str) -> Result<CheckinRecord, ApiError> {
        Ok(CheckinRecord {
            id: format!("chk-{user_id}"),
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
            method: CheckinMethod::Manual,
            at: Utc::now(),
        })
    }
}

#[tokio::test]
async fn duplicate_scan_is_debounced() {
    let api = FakeCheckinApi::default();
    let session = CheckinSession::new("evt-42", api.clone(), MemoryStore::new());

    let first = session.submit_or_queue("X").await;
    assert!(matches!(first, ScanOutcome::CheckedIn(_)));

    let second = session.submit_or_queue("X").await;
    assert!(matches!(second, ScanOutcome::DuplicateScan));
    assert_eq!(api.scans(), vec!["X"]);
}

#[tokio::test]
async fn duplicate_debounce_also_covers_failed_attempts() {
    let api = FakeCheckinApi::default();
    api.set_offline(true);
    let store = MemoryStore::new();
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    assert!(matches!(
        session.submit_or_queue("X").await,
        ScanOutcome::Queued
    ));
    assert!(matches!(
        session.submit_or_queue("X").await,
        ScanOutcome::DuplicateScan
    ));
    assert_eq!(store.load(KEY), vec!["X"]);
    assert_eq!(api.scans(), vec!["X"]);
}

#[tokio::test]
async fn transport_failure_queues_tokens_in_scan_order() {
    let api = FakeCheckinApi::default();
    api.set_offline(true);
    let store = MemoryStore::new();
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    assert!(matches!(
        session.submit_or_queue("A").await,
        ScanOutcome::Queued
    ));
    assert!(matches!(
        session.submit_or_queue("B").await,
        ScanOutcome::Queued
    ));
    assert_eq!(store.load(KEY), vec!["A", "B"]);
    assert_eq!(session.pending(), vec!["A", "B"]);
}

#[tokio::test]
async fn definitive_rejections_are_not_queued() {
    let api = FakeCheckinApi::default();
    api.reject_token("dup", 409);
    api.reject_token("bad", 400);
    api.reject_token("odd", 422);
    let store = MemoryStore::new();
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    assert!(matches!(
        session.submit_or_queue("dup").await,
        ScanOutcome::AlreadyCheckedIn
    ));
    assert!(matches!(
        session.submit_or_queue("bad").await,
        ScanOutcome::InvalidCode
    ));
    assert!(matches!(
        session.submit_or_queue("odd").await,
        ScanOutcome::Rejected(_)
    ));
    assert!(store.load(KEY).is_empty());
}

#[tokio::test]
async fn flushing_an_empty_queue_is_a_noop() {
    let api = FakeCheckinApi::default();
    let session = CheckinSession::new("evt-42", api.clone(), MemoryStore::new());

    let report = session.flush().await.expect("report");
    assert_eq!(
        report,
        FlushReport {
            processed: 0,
            remaining: 0
        }
    );
    assert!(api.scans().is_empty());
}

#[tokio::test]
async fn successful_flush_empties_storage() {
    let store = MemoryStore::new();
    store.save(KEY, &["A".into(), "B".into(), "C".into()]);
    let api = FakeCheckinApi::default();
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    let report = session.flush().await.expect("report");
    assert_eq!(
        report,
        FlushReport {
            processed: 3,
            remaining: 0
        }
    );
    assert!(store.load(KEY).is_empty());
    assert_eq!(api.scans(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn failed_flush_preserves_content_and_order() {
    let store = MemoryStore::new();
    store.save(KEY, &["A".into(), "B".into(), "C".into()]);
    let api = FakeCheckinApi::default();
    api.set_offline(true);
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    let report = session.flush().await.expect("report");
    assert_eq!(
        report,
        FlushReport {
            processed: 0,
            remaining: 3
        }
    );
    assert_eq!(store.load(KEY), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn partial_flush_keeps_only_failed_tokens() {
    let store = MemoryStore::new();
    store.save(KEY, &["A".into(), "B".into(), "C".into()]);
    let api = FakeCheckinApi::default();
    api.fail_token("B");
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    let report = session.flush().await.expect("report");
    assert_eq!(
        report,
        FlushReport {
            processed: 2,
            remaining: 1
        }
    );
    assert_eq!(store.load(KEY), vec!["B"]);
}

#[tokio::test]
async fn concurrent_flushes_run_a_single_pass() {
    let store = MemoryStore::new();
    store.save(KEY, &["A".into()]);
    let api = FakeCheckinApi::default();
    let gate = api.hold_scans();
    let session = Arc::new(CheckinSession::new("evt-42", api.clone(), store.clone()));

    let background = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.flush().await }
    });

    // wait for the first pass to reach the remote call
    let mut tries = 0;
    while api.scans().is_empty() {
        tries += 1;
        assert!(tries < 500, "first flush never started");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // re-entry observes the guard and does nothing
    assert!(session.flush().await.is_none());
    assert_eq!(api.scans(), vec!["A"]);

    gate.notify_one();
    let report = background.await.expect("join").expect("report");
    assert_eq!(
        report,
        FlushReport {
            processed: 1,
            remaining: 0
        }
    );
    assert!(store.load(KEY).is_empty());
}

#[tokio::test]
async fn queue_flushes_when_connectivity_returns() {
    let api = FakeCheckinApi::default();
    api.set_offline(true);
    let store = MemoryStore::new();
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    assert!(session.set_online(false).await.is_none());
    assert!(matches!(
        session.submit_or_queue("A").await,
        ScanOutcome::Queued
    ));

    api.set_offline(false);
    // still offline from the session's point of view
    assert!(session.set_online(false).await.is_none());

    let report = session.set_online(true).await.expect("report");
    assert_eq!(
        report,
        FlushReport {
            processed: 1,
            remaining: 0
        }
    );
    assert!(store.load(KEY).is_empty());

    // already online, no second pass
    assert!(session.set_online(true).await.is_none());
}

#[tokio::test]
async fn start_replays_the_queue_from_a_previous_session() {
    let store = MemoryStore::new();
    store.save(KEY, &["A".into(), "B".into()]);
    let api = FakeCheckinApi::default();
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    let report = session.start().await.expect("report");
    assert_eq!(
        report,
        FlushReport {
            processed: 2,
            remaining: 0
        }
    );
    assert_eq!(api.scans(), vec!["A", "B"]);
}

#[tokio::test]
async fn manual_checkin_never_touches_the_queue() {
    let api = FakeCheckinApi::default();
    let store = MemoryStore::new();
    let session = CheckinSession::new("evt-42", api.clone(), store.clone());

    let record = session.manual_checkin("user-9").await.expect("record");
    assert_eq!(record.method, CheckinMethod::Manual);
    assert!(store.load(KEY).is_empty());
}
