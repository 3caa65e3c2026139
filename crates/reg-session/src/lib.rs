pub mod checkin;
pub mod draft;
pub mod session;
pub mod store;

pub use checkin::{CheckinSession, FlushReport, ScanOutcome};
pub use draft::{DraftState, DraftStatus};
pub use session::{AutosaveHandle, FormSession, SessionConfig, SubmitOutcome};
pub use store::{FileStore, MemoryStore, QueueStore};
