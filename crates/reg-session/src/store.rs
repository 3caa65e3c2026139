use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

/// Small embedded persistence seam for the offline check-in queue.
///
/// Reads degrade to an empty queue and writes are best-effort: the scanning
/// flow must keep working when storage is unavailable or corrupt.
pub trait QueueStore: Send + Sync {
    fn load(&self, key: &str) -> Vec<String>;
    fn save(&self, key: &str, tokens: &[String]);
    fn clear(&self, key: &str);
}

/// In-memory store for tests and ephemeral sessions. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryStore {
    fn load(&self, key: &str) -> Vec<String> {
        self.entries.lock().get(key).cloned().unwrap_or_default()
    }

    fn save(&self, key: &str, tokens: &[String]) {
        self.entries.lock().insert(key.to_string(), tokens.to_vec());
    }

    fn clear(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// Durable store writing one JSON document per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl QueueStore for FileStore {
    fn load(&self, key: &str) -> Vec<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => parse_tokens(&raw),
            Err(_) => Vec::new(),
        }
    }

    fn save(&self, key: &str, tokens: &[String]) {
        if let Err(error) = fs::create_dir_all(&self.dir) {
            warn!(key, %error, "queue directory unavailable, dropping write");
            return;
        }
        let body = match serde_json::to_string(tokens) {
            Ok(body) => body,
            Err(error) => {
                warn!(key, %error, "queue serialization failed, dropping write");
                return;
            }
        };
        if let Err(error) = fs::write(self.path(key), body) {
            warn!(key, %error, "queue write failed, dropping write");
        }
    }

    fn clear(&self, key: &str) {
        let _ = fs::remove_file(self.path(key));
    }
}

/// Malformed persisted data reads as an empty queue; non-string entries
/// are dropped.
fn parse_tokens(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(token) => Some(token),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
