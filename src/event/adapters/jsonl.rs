//! JSON-lines implementation of the `EventStore` port.
//!
//! Events are appended as one JSON document per line to a log file opened
//! through a capability directory handle. The full log is indexed in memory
//! on open, so queries never touch the file. Blocking file operations run on
//! Tokio's blocking pool.

use super::index::EventIndex;
use crate::event::domain::{CorrelationId, Event, EventFilter, EventId};
use crate::event::ports::store::{EventSequence, EventStore, EventStoreError, EventStoreResult};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::{Dir, File};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

struct LogState {
    index: EventIndex,
    file: File,
}

/// Durable, append-only event store backed by a JSON-lines file.
///
/// Clones share the same file handle and index.
#[derive(Clone)]
pub struct JsonlEventStore {
    dir: Arc<Dir>,
    file_name: Arc<str>,
    state: Arc<Mutex<LogState>>,
}

impl std::fmt::Debug for JsonlEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlEventStore")
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

impl JsonlEventStore {
    /// Opens the log at `path`, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::Corrupted`] when an existing line cannot be
    /// decoded or repeats an event identifier, and
    /// [`EventStoreError::Persistence`] when the file cannot be opened.
    pub fn open(path: &Utf8Path) -> EventStoreResult<Self> {
        let file_name = path.file_name().ok_or_else(|| {
            EventStoreError::persistence(std::io::Error::other(
                "event log path must include a file name",
            ))
        })?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(EventStoreError::persistence)?;

        let index = load_index(&dir, file_name)?;
        let file = open_for_append(&dir, file_name)?;
        info!(path = %path, events = index.len(), "opened event log");

        Ok(Self {
            dir: Arc::new(dir),
            file_name: Arc::from(file_name),
            state: Arc::new(Mutex::new(LogState { index, file })),
        })
    }

    /// Returns the number of stored events.
    ///
    /// Returns `0` if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map(|guard| guard.index.len()).unwrap_or(0)
    }

    /// Returns `true` if no events are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_state<T>(&self, f: impl FnOnce(&LogState) -> T) -> EventStoreResult<T> {
        let guard = self
            .state
            .lock()
            .map_err(|_| EventStoreError::poisoned("event log"))?;
        Ok(f(&guard))
    }
}

fn load_index(dir: &Dir, file_name: &str) -> EventStoreResult<EventIndex> {
    let contents = match dir.read_to_string(file_name) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(EventStoreError::persistence(err)),
    };
    let mut index = EventIndex::default();
    for (offset, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_number = offset + 1;
        let event: Event =
            serde_json::from_str(line).map_err(|err| EventStoreError::Corrupted {
                line: line_number,
                reason: err.to_string(),
            })?;
        index
            .insert(event)
            .map_err(|err| EventStoreError::Corrupted {
                line: line_number,
                reason: err.to_string(),
            })?;
    }
    Ok(index)
}

fn open_for_append(dir: &Dir, file_name: &str) -> EventStoreResult<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    dir.open_with(file_name, &options)
        .map_err(EventStoreError::persistence)
}

fn encode_line(event: &Event) -> EventStoreResult<String> {
    let mut line = serde_json::to_string(event).map_err(EventStoreError::persistence)?;
    line.push('\n');
    Ok(line)
}

/// Runs a blocking log operation on Tokio's blocking pool.
async fn run_blocking<F, T>(f: F) -> EventStoreResult<T>
where
    F: FnOnce() -> EventStoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(EventStoreError::persistence)?
}

#[async_trait]
impl EventStore for JsonlEventStore {
    async fn append(&self, event: &Event) -> EventStoreResult<()> {
        let line = encode_line(event)?;
        let owned = event.clone();
        let state = Arc::clone(&self.state);
        run_blocking(move || {
            let mut guard = state
                .lock()
                .map_err(|_| EventStoreError::poisoned("event log"))?;
            if guard.index.contains(owned.id()) {
                return Err(EventStoreError::DuplicateEvent(owned.id()));
            }
            guard
                .file
                .write_all(line.as_bytes())
                .map_err(EventStoreError::persistence)?;
            guard.file.flush().map_err(EventStoreError::persistence)?;
            guard.index.insert(owned)
        })
        .await
    }

    async fn get_events(&self, filter: &EventFilter) -> EventStoreResult<EventSequence> {
        self.with_state(|state| state.index.query(filter))
    }

    async fn get_event_by_id(&self, id: EventId) -> EventStoreResult<Option<Event>> {
        self.with_state(|state| state.index.get(id))
    }

    async fn get_events_by_correlation_id(
        &self,
        correlation_id: CorrelationId,
    ) -> EventStoreResult<Vec<Event>> {
        self.with_state(|state| state.index.correlated(correlation_id))
    }

    async fn delete_events(&self, older_than: DateTime<Utc>) -> EventStoreResult<u64> {
        let dir = Arc::clone(&self.dir);
        let file_name = Arc::clone(&self.file_name);
        let state = Arc::clone(&self.state);
        run_blocking(move || {
            let mut guard = state
                .lock()
                .map_err(|_| EventStoreError::poisoned("event log"))?;
            let mut contents = String::new();
            for event in guard.index.retained_since(older_than) {
                contents.push_str(&encode_line(event)?);
            }
            let temp_name = format!("{file_name}.tmp");
            dir.write(&temp_name, contents.as_bytes())
                .map_err(EventStoreError::persistence)?;
            dir.rename(&temp_name, &dir, &*file_name)
                .map_err(EventStoreError::persistence)?;
            guard.file = open_for_append(&dir, &file_name)?;
            let removed = guard.index.remove_before(older_than);
            debug!(removed, cutoff = %older_than, "rewrote event log after retention");
            Ok(removed)
        })
        .await
    }
}
