//! Event types for the admin tooling event system
//!
//! Provides the shared event definitions and the EventBus used to stream import
//! progress to whatever front end is attached (CLI renderer, tests).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Import phase a progress event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportPhase {
    /// Phase 1: creating journalist profiles
    Profiles,
    /// Phase 2: fetching and storing email screenshots
    Images,
}

impl ImportPhase {
    /// Operator-facing label for progress bars
    pub fn label(&self) -> &'static str {
        match self {
            ImportPhase::Profiles => "Importing Profiles",
            ImportPhase::Images => "Processing Images",
        }
    }
}

/// Admin tooling event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CjEvent {
    /// Import session started (operator confirmed the mapping)
    ImportSessionStarted {
        /// Import session UUID
        session_id: Uuid,
        /// Rows in the uploaded file
        total_rows: usize,
        /// Rows that passed validation and will be submitted
        valid_rows: usize,
        /// When session started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress update, emitted after every batch of either phase
    ImportProgressUpdate {
        /// Import session UUID
        session_id: Uuid,
        /// Phase the update belongs to
        phase: ImportPhase,
        /// Items processed so far
        current: usize,
        /// Items in the phase
        total: usize,
        /// Progress percentage (0.0-100.0)
        percentage: f32,
        /// Phase 2 only: items stored so far
        #[serde(default)]
        successful: usize,
        /// Phase 2 only: items failed so far
        #[serde(default)]
        failed: usize,
        /// When progress updated
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A whole batch call failed and was absorbed
    ImportBatchFailed {
        /// Import session UUID
        session_id: Uuid,
        /// Phase the batch belongs to
        phase: ImportPhase,
        /// 1-based position of the first item of the batch
        first_row: usize,
        /// Items in the batch
        batch_len: usize,
        /// Error message from the remote call
        message: String,
        /// When the failure was observed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Both phases finished
    ImportSessionCompleted {
        /// Import session UUID
        session_id: Uuid,
        records_inserted: usize,
        skipped: usize,
        errors: usize,
        images_successful: usize,
        images_failed: usize,
        /// Session duration in seconds
        duration_seconds: u64,
        /// When session completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session discarded and returned to upload
    ImportSessionReset {
        /// Import session UUID
        session_id: Uuid,
        /// When session was reset
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CjEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            CjEvent::ImportSessionStarted { .. } => "ImportSessionStarted",
            CjEvent::ImportProgressUpdate { .. } => "ImportProgressUpdate",
            CjEvent::ImportBatchFailed { .. } => "ImportBatchFailed",
            CjEvent::ImportSessionCompleted { .. } => "ImportSessionCompleted",
            CjEvent::ImportSessionReset { .. } => "ImportSessionReset",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            CjEvent::ImportSessionStarted { session_id, .. }
            | CjEvent::ImportProgressUpdate { session_id, .. }
            | CjEvent::ImportBatchFailed { session_id, .. }
            | CjEvent::ImportSessionCompleted { session_id, .. }
            | CjEvent::ImportSessionReset { session_id, .. } => *session_id,
        }
    }
}

/// Central event distribution bus
///
/// Uses `tokio::sync::broadcast` internally:
/// - Multiple subscribers, each receiving every event emitted after it subscribed
/// - Bounded buffer; slow subscribers lose the oldest events (`RecvError::Lagged`)
/// - Cheap to clone; clones share the same channel
///
/// # Examples
///
/// ```
/// use cj_common::events::{CjEvent, EventBus};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(CjEvent::ImportSessionReset {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CjEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before old events are dropped
    /// for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CjEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: CjEvent) -> Result<usize, broadcast::error::SendError<CjEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress events use this: a run with no attached renderer is normal.
    pub fn emit_lossy(&self, event: CjEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
