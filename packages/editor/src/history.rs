//! # History Timeline
//!
//! Linear snapshot history with undo, redo and jump-to-version.
//!
//! ## Design
//!
//! - The timeline starts with one seed snapshot and never becomes empty
//! - Each snapshot retains a complete forest; forests are immutable values,
//!   so a retained forest can never be changed by later edits
//! - Undo/redo/jump only move the cursor
//! - Pushing while the cursor is not at the tail discards everything after
//!   the cursor first (the redo branch is lost on a fresh edit)
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryTimeline::new(Forest::new(), "Empty form");
//! history.push_snapshot(&forest, "Add text \"Name\"");
//!
//! let previous = history.undo().cloned();
//! let again = history.redo().cloned();
//! ```

use chrono::{DateTime, Utc};
use formwork_schema::Forest;
use serde::Serialize;
use tracing::debug;

/// One immutable state of the forest
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub forest: Forest,
    pub description: String,
}

/// What the history UI reads for each entry; forests stay private
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub index: usize,
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub current: bool,
}

#[derive(Debug, Clone)]
pub struct HistoryTimeline {
    snapshots: Vec<Snapshot>,
    current: usize,

    /// Maximum number of snapshots kept (0 = unlimited)
    max_levels: usize,

    /// Sequence for snapshot ids, never reused within a timeline
    next_seq: u64,
}

impl HistoryTimeline {
    /// Create a timeline seeded with `forest`
    pub fn new(forest: Forest, description: impl Into<String>) -> Self {
        Self::with_max_levels(forest, description, 0)
    }

    /// Create a timeline that keeps at most `max_levels` snapshots
    pub fn with_max_levels(forest: Forest, description: impl Into<String>, max_levels: usize) -> Self {
        let mut timeline = Self {
            snapshots: Vec::new(),
            current: 0,
            max_levels,
            next_seq: 0,
        };
        let seed = timeline.snapshot(forest, description.into());
        timeline.snapshots.push(seed);
        timeline
    }

    fn snapshot(&mut self, forest: Forest, description: String) -> Snapshot {
        self.next_seq += 1;
        Snapshot {
            id: format!("snapshot-{}", self.next_seq),
            timestamp: Utc::now(),
            forest,
            description,
        }
    }

    /// Record `forest` as the newest state, discarding any redo branch
    pub fn push_snapshot(&mut self, forest: &Forest, description: impl Into<String>) {
        let discarded = self.snapshots.len() - self.current - 1;
        self.snapshots.truncate(self.current + 1);

        let snapshot = self.snapshot(forest.clone(), description.into());
        debug!(snapshot_id = %snapshot.id, description = %snapshot.description, discarded, "Pushed snapshot");
        self.snapshots.push(snapshot);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.snapshots.len() > self.max_levels {
            let excess = self.snapshots.len() - self.max_levels;
            self.snapshots.drain(..excess);
        }

        self.current = self.snapshots.len() - 1;
    }

    /// Step back one snapshot. `None` at the start of the timeline.
    pub fn undo(&mut self) -> Option<&Forest> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        Some(&self.snapshots[self.current].forest)
    }

    /// Step forward one snapshot. `None` at the tail.
    pub fn redo(&mut self) -> Option<&Forest> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        Some(&self.snapshots[self.current].forest)
    }

    /// Move the cursor to `index` without discarding anything
    pub fn jump_to_version(&mut self, index: usize) -> Option<&Forest> {
        if index >= self.snapshots.len() {
            return None;
        }
        self.current = index;
        Some(&self.snapshots[index].forest)
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.current]
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Current index of the snapshot with `id`, if it is still kept
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.snapshots.iter().position(|snapshot| snapshot.id == id)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a timeline holds at least its seed
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Entries for the history UI, oldest first
    pub fn entries(&self) -> Vec<SnapshotInfo> {
        self.snapshots
            .iter()
            .enumerate()
            .map(|(index, snapshot)| SnapshotInfo {
                index,
                id: snapshot.id.clone(),
                timestamp: snapshot.timestamp,
                description: snapshot.description.clone(),
                current: index == self.current,
            })
            .collect()
    }

    /// Description of the step `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.snapshots[self.current].description.as_str())
    }

    /// Description of the step `redo` would reapply
    pub fn redo_description(&self) -> Option<&str> {
        self.can_redo()
            .then(|| self.snapshots[self.current + 1].description.as_str())
    }

    /// Drop all history and reseed with `forest`
    pub fn reset(&mut self, forest: Forest, description: impl Into<String>) {
        self.snapshots.clear();
        let seed = self.snapshot(forest, description.into());
        self.snapshots.push(seed);
        self.current = 0;
    }
}
