//! Undo/redo history of forward/inverse mutation pairs.
//!
//! One [`UndoGroup`] is one user-visible step: a top-level mutation, or all
//! mutations recorded while a composite command ran. Undo replays the
//! inverses in reverse order, redo replays the forwards in order.

use std::collections::VecDeque;

use crate::command::CommandInfo;
use crate::error::BusError;

/// Inverse params read from the grid, stamped with the revision they were
/// read at.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseCapture {
    pub inverse: CommandInfo,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub forward: CommandInfo,
    pub inverse: CommandInfo,
}

impl UndoEntry {
    /// Pair a forward mutation with its captured inverse.
    ///
    /// `applied_at` is the grid revision immediately before the forward
    /// mutation ran. A capture from any other revision was taken out of
    /// order and is rejected with [`BusError::InverseCaptureSkipped`].
    pub fn from_capture(
        forward: CommandInfo,
        capture: InverseCapture,
        applied_at: u64,
    ) -> Result<Self, BusError> {
        if capture.revision != applied_at {
            #[cfg(feature = "tracing")]
            tracing::error!(
                id = %forward.id,
                captured_at = capture.revision,
                applied_at,
                "inverse captured out of order; refusing to record undo entry"
            );
            return Err(BusError::InverseCaptureSkipped {
                id: forward.id,
                captured_at: capture.revision,
                applied_at,
            });
        }
        Ok(Self {
            forward,
            inverse: capture.inverse,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoGroup {
    pub label: String,
    pub entries: Vec<UndoEntry>,
}

impl UndoGroup {
    pub fn new(label: impl Into<String>, entries: Vec<UndoEntry>) -> Self {
        Self {
            label: label.into(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub struct UndoStack {
    undo: VecDeque<UndoGroup>,
    redo: Vec<UndoGroup>,
    max_steps: Option<usize>,
    enabled: bool,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_steps: None,
            enabled: true,
        }
    }

    /// Keep at most `max_steps` undo steps; the oldest are dropped first.
    pub fn with_max_steps(max_steps: usize) -> Self {
        Self {
            max_steps: Some(max_steps),
            ..Self::new()
        }
    }

    /// A disabled stack accepts and discards every push.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a fresh step. Invalidates redo history.
    pub fn push(&mut self, group: UndoGroup) {
        if !self.enabled || group.is_empty() {
            return;
        }
        self.redo.clear();
        self.push_undo(group);
    }

    pub(crate) fn push_undo(&mut self, group: UndoGroup) {
        self.undo.push_back(group);
        if let Some(max) = self.max_steps {
            while self.undo.len() > max {
                self.undo.pop_front();
            }
        }
    }

    pub(crate) fn pop_undo(&mut self) -> Option<UndoGroup> {
        self.undo.pop_back()
    }

    pub(crate) fn push_redo(&mut self, group: UndoGroup) {
        self.redo.push(group);
    }

    pub(crate) fn pop_redo(&mut self) -> Option<UndoGroup> {
        self.redo.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn peek_undo(&self) -> Option<&UndoGroup> {
        self.undo.back()
    }

    pub fn peek_redo(&self) -> Option<&UndoGroup> {
        self.redo.last()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Ids of every forward mutation still undoable, oldest first.
    pub fn recorded_ids(&self) -> Vec<&str> {
        self.undo
            .iter()
            .flat_map(|g| g.entries.iter())
            .map(|e| e.forward.id.as_str())
            .collect()
    }
}
