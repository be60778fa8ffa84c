//! Hand-off point to the collaboration layer.
//!
//! The bus calls [`CollaborationSink::propagate`] once for every mutation
//! that is not `only_local` and did not itself arrive from a collaborator.
//! Transport is the sink's business.

use parking_lot::Mutex;

use crate::command::CommandInfo;

pub trait CollaborationSink: Send + Sync {
    fn propagate(&self, mutation: &CommandInfo);
}

/// Sink for sessions without collaborators.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCollaborationSink;

impl CollaborationSink for NullCollaborationSink {
    fn propagate(&self, _: &CommandInfo) {}
}

/// In-memory outbox; the transport drains it.
#[derive(Debug, Default)]
pub struct OutboxSink {
    pending: Mutex<Vec<CommandInfo>>,
}

impl OutboxSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<CommandInfo> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.pending.lock().iter().map(|m| m.id.clone()).collect()
    }
}

impl CollaborationSink for OutboxSink {
    fn propagate(&self, mutation: &CommandInfo) {
        self.pending.lock().push(mutation.clone());
    }
}
