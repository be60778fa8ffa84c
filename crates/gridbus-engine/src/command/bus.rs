use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::listeners::{ListenerRegistry, Subscription};
use super::{
    CommandHandler, CommandInfo, CommandType, ErasedHandler, ExecutionOptions, ExecutionSource,
    InverseFactory, PlainHandler, UndoableHandler,
};
use crate::error::BusError;
use crate::sync::{CollaborationSink, NullCollaborationSink};
use crate::undo::{InverseCapture, UndoEntry, UndoGroup, UndoStack};

/// Configuration for the command bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Record undo history for globally scoped mutations.
    pub record_history: bool,
    /// Oldest undo steps are dropped past this depth.
    pub max_undo_steps: Option<usize>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            record_history: true,
            max_undo_steps: Some(100),
        }
    }
}

/// Undo entries collected while one handler runs.
#[derive(Default)]
struct Frame {
    only_local: bool,
    source: ExecutionSource,
    entries: Vec<UndoEntry>,
}

#[derive(Default)]
struct ExecutionState {
    frames: Vec<Frame>,
}

/// Single entry point for commands, operations and mutations.
///
/// Executions are serialized: the execution lock is re-entrant so handlers
/// can execute nested commands on the same thread, while other threads wait
/// for the running command to complete. Listeners are notified before
/// `execute_command` returns, in execution order.
pub struct CommandBus {
    handlers: RwLock<FxHashMap<String, Arc<dyn ErasedHandler>>>,
    listeners: ListenerRegistry,
    execution: ReentrantMutex<RefCell<ExecutionState>>,
    history: Mutex<UndoStack>,
    sync: Arc<dyn CollaborationSink>,
}

impl CommandBus {
    pub fn new(config: BusConfig, sync: Arc<dyn CollaborationSink>) -> Self {
        let mut history = match config.max_undo_steps {
            Some(max) => UndoStack::with_max_steps(max),
            None => UndoStack::new(),
        };
        history.set_enabled(config.record_history);
        Self {
            handlers: RwLock::new(FxHashMap::default()),
            listeners: ListenerRegistry::default(),
            execution: ReentrantMutex::new(RefCell::new(ExecutionState::default())),
            history: Mutex::new(history),
            sync,
        }
    }

    /// Bus whose globally scoped mutations go nowhere.
    pub fn standalone(config: BusConfig) -> Self {
        Self::new(config, Arc::new(NullCollaborationSink))
    }

    pub fn register<H: CommandHandler>(&self, handler: H) -> Result<(), BusError> {
        self.insert(Arc::new(PlainHandler(handler)))
    }

    /// Register a mutation whose inverse is captured before every globally
    /// scoped execution and recorded for undo.
    pub fn register_undoable<H: InverseFactory>(&self, handler: H) -> Result<(), BusError> {
        self.insert(Arc::new(UndoableHandler(handler)))
    }

    fn insert(&self, handler: Arc<dyn ErasedHandler>) -> Result<(), BusError> {
        let mut handlers = self.handlers.write();
        if handlers.contains_key(handler.id()) {
            return Err(BusError::DuplicateCommand(handler.id().to_string()));
        }
        handlers.insert(handler.id().to_string(), handler);
        Ok(())
    }

    pub fn has_command(&self, id: &str) -> bool {
        self.handlers.read().contains_key(id)
    }

    pub fn command_type(&self, id: &str) -> Option<CommandType> {
        self.handlers.read().get(id).map(|h| h.command_type())
    }

    fn handler(&self, id: &str) -> Result<Arc<dyn ErasedHandler>, BusError> {
        self.handlers
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| BusError::UnknownCommand(id.to_string()))
    }

    /// Typed convenience over [`execute_command`](Self::execute_command).
    pub fn execute<P: Serialize>(
        &self,
        id: &str,
        params: &P,
        options: ExecutionOptions,
    ) -> Result<bool, BusError> {
        let params = serde_json::to_value(params).map_err(|e| BusError::invalid_params(id, e))?;
        self.execute_command(id, params, options)
    }

    /// Execute `id` and notify listeners.
    ///
    /// `Ok(false)` means the handler reported a failure and changed nothing;
    /// nothing is recorded, propagated or observed in that case.
    pub fn execute_command(
        &self,
        id: &str,
        params: Value,
        options: ExecutionOptions,
    ) -> Result<bool, BusError> {
        let handler = self.handler(id)?;
        let info = CommandInfo {
            id: id.to_string(),
            command_type: handler.command_type(),
            params,
            options,
            source: ExecutionSource::Local,
        };
        self.run(info)
    }

    /// Apply a mutation received from a collaborator. It is observed by
    /// listeners but neither recorded for undo nor propagated again. When a
    /// command is applied this way, everything it executes is remote too.
    pub fn apply_remote(&self, mutation: CommandInfo) -> Result<bool, BusError> {
        self.run(mutation.with_source(ExecutionSource::Remote))
    }

    pub fn on_command_executed<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CommandInfo) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn run(&self, mut info: CommandInfo) -> Result<bool, BusError> {
        let guard = self.execution.lock();
        let handler = self.handler(&info.id)?;
        info.command_type = handler.command_type();

        let parent = guard
            .borrow()
            .frames
            .last()
            .map(|f| (f.only_local, f.source));
        if let Some((parent_local, parent_source)) = parent {
            info.options.only_local |= parent_local;
            if parent_source != ExecutionSource::Local {
                info.source = parent_source;
            }
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "execute_command",
            id = %info.id,
            kind = ?info.command_type,
            only_local = info.options.only_local,
            source = ?info.source
        )
        .entered();

        let records = info.command_type == CommandType::Mutation
            && !info.options.only_local
            && info.source == ExecutionSource::Local
            && self.history.lock().is_enabled();

        // The pairing is checked before the forward handler runs so that a
        // refused capture leaves state untouched.
        let recorded = match handler.inverse().filter(|_| records) {
            Some(factory) => {
                let revision = factory.state_revision();
                let capture = factory.capture(&info.params)?.map(|params| InverseCapture {
                    inverse: CommandInfo::mutation(info.id.clone(), params),
                    revision,
                });
                let applied_at = factory.state_revision();
                capture
                    .map(|capture| UndoEntry::from_capture(info.clone(), capture, applied_at))
                    .transpose()?
            }
            None => None,
        };

        guard.borrow_mut().frames.push(Frame {
            only_local: info.options.only_local,
            source: info.source,
            entries: Vec::new(),
        });
        let outcome = handler.invoke(self, &info.params);
        let frame = guard.borrow_mut().frames.pop().unwrap_or_default();

        match outcome {
            Ok(true) => {}
            Ok(false) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(id = %info.id, "handler reported failure; state unchanged");
                self.rollback(frame.entries);
                return Ok(false);
            }
            Err(err) => {
                self.rollback(frame.entries);
                return Err(err);
            }
        }

        let mut entries = frame.entries;
        entries.extend(recorded);
        if !entries.is_empty() {
            let top_level = {
                let mut state = guard.borrow_mut();
                match state.frames.last_mut() {
                    Some(parent) => {
                        parent.entries.extend(entries);
                        None
                    }
                    None => Some(entries),
                }
            };
            if let Some(entries) = top_level {
                self.history.lock().push(UndoGroup::new(info.id.clone(), entries));
            }
        }

        if info.command_type == CommandType::Mutation
            && !info.options.only_local
            && info.source != ExecutionSource::Remote
        {
            self.sync.propagate(&info);
        }

        self.listeners.dispatch(&info);
        Ok(true)
    }

    /// Undo the most recent step. `Ok(false)` when there is nothing to undo.
    ///
    /// If an inverse fails to replay, the inverses already replayed are
    /// re-applied forward and the step goes back onto the undo stack.
    pub fn undo(&self) -> Result<bool, BusError> {
        let _guard = self.execution.lock();
        let popped = self.history.lock().pop_undo();
        let Some(group) = popped else {
            return Ok(false);
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("undo", label = %group.label, entries = group.entries.len())
            .entered();

        let failed = group
            .entries
            .iter()
            .rev()
            .enumerate()
            .find_map(|(replayed, entry)| {
                self.replay(entry.inverse.clone(), ExecutionSource::Undo)
                    .err()
                    .map(|err| (replayed, err))
            });
        if let Some((replayed, err)) = failed {
            let start = group.entries.len() - replayed;
            self.restore(group.entries[start..].iter().map(|e| e.forward.clone()));
            self.history.lock().push_undo(group);
            return Err(err);
        }
        self.history.lock().push_redo(group);
        Ok(true)
    }

    /// Re-apply the most recently undone step. On a failed replay the
    /// forwards already applied are undone again and the step stays on the
    /// redo stack.
    pub fn redo(&self) -> Result<bool, BusError> {
        let _guard = self.execution.lock();
        let popped = self.history.lock().pop_redo();
        let Some(group) = popped else {
            return Ok(false);
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("redo", label = %group.label, entries = group.entries.len())
            .entered();

        let failed = group
            .entries
            .iter()
            .enumerate()
            .find_map(|(replayed, entry)| {
                self.replay(entry.forward.clone(), ExecutionSource::Redo)
                    .err()
                    .map(|err| (replayed, err))
            });
        if let Some((replayed, err)) = failed {
            self.restore(group.entries[..replayed].iter().rev().map(|e| e.inverse.clone()));
            self.history.lock().push_redo(group);
            return Err(err);
        }
        self.history.lock().push_undo(group);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.lock().can_redo()
    }

    /// Read access to the undo history.
    pub fn with_history<R>(&self, f: impl FnOnce(&UndoStack) -> R) -> R {
        f(&self.history.lock())
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    fn replay(&self, info: CommandInfo, source: ExecutionSource) -> Result<(), BusError> {
        let id = info.id.clone();
        match self.run(info.with_source(source)) {
            Ok(true) => Ok(()),
            Ok(false) => Err(BusError::HistoryReplay {
                id,
                reason: "handler reported failure".to_string(),
            }),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(id = %id, error = %err, "history replay failed");
                Err(BusError::HistoryReplay {
                    id,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Undo the nested mutations of a command that failed part-way.
    fn rollback(&self, entries: Vec<UndoEntry>) {
        if entries.is_empty() {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::warn!(entries = entries.len(), "rolling back partially applied command");
        self.restore(entries.into_iter().rev().map(|entry| entry.inverse));
    }

    /// Replay compensating mutations in the given order. Failures are logged
    /// and skipped.
    fn restore(&self, mutations: impl Iterator<Item = CommandInfo>) {
        for mutation in mutations {
            if let Err(_err) = self.replay(mutation, ExecutionSource::Rollback) {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "compensating replay failed");
            }
        }
    }
}

impl std::fmt::Debug for CommandBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<String> = self.handlers.read().keys().cloned().collect();
        ids.sort();
        f.debug_struct("CommandBus")
            .field("handlers", &ids)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
