//! Store: the single owner of the composition state.
//!
//! `dispatch` runs strictly in order: reduce, commit the new state, notify
//! listeners with it, then hand the effects to the effect handler in emission
//! order. Effect handlers never dispatch re-entrantly; asynchronous results go
//! through an [`ActionSink`] into the store's inbox and are applied when the
//! owner calls [`ImeStore::pump`] or awaits [`ImeStore::next_internal`].

use crate::action::{Effect, ImeAction, KeyboardAction};
use crate::host::EditorHost;
use crate::interpreter::EffectInterpreter;
use crate::provider::CandidateProvider;
use crate::reducer::ImeReducer;
use crate::state::ImeState;
use crate::Config;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Executes the effects produced by a dispatch.
pub trait EffectHandler {
    fn handle(&mut self, effect: Effect);

    fn handle_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.handle(effect);
        }
    }

    /// Release background work. Called once when the store is disposed.
    fn dispose(&mut self) {}
}

/// Cloneable handle for submitting top-level actions from outside the store
/// (lookup tasks, candidate taps from UI code).
#[derive(Debug, Clone)]
pub struct ActionSink {
    tx: UnboundedSender<ImeAction>,
}

impl ActionSink {
    /// Queue an action. Returns false once the store is gone or disposed.
    pub fn send(&self, action: ImeAction) -> bool {
        match self.tx.send(action) {
            Ok(()) => true,
            Err(_) => {
                debug!(target: "ime.store", "action_dropped_inbox_closed");
                false
            }
        }
    }

    pub fn send_ui(&self, action: KeyboardAction) -> bool {
        self.send(ImeAction::Ui(action))
    }
}

/// Receiving side of [`ActionSink`], owned by the store.
#[derive(Debug)]
pub struct ActionInbox {
    rx: UnboundedReceiver<ImeAction>,
}

/// Create a connected sink/inbox pair.
pub fn action_channel() -> (ActionSink, ActionInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ActionSink { tx }, ActionInbox { rx })
}

/// Identifies a registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ImeState)>;

pub struct ImeStore<H> {
    state: ImeState,
    reducer: ImeReducer,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
    handler: H,
    sink: ActionSink,
    inbox: ActionInbox,
    disposed: bool,
}

impl<H: EditorHost, P: CandidateProvider> ImeStore<EffectInterpreter<H, P>> {
    /// Store wired to an [`EffectInterpreter`] that spawns lookups on `runtime`.
    pub fn with_interpreter(config: &Config, host: H, provider: P, runtime: Handle) -> Self {
        let (sink, inbox) = action_channel();
        let interpreter = EffectInterpreter::new(host, provider, sink.clone(), runtime);
        Self::new(
            ImeState::initial(config),
            ImeReducer::from_config(config),
            interpreter,
            sink,
            inbox,
        )
    }
}

impl<H: EffectHandler> ImeStore<H> {
    /// `sink` must be the sender half of `inbox`.
    pub fn new(
        initial: ImeState,
        reducer: ImeReducer,
        handler: H,
        sink: ActionSink,
        inbox: ActionInbox,
    ) -> Self {
        Self {
            state: initial,
            reducer,
            listeners: Vec::new(),
            next_listener_id: 0,
            handler,
            sink,
            inbox,
            disposed: false,
        }
    }

    pub fn state(&self) -> &ImeState {
        &self.state
    }

    pub fn reducer(&self) -> &ImeReducer {
        &self.reducer
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Handle for submitting actions from outside the store's context.
    pub fn action_sink(&self) -> ActionSink {
        self.sink.clone()
    }

    /// Register a listener. It is called right away with the current state.
    pub fn add_listener<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(&ImeState) + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        listener(&self.state);
        self.listeners.push((id, Box::new(listener)));
        debug!(target: "ime.store", listeners = self.listeners.len(), "listener_added");
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    pub fn dispatch_ui(&mut self, action: KeyboardAction) {
        self.dispatch(ImeAction::Ui(action));
    }

    pub fn dispatch(&mut self, action: ImeAction) {
        if self.disposed {
            debug!(target: "ime.store", ?action, "dispatch_after_dispose");
            return;
        }
        let next = self.reducer.reduce(&self.state, action);
        debug!(
            target: "ime.store",
            mode = ?next.state.mode(),
            effects = next.effects.len(),
            "dispatch"
        );
        self.state = next.state;
        self.notify();
        self.handler.handle_all(next.effects);
    }

    /// Apply every queued internal action without waiting. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        let mut applied = 0;
        loop {
            match self.inbox.rx.try_recv() {
                Ok(action) => {
                    self.dispatch(action);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Wait for the next internal action and apply it. Returns false when the
    /// inbox is closed.
    pub async fn next_internal(&mut self) -> bool {
        match self.inbox.rx.recv().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Apply internal actions until no candidate lookup is pending for the
    /// current context. Stale results arriving meanwhile are applied (and
    /// ignored by the reducer) along the way.
    pub async fn wait_for_candidates(&mut self) {
        while !self.disposed && self.state.is_loading() {
            if !self.next_internal().await {
                break;
            }
        }
    }

    /// Drop the preedit without committing it, e.g. when the host starts a new
    /// input session. Selection and candidates of the old buffer go with it,
    /// so late results for the old context are ignored.
    pub fn clear_preedit_if_any(&mut self) {
        let cleared = match &mut self.state {
            ImeState::Precomposition(p) if !p.is_empty() => {
                p.composing.clear();
                p.split_cursor = 0;
                p.candidate_ui.reset();
                true
            }
            _ => false,
        };
        if cleared {
            self.notify();
            self.handler.handle(Effect::ClearComposing);
        }
    }

    /// Tear down: cancel pending lookups and stop accepting actions.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.handler.dispose();
        self.inbox.rx.close();
        debug!(target: "ime.store", "disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }
}
