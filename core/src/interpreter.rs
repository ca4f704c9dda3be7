//! Effect interpreter.
//!
//! Executes reducer effects in order against an [`EditorHost`] and a
//! [`CandidateProvider`]. Everything runs synchronously on the caller's
//! context except candidate lookups, which are spawned on a tokio runtime,
//! run on its blocking pool, and come back as `ImeAction::CandidatesLoaded`
//! through the store's [`ActionSink`].

use crate::action::{Effect, ImeAction, RawAction};
use crate::decoration::StyledPreedit;
use crate::host::EditorHost;
use crate::provider::CandidateProvider;
use crate::store::{ActionSink, EffectHandler};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

pub struct EffectInterpreter<H, P> {
    host: H,
    provider: Arc<P>,
    sink: ActionSink,
    runtime: Handle,
    pending: Vec<JoinHandle<()>>,
    disposed: bool,
}

impl<H: EditorHost, P: CandidateProvider> EffectInterpreter<H, P> {
    /// Create an interpreter that spawns lookups on `runtime` and reports
    /// results to `sink`.
    pub fn new(host: H, provider: P, sink: ActionSink, runtime: Handle) -> Self {
        Self::from_arc(host, Arc::new(provider), sink, runtime)
    }

    /// Like `new`, for a provider shared with other owners.
    pub fn from_arc(host: H, provider: Arc<P>, sink: ActionSink, runtime: Handle) -> Self {
        Self {
            host,
            provider,
            sink,
            runtime,
            pending: Vec::new(),
            disposed: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of lookups spawned and not yet finished.
    pub fn pending_lookups(&mut self) -> usize {
        self.reap_finished();
        self.pending.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn reap_finished(&mut self) {
        self.pending.retain(|handle| !handle.is_finished());
    }

    fn render_preedit(&mut self, preedit: StyledPreedit) {
        if preedit.is_empty() {
            self.host.clear_composing();
        } else {
            self.host.set_composing_region(&preedit);
        }
    }

    fn perform_raw(&mut self, raw: RawAction) {
        match raw {
            RawAction::SendKeyCode(code) => self.host.send_key_code(code),
            RawAction::PerformEditorAction(id) => self.host.perform_editor_action(id),
            RawAction::CommitText(text) => self.host.commit_text(&text),
        }
    }

    fn request_candidates(&mut self, request_key: String, bg_text: String, limit: usize) {
        if self.disposed {
            trace!(target: "ime.effect", %request_key, "request_after_dispose");
            return;
        }

        if bg_text.trim().is_empty() {
            self.sink.send(ImeAction::CandidatesLoaded {
                request_key,
                bg_text,
                candidates: Vec::new(),
            });
            return;
        }

        self.reap_finished();
        let provider = Arc::clone(&self.provider);
        let sink = self.sink.clone();
        debug!(target: "ime.effect", %request_key, limit, "request_candidates");
        let handle = self.runtime.spawn(async move {
            let text = bg_text.clone();
            let lookup =
                tokio::task::spawn_blocking(move || provider.suggest(&text, limit)).await;
            let candidates = match lookup {
                Ok(Ok(candidates)) => candidates,
                Ok(Err(err)) => {
                    warn!(target: "ime.effect", %request_key, error = %err, "provider_failed");
                    Vec::new()
                }
                Err(join_err) => {
                    warn!(target: "ime.effect", %request_key, ?join_err, "provider_panicked");
                    Vec::new()
                }
            };
            sink.send(ImeAction::CandidatesLoaded {
                request_key,
                bg_text,
                candidates,
            });
        });
        self.pending.push(handle);
    }
}

impl<H: EditorHost, P: CandidateProvider> EffectHandler for EffectInterpreter<H, P> {
    fn handle(&mut self, effect: Effect) {
        trace!(target: "ime.effect", effect = effect.name(), "handle");
        match effect {
            Effect::CommitText(text) => self.host.commit_text(&text),
            Effect::ClearComposing => self.host.clear_composing(),
            Effect::RenderPreedit {
                composing,
                split_cursor,
                decoration,
            } => self.render_preedit(StyledPreedit::new(composing, split_cursor, &decoration)),
            Effect::SendDpad { direction, times } => {
                self.host.send_directional_key(direction, times.max(1))
            }
            Effect::BackspaceInEditor => self.host.delete_one_character_or_selection(),
            Effect::PerformEditorEnter => self.host.perform_default_or_newline_action(),
            Effect::RequestCandidates {
                request_key,
                bg_text,
                limit,
            } => self.request_candidates(request_key, bg_text, limit),
            Effect::PerformRaw(raw) => self.perform_raw(raw),
        }
    }

    /// Abort every pending lookup. Nothing is delivered afterwards.
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let aborted = self.pending.len();
        for handle in self.pending.drain(..) {
            handle.abort();
        }
        debug!(target: "ime.effect", aborted, "disposed");
    }
}

impl<H, P> Drop for EffectInterpreter<H, P> {
    fn drop(&mut self) {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
    }
}
