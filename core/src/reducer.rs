//! The composition state machine.
//!
//! `ImeReducer::reduce` maps `(state, action)` to the next state plus an
//! ordered list of effects. It performs no I/O: effects are requests that the
//! store hands to an [`EffectHandler`](crate::store::EffectHandler).
//!
//! ## Structure
//!
//! - `Direct`: literal passthrough to the editor.
//! - `Precomposition`, select mode: the "next" key (Space) cycles previews,
//!   Enter commits the previewed candidate, any other key restores the buffer
//!   from the base snapshot and is then reduced in normal mode.
//! - `Precomposition`, normal mode: buffer editing followed by candidate sync.
//!
//! Committing a candidate uses commit-and-carry: the candidate replaces only
//! the bg range, and the text after it becomes the next preedit with the cursor
//! at its end, so a long input can be converted segment by segment.

use crate::action::{DpadDirection, Effect, ImeAction, KeyboardAction};
use crate::candidate::Candidate;
use crate::decoration::{byte_offset, char_len, slice_chars, DecorationPolicy, Range};
use crate::state::{
    bg_range_of, CandidateUiMode, CompositionMode, ImeState, Precomposition,
};
use crate::Config;
use tracing::trace;

/// Number of candidates requested per lookup unless configured otherwise.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 8;

/// Output of one reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Next {
    pub state: ImeState,
    pub effects: Vec<Effect>,
}

impl Next {
    fn unchanged(state: &ImeState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    fn precomposition(state: Precomposition, effects: Vec<Effect>) -> Self {
        Self {
            state: ImeState::Precomposition(state),
            effects,
        }
    }
}

/// Reduce with default settings (8 candidates, split-at-cursor decoration).
pub fn reduce(state: &ImeState, action: ImeAction) -> Next {
    ImeReducer::default().reduce(state, action)
}

/// Deterministic reducer. Holds only settings, no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImeReducer {
    candidate_limit: usize,
    decoration: DecorationPolicy,
}

impl Default for ImeReducer {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            decoration: DecorationPolicy::SplitAtCursor,
        }
    }
}

impl ImeReducer {
    pub fn new(candidate_limit: usize, decoration: DecorationPolicy) -> Self {
        Self {
            candidate_limit: candidate_limit.max(1),
            decoration,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.candidate_limit, config.decoration)
    }

    pub fn candidate_limit(&self) -> usize {
        self.candidate_limit
    }

    /// Decoration given to a `Precomposition` created by a mode switch.
    pub fn decoration(&self) -> DecorationPolicy {
        self.decoration
    }

    pub fn reduce(&self, state: &ImeState, action: ImeAction) -> Next {
        match action {
            ImeAction::Ui(action) => match state {
                ImeState::Direct => self.reduce_direct(action),
                ImeState::Precomposition(p) => self.reduce_precomposition(p.clone(), action),
            },
            ImeAction::CandidatesLoaded {
                request_key,
                bg_text,
                candidates,
            } => reduce_candidates_loaded(state, request_key, bg_text, candidates),
            ImeAction::CandidateChosen(candidate) => self.reduce_candidate_chosen(state, candidate),
        }
    }

    fn reduce_direct(&self, action: KeyboardAction) -> Next {
        let effects = match action {
            KeyboardAction::InputText(text) => vec![Effect::CommitText(text)],
            KeyboardAction::Space => vec![Effect::CommitText(" ".to_string())],
            KeyboardAction::Backspace => vec![Effect::BackspaceInEditor],
            KeyboardAction::Enter => vec![Effect::PerformEditorEnter],
            KeyboardAction::MoveCursor { dx, dy } => dpad_effects(dx, dy),
            KeyboardAction::SetCompositionMode(CompositionMode::Precomposition) => {
                return Next::precomposition(
                    Precomposition::new(self.decoration),
                    vec![Effect::ClearComposing],
                );
            }
            KeyboardAction::SetCompositionMode(CompositionMode::Direct)
            | KeyboardAction::SetPreeditDecor(_)
            | KeyboardAction::Noop => Vec::new(),
            KeyboardAction::Raw(raw) => vec![Effect::PerformRaw(raw)],
        };
        Next {
            state: ImeState::Direct,
            effects,
        }
    }

    fn reduce_precomposition(&self, s0: Precomposition, action: KeyboardAction) -> Next {
        if s0.candidate_ui.select_mode {
            self.reduce_select(s0, action)
        } else {
            self.reduce_normal(s0, action)
        }
    }

    fn reduce_select(&self, s0: Precomposition, action: KeyboardAction) -> Next {
        match action {
            KeyboardAction::Space => {
                let count = s0.candidate_ui.candidates.len();
                if count == 0 {
                    return self.abandon_selection(s0);
                }
                let next_index = match s0.candidate_ui.selected_index {
                    Some(i) if i < count => (i + 1) % count,
                    _ => 0,
                };
                let surface = s0.candidate_ui.candidates[next_index].surface.clone();
                trace!(target: "ime.reducer", next_index, "select_next");
                // No candidate sync here: the bg text is only a preview.
                let s1 = build_preview(s0, &surface, next_index);
                let effects = vec![render(&s1)];
                Next::precomposition(s1, effects)
            }
            KeyboardAction::Enter => {
                let count = s0.candidate_ui.candidates.len();
                if count == 0 {
                    return self.abandon_selection(s0);
                }
                let index = s0.candidate_ui.selected_index.unwrap_or(0).min(count - 1);
                let surface = s0.candidate_ui.candidates[index].surface.clone();
                self.commit_and_carry(s0, &surface)
            }
            KeyboardAction::Noop => Next::precomposition(s0, Vec::new()),
            KeyboardAction::Raw(raw) => Next::precomposition(s0, vec![Effect::PerformRaw(raw)]),
            other => {
                trace!(target: "ime.reducer", "select_exit");
                self.reduce_normal(restore_base(s0), other)
            }
        }
    }

    /// Leave select mode without committing and show the base buffer again.
    fn abandon_selection(&self, s0: Precomposition) -> Next {
        let s1 = restore_base(s0);
        let effects = vec![render_or_clear(&s1)];
        self.sync_candidates(s1, effects)
    }

    fn reduce_normal(&self, s0: Precomposition, action: KeyboardAction) -> Next {
        let (s1, effects) = match action {
            KeyboardAction::InputText(text) => {
                let s = insert_at_cursor(s0, &text);
                let effects = vec![render(&s)];
                (s, effects)
            }
            KeyboardAction::Space => {
                let ui = &s0.candidate_ui;
                if !is_blank(&ui.bg_text) && !ui.candidates.is_empty() {
                    return self.enter_select_mode(s0);
                }
                let s = insert_at_cursor(s0, " ");
                let effects = vec![render(&s)];
                (s, effects)
            }
            KeyboardAction::Backspace => {
                if s0.is_empty() || s0.split_cursor == 0 {
                    (s0, vec![Effect::BackspaceInEditor])
                } else {
                    let s = delete_before_cursor(s0);
                    let effects = vec![render_or_clear(&s)];
                    (s, effects)
                }
            }
            KeyboardAction::Enter => {
                if s0.is_empty() {
                    (s0, vec![Effect::PerformEditorEnter])
                } else {
                    let mut s = s0;
                    let committed = std::mem::take(&mut s.composing);
                    s.split_cursor = 0;
                    (
                        s,
                        vec![Effect::CommitText(committed), Effect::ClearComposing],
                    )
                }
            }
            KeyboardAction::MoveCursor { dx, dy } => {
                if s0.is_empty() {
                    (s0, dpad_effects(dx, dy))
                } else {
                    let mut s = s0;
                    let len = s.len() as i64;
                    s.split_cursor = (s.split_cursor as i64 + dx as i64).clamp(0, len) as usize;
                    let effects = vec![render(&s)];
                    (s, effects)
                }
            }
            KeyboardAction::SetCompositionMode(CompositionMode::Direct) => {
                let mut effects = Vec::with_capacity(2);
                if !s0.is_empty() {
                    effects.push(Effect::CommitText(s0.composing));
                }
                effects.push(Effect::ClearComposing);
                return Next {
                    state: ImeState::Direct,
                    effects,
                };
            }
            KeyboardAction::SetCompositionMode(CompositionMode::Precomposition) => {
                (s0, Vec::new())
            }
            KeyboardAction::SetPreeditDecor(decoration) => {
                let mut s = s0;
                s.decoration = decoration;
                let effects = if s.is_empty() {
                    Vec::new()
                } else {
                    vec![render(&s)]
                };
                (s, effects)
            }
            KeyboardAction::Noop => (s0, Vec::new()),
            KeyboardAction::Raw(raw) => (s0, vec![Effect::PerformRaw(raw)]),
        };
        self.sync_candidates(s1, effects)
    }

    fn enter_select_mode(&self, mut s0: Precomposition) -> Next {
        s0.candidate_ui.select_mode = true;
        s0.candidate_ui.base_composing = Some(s0.composing.clone());
        s0.candidate_ui.base_split_cursor = s0.split_cursor;
        let surface = s0.candidate_ui.candidates[0].surface.clone();
        trace!(target: "ime.reducer", bg_text = %s0.candidate_ui.bg_text, "select_enter");
        let s1 = build_preview(s0, &surface, 0);
        let effects = vec![render(&s1)];
        Next::precomposition(s1, effects)
    }

    fn reduce_candidate_chosen(&self, state: &ImeState, candidate: Candidate) -> Next {
        let ImeState::Precomposition(s0) = state else {
            return Next::unchanged(state);
        };
        if is_blank(&s0.candidate_ui.bg_text) {
            return Next::unchanged(state);
        }
        self.commit_and_carry(s0.clone(), &candidate.surface)
    }

    /// Commit `surface` in place of the bg range and keep the text after it as
    /// the next preedit, cursor at its end.
    fn commit_and_carry(&self, s: Precomposition, surface: &str) -> Next {
        let (base, base_cursor) = base_of(&s);
        let bg = bg_range_of(&base, base_cursor, &s.decoration);
        if bg.is_empty() {
            return Next::precomposition(s, Vec::new());
        }

        let carried = slice_chars(&base, Range::new(bg.end_exclusive, char_len(&base))).to_string();

        let mut s1 = s;
        s1.split_cursor = char_len(&carried);
        s1.composing = carried;
        s1.candidate_ui.clear_selection();

        let effects = vec![Effect::CommitText(surface.to_string()), render_or_clear(&s1)];
        self.sync_candidates(s1, effects)
    }

    /// Bring the candidate UI in line with the current bg text, requesting
    /// candidates when the context changed.
    fn sync_candidates(&self, mut s: Precomposition, mut effects: Vec<Effect>) -> Next {
        if s.candidate_ui.select_mode {
            return Next::precomposition(s, effects);
        }

        let bg_text = s.bg_text().to_string();
        if is_blank(&bg_text) {
            s.candidate_ui.reset();
            return Next::precomposition(s, effects);
        }

        let len = s.len();
        let key = request_key(&bg_text, len, s.split_cursor.min(len));
        let ui = &mut s.candidate_ui;
        ui.mode = CandidateUiMode::Suggestion;
        if ui.request_key == key && ui.bg_text == bg_text {
            return Next::precomposition(s, effects);
        }

        ui.bg_text = bg_text.clone();
        ui.request_key = key.clone();
        ui.candidates.clear();
        ui.is_loading = true;
        effects.push(Effect::RequestCandidates {
            request_key: key,
            bg_text,
            limit: self.candidate_limit,
        });
        Next::precomposition(s, effects)
    }
}

fn reduce_candidates_loaded(
    state: &ImeState,
    request_key: String,
    bg_text: String,
    candidates: Vec<Candidate>,
) -> Next {
    let ImeState::Precomposition(s0) = state else {
        return Next::unchanged(state);
    };
    if s0.candidate_ui.request_key != request_key || s0.candidate_ui.bg_text != bg_text {
        trace!(target: "ime.reducer", %request_key, live = %s0.candidate_ui.request_key, "stale_candidates");
        return Next::unchanged(state);
    }

    let mut s1 = s0.clone();
    s1.candidate_ui.candidates = candidates;
    s1.candidate_ui.is_loading = false;
    Next::precomposition(s1, Vec::new())
}

/// Dedup key of a candidate context.
pub fn request_key(bg_text: &str, len: usize, cursor: usize) -> String {
    format!("{}#{}#{}", bg_text, len, cursor)
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn render(s: &Precomposition) -> Effect {
    Effect::RenderPreedit {
        composing: s.composing.clone(),
        split_cursor: s.split_cursor,
        decoration: s.decoration,
    }
}

fn render_or_clear(s: &Precomposition) -> Effect {
    if s.is_empty() {
        Effect::ClearComposing
    } else {
        render(s)
    }
}

fn dpad_effects(dx: i32, dy: i32) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if dx != 0 {
        effects.push(Effect::SendDpad {
            direction: if dx < 0 {
                DpadDirection::Left
            } else {
                DpadDirection::Right
            },
            times: dx.unsigned_abs() as usize,
        });
    }
    if dy != 0 {
        effects.push(Effect::SendDpad {
            direction: if dy < 0 {
                DpadDirection::Up
            } else {
                DpadDirection::Down
            },
            times: dy.unsigned_abs() as usize,
        });
    }
    effects
}

/// Base buffer for previews and commits: the select-mode snapshot if there is
/// one, otherwise the live buffer. The cursor is clamped to the base length.
fn base_of(s: &Precomposition) -> (String, usize) {
    match &s.candidate_ui.base_composing {
        Some(base) => (base.clone(), s.candidate_ui.base_split_cursor.min(char_len(base))),
        None => (s.composing.clone(), s.split_cursor.min(s.len())),
    }
}

/// Replace the bg range of the base with `surface`.
fn build_preview(mut s: Precomposition, surface: &str, selected_index: usize) -> Precomposition {
    let (base, base_cursor) = base_of(&s);
    let bg = bg_range_of(&base, base_cursor, &s.decoration);
    s.candidate_ui.selected_index = Some(selected_index);
    if bg.is_empty() {
        return s;
    }

    let start = byte_offset(&base, bg.start);
    let end = byte_offset(&base, bg.end_exclusive);
    let mut replaced = String::with_capacity(base.len() - (end - start) + surface.len());
    replaced.push_str(&base[..start]);
    replaced.push_str(surface);
    replaced.push_str(&base[end..]);

    s.split_cursor = (bg.start + char_len(surface)).min(char_len(&replaced));
    s.composing = replaced;
    s.candidate_ui.base_composing = Some(base);
    s.candidate_ui.base_split_cursor = base_cursor;
    s
}

/// Put the buffer back to the select-mode snapshot and clear select fields.
fn restore_base(mut s: Precomposition) -> Precomposition {
    if let Some(base) = s.candidate_ui.base_composing.take() {
        s.split_cursor = s.candidate_ui.base_split_cursor.min(char_len(&base));
        s.composing = base;
    }
    s.candidate_ui.clear_selection();
    s
}

fn insert_at_cursor(mut s: Precomposition, text: &str) -> Precomposition {
    let cursor = s.split_cursor.min(s.len());
    let at = byte_offset(&s.composing, cursor);
    s.composing.insert_str(at, text);
    s.split_cursor = cursor + char_len(text);
    s
}

fn delete_before_cursor(mut s: Precomposition) -> Precomposition {
    let cursor = s.split_cursor.min(s.len());
    if cursor == 0 {
        return s;
    }
    let at = byte_offset(&s.composing, cursor - 1);
    s.composing.remove(at);
    s.split_cursor = cursor - 1;
    s
}
