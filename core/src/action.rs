//! Inputs accepted by the reducer and side effects it can request.
//!
//! The sets are closed: widgets and gesture handlers only ever produce
//! `KeyboardAction`s, the store wraps them (and asynchronous results) as
//! `ImeAction`s, and the reducer answers with an ordered list of `Effect`s that
//! the interpreter executes against the editor and the candidate provider.

use crate::candidate::Candidate;
use crate::decoration::DecorationPolicy;
use crate::state::CompositionMode;
use serde::{Deserialize, Serialize};

/// Low-level host calls that bypass composition entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawAction {
    /// Send a down/up pair for a host key code
    SendKeyCode(i32),
    /// Run an editor action by host id (search, go, send, ...)
    PerformEditorAction(i32),
    /// Write text at the insertion point, ignoring any preedit logic
    CommitText(String),
}

/// Abstract keyboard input produced by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardAction {
    InputText(String),
    /// Space key; doubles as "next candidate" when candidates are available
    Space,
    Backspace,
    /// Enter key; confirms the previewed candidate in select mode
    Enter,
    /// Relative cursor move, usually `-1`/`+1` per axis
    MoveCursor { dx: i32, dy: i32 },
    SetCompositionMode(CompositionMode),
    SetPreeditDecor(DecorationPolicy),
    Noop,
    Raw(RawAction),
}

impl KeyboardAction {
    pub fn input<T: Into<String>>(text: T) -> Self {
        Self::InputText(text.into())
    }

    pub fn move_horizontal(dx: i32) -> Self {
        Self::MoveCursor { dx, dy: 0 }
    }
}

/// Everything the reducer consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImeAction {
    Ui(KeyboardAction),
    /// Result of a `RequestCandidates` effect, tagged with the context it was
    /// requested for
    CandidatesLoaded {
        request_key: String,
        bg_text: String,
        candidates: Vec<Candidate>,
    },
    /// The user tapped a candidate in the candidate bar
    CandidateChosen(Candidate),
}

impl From<KeyboardAction> for ImeAction {
    fn from(action: KeyboardAction) -> Self {
        Self::Ui(action)
    }
}

/// Host caret direction for `SendDpad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DpadDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Side-effect requests emitted by the reducer, executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CommitText(String),
    ClearComposing,
    /// Render `composing` as the preedit; `split_cursor` is both the bg/ul
    /// boundary and the caret shown inside the composing region
    RenderPreedit {
        composing: String,
        split_cursor: usize,
        decoration: DecorationPolicy,
    },
    SendDpad {
        direction: DpadDirection,
        times: usize,
    },
    BackspaceInEditor,
    PerformEditorEnter,
    RequestCandidates {
        request_key: String,
        bg_text: String,
        limit: usize,
    },
    PerformRaw(RawAction),
}

impl Effect {
    /// Short name used as a log field.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::CommitText(_) => "commit_text",
            Effect::ClearComposing => "clear_composing",
            Effect::RenderPreedit { .. } => "render_preedit",
            Effect::SendDpad { .. } => "send_dpad",
            Effect::BackspaceInEditor => "backspace_in_editor",
            Effect::PerformEditorEnter => "perform_editor_enter",
            Effect::RequestCandidates { .. } => "request_candidates",
            Effect::PerformRaw(_) => "perform_raw",
        }
    }
}
