//! Composition state.
//!
//! `ImeState` is either `Direct` (no preedit, every key goes straight to the
//! editor) or `Precomposition`, an uncommitted buffer with a split cursor and
//! the candidate UI state that belongs to it. The store owns exactly one
//! `ImeState`; the reducer produces new values and never mutates in place.

use crate::candidate::Candidate;
use crate::decoration::{char_len, compute_ranges, slice_chars, DecorationPolicy, Range};
use crate::Config;
use serde::{Deserialize, Serialize};

/// Requested composition mode, as sent by the keyboard's mode toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    Direct,
    Precomposition,
}

impl Default for CompositionMode {
    fn default() -> Self {
        Self::Precomposition
    }
}

/// What the candidate bar should show. Derived; never drives transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateUiMode {
    /// Candidates (or a loading indicator) for the current bg text
    Suggestion,
    /// Nothing to suggest; show keyboard controls instead
    Controls,
}

impl Default for CandidateUiMode {
    fn default() -> Self {
        Self::Controls
    }
}

/// Candidate bar state owned by a `Precomposition`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUiState {
    pub mode: CandidateUiMode,

    /// bg text the current `candidates` (or pending request) belong to
    pub bg_text: String,

    /// Dedup key of the last synchronised context, `"{bg}#{len}#{cursor}"`
    pub request_key: String,

    pub candidates: Vec<Candidate>,

    /// True while waiting for the candidates of `request_key`
    pub is_loading: bool,

    /// True while the user cycles through candidates with the "next" key
    pub select_mode: bool,
    pub selected_index: Option<usize>,

    /// Buffer snapshot taken on entry into select mode. Previews always
    /// replace the bg range of this base, never the previewed buffer.
    pub base_composing: Option<String>,
    pub base_split_cursor: usize,
}

impl CandidateUiState {
    /// The candidate under the selection cursor, if any.
    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.selected_index.and_then(|i| self.candidates.get(i))
    }

    /// Leave select mode, dropping the base snapshot.
    pub fn clear_selection(&mut self) {
        self.select_mode = false;
        self.selected_index = None;
        self.base_composing = None;
        self.base_split_cursor = 0;
    }

    /// Back to "nothing to suggest": controls shown, no context, no
    /// candidates, no selection.
    pub fn reset(&mut self) {
        self.mode = CandidateUiMode::Controls;
        self.bg_text.clear();
        self.request_key.clear();
        self.candidates.clear();
        self.is_loading = false;
        self.clear_selection();
    }
}

/// An active, uncommitted composing buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precomposition {
    pub composing: String,
    /// bg/ul boundary and visible caret, as a char index into `composing`
    pub split_cursor: usize,
    pub decoration: DecorationPolicy,
    pub candidate_ui: CandidateUiState,
}

impl Precomposition {
    pub fn new(decoration: DecorationPolicy) -> Self {
        Self {
            decoration,
            ..Self::default()
        }
    }

    /// Buffer length in chars.
    pub fn len(&self) -> usize {
        char_len(&self.composing)
    }

    pub fn is_empty(&self) -> bool {
        self.composing.is_empty()
    }

    /// Current bg range of the live buffer.
    pub fn bg_range(&self) -> Range {
        bg_range_of(&self.composing, self.split_cursor, &self.decoration)
    }

    /// Current bg text of the live buffer (empty when the range is empty).
    pub fn bg_text(&self) -> &str {
        slice_chars(&self.composing, self.bg_range())
    }
}

/// bg range of an arbitrary buffer under a decoration policy.
pub(crate) fn bg_range_of(text: &str, cursor: usize, decoration: &DecorationPolicy) -> Range {
    let len = char_len(text);
    compute_ranges(len, cursor, decoration).bg.clamp(len)
}

/// The composition state owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImeState {
    Direct,
    Precomposition(Precomposition),
}

impl Default for ImeState {
    fn default() -> Self {
        Self::Direct
    }
}

impl ImeState {
    /// Initial state for a configuration: an empty `Precomposition` with the
    /// configured decoration, or `Direct`.
    pub fn initial(config: &Config) -> Self {
        match config.initial_mode {
            CompositionMode::Direct => Self::Direct,
            CompositionMode::Precomposition => {
                Self::Precomposition(Precomposition::new(config.decoration))
            }
        }
    }

    pub fn mode(&self) -> CompositionMode {
        match self {
            Self::Direct => CompositionMode::Direct,
            Self::Precomposition(_) => CompositionMode::Precomposition,
        }
    }

    pub fn as_precomposition(&self) -> Option<&Precomposition> {
        match self {
            Self::Precomposition(p) => Some(p),
            Self::Direct => None,
        }
    }

    /// Whether a candidate lookup for the current context is pending.
    pub fn is_loading(&self) -> bool {
        self.as_precomposition()
            .map(|p| p.candidate_ui.is_loading)
            .unwrap_or(false)
    }
}
