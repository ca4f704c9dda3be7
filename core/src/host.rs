//! Editor host trait.
//!
//! The interpreter never touches a concrete text widget. Platforms implement
//! `EditorHost` on top of whatever editing API they have (an input connection,
//! a terminal, a test recorder) and the composition engine drives it through
//! these calls only.

use crate::action::DpadDirection;
use crate::decoration::StyledPreedit;

/// Narrow editing capability consumed by the effect interpreter.
///
/// # Example
///
/// ```
/// use libime_core::{DpadDirection, EditorHost, StyledPreedit};
///
/// #[derive(Default)]
/// struct Buffer {
///     committed: String,
///     preedit: Option<String>,
/// }
///
/// impl EditorHost for Buffer {
///     fn commit_text(&mut self, text: &str) {
///         self.committed.push_str(text);
///     }
///     fn set_composing_region(&mut self, preedit: &StyledPreedit) {
///         self.preedit = Some(preedit.text.clone());
///     }
///     fn clear_composing(&mut self) {
///         self.preedit = None;
///     }
///     fn send_directional_key(&mut self, _direction: DpadDirection, _count: usize) {}
///     fn delete_one_character_or_selection(&mut self) {
///         self.committed.pop();
///     }
///     fn perform_default_or_newline_action(&mut self) {
///         self.committed.push('\n');
///     }
/// }
/// ```
pub trait EditorHost {
    /// Permanently write `text` at the insertion point, replacing any preedit.
    fn commit_text(&mut self, text: &str);

    /// Show `preedit` as the composing region, bg and ul styled, with the
    /// visible caret at `preedit.caret`.
    fn set_composing_region(&mut self, preedit: &StyledPreedit);

    /// Withdraw the composing region without committing it.
    fn clear_composing(&mut self);

    /// Move the host caret when there is no active preedit.
    fn send_directional_key(&mut self, direction: DpadDirection, count: usize);

    /// Delete the selection if there is one, otherwise one char before the caret.
    fn delete_one_character_or_selection(&mut self);

    /// Run the editor's default action (search, send, ...) or insert a newline.
    fn perform_default_or_newline_action(&mut self);

    /// Raw host key code. Hosts without key codes can ignore it.
    fn send_key_code(&mut self, key_code: i32) {
        tracing::debug!(target: "ime.effect", key_code, "send_key_code_unsupported");
    }

    /// Raw editor action id. Hosts without editor actions can ignore it.
    fn perform_editor_action(&mut self, action_id: i32) {
        tracing::debug!(target: "ime.effect", action_id, "perform_editor_action_unsupported");
    }
}
