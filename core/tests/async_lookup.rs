// core/tests/async_lookup.rs
//
// Store + EffectInterpreter end to end, with candidate lookups running on a
// tokio runtime.

use libime_core::{
    action_channel, Candidate, CandidateProvider, Config, DpadDirection, EditorHost, Effect,
    EffectHandler, EffectInterpreter, ImeAction, ImeReducer, ImeState, ImeStore, KeyboardAction,
    Precomposition, StyledPreedit,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Records every host call as a short string.
#[derive(Default)]
struct RecordingHost {
    calls: Vec<String>,
    committed: String,
}

impl EditorHost for RecordingHost {
    fn commit_text(&mut self, text: &str) {
        self.committed.push_str(text);
        self.calls.push(format!("commit:{}", text));
    }

    fn set_composing_region(&mut self, preedit: &StyledPreedit) {
        self.calls.push(format!(
            "composing:{}|{}|{}",
            preedit.bg_text(),
            preedit.ul_text(),
            preedit.caret
        ));
    }

    fn clear_composing(&mut self) {
        self.calls.push("clear".to_string());
    }

    fn send_directional_key(&mut self, direction: DpadDirection, count: usize) {
        self.calls.push(format!("dpad:{:?}x{}", direction, count));
    }

    fn delete_one_character_or_selection(&mut self) {
        self.calls.push("backspace".to_string());
    }

    fn perform_default_or_newline_action(&mut self) {
        self.calls.push("enter".to_string());
    }
}

/// Upper-cases the text and appends a marker.
struct Echo;

impl CandidateProvider for Echo {
    fn suggest(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> {
        let all = vec![Candidate::new(text.to_uppercase()), Candidate::new(format!("{}!", text))];
        Ok(all.into_iter().take(limit).collect())
    }
}

struct Failing;

impl CandidateProvider for Failing {
    fn suggest(&self, _text: &str, _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        anyhow::bail!("dictionary not loaded")
    }
}

struct Panicking;

impl CandidateProvider for Panicking {
    fn suggest(&self, _text: &str, _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        panic!("provider bug")
    }
}

/// Sleeps before answering; the single-char context sleeps longest so its
/// result arrives after newer ones.
struct Slow {
    calls: AtomicUsize,
}

impl CandidateProvider for Slow {
    fn suggest(&self, text: &str, _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = if text.chars().count() == 1 { 150 } else { 20 };
        std::thread::sleep(Duration::from_millis(delay));
        Ok(vec![Candidate::new(format!("<{}>", text))])
    }
}

fn store_with<P: CandidateProvider>(provider: P) -> ImeStore<EffectInterpreter<RecordingHost, P>> {
    ImeStore::with_interpreter(
        &Config::default(),
        RecordingHost::default(),
        provider,
        Handle::current(),
    )
}

fn candidates_of<H: EffectHandler>(store: &ImeStore<H>) -> Vec<String> {
    store
        .state()
        .as_precomposition()
        .map(|p| p.candidate_ui.candidates.iter().map(|c| c.surface.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_lookup_result_reaches_state() {
    let mut store = store_with(Echo);
    store.dispatch_ui(KeyboardAction::input("abc"));
    assert!(store.state().is_loading());

    store.wait_for_candidates().await;
    assert!(!store.state().is_loading());
    assert_eq!(candidates_of(&store), vec!["ABC", "abc!"]);
    assert_eq!(store.handler().host().calls, vec!["composing:abc||3"]);
}

#[tokio::test]
async fn test_provider_error_yields_empty_candidates() {
    let mut store = store_with(Failing);
    store.dispatch_ui(KeyboardAction::input("a"));
    store.wait_for_candidates().await;

    let p = store.state().as_precomposition().unwrap();
    assert!(!p.candidate_ui.is_loading);
    assert!(p.candidate_ui.candidates.is_empty());
    assert_eq!(p.composing, "a");
}

#[tokio::test]
async fn test_provider_panic_yields_empty_candidates() {
    let mut store = store_with(Panicking);
    store.dispatch_ui(KeyboardAction::input("a"));
    store.wait_for_candidates().await;

    assert!(!store.state().is_loading());
    assert!(candidates_of(&store).is_empty());

    // Typing keeps working after the failure.
    store.dispatch_ui(KeyboardAction::input("b"));
    assert_eq!(store.state().as_precomposition().unwrap().composing, "ab");
}

#[tokio::test]
async fn test_late_result_for_old_context_is_dropped() {
    let mut store = store_with(Slow {
        calls: AtomicUsize::new(0),
    });
    store.dispatch_ui(KeyboardAction::input("a"));
    store.dispatch_ui(KeyboardAction::input("b"));
    store.wait_for_candidates().await;
    assert_eq!(candidates_of(&store), vec!["<ab>"]);

    // Let the slow "a" lookup finish and apply it: nothing changes.
    tokio::time::sleep(Duration::from_millis(250)).await;
    let before = store.state().clone();
    store.pump();
    assert_eq!(*store.state(), before);
    assert_eq!(store.handler().provider().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_chosen_candidate_commits_and_carries() {
    let mut store = store_with(Echo);
    store.dispatch_ui(KeyboardAction::input("abcdef"));
    store.dispatch_ui(KeyboardAction::move_horizontal(-3));
    store.wait_for_candidates().await;
    assert_eq!(candidates_of(&store), vec!["ABC", "abc!"]);

    store.dispatch(ImeAction::CandidateChosen(Candidate::new("ABC")));
    store.wait_for_candidates().await;

    assert_eq!(store.handler().host().committed, "ABC");
    let p = store.state().as_precomposition().unwrap();
    assert_eq!(p.composing, "def");
    assert_eq!(p.split_cursor, 3);
    assert_eq!(candidates_of(&store), vec!["DEF", "def!"]);
}

#[tokio::test]
async fn test_select_mode_through_store() {
    let mut store = store_with(Echo);
    store.dispatch_ui(KeyboardAction::input("ab"));
    store.wait_for_candidates().await;

    store.dispatch_ui(KeyboardAction::Space);
    store.dispatch_ui(KeyboardAction::Space);
    store.dispatch_ui(KeyboardAction::Enter);

    let host = store.handler().host();
    assert_eq!(host.committed, "ab!");
    assert_eq!(
        host.calls,
        vec!["composing:ab||2", "composing:AB||2", "composing:ab!||3", "commit:ab!", "clear"]
    );
    assert_eq!(store.handler_mut().pending_lookups(), 0);
}

#[tokio::test]
async fn test_direct_mode_drives_editor() {
    let config = Config {
        initial_mode: libime_core::CompositionMode::Direct,
        ..Config::default()
    };
    let mut store =
        ImeStore::with_interpreter(&config, RecordingHost::default(), Echo, Handle::current());
    store.dispatch_ui(KeyboardAction::input("x"));
    store.dispatch_ui(KeyboardAction::MoveCursor { dx: 2, dy: 0 });
    store.dispatch_ui(KeyboardAction::Backspace);
    store.dispatch_ui(KeyboardAction::Enter);

    assert_eq!(
        store.handler().host().calls,
        vec!["commit:x", "dpad:Rightx2", "backspace", "enter"]
    );
}

#[tokio::test]
async fn test_blank_request_answers_without_provider() {
    let (sink, inbox) = action_channel();
    let provider = Arc::new(Slow {
        calls: AtomicUsize::new(0),
    });
    let interpreter = EffectInterpreter::from_arc(
        RecordingHost::default(),
        Arc::clone(&provider),
        sink.clone(),
        Handle::current(),
    );
    let mut store = ImeStore::new(
        ImeState::Precomposition(Precomposition::default()),
        ImeReducer::default(),
        interpreter,
        sink,
        inbox,
    );

    store.handler_mut().handle(Effect::RequestCandidates {
        request_key: " #1#1".to_string(),
        bg_text: " ".to_string(),
        limit: 8,
    });
    // Delivered synchronously through the inbox.
    assert_eq!(store.pump(), 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.handler_mut().pending_lookups(), 0);
}

#[tokio::test]
async fn test_dispose_cancels_pending_lookup() {
    let mut store = store_with(Slow {
        calls: AtomicUsize::new(0),
    });
    store.dispatch_ui(KeyboardAction::input("a"));
    assert_eq!(store.handler_mut().pending_lookups(), 1);

    store.dispose();
    assert!(store.is_disposed());
    assert!(store.handler().is_disposed());

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(store.pump(), 0);
    // Still the state from before teardown.
    assert!(store.state().is_loading());

    store.dispatch_ui(KeyboardAction::input("b"));
    assert_eq!(store.state().as_precomposition().unwrap().composing, "a");
}

#[tokio::test]
async fn test_clear_preedit_on_new_session() {
    let mut store = store_with(Echo);
    store.dispatch_ui(KeyboardAction::input("abc"));
    store.clear_preedit_if_any();
    assert_eq!(store.state().as_precomposition().unwrap().composing, "");
    assert_eq!(
        store.handler().host().calls.last().map(String::as_str),
        Some("clear")
    );
}
