//! libkana crate root
//!
//! Japanese kana input method on top of `libime-core`: kana conversion
//! helpers, the default `KanaCandidateProvider`, `KanaConfig` and a store
//! factory wiring them to an editor host.
//!
//! Public API exported here:
//! - `to_katakana` / `to_hiragana` from `kana`
//! - `KanaCandidateProvider` from `provider`
//! - `KanaConfig` from `config`
//! - `create_ime_store`

pub mod config;
pub mod kana;
pub mod provider;

pub use libime_core::{
    Candidate, CandidateProvider, CompositionMode, DecorationPolicy, EditorHost, EffectInterpreter,
    ImeAction, ImeState, ImeStore, KeyboardAction,
};

pub use config::KanaConfig;
pub use kana::{is_hiragana, is_katakana, to_hiragana, to_katakana};
pub use provider::KanaCandidateProvider;

/// Store type produced by [`create_ime_store`].
pub type KanaStore<H> = ImeStore<EffectInterpreter<H, libime_core::CachedProvider<KanaCandidateProvider>>>;

/// Build a store driving `host`, with the kana provider behind the lookup
/// cache. Lookups are spawned on `runtime`.
pub fn create_ime_store<H: EditorHost>(
    config: &KanaConfig,
    host: H,
    runtime: tokio::runtime::Handle,
) -> KanaStore<H> {
    let provider = config
        .base()
        .cached(KanaCandidateProvider::from_config(config));
    tracing::debug!(
        target: "kana",
        candidate_limit = config.base().candidate_limit,
        initial_mode = ?config.base().initial_mode,
        "create_ime_store"
    );
    ImeStore::with_interpreter(config.base(), host, provider, runtime)
}
