//! libime-core
//!
//! Composition engine shared by soft-keyboard input methods: the preedit
//! state machine, candidate synchronisation and the effect interpreter that
//! drives an editor and a candidate provider.
//!
//! Language crates (e.g. libkana) plug in a `CandidateProvider`; platforms
//! plug in an `EditorHost`.
//!
//! Public API:
//! - `ImeState`, `Precomposition`, `CandidateUiState` - composition state
//! - `KeyboardAction`, `ImeAction`, `Effect` - reducer inputs and outputs
//! - `ImeReducer` / `reduce` - the pure state machine
//! - `ImeStore` - sequential dispatch loop with listeners
//! - `EffectInterpreter` - executes effects against `EditorHost` and `CandidateProvider`
//! - `Config` - configuration (TOML)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libime_core::{Config, ImeStore, KeyboardAction, NoCandidates};
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let mut store = ImeStore::with_interpreter(&Config::default(), host, NoCandidates, runtime.handle().clone());
//! store.add_listener(|state| println!("{:?}", state));
//! store.dispatch_ui(KeyboardAction::input("か"));
//! runtime.block_on(store.wait_for_candidates());
//! ```
use serde::{Deserialize, Serialize};

pub mod action;
pub use action::{DpadDirection, Effect, ImeAction, KeyboardAction, RawAction};

pub mod candidate;
pub use candidate::Candidate;

pub mod decoration;
pub use decoration::{compute_ranges, ComputedRanges, DecorationPolicy, PreeditStyle, Range, StyledPreedit};

pub mod state;
pub use state::{CandidateUiMode, CandidateUiState, CompositionMode, ImeState, Precomposition};

pub mod reducer;
pub use reducer::{reduce, request_key, ImeReducer, Next, DEFAULT_CANDIDATE_LIMIT};

pub mod host;
pub use host::EditorHost;

pub mod provider;
pub use provider::{CacheStats, CachedProvider, CandidateProvider, NoCandidates};

pub mod interpreter;
pub use interpreter::EffectInterpreter;

pub mod store;
pub use store::{action_channel, ActionInbox, ActionSink, EffectHandler, ImeStore, ListenerId};

/// Generic configuration for the composition engine.
///
/// Language crates flatten this into their own config (see `KanaConfig` in
/// libkana) and add provider-specific options next to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of candidates requested per lookup
    pub candidate_limit: usize,

    /// Mode the store starts in
    pub initial_mode: CompositionMode,

    /// Decoration of newly created preedits
    pub decoration: DecorationPolicy,

    /// Capacity of the lookup cache when the provider is wrapped in
    /// `CachedProvider`
    pub max_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            initial_mode: CompositionMode::Precomposition,
            decoration: DecorationPolicy::SplitAtCursor,
            max_cache_size: 256,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path.display(), e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Wrap `provider` in an LRU cache sized by `max_cache_size`.
    pub fn cached<P: CandidateProvider>(&self, provider: P) -> CachedProvider<P> {
        CachedProvider::new(provider, self.max_cache_size)
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}
