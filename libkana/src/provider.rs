//! Default kana candidate provider.
//!
//! No dictionary: the candidates are surface variants of the input itself
//! (as typed, bracketed, upper-cased, katakana), which is enough to drive
//! conversion, selection and commit-and-carry end to end.

use crate::config::KanaConfig;
use crate::kana::to_katakana;
use libime_core::{utils, Candidate, CandidateProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KanaCandidateProvider {
    bracketed: bool,
    uppercase: bool,
    katakana: bool,
}

impl Default for KanaCandidateProvider {
    fn default() -> Self {
        Self::from_config(&KanaConfig::default())
    }
}

impl KanaCandidateProvider {
    pub fn from_config(config: &KanaConfig) -> Self {
        Self {
            bracketed: config.bracketed,
            uppercase: config.uppercase,
            katakana: config.katakana,
        }
    }

    /// All variants of `text` in ranking order, without truncation.
    pub fn variants(&self, text: &str) -> Vec<Candidate> {
        let base = utils::normalize(text);
        if base.is_empty() {
            return Vec::new();
        }

        let mut forms = Vec::with_capacity(4);
        forms.push(base.clone());
        if self.bracketed {
            forms.push(format!("【{}】", base));
        }
        if self.uppercase {
            forms.push(base.to_uppercase());
        }
        if self.katakana {
            forms.push(to_katakana(&base));
        }

        let mut out: Vec<Candidate> = Vec::with_capacity(forms.len());
        for form in forms {
            if !out.iter().any(|c| c.surface == form) {
                out.push(Candidate::new(form));
            }
        }
        out
    }
}

impl CandidateProvider for KanaCandidateProvider {
    fn suggest(&self, text: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> {
        let mut candidates = self.variants(text);
        candidates.truncate(limit);
        tracing::trace!(target: "kana.provider", text, count = candidates.len(), "suggest");
        Ok(candidates)
    }
}
