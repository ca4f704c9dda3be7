//! Candidate type for preedit conversion and suggestion.

use serde::{Deserialize, Serialize};

/// A single conversion or suggestion result.
///
/// Candidates are opaque to the composition engine: providers rank them and
/// the engine only ever reads `surface`, the text that replaces the bg range
/// when the candidate is previewed or committed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub surface: String,
}

impl Candidate {
    pub fn new<T: Into<String>>(surface: T) -> Self {
        Candidate {
            surface: surface.into(),
        }
    }

    /// Number of chars in the surface.
    pub fn char_len(&self) -> usize {
        self.surface.chars().count()
    }
}

impl From<&str> for Candidate {
    fn from(surface: &str) -> Self {
        Candidate::new(surface)
    }
}

impl From<String> for Candidate {
    fn from(surface: String) -> Self {
        Candidate { surface }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_candidate() {
        let c = Candidate::new("漢字");
        assert_eq!(c.surface, "漢字");
        assert_eq!(c.char_len(), 2);
    }

    #[test]
    fn test_from_conversions() {
        let a: Candidate = "かな".into();
        let b: Candidate = String::from("かな").into();
        assert_eq!(a, b);
    }
}
