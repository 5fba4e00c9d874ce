//! The learner's set of completed subjects

use crate::normalize::normalize;
use std::collections::BTreeMap;

/// Completed subject names
///
/// Membership is normalized-name equality; the original spelling of each
/// name is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    names: BTreeMap<String, String>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name`; returns `false` if it was already present
    pub fn insert(&mut self, name: &str) -> bool {
        let key = normalize(name);
        if self.names.contains_key(&key) {
            return false;
        }
        self.names.insert(key, name.to_string());
        true
    }

    /// Remove `name`, returning the stored spelling if it was present
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.names.remove(&normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&normalize(name))
    }

    /// Stored names, ordered by normalized key
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.values().map(String::as_str)
    }

    pub fn names(&self) -> Vec<String> {
        self.names.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

impl<'a> FromIterator<&'a str> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_normalized() {
        let mut set = CompletionSet::new();
        assert!(set.insert("Cálculo I"));
        assert!(set.contains("calculo  i"));
        assert!(!set.insert("CALCULO I"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.names(), vec!["Cálculo I".to_string()]);
    }

    #[test]
    fn test_remove_returns_original_spelling() {
        let mut set: CompletionSet = ["Álgebra I", "Física I"].into_iter().collect();
        assert_eq!(set.remove("algebra i"), Some("Álgebra I".to_string()));
        assert_eq!(set.remove("algebra i"), None);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Física I"]);
    }

    #[test]
    fn test_clear() {
        let mut set: CompletionSet = ["A", "B"].into_iter().collect();
        set.clear();
        assert!(set.is_empty());
    }
}
