//! Scenario selection filter

use std::collections::BTreeSet;

/// Sentinel name selecting the whole catalog
pub const ALL: &str = "all";

/// Set of scenario names requested by the caller, or everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every scenario in the catalog
    All,
    /// Only the named scenarios
    Named(BTreeSet<String>),
}

impl Selection {
    /// Build a selection; `all` anywhere in `names` selects everything
    #[must_use]
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        if names.iter().any(|name| name.as_ref() == ALL) {
            return Self::All;
        }
        Self::Named(names.iter().map(|name| name.as_ref().to_string()).collect())
    }

    /// Whether `name` passes the filter
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.contains(name),
        }
    }

    /// Whether no scenario can pass the filter
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Named(names) if names.is_empty())
    }

    /// Requested names that are absent from `known`
    pub fn unknown<'a>(&'a self, known: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        let names = match self {
            Self::All => None,
            Self::Named(names) => Some(names),
        };
        names
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(move |name| !known.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_anywhere_selects_everything() {
        let selection = Selection::from_names(&["attack-small-tree", "all"]);
        assert_eq!(selection, Selection::All);
        assert!(selection.contains("convert-topologies"));
        assert!(!selection.is_empty());
    }

    #[test]
    fn named_selection_filters() {
        let selection = Selection::from_names(&["convert-topologies"]);
        assert!(selection.contains("convert-topologies"));
        assert!(!selection.contains("attack-small-tree"));
    }

    #[test]
    fn empty_selection() {
        let selection = Selection::from_names::<&str>(&[]);
        assert!(selection.is_empty());
        assert!(!selection.contains("anything"));
    }

    #[test]
    fn reports_unknown_names() {
        let selection = Selection::from_names(&["attack-small-tree", "typo"]);
        let known = ["attack-small-tree", "convert-topologies"];
        let unknown: Vec<_> = selection.unknown(&known).collect();
        assert_eq!(unknown, ["typo"]);
        assert_eq!(Selection::All.unknown(&known).count(), 0);
    }
}
