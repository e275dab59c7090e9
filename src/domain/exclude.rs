//! Exclusion patterns for packaging
//!
//! Names are tested against shell-style globs (`*.pyc`, `.git`, `tests`).
//! A name is excluded when it matches any pattern in the set.

use glob::Pattern;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExclusionError {
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// A set of glob patterns matched against file and directory names
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// Creates an empty set that excludes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from pattern strings, skipping duplicates
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, ExclusionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for pattern in patterns {
            set.add(pattern.as_ref())?;
        }
        Ok(set)
    }

    /// Adds a pattern to the set
    pub fn add(&mut self, pattern: &str) -> Result<(), ExclusionError> {
        let normalized = collapse_stars(pattern);
        if self.patterns.iter().any(|p| p.as_str() == normalized) {
            return Ok(());
        }

        let compiled = Pattern::new(&normalized).map_err(|source| ExclusionError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.patterns.push(compiled);
        Ok(())
    }

    /// Returns true if the name matches any pattern
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Returns the pattern strings in the set
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Replaces every run of `*` with a single `*`
///
/// Names never contain `/`, so `**` matches exactly what `*` does, but
/// `glob` only accepts it as a whole path component.
fn collapse_stars(pattern: &str) -> String {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn matches_wildcards_and_literals() {
        let set = ExclusionSet::from_patterns(["*.pyc", ".git"]).unwrap();

        assert!(set.is_excluded("plugin.pyc"));
        assert!(set.is_excluded(".git"));
        assert!(!set.is_excluded("plugin.py"));
        assert!(!set.is_excluded(".gitignore"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let set = ExclusionSet::from_patterns(["tests"]).unwrap();
        assert!(set.is_excluded("tests"));
        assert!(!set.is_excluded("Tests"));
    }

    #[test]
    fn empty_set_excludes_nothing() {
        let set = ExclusionSet::new();
        assert!(set.is_empty());
        assert!(!set.is_excluded("anything"));
    }

    #[test]
    fn duplicates_are_collapsed() {
        let set = ExclusionSet::from_patterns(["test", "tests", "test"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.patterns().collect::<Vec<_>>(), vec!["test", "tests"]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = ExclusionSet::from_patterns(["[unclosed"]).unwrap_err();
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn repeated_stars_act_as_one() {
        let set = ExclusionSet::from_patterns(["a**", "**b", "*.py**"]).unwrap();
        assert_eq!(set.patterns().collect::<Vec<_>>(), vec!["a*", "*b", "*.py*"]);

        assert!(set.is_excluded("abc"));
        assert!(set.is_excluded("cab"));
        assert!(set.is_excluded("plugin.pyc"));
        assert!(set.is_excluded("plugin.py"));
        assert!(!set.is_excluded("xyz"));
    }

    #[test]
    fn collapsed_duplicates_are_skipped() {
        let set = ExclusionSet::from_patterns(["*.pyc", "**.pyc"]).unwrap();
        assert_eq!(set.len(), 1);
    }

    proptest! {
        #[test]
        fn order_of_patterns_does_not_matter(
            patterns in prop::collection::vec("[a-c*?]{1,4}", 1..5),
            name in "[a-c]{0,5}",
        ) {
            let forward = ExclusionSet::from_patterns(&patterns).unwrap();
            let reversed = ExclusionSet::from_patterns(patterns.iter().rev()).unwrap();
            prop_assert_eq!(forward.is_excluded(&name), reversed.is_excluded(&name));
        }
    }
}
