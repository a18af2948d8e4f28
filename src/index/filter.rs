//! Search-term filtering of a finished index

use crate::index::MetadataIndex;
use std::fmt;

/// Lowercased search terms, all of which must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    terms: Vec<String>,
}

impl SearchTerms {
    /// Parse comma-separated terms
    ///
    /// Each piece is trimmed of spaces and lowercased. A blank piece is
    /// kept as the empty term, which matches every entry.
    pub fn parse(csv: &str) -> Self {
        let terms = csv
            .split(',')
            .map(|piece| piece.trim_matches(' ').to_lowercase())
            .collect();
        Self { terms }
    }

    /// Build from already-split terms (lowercased here)
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True if every term occurs in `metadata`, case-insensitively
    pub fn matches(&self, metadata: &str) -> bool {
        let folded = metadata.to_lowercase();
        self.matches_folded(&folded)
    }

    fn matches_folded(&self, folded: &str) -> bool {
        self.terms.iter().all(|term| folded.contains(term.as_str()))
    }
}

impl fmt::Display for SearchTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.terms.join(", "))
    }
}

/// Drop every entry that does not contain all `terms`
///
/// Returns the number of entries removed.
pub fn filter_index(index: &mut MetadataIndex, terms: &SearchTerms) -> usize {
    let before = index.len();
    index.retain(|_, metadata| terms.matches(metadata));
    before - index.len()
}

/// Copy out the entries that contain all `terms`, leaving `index` intact
pub fn matching_entries(index: &MetadataIndex, terms: &SearchTerms) -> MetadataIndex {
    index
        .iter()
        .filter(|(_, metadata)| terms.matches(metadata))
        .map(|(identity, metadata)| (identity.clone(), metadata.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cameras() -> MetadataIndex {
        let mut index = MetadataIndex::new();
        index.insert("a".into(), "Camera: Nikon".into());
        index.insert("b".into(), "Camera: Canon".into());
        index
    }

    #[test]
    fn test_single_term_case_insensitive() {
        let mut index = cameras();
        let removed = filter_index(&mut index, &SearchTerms::from_terms(["nikon"]));
        assert_eq!(removed, 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index["a"], "Camera: Nikon");
    }

    #[test]
    fn test_terms_are_anded() {
        let mut index = cameras();
        filter_index(&mut index, &SearchTerms::from_terms(["camera", "zzz"]));
        assert!(index.is_empty());
    }

    #[test]
    fn test_matching_entries_leaves_source() {
        let index = cameras();
        let matched = matching_entries(&index, &SearchTerms::parse("CANON"));
        assert_eq!(matched.len(), 1);
        assert_eq!(matched["b"], "Camera: Canon");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_term_matches_everything() {
        let mut index = cameras();
        index.insert("c".into(), String::new());
        filter_index(&mut index, &SearchTerms::parse(""));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_parse_trims_and_lowercases() {
        let terms = SearchTerms::parse(" Cat ,DOG,  ,bird");
        assert_eq!(terms.terms(), ["cat", "dog", "", "bird"]);
        assert_eq!(terms.to_string(), "cat, dog, , bird");
    }

    #[test]
    fn test_parse_keeps_inner_spaces() {
        let terms = SearchTerms::parse("red fox, blue sky");
        assert!(terms.matches("Prompt: a Red Fox under a BLUE SKY"));
        assert!(!terms.matches("Prompt: a red dog under a blue sky"));
    }

    #[test]
    fn test_no_terms_matches_everything() {
        let terms = SearchTerms::from_terms(Vec::<String>::new());
        assert!(terms.is_empty());
        assert!(terms.matches("anything"));
    }
}
