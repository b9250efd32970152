//! Union of per-worker detection results

use crate::catalog::TechnologyId;
use serde::{Deserialize, Serialize};
use std::collections::btree_set;
use std::collections::BTreeSet;

/// Set of detected technologies
///
/// Grows by union only. Ids are normalized on insert, so `"React"` and `"react"`
/// are the same member. Iteration is in sorted order, which keeps printed output
/// stable without making membership depend on traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanResult {
    technologies: BTreeSet<TechnologyId>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the id was not already present
    pub fn insert(&mut self, id: impl Into<TechnologyId>) -> bool {
        self.technologies.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.technologies.contains(TechnologyId::new(id).as_str())
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, TechnologyId> {
        self.technologies.iter()
    }

    pub fn merge(&mut self, other: ScanResult) {
        if self.technologies.is_empty() {
            self.technologies = other.technologies;
        } else {
            self.technologies.extend(other.technologies);
        }
    }

    pub fn is_superset(&self, other: &ScanResult) -> bool {
        self.technologies.is_superset(&other.technologies)
    }
}

impl<T: Into<TechnologyId>> FromIterator<T> for ScanResult {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            technologies: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T: Into<TechnologyId>> Extend<T> for ScanResult {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.technologies.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for ScanResult {
    type Item = TechnologyId;
    type IntoIter = btree_set::IntoIter<TechnologyId>;

    fn into_iter(self) -> Self::IntoIter {
        self.technologies.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScanResult {
    type Item = &'a TechnologyId;
    type IntoIter = btree_set::Iter<'a, TechnologyId>;

    fn into_iter(self) -> Self::IntoIter {
        self.technologies.iter()
    }
}

/// Merges partial results after all workers have finished
pub fn aggregate<I>(parts: I) -> ScanResult
where
    I: IntoIterator<Item = ScanResult>,
{
    parts.into_iter().fold(ScanResult::new(), |mut acc, part| {
        acc.merge(part);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_normalizes_case() {
        let mut result = ScanResult::new();
        assert!(result.insert("React"));
        assert!(!result.insert("react"));
        assert!(!result.insert(" REACT "));
        assert_eq!(result.len(), 1);
        assert!(result.contains("react"));
        assert!(result.contains("ReAcT"));
    }

    #[test]
    fn test_aggregate_is_union() {
        let a: ScanResult = ["python", "testing"].into_iter().collect();
        let b: ScanResult = ["Python", "django"].into_iter().collect();
        let c = ScanResult::new();

        let merged = aggregate(vec![a.clone(), b.clone(), c]);
        let ids: Vec<&str> = merged.iter().map(TechnologyId::as_str).collect();
        assert_eq!(ids, vec!["django", "python", "testing"]);
        assert!(merged.is_superset(&a));
        assert!(merged.is_superset(&b));
    }

    #[test]
    fn test_aggregate_ignores_order() {
        let parts = || {
            vec![
                ScanResult::from_iter(["go"]),
                ScanResult::from_iter(["rust", "shell"]),
                ScanResult::from_iter(["GO", "docker"]),
            ]
        };
        let forward = aggregate(parts());
        let backward = aggregate(parts().into_iter().rev());
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_aggregate_of_nothing_is_empty() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn test_serializes_as_sorted_list() {
        let result: ScanResult = ["typescript", "React", "node"].into_iter().collect();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"["node","react","typescript"]"#);

        let back: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
