//! Typed index from variable group name to index-ordered column positions.

use std::collections::{BTreeMap, HashMap};

use super::column::ColumnName;
use super::SampleError;

/// One element of a variable group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMember {
    /// Index parsed from the bracket suffix (1-based in JAGS output).
    pub index: usize,
    /// Position of the column in the sample matrix.
    pub column: usize,
}

/// Variable groups of a sample matrix, built once at ingest.
///
/// Only one-dimensional elements (`x[3]`) join a group. Matrix elements
/// (`Xf[3,1]`) and scalars stay plain columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndex {
    groups: HashMap<String, Vec<GroupMember>>,
}

impl GroupIndex {
    /// Build the index for a list of column names.
    ///
    /// Members are sorted by index. Duplicate indices are rejected. Gaps are
    /// kept, since a partial monitor (`beta[1]`, `beta[3]`) is still a valid
    /// matrix; contiguity is checked only where a group meets a time axis.
    pub fn build(names: &[String]) -> Result<Self, SampleError> {
        let mut by_group: HashMap<String, BTreeMap<usize, usize>> = HashMap::new();

        for (column, name) in names.iter().enumerate() {
            let parsed = ColumnName::parse(name);
            let Some(index) = parsed.vector_index() else {
                continue;
            };
            let members = by_group.entry(parsed.base.clone()).or_default();
            if members.insert(index, column).is_some() {
                return Err(SampleError::DuplicateIndex {
                    group: parsed.base,
                    index,
                });
            }
        }

        let groups = by_group
            .into_iter()
            .map(|(group, members)| {
                let ordered = members
                    .into_iter()
                    .map(|(index, column)| GroupMember { index, column })
                    .collect();
                (group, ordered)
            })
            .collect();

        Ok(GroupIndex { groups })
    }

    /// Members of a group, ascending by index.
    pub fn get(&self, group: &str) -> Option<&[GroupMember]> {
        self.groups.get(group).map(|m| m.as_slice())
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Group names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn groups_are_sorted_by_index() {
        let idx = GroupIndex::build(&names(&["x[3]", "tau_obs", "x[1]", "x[2]"])).unwrap();
        let members = idx.get("x").unwrap();
        let indices: Vec<usize> = members.iter().map(|m| m.index).collect();
        let columns: Vec<usize> = members.iter().map(|m| m.column).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(columns, vec![2, 3, 0]);
        assert!(!idx.contains("tau_obs"));
    }

    #[test]
    fn numeric_not_lexicographic_order() {
        let idx = GroupIndex::build(&names(&["x[10]", "x[9]", "x[8]"])).unwrap();
        let indices: Vec<usize> = idx.get("x").unwrap().iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![8, 9, 10]);
    }

    #[test]
    fn matrix_elements_are_not_grouped() {
        let idx = GroupIndex::build(&names(&["Xf[1,1]", "Xf[2,1]", "y[1]"])).unwrap();
        assert!(!idx.contains("Xf"));
        assert_eq!(idx.names(), vec!["y"]);
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let err = GroupIndex::build(&names(&["x[1]", "x[ 1 ]"])).unwrap_err();
        assert!(matches!(err, SampleError::DuplicateIndex { index: 1, .. }));
    }

    #[test]
    fn partial_monitor_keeps_gaps() {
        let idx =
            GroupIndex::build(&names(&["x[1]", "x[2]", "beta[3]", "beta[1]"])).unwrap();
        let indices: Vec<usize> = idx.get("beta").unwrap().iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(idx.get("x").unwrap().len(), 2);
    }

    #[test]
    fn similar_prefixes_are_separate_groups() {
        let idx = GroupIndex::build(&names(&["x[1]", "xf[1]", "tau_x[1]"])).unwrap();
        assert_eq!(idx.names(), vec!["tau_x", "x", "xf"]);
        assert_eq!(idx.get("x").unwrap().len(), 1);
    }
}
