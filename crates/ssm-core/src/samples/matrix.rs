//! The posterior sample matrix.

use std::collections::HashMap;
use std::ops::Range;

use super::group::{GroupIndex, GroupMember};
use super::SampleError;

/// Retained posterior draws for every monitored scalar.
///
/// Rows are draws, columns are named scalars. Rows from all chains are
/// concatenated in chain order and each chain's row range is kept so that
/// convergence diagnostics can look at chains separately. The matrix is
/// immutable: burn-in and thinning return a new matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorSamples {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    chains: Vec<Range<usize>>,
    lookup: HashMap<String, usize>,
    groups: GroupIndex,
}

impl PosteriorSamples {
    /// Build a single-chain matrix from named columns.
    pub fn from_columns(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, SampleError> {
        Self::from_chains(names, vec![columns])
    }

    /// Build a matrix from per-chain columns: `chains[k][j]` holds the draws
    /// of column `j` in chain `k`.
    pub fn from_chains(
        names: Vec<String>,
        chains: Vec<Vec<Vec<f64>>>,
    ) -> Result<Self, SampleError> {
        if names.is_empty() {
            return Err(SampleError::NoColumns);
        }

        let mut lookup = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if lookup.insert(name.clone(), i).is_some() {
                return Err(SampleError::DuplicateColumn { name: name.clone() });
            }
        }
        let groups = GroupIndex::build(&names)?;

        if chains.is_empty() {
            return Err(SampleError::EmptyChain { chain: 1 });
        }

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        let mut ranges = Vec::with_capacity(chains.len());
        let mut start = 0usize;

        for (k, chain) in chains.into_iter().enumerate() {
            let chain_no = k + 1;
            if chain.len() != names.len() {
                return Err(SampleError::ChainWidth {
                    chain: chain_no,
                    expected: names.len(),
                    actual: chain.len(),
                });
            }
            let len = chain[0].len();
            if len == 0 {
                return Err(SampleError::EmptyChain { chain: chain_no });
            }
            for (j, draws) in chain.into_iter().enumerate() {
                if draws.len() != len {
                    return Err(SampleError::RaggedColumn {
                        name: names[j].clone(),
                        chain: chain_no,
                        expected: len,
                        actual: draws.len(),
                    });
                }
                columns[j].extend(draws);
            }
            ranges.push(start..start + len);
            start += len;
        }

        Ok(PosteriorSamples {
            names,
            columns,
            chains: ranges,
            lookup,
            groups,
        })
    }

    /// Total retained draws across all chains.
    pub fn n_draws(&self) -> usize {
        self.chains.last().map(|r| r.end).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    pub fn n_chains(&self) -> usize {
        self.chains.len()
    }

    /// Draws per chain, in chain order.
    pub fn draws_per_chain(&self) -> Vec<usize> {
        self.chains.iter().map(|r| r.len()).collect()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// All draws of a column, chains concatenated.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }

    pub fn column_at(&self, position: usize) -> Option<&[f64]> {
        self.columns.get(position).map(|c| c.as_slice())
    }

    /// The draws of one column split by chain.
    pub fn chains_of(&self, position: usize) -> Vec<&[f64]> {
        match self.columns.get(position) {
            Some(column) => self.chains.iter().map(|r| &column[r.clone()]).collect(),
            None => Vec::new(),
        }
    }

    pub fn chain_ranges(&self) -> &[Range<usize>] {
        &self.chains
    }

    pub fn groups(&self) -> &GroupIndex {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&[GroupMember]> {
        self.groups.get(name)
    }

    /// Names of columns that do not belong to any variable group.
    pub fn ungrouped_names(&self) -> Vec<&str> {
        let mut grouped = vec![false; self.names.len()];
        for group in self.groups.names() {
            for member in self.groups.get(group).unwrap_or(&[]) {
                grouped[member.column] = true;
            }
        }
        self.names
            .iter()
            .zip(grouped)
            .filter(|(_, g)| !g)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// One draw as `(name, value)` pairs, in column order.
    pub fn draw(&self, row: usize) -> Option<Vec<(&str, f64)>> {
        if row >= self.n_draws() {
            return None;
        }
        Some(
            self.names
                .iter()
                .zip(&self.columns)
                .map(|(n, c)| (n.as_str(), c[row]))
                .collect(),
        )
    }

    /// Drop the first `per_chain` draws of every chain.
    pub fn discard_burn_in(&self, per_chain: usize) -> Result<Self, SampleError> {
        if per_chain == 0 {
            return Ok(self.clone());
        }
        for (k, range) in self.chains.iter().enumerate() {
            if per_chain >= range.len() {
                return Err(SampleError::BurnInTooLong {
                    requested: per_chain,
                    chain: k + 1,
                    available: range.len(),
                });
            }
        }
        Ok(self.retain_rows(|offset| offset >= per_chain))
    }

    /// Keep every `every`-th draw of each chain, starting with the first.
    pub fn thin(&self, every: usize) -> Result<Self, SampleError> {
        if every == 0 {
            return Err(SampleError::InvalidThin);
        }
        if every == 1 {
            return Ok(self.clone());
        }
        Ok(self.retain_rows(|offset| offset % every == 0))
    }

    /// Rebuild the matrix keeping rows whose within-chain offset passes `keep`.
    /// Column names are unchanged, so the group index is reused.
    fn retain_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); self.names.len()];
        let mut ranges = Vec::with_capacity(self.chains.len());
        let mut start = 0usize;

        for range in &self.chains {
            let rows: Vec<usize> = range.clone().filter(|&r| keep(r - range.start)).collect();
            for (j, column) in self.columns.iter().enumerate() {
                columns[j].extend(rows.iter().map(|&r| column[r]));
            }
            ranges.push(start..start + rows.len());
            start += rows.len();
        }

        PosteriorSamples {
            names: self.names.clone(),
            columns,
            chains: ranges,
            lookup: self.lookup.clone(),
            groups: self.groups.clone(),
        }
    }
}
