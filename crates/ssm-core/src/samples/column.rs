//! Column name parsing.
//!
//! Sampler output names scalars `tau_obs`, vector elements `x[12]` and matrix
//! elements `Xf[3,1]`. The base name must match the whole text before the
//! bracket, so `tau_x[1]` belongs to `tau_x`, never to `x`.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

static COLUMN_RE: OnceLock<Regex> = OnceLock::new();

fn column_re() -> &'static Regex {
    COLUMN_RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9._]*)(?:\[\s*(\d+(?:\s*,\s*\d+)*)\s*\])?$")
            .expect("column name pattern is valid")
    })
}

/// A parsed column name: base variable plus zero or more indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName {
    pub base: String,
    pub indices: Vec<usize>,
}

impl ColumnName {
    /// Parse a column name. Text that is not a JAGS node name (for example
    /// `x[a]`) is kept whole as a scalar so it never joins a group.
    pub fn parse(name: &str) -> Self {
        let Some(caps) = column_re().captures(name.trim()) else {
            return ColumnName {
                base: name.to_string(),
                indices: Vec::new(),
            };
        };

        let base = caps[1].to_string();
        let indices = match caps.get(2) {
            None => Vec::new(),
            Some(m) => {
                let parsed: Option<Vec<usize>> = m
                    .as_str()
                    .split(',')
                    .map(|part| part.trim().parse::<usize>().ok())
                    .collect();
                match parsed {
                    Some(indices) => indices,
                    // Index overflowed usize.
                    None => {
                        return ColumnName {
                            base: name.to_string(),
                            indices: Vec::new(),
                        }
                    }
                }
            }
        };

        ColumnName { base, indices }
    }

    pub fn is_scalar(&self) -> bool {
        self.indices.is_empty()
    }

    /// The single index of a one-dimensional element, if this is one.
    pub fn vector_index(&self) -> Option<usize> {
        match self.indices.as_slice() {
            [i] => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indices.is_empty() {
            return write!(f, "{}", self.base);
        }
        let idx: Vec<String> = self.indices.iter().map(|i| i.to_string()).collect();
        write!(f, "{}[{}]", self.base, idx.join(","))
    }
}
