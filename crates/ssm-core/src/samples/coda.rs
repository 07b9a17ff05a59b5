//! Reader and writer for the CODA text format.
//!
//! JAGS writes one index file and one file per chain:
//!
//! ```text
//! CODAindex.txt        CODAchain1.txt
//! x[1] 1 1000          1001  6.91
//! x[2] 1001 2000       1002  6.88
//! tau_obs 2001 3000    ...
//! ```
//!
//! Index lines are `name first last` (1-based, inclusive line numbers into
//! every chain file). Chain lines are `iteration value`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::matrix::PosteriorSamples;
use super::SampleError;

/// One variable's line range in the chain files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodaIndexEntry {
    pub name: String,
    pub first: usize,
    pub last: usize,
}

impl CodaIndexEntry {
    pub fn len(&self) -> usize {
        self.last + 1 - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

/// Paths of an index file and its chain files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodaFiles {
    pub index: PathBuf,
    pub chains: Vec<PathBuf>,
}

impl CodaFiles {
    /// Paths for `n_chains` chains written with `stem` into `dir`.
    pub fn with_stem(dir: &Path, stem: &str, n_chains: usize) -> Self {
        CodaFiles {
            index: dir.join(format!("{stem}index.txt")),
            chains: (1..=n_chains)
                .map(|k| dir.join(format!("{stem}chain{k}.txt")))
                .collect(),
        }
    }

    /// Find the index file and every consecutively numbered chain file.
    pub fn discover(dir: &Path, stem: &str) -> Result<Self, SampleError> {
        let index = dir.join(format!("{stem}index.txt"));
        if !index.is_file() {
            return Err(SampleError::Io {
                path: index.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "CODA index not found"),
            });
        }
        let chains: Vec<PathBuf> = (1..)
            .map(|k| dir.join(format!("{stem}chain{k}.txt")))
            .take_while(|p| p.is_file())
            .collect();
        if chains.is_empty() {
            return Err(SampleError::EmptyChain { chain: 1 });
        }
        Ok(CodaFiles { index, chains })
    }

    /// Write a sample matrix to these paths.
    pub fn write(&self, samples: &PosteriorSamples) -> Result<(), SampleError> {
        let (index, chains) = write_coda(samples);
        write_file(&self.index, &index)?;
        for (path, text) in self.chains.iter().zip(chains) {
            write_file(path, &text)?;
        }
        Ok(())
    }
}

/// Parse a CODA index file.
pub fn parse_index(text: &str, file: &str) -> Result<Vec<CodaIndexEntry>, SampleError> {
    let mut entries = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [name, first, last] = fields.as_slice() else {
            return Err(SampleError::coda(
                file,
                line_no,
                format!("expected 'name first last', got {} fields", fields.len()),
            ));
        };
        let first: usize = first
            .parse()
            .map_err(|_| SampleError::coda(file, line_no, format!("bad first line '{first}'")))?;
        let last: usize = last
            .parse()
            .map_err(|_| SampleError::coda(file, line_no, format!("bad last line '{last}'")))?;
        if first == 0 || last < first {
            return Err(SampleError::coda(
                file,
                line_no,
                format!("invalid range {first}..{last}"),
            ));
        }
        entries.push(CodaIndexEntry {
            name: name.to_string(),
            first,
            last,
        });
    }
    if entries.is_empty() {
        return Err(SampleError::coda(file, 0, "index lists no variables"));
    }
    Ok(entries)
}

/// Parse a CODA chain file into its values, one per line.
///
/// Blank lines are skipped, as in the index; line numbers in errors still
/// count them.
pub fn parse_chain(text: &str, file: &str) -> Result<Vec<f64>, SampleError> {
    let mut values = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(iter), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(SampleError::coda(file, line_no, "expected 'iteration value'"));
        };
        if iter.parse::<f64>().is_err() {
            return Err(SampleError::coda(
                file,
                line_no,
                format!("bad iteration '{iter}'"),
            ));
        }
        let value: f64 = value
            .parse()
            .map_err(|_| SampleError::coda(file, line_no, format!("bad value '{value}'")))?;
        values.push(value);
    }
    Ok(values)
}

/// Assemble a sample matrix from CODA index and chain texts.
pub fn from_coda_text(index: &str, chains: &[&str]) -> Result<PosteriorSamples, SampleError> {
    let entries = parse_index(index, "CODAindex.txt")?;
    let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();

    let mut per_chain = Vec::with_capacity(chains.len());
    for (k, text) in chains.iter().enumerate() {
        let file = format!("CODAchain{}.txt", k + 1);
        let values = parse_chain(text, &file)?;
        per_chain.push(slice_columns(&entries, &values, &file)?);
    }
    PosteriorSamples::from_chains(names, per_chain)
}

/// Read a sample matrix from CODA files on disk.
pub fn read_coda(files: &CodaFiles) -> Result<PosteriorSamples, SampleError> {
    let index_file = files.index.display().to_string();
    let entries = parse_index(&read_file(&files.index)?, &index_file)?;
    let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();

    let mut per_chain = Vec::with_capacity(files.chains.len());
    for path in &files.chains {
        let file = path.display().to_string();
        let values = parse_chain(&read_file(path)?, &file)?;
        per_chain.push(slice_columns(&entries, &values, &file)?);
    }
    PosteriorSamples::from_chains(names, per_chain)
}

fn slice_columns(
    entries: &[CodaIndexEntry],
    values: &[f64],
    file: &str,
) -> Result<Vec<Vec<f64>>, SampleError> {
    entries
        .iter()
        .map(|e| {
            if e.last > values.len() {
                return Err(SampleError::coda(
                    file,
                    values.len(),
                    format!(
                        "'{}' needs lines {}..{} but the file has {} lines",
                        e.name,
                        e.first,
                        e.last,
                        values.len()
                    ),
                ));
            }
            Ok(values[e.first - 1..e.last].to_vec())
        })
        .collect()
}

/// Render a sample matrix as CODA text: the index and one text per chain.
///
/// Iterations are numbered from 1 within each chain.
pub fn write_coda(samples: &PosteriorSamples) -> (String, Vec<String>) {
    let draws = samples.draws_per_chain();
    // All chains share one index, so use the shortest chain length.
    let per_chain = draws.iter().copied().min().unwrap_or(0);

    let mut index = String::new();
    for (j, name) in samples.names().iter().enumerate() {
        let first = j * per_chain + 1;
        let _ = writeln!(index, "{} {} {}", name, first, first + per_chain - 1);
    }

    let chains = (0..samples.n_chains())
        .map(|k| {
            let mut text = String::new();
            for position in 0..samples.n_columns() {
                let split = samples.chains_of(position);
                for (iter, value) in split[k].iter().take(per_chain).enumerate() {
                    let _ = writeln!(text, "{} {}", iter + 1, value);
                }
            }
            text
        })
        .collect();

    (index, chains)
}

fn read_file(path: &Path) -> Result<String, SampleError> {
    fs::read_to_string(path).map_err(|source| SampleError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn write_file(path: &Path, text: &str) -> Result<(), SampleError> {
    fs::write(path, text).map_err(|source| SampleError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "x[1] 1 3\nx[2] 4 6\ntau_obs 7 9\n";
    const CHAIN1: &str = "1 1.0\n2 2.0\n3 3.0\n1 10\n2 20\n3 30\n1 0.5\n2 0.6\n3 0.7\n";
    const CHAIN2: &str = "1 4.0\n2 5.0\n3 6.0\n1 40\n2 50\n3 60\n1 0.8\n2 0.9\n3 1.0\n";

    #[test]
    fn parses_index_entries() {
        let entries = parse_index(INDEX, "idx").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[1],
            CodaIndexEntry {
                name: "x[2]".into(),
                first: 4,
                last: 6
            }
        );
        assert_eq!(entries[1].len(), 3);
    }

    #[test]
    fn assembles_two_chains() {
        let s = from_coda_text(INDEX, &[CHAIN1, CHAIN2]).unwrap();
        assert_eq!(s.n_chains(), 2);
        assert_eq!(s.n_draws(), 6);
        assert_eq!(s.column("x[2]").unwrap(), &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(s.group("x").unwrap().len(), 2);
    }

    #[test]
    fn index_errors_carry_line_numbers() {
        let err = parse_index("x[1] 1 3\nbroken line\n", "CODAindex.txt").unwrap_err();
        match err {
            SampleError::Coda { file, line, .. } => {
                assert_eq!(file, "CODAindex.txt");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_index("x 0 3\n", "i").is_err());
        assert!(parse_index("x 5 3\n", "i").is_err());
        assert!(parse_index("\n\n", "i").is_err());
    }

    #[test]
    fn chain_errors_carry_line_numbers() {
        let err = parse_chain("1 1.0\n2 abc\n", "CODAchain1.txt").unwrap_err();
        assert!(err.to_string().starts_with("CODAchain1.txt:2:"));
        assert!(parse_chain("1\n", "c").is_err());
        assert!(parse_chain("1 2 3\n", "c").is_err());
    }

    #[test]
    fn blank_chain_lines_are_skipped() {
        assert_eq!(parse_chain("1 1.0\n\n2 2.0\n  \n", "c").unwrap(), vec![1.0, 2.0]);
        let err = parse_chain("1 1.0\n\n3 x\n", "CODAchain1.txt").unwrap_err();
        assert!(err.to_string().starts_with("CODAchain1.txt:3:"));

        let padded = format!("\n{CHAIN1}\n");
        let s = from_coda_text(INDEX, &[padded.as_str(), CHAIN2]).unwrap();
        assert_eq!(s.column("tau_obs").unwrap(), &[0.5, 0.6, 0.7, 0.8, 0.9, 1.0]);
    }

    #[test]
    fn truncated_chain_is_reported() {
        let err = from_coda_text(INDEX, &["1 1.0\n2 2.0\n"]).unwrap_err();
        assert!(err.to_string().contains("needs lines 1..3"));
    }

    #[test]
    fn written_text_reads_back() {
        let s = from_coda_text(INDEX, &[CHAIN1, CHAIN2]).unwrap();
        let (index, chains) = write_coda(&s);
        let refs: Vec<&str> = chains.iter().map(|c| c.as_str()).collect();
        assert_eq!(from_coda_text(&index, &refs).unwrap(), s);
    }

    #[test]
    fn discover_and_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let s = from_coda_text(INDEX, &[CHAIN1, CHAIN2]).unwrap();
        CodaFiles::with_stem(dir.path(), "CODA", 2).write(&s).unwrap();

        let files = CodaFiles::discover(dir.path(), "CODA").unwrap();
        assert_eq!(files.chains.len(), 2);
        assert_eq!(read_coda(&files).unwrap(), s);
    }

    #[test]
    fn discover_requires_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CodaFiles::discover(dir.path(), "CODA"),
            Err(SampleError::Io { .. })
        ));
    }
}
