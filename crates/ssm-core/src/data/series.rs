//! Delimited and JSON time series files.
//!
//! The delimited reader accepts the Flu Trends download layout: a free-text
//! preamble, a `Date,<region>,<region>,...` header and one row per week.
//! Lines starting with `#` and blank lines are ignored anywhere. Empty cells
//! and `NA` are missing observations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::DataError;

/// Time labels with optional observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl TimeSeries {
    pub fn new(
        name: impl Into<String>,
        labels: Vec<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, DataError> {
        if labels.len() != values.len() {
            return Err(DataError::LengthMismatch {
                labels: labels.len(),
                values: values.len(),
            });
        }
        Ok(TimeSeries {
            name: name.into(),
            labels,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observed values in time order, missing ones skipped.
    pub fn observed(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    pub fn n_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Natural log of every observed value. Zero or negative values fail.
    pub fn log(&self) -> Result<TimeSeries, DataError> {
        let values = self
            .values
            .iter()
            .zip(&self.labels)
            .map(|(v, time)| match *v {
                Some(x) if x > 0.0 => Ok(Some(x.ln())),
                Some(x) => Err(DataError::NonPositive {
                    time: time.clone(),
                    value: x,
                }),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TimeSeries {
            name: self.name.clone(),
            labels: self.labels.clone(),
            values,
        })
    }
}

/// A parsed table: time labels in the first column, numeric columns after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub time_header: String,
    pub labels: Vec<String>,
    pub columns: Vec<DataColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl DataTable {
    /// Parse comma- or tab-delimited text.
    pub fn parse_delimited(text: &str) -> Result<Self, DataError> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
            .collect();

        // The header is the first line whose first cell is "Date"; without
        // one, the first remaining line.
        let header_at = lines
            .iter()
            .position(|(_, l)| {
                l.split([',', '\t'])
                    .next()
                    .is_some_and(|c| c.trim().eq_ignore_ascii_case("date"))
            })
            .unwrap_or(0);
        let Some(&(header_line, header)) = lines.get(header_at) else {
            return Err(DataError::Parse {
                line: 0,
                message: "no header line".to_string(),
            });
        };

        let delimiter = if header.contains('\t') { '\t' } else { ',' };
        let headers: Vec<String> = header
            .split(delimiter)
            .map(|c| c.trim().to_string())
            .collect();
        if headers.len() < 2 {
            return Err(DataError::Parse {
                line: header_line,
                message: "header needs a time column and at least one value column".to_string(),
            });
        }

        let mut labels = Vec::new();
        let mut columns: Vec<DataColumn> = headers[1..]
            .iter()
            .map(|name| DataColumn {
                name: name.clone(),
                values: Vec::new(),
            })
            .collect();

        for &(line, row) in &lines[header_at + 1..] {
            let cells: Vec<&str> = row.split(delimiter).map(str::trim).collect();
            if cells.len() > headers.len() {
                return Err(DataError::Parse {
                    line,
                    message: format!("{} cells but {} headers", cells.len(), headers.len()),
                });
            }
            labels.push(cells[0].to_string());
            for (j, column) in columns.iter_mut().enumerate() {
                let value = match cells.get(j + 1) {
                    Some(cell) => parse_cell(cell).ok_or_else(|| DataError::Parse {
                        line,
                        message: format!("'{}' is not a number", cell),
                    })?,
                    None => None,
                };
                column.values.push(value);
            }
        }

        Ok(DataTable {
            time_header: headers[0].clone(),
            labels,
            columns,
        })
    }

    /// Parse the JSON form written by `serde_json` for this type.
    pub fn from_json(text: &str) -> Result<Self, DataError> {
        let table: DataTable = serde_json::from_str(text)?;
        if let Some(bad) = table
            .columns
            .iter()
            .find(|c| c.values.len() != table.labels.len())
        {
            return Err(DataError::LengthMismatch {
                labels: table.labels.len(),
                values: bad.values.len(),
            });
        }
        Ok(table)
    }

    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// A column as a series. `None` selects the first value column.
    pub fn series(&self, column: Option<&str>) -> Result<TimeSeries, DataError> {
        let selected = match column {
            Some(name) => self.column(name),
            None => self.columns.first(),
        }
        .ok_or_else(|| DataError::MissingColumn {
            column: column.unwrap_or("<first value column>").to_string(),
        })?;
        TimeSeries::new(
            selected.name.clone(),
            self.labels.clone(),
            selected.values.clone(),
        )
    }
}

fn parse_cell(cell: &str) -> Option<Option<f64>> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") {
        return Some(None);
    }
    cell.parse::<f64>().ok().map(Some)
}

/// Read a table from disk; `.json` files use the JSON form.
pub fn load_table(path: &Path) -> Result<DataTable, DataError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => DataTable::from_json(&text),
        _ => DataTable::parse_delimited(&text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLU: &str = "\
Google Flu Trends - United States
Copyright 2015 Google Inc.

Date,United States,Massachusetts
2003-09-28,1057,212
2003-10-05,1092,NA
2003-10-12,,250
# trailing comment
2003-10-19,1175,271
";

    #[test]
    fn skips_preamble_and_reads_missing() {
        let table = DataTable::parse_delimited(FLU).unwrap();
        assert_eq!(table.time_header, "Date");
        assert_eq!(table.column_names(), vec!["United States", "Massachusetts"]);
        assert_eq!(table.labels.len(), 4);

        let ma = table.series(Some("Massachusetts")).unwrap();
        assert_eq!(ma.values, vec![Some(212.0), None, Some(250.0), Some(271.0)]);
        assert_eq!(ma.n_missing(), 1);

        let us = table.series(None).unwrap();
        assert_eq!(us.name, "United States");
        assert_eq!(us.values[2], None);
    }

    #[test]
    fn tab_delimited_without_date_header() {
        let table = DataTable::parse_delimited("week\tcases\n1\t3.5\n2\t4\n").unwrap();
        assert_eq!(table.time_header, "week");
        assert_eq!(table.series(Some("cases")).unwrap().observed(), vec![3.5, 4.0]);
    }

    #[test]
    fn bad_cell_reports_line() {
        let err = DataTable::parse_delimited("Date,MA\n2003-09-28,12\n2003-10-05,abc\n")
            .unwrap_err();
        assert!(matches!(err, DataError::Parse { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn missing_column_is_error() {
        let table = DataTable::parse_delimited(FLU).unwrap();
        let err = table.series(Some("Texas")).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column } if column == "Texas"));
    }

    #[test]
    fn log_rejects_non_positive() {
        let s = TimeSeries::new(
            "MA",
            vec!["a".into(), "b".into(), "c".into()],
            vec![Some(1.0), None, Some(0.0)],
        )
        .unwrap();
        let err = s.log().unwrap_err();
        assert!(matches!(err, DataError::NonPositive { ref time, .. } if time == "c"));

        let ok = TimeSeries::new("MA", vec!["a".into(), "b".into()], vec![Some(1.0), None])
            .unwrap()
            .log()
            .unwrap();
        assert_eq!(ok.values, vec![Some(0.0), None]);
    }

    #[test]
    fn json_round_trip_through_serde() {
        let table = DataTable::parse_delimited(FLU).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(DataTable::from_json(&json).unwrap(), table);
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flu.csv");
        std::fs::write(&path, FLU).unwrap();
        let table = load_table(&path).unwrap();
        assert_eq!(table.labels[0], "2003-09-28");

        let missing = load_table(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(missing, DataError::Io { .. }));
    }
}
