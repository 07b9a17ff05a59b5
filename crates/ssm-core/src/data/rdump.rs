//! Writer for the R dump format JAGS reads data and initial values from.
//!
//! ```text
//! "n" <- 52
//! "y" <- c(5.35, NA, 5.52)
//! "Xf" <- structure(c(1.0, 2.0, 3.0, 4.0), .Dim = c(2, 2))
//! ".RNG.name" <- "base::Mersenne-Twister"
//! ```

use std::fmt::Write as _;

/// Accumulates `"name" <- value` lines.
#[derive(Debug, Default, Clone)]
pub struct RDump {
    out: String,
}

impl RDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, name: &str, value: f64) -> Self {
        let _ = writeln!(self.out, "\"{}\" <- {}", name, number(Some(value)));
        self
    }

    pub fn integer(mut self, name: &str, value: u64) -> Self {
        let _ = writeln!(self.out, "\"{}\" <- {}", name, value);
        self
    }

    pub fn string(mut self, name: &str, value: &str) -> Self {
        let _ = writeln!(self.out, "\"{}\" <- \"{}\"", name, value.replace('"', "\\\""));
        self
    }

    /// Vector with `NA` for missing entries.
    pub fn vector(mut self, name: &str, values: &[Option<f64>]) -> Self {
        let _ = writeln!(self.out, "\"{}\" <- c({})", name, joined(values));
        self
    }

    /// Matrix with `rows` rows from column-major `values`.
    pub fn matrix(mut self, name: &str, rows: usize, values: &[Option<f64>]) -> Self {
        let cols = if rows == 0 { 0 } else { values.len() / rows };
        let _ = writeln!(
            self.out,
            "\"{}\" <- structure(c({}), .Dim = c({}, {}))",
            name,
            joined(values),
            rows,
            cols
        );
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn joined(values: &[Option<f64>]) -> String {
    values
        .iter()
        .map(|v| number(*v))
        .collect::<Vec<_>>()
        .join(", ")
}

// Debug formatting round-trips and switches to exponent notation for very
// large or small magnitudes, both of which R parses.
fn number(value: Option<f64>) -> String {
    match value {
        None => "NA".to_string(),
        Some(x) if x.is_nan() => "NaN".to_string(),
        Some(x) if x == f64::INFINITY => "Inf".to_string(),
        Some(x) if x == f64::NEG_INFINITY => "-Inf".to_string(),
        Some(x) => format!("{:?}", x),
    }
}
