//! Sampler data: observations, covariates and prior hyperparameters.

use serde::Serialize;
use ssm_config::StatePriors;
use ssm_math::Moments;

use super::rdump::RDump;
use super::series::{DataTable, TimeSeries};
use super::DataError;

/// Covariates as an `n x k` matrix, one column per covariate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovariateMatrix {
    names: Vec<String>,
    rows: usize,
    columns: Vec<Vec<Option<f64>>>,
}

impl CovariateMatrix {
    /// Select named columns from a table.
    pub fn from_table<S: AsRef<str>>(table: &DataTable, names: &[S]) -> Result<Self, DataError> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let column = table
                .column(name.as_ref())
                .ok_or_else(|| DataError::MissingColumn {
                    column: name.as_ref().to_string(),
                })?;
            columns.push(column.values.clone());
        }
        Ok(CovariateMatrix {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            rows: table.labels.len(),
            columns,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Which covariates have missing entries and so need an imputation model.
    pub fn missing_flags(&self) -> Vec<bool> {
        self.columns
            .iter()
            .map(|c| c.iter().any(Option::is_none))
            .collect()
    }

    /// Mean and precision of each covariate's observed values, used as the
    /// imputation prior. Fewer than two observations or zero variance fall
    /// back to mean 0 and precision 1.
    pub fn imputation_priors(&self) -> (Vec<f64>, Vec<f64>) {
        self.columns
            .iter()
            .map(|c| {
                let observed: Vec<f64> = c.iter().flatten().copied().collect();
                let m = Moments::of(&observed);
                if m.n < 2 || m.variance.is_nan() || m.variance <= 0.0 {
                    (0.0, 1.0)
                } else {
                    (m.mean, 1.0 / m.variance)
                }
            })
            .unzip()
    }

    fn column_major(&self) -> Vec<Option<f64>> {
        self.columns.iter().flatten().copied().collect()
    }
}

/// Everything the model reads as data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitData {
    pub y: Vec<Option<f64>>,
    pub priors: StatePriors,
    pub covariates: Option<CovariateMatrix>,
}

impl FitData {
    pub fn new(series: &TimeSeries, priors: &StatePriors) -> Self {
        FitData {
            y: series.values.clone(),
            priors: priors.clone(),
            covariates: None,
        }
    }

    pub fn with_covariates(mut self, covariates: CovariateMatrix) -> Result<Self, DataError> {
        if covariates.rows() != self.y.len() {
            return Err(DataError::LengthMismatch {
                labels: self.y.len(),
                values: covariates.rows(),
            });
        }
        self.covariates = Some(covariates).filter(|c| !c.is_empty());
        Ok(self)
    }

    pub fn n(&self) -> usize {
        self.y.len()
    }

    /// Names of the data nodes written by [`FitData::to_rdump`].
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = vec!["y", "n", "x_ic", "tau_ic", "a_obs", "r_obs", "a_add", "r_add"];
        if let Some(cov) = &self.covariates {
            names.push("Xf");
            if cov.missing_flags().iter().any(|&m| m) {
                names.extend(["mu_Xf", "tau_Xf"]);
            }
        }
        names
    }

    pub fn to_rdump(&self) -> String {
        let p = &self.priors;
        let mut dump = RDump::new()
            .vector("y", &self.y)
            .integer("n", self.n() as u64)
            .scalar("x_ic", p.x_ic)
            .scalar("tau_ic", p.tau_ic)
            .scalar("a_obs", p.a_obs)
            .scalar("r_obs", p.r_obs)
            .scalar("a_add", p.a_add)
            .scalar("r_add", p.r_add);

        if let Some(cov) = &self.covariates {
            dump = dump.matrix("Xf", cov.rows(), &cov.column_major());
            if cov.missing_flags().iter().any(|&m| m) {
                let (mu, tau) = cov.imputation_priors();
                let mu: Vec<Option<f64>> = mu.into_iter().map(Some).collect();
                let tau: Vec<Option<f64>> = tau.into_iter().map(Some).collect();
                dump = dump.vector("mu_Xf", &mu).vector("tau_Xf", &tau);
            }
        }
        dump.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::parse_delimited("Date,MA,temp,precip\nw1,1,10,0\nw2,2,,1\nw3,3,14,2\n").unwrap()
    }

    #[test]
    fn random_walk_data() {
        let series = table().series(Some("MA")).unwrap().log().unwrap();
        let data = FitData::new(&series, &StatePriors::default());
        assert_eq!(data.n(), 3);
        let dump = data.to_rdump();
        assert!(dump.starts_with("\"y\" <- c(0.0, "));
        assert!(dump.contains("\"n\" <- 3\n"));
        assert!(dump.contains("\"tau_ic\" <- 100.0\n"));
        assert!(!dump.contains("Xf"));
        assert_eq!(data.names().len(), 8);
    }

    #[test]
    fn covariates_with_missing_get_imputation_priors() {
        let t = table();
        let series = t.series(Some("MA")).unwrap();
        let cov = CovariateMatrix::from_table(&t, &["temp", "precip"]).unwrap();
        assert_eq!(cov.missing_flags(), vec![true, false]);
        let (mu, tau) = cov.imputation_priors();
        assert_eq!(mu, vec![12.0, 1.0]);
        assert_eq!(tau, vec![1.0 / 8.0, 1.0]);

        let data = FitData::new(&series, &StatePriors::default())
            .with_covariates(cov)
            .unwrap();
        let dump = data.to_rdump();
        assert!(dump.contains(
            "\"Xf\" <- structure(c(10.0, NA, 14.0, 0.0, 1.0, 2.0), .Dim = c(3, 2))"
        ));
        assert!(dump.contains("\"mu_Xf\" <- c(12.0, 1.0)"));
        assert!(data.names().contains(&"tau_Xf"));
    }

    #[test]
    fn unknown_covariate() {
        let err = CovariateMatrix::from_table(&table(), &["humidity"]).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }
}
