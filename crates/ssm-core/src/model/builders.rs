//! The random walk and dynamic linear model families.

use ssm_config::{ModelConfig, ModelKind};

use super::{Block, Distribution, Expr, ModelError, ModelSpec, Node, Statement};

const BASE_DATA: [&str; 8] = ["y", "n", "x_ic", "tau_ic", "a_obs", "r_obs", "a_add", "r_add"];

/// Node names a covariate's `beta_<name>` must not collide with.
const RESERVED: [&str; 2] = ["IC", "X"];

fn t() -> Expr {
    Expr::var("t")
}

fn x_prev() -> Expr {
    Expr::at("x", [t() - Expr::int(1)])
}

fn data_model() -> Block {
    Block::new(
        "Data Model",
        vec![Statement::for_loop(
            "t",
            Expr::int(1),
            Expr::var("n"),
            vec![Statement::stochastic(
                Node::indexed("y", [t()]),
                Distribution::normal(Expr::at("x", [t()]), Expr::var("tau_obs")),
            )],
        )],
    )
}

fn state_priors() -> Vec<Statement> {
    vec![
        Statement::stochastic(
            Node::indexed("x", [Expr::int(1)]),
            Distribution::normal(Expr::var("x_ic"), Expr::var("tau_ic")),
        ),
        Statement::stochastic(
            Node::scalar("tau_obs"),
            Distribution::gamma(Expr::var("a_obs"), Expr::var("r_obs")),
        ),
        Statement::stochastic(
            Node::scalar("tau_add"),
            Distribution::gamma(Expr::var("a_add"), Expr::var("r_add")),
        ),
    ]
}

fn base_data() -> Vec<String> {
    BASE_DATA.iter().map(|s| s.to_string()).collect()
}

/// Latent random walk observed with Gaussian noise, fit on the log scale.
///
/// ```text
/// y[t] ~ dnorm(x[t], tau_obs)         t in 1:n
/// x[t] ~ dnorm(x[t-1], tau_add)       t in 2:n
/// x[1] ~ dnorm(x_ic, tau_ic)
/// tau_obs ~ dgamma(a_obs, r_obs)
/// tau_add ~ dgamma(a_add, r_add)
/// ```
pub fn random_walk() -> ModelSpec {
    let process = Block::new(
        "Process Model",
        vec![Statement::for_loop(
            "t",
            Expr::int(2),
            Expr::var("n"),
            vec![Statement::stochastic(
                Node::indexed("x", [t()]),
                Distribution::normal(x_prev(), Expr::var("tau_add")),
            )],
        )],
    );

    ModelSpec {
        name: ModelKind::RandomWalk.as_str().to_string(),
        blocks: vec![data_model(), process, Block::new("Priors", state_priors())],
        data: base_data(),
        monitor: vec!["x".into(), "tau_add".into(), "tau_obs".into()],
    }
}

/// A covariate column of `Xf` and whether it needs an imputation model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Covariate {
    pub name: String,
    pub impute: bool,
}

impl Covariate {
    pub fn new(name: &str, impute: bool) -> Self {
        Covariate {
            name: name.to_string(),
            impute,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicLinearOptions {
    pub covariates: Vec<Covariate>,
    pub intercept: bool,
    pub autoregressive: bool,
    pub beta_precision: f64,
}

impl Default for DynamicLinearOptions {
    fn default() -> Self {
        DynamicLinearOptions {
            covariates: Vec::new(),
            intercept: true,
            autoregressive: true,
            beta_precision: 0.001,
        }
    }
}

/// Random walk plus intercept, density dependence and covariate effects:
///
/// ```text
/// mu[t] <- x[t-1] + beta_IC + beta_X*x[t-1] + beta_k*Xf[t,k] ...
/// x[t] ~ dnorm(mu[t], tau_add)
/// ```
///
/// Covariates flagged for imputation get `Xf[t,k] ~ dnorm(mu_Xf[k], tau_Xf[k])`.
pub fn dynamic_linear(options: &DynamicLinearOptions) -> Result<ModelSpec, ModelError> {
    let mut seen: Vec<&str> = Vec::new();
    for cov in &options.covariates {
        if !ssm_config::validate::is_identifier(&cov.name) {
            return Err(ModelError::InvalidName {
                name: cov.name.clone(),
            });
        }
        if RESERVED.contains(&cov.name.as_str()) {
            return Err(ModelError::ReservedName {
                name: cov.name.clone(),
            });
        }
        if seen.contains(&cov.name.as_str()) {
            return Err(ModelError::DuplicateCovariate {
                name: cov.name.clone(),
            });
        }
        seen.push(&cov.name);
    }

    let mut betas: Vec<String> = Vec::new();
    let mut mu = x_prev();
    if options.intercept {
        mu = mu + Expr::var("beta_IC");
        betas.push("beta_IC".into());
    }
    if options.autoregressive {
        mu = mu + Expr::var("beta_X") * x_prev();
        betas.push("beta_X".into());
    }
    for (k, cov) in options.covariates.iter().enumerate() {
        let beta = format!("beta_{}", cov.name);
        mu = mu + Expr::var(&beta) * Expr::at("Xf", [t(), Expr::int(k as i64 + 1)]);
        betas.push(beta);
    }

    let process = Block::new(
        "Process Model",
        vec![Statement::for_loop(
            "t",
            Expr::int(2),
            Expr::var("n"),
            vec![
                Statement::deterministic(Node::indexed("mu", [t()]), mu),
                Statement::stochastic(
                    Node::indexed("x", [t()]),
                    Distribution::normal(Expr::at("mu", [t()]), Expr::var("tau_add")),
                ),
            ],
        )],
    );

    let mut priors = state_priors();
    for beta in &betas {
        priors.push(Statement::stochastic(
            Node::scalar(beta),
            Distribution::normal(Expr::num(0.0), Expr::num(options.beta_precision)),
        ));
    }

    let mut blocks = vec![data_model(), process, Block::new("Priors", priors)];
    let mut data = base_data();

    if !options.covariates.is_empty() {
        data.push("Xf".into());
    }
    let imputed: Vec<Statement> = options
        .covariates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.impute)
        .map(|(k, _)| {
            let k = Expr::int(k as i64 + 1);
            Statement::for_loop(
                "t",
                Expr::int(1),
                Expr::var("n"),
                vec![Statement::stochastic(
                    Node::indexed("Xf", [t(), k.clone()]),
                    Distribution::normal(
                        Expr::at("mu_Xf", [k.clone()]),
                        Expr::at("tau_Xf", [k]),
                    ),
                )],
            )
        })
        .collect();
    if !imputed.is_empty() {
        blocks.push(Block::new("Missing Covariates", imputed));
        data.extend(["mu_Xf".to_string(), "tau_Xf".to_string()]);
    }

    let mut monitor = vec!["x".to_string(), "tau_add".to_string(), "tau_obs".to_string()];
    monitor.extend(betas);

    Ok(ModelSpec {
        name: ModelKind::DynamicLinear.as_str().to_string(),
        blocks,
        data,
        monitor,
    })
}

/// Build the configured model. `missing` flags which covariates have gaps.
pub fn for_config(
    config: &ModelConfig,
    beta_precision: f64,
    missing: &[bool],
) -> Result<ModelSpec, ModelError> {
    match config.kind {
        ModelKind::RandomWalk => Ok(random_walk()),
        ModelKind::DynamicLinear => {
            let covariates = config
                .covariates
                .iter()
                .enumerate()
                .map(|(k, name)| Covariate::new(name, missing.get(k).copied().unwrap_or(false)))
                .collect();
            dynamic_linear(&DynamicLinearOptions {
                covariates,
                intercept: config.intercept,
                autoregressive: config.autoregressive,
                beta_precision,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlm_monitors_betas() {
        let options = DynamicLinearOptions {
            covariates: vec![Covariate::new("temp", false), Covariate::new("precip", true)],
            ..DynamicLinearOptions::default()
        };
        let model = dynamic_linear(&options).unwrap();
        assert_eq!(
            model.monitored(),
            &["x", "tau_add", "tau_obs", "beta_IC", "beta_X", "beta_temp", "beta_precip"]
        );
        assert!(model.data_names().iter().any(|d| d == "Xf"));
        assert!(model.data_names().iter().any(|d| d == "tau_Xf"));
        assert_eq!(model.blocks.last().unwrap().title, "Missing Covariates");
        assert_eq!(model.blocks.last().unwrap().statements.len(), 1);
    }

    #[test]
    fn dlm_without_covariates_reads_no_xf() {
        let model = dynamic_linear(&DynamicLinearOptions {
            intercept: false,
            ..DynamicLinearOptions::default()
        })
        .unwrap();
        assert!(!model.data_names().iter().any(|d| d == "Xf"));
        assert_eq!(model.monitored().last().unwrap(), "beta_X");
    }

    #[test]
    fn rejects_bad_covariates() {
        let bad = |names: &[&str]| {
            dynamic_linear(&DynamicLinearOptions {
                covariates: names.iter().map(|n| Covariate::new(n, false)).collect(),
                ..DynamicLinearOptions::default()
            })
            .unwrap_err()
        };
        assert!(matches!(bad(&["1temp"]), ModelError::InvalidName { .. }));
        assert!(matches!(bad(&["X"]), ModelError::ReservedName { .. }));
        assert!(matches!(bad(&["a", "a"]), ModelError::DuplicateCovariate { .. }));
    }

    #[test]
    fn config_selects_family() {
        let mut config = ModelConfig::default();
        assert_eq!(for_config(&config, 0.001, &[]).unwrap().name, "random_walk");
        config.kind = ModelKind::DynamicLinear;
        config.covariates = vec!["temp".into()];
        let model = for_config(&config, 0.01, &[true]).unwrap();
        assert_eq!(model.name, "dynamic_linear");
        assert!(model.data_names().iter().any(|d| d == "mu_Xf"));
    }
}
