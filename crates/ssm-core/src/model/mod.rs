//! Typed model descriptions for the external sampler.
//!
//! A model is a tree of blocks and statements built in Rust and only turned
//! into JAGS text by [`render`]. Builders for the two supported model families
//! live in [`builders`].

pub mod builders;
pub mod render;

pub use builders::{dynamic_linear, for_config, random_walk, Covariate, DynamicLinearOptions};
pub use render::render;

use serde::Serialize;
use std::ops::{Add, Div, Mul, Sub};
use thiserror::Error;

/// Errors from building a model description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("'{name}' is not a valid node name")]
    InvalidName { name: String },

    #[error("covariate '{name}' appears more than once")]
    DuplicateCovariate { name: String },

    #[error("covariate '{name}' clashes with a model node")]
    ReservedName { name: String },

    #[error("model reads '{name}' but the fit data does not provide it")]
    MissingData { name: String },
}

impl From<ModelError> for ssm_common::Error {
    fn from(err: ModelError) -> Self {
        ssm_common::Error::Model(err.to_string())
    }
}

/// A complete model: titled blocks plus the data it reads and the nodes to
/// record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSpec {
    pub name: String,
    pub blocks: Vec<Block>,
    pub data: Vec<String>,
    pub monitor: Vec<String>,
}

impl ModelSpec {
    /// Variables the sampler should record.
    pub fn monitored(&self) -> &[String] {
        &self.monitor
    }

    /// Names the model expects in the data file.
    pub fn data_names(&self) -> &[String] {
        &self.data
    }

    /// Fail if any data name the model reads is absent from `provided`.
    pub fn check_data<S: AsRef<str>>(&self, provided: &[S]) -> Result<(), ModelError> {
        match self
            .data
            .iter()
            .find(|name| !provided.iter().any(|p| p.as_ref() == name.as_str()))
        {
            Some(name) => Err(ModelError::MissingData { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// Every stochastic node name, in order of first appearance.
    pub fn stochastic_nodes(&self) -> Vec<&str> {
        fn walk<'a>(statements: &'a [Statement], out: &mut Vec<&'a str>) {
            for s in statements {
                match s {
                    Statement::Stochastic { node, .. } => {
                        if !out.contains(&node.name.as_str()) {
                            out.push(&node.name);
                        }
                    }
                    Statement::For { body, .. } => walk(body, out),
                    Statement::Deterministic { .. } => {}
                }
            }
        }
        let mut out = Vec::new();
        for block in &self.blocks {
            walk(&block.statements, &mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub title: String,
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(title: impl Into<String>, statements: Vec<Statement>) -> Self {
        Block {
            title: title.into(),
            statements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `node ~ dist`
    Stochastic { node: Node, dist: Distribution },
    /// `node <- expr`
    Deterministic { node: Node, expr: Expr },
    /// `for(var in from:to) { body }`
    For {
        var: String,
        from: Expr,
        to: Expr,
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn stochastic(node: Node, dist: Distribution) -> Self {
        Statement::Stochastic { node, dist }
    }

    pub fn deterministic(node: Node, expr: Expr) -> Self {
        Statement::Deterministic { node, expr }
    }

    pub fn for_loop(var: &str, from: Expr, to: Expr, body: Vec<Statement>) -> Self {
        Statement::For {
            var: var.to_string(),
            from,
            to,
            body,
        }
    }
}

/// A (possibly indexed) variable reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub index: Vec<Expr>,
}

impl Node {
    pub fn scalar(name: &str) -> Self {
        Node {
            name: name.to_string(),
            index: Vec::new(),
        }
    }

    pub fn indexed(name: &str, index: impl IntoIterator<Item = Expr>) -> Self {
        Node {
            name: name.to_string(),
            index: index.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Num { value: f64 },
    Int { value: i64 },
    Node { node: Node },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn num(value: f64) -> Self {
        Expr::Num { value }
    }

    pub fn int(value: i64) -> Self {
        Expr::Int { value }
    }

    /// Unindexed variable: a loop counter, scalar data or scalar parameter.
    pub fn var(name: &str) -> Self {
        Expr::Node {
            node: Node::scalar(name),
        }
    }

    pub fn at(name: &str, index: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Node {
            node: Node::indexed(name, index),
        }
    }

    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            _ => u8::MAX,
        }
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Div, self, rhs)
    }
}

/// Distributions in the sampler's parameterization (normal by precision,
/// gamma by shape and rate).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Distribution {
    Normal { mean: Expr, precision: Expr },
    Gamma { shape: Expr, rate: Expr },
    Uniform { lower: Expr, upper: Expr },
}

impl Distribution {
    pub fn normal(mean: Expr, precision: Expr) -> Self {
        Distribution::Normal { mean, precision }
    }

    pub fn gamma(shape: Expr, rate: Expr) -> Self {
        Distribution::Gamma { shape, rate }
    }

    pub fn uniform(lower: Expr, upper: Expr) -> Self {
        Distribution::Uniform { lower, upper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_walk_structure() {
        let model = random_walk();
        assert_eq!(model.blocks.len(), 3);
        assert_eq!(model.stochastic_nodes(), vec!["y", "x", "tau_obs", "tau_add"]);
        assert_eq!(model.monitored(), &["x", "tau_add", "tau_obs"]);
        assert!(model.data_names().iter().any(|d| d == "x_ic"));
    }

    #[test]
    fn check_data_names_missing() {
        let model = random_walk();
        let err = model.check_data(&["y", "n"]).unwrap_err();
        assert!(matches!(err, ModelError::MissingData { .. }));
        let all: Vec<&str> = model.data_names().iter().map(String::as_str).collect();
        assert!(model.check_data(&all).is_ok());
    }

    #[test]
    fn operators_build_binary_nodes() {
        let e = Expr::var("t") - Expr::int(1);
        assert!(matches!(e, Expr::Binary { op: BinOp::Sub, .. }));
    }
}
