//! JAGS text for a [`ModelSpec`].

use std::fmt::Write as _;

use super::{Distribution, Expr, ModelSpec, Node, Statement};

const INDENT: &str = "  ";

/// Render `model` in the BUGS/JAGS model language.
pub fn render(model: &ModelSpec) -> String {
    let mut out = String::from("model{\n");
    for block in &model.blocks {
        let _ = writeln!(out, "\n{INDENT}#### {}", block.title);
        for statement in &block.statements {
            statement_into(&mut out, statement, 1);
        }
    }
    out.push_str("}\n");
    out
}

fn statement_into(out: &mut String, statement: &Statement, depth: usize) {
    let pad = INDENT.repeat(depth);
    match statement {
        Statement::Stochastic { node, dist } => {
            let _ = writeln!(out, "{pad}{} ~ {}", node_text(node), dist_text(dist));
        }
        Statement::Deterministic { node, expr } => {
            let _ = writeln!(out, "{pad}{} <- {}", node_text(node), expr_text(expr));
        }
        Statement::For {
            var,
            from,
            to,
            body,
        } => {
            let _ = writeln!(out, "{pad}for({var} in {}:{}){{", expr_text(from), expr_text(to));
            for inner in body {
                statement_into(out, inner, depth + 1);
            }
            let _ = writeln!(out, "{pad}}}");
        }
    }
}

fn dist_text(dist: &Distribution) -> String {
    let (name, a, b) = match dist {
        Distribution::Normal { mean, precision } => ("dnorm", mean, precision),
        Distribution::Gamma { shape, rate } => ("dgamma", shape, rate),
        Distribution::Uniform { lower, upper } => ("dunif", lower, upper),
    };
    format!("{name}({},{})", expr_text(a), expr_text(b))
}

fn node_text(node: &Node) -> String {
    if node.index.is_empty() {
        return node.name.clone();
    }
    let index: Vec<String> = node.index.iter().map(expr_text).collect();
    format!("{}[{}]", node.name, index.join(","))
}

/// Render an expression with the fewest parentheses that keep its meaning.
pub fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Num { value } => number(*value),
        Expr::Int { value } => value.to_string(),
        Expr::Node { node } => node_text(node),
        Expr::Binary { op, lhs, rhs } => {
            let prec = op.precedence();
            let left = operand(lhs, lhs.precedence() < prec);
            // a - (b + c) and a / (b * c) need the parentheses; a + (b + c) does not.
            let right_needs = rhs.precedence() < prec
                || (rhs.precedence() == prec && matches!(op, super::BinOp::Sub | super::BinOp::Div));
            let right = operand(rhs, right_needs);
            if prec == 1 {
                format!("{left} {} {right}", op.symbol())
            } else {
                format!("{left}{}{right}", op.symbol())
            }
        }
    }
}

fn operand(expr: &Expr, parenthesize: bool) -> String {
    let text = expr_text(expr);
    if parenthesize {
        format!("({text})")
    } else {
        text
    }
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:?}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{dynamic_linear, random_walk, Covariate, DynamicLinearOptions};
    use super::*;

    #[test]
    fn random_walk_text() {
        let text = render(&random_walk());
        let expected = "\
model{

  #### Data Model
  for(t in 1:n){
    y[t] ~ dnorm(x[t],tau_obs)
  }

  #### Process Model
  for(t in 2:n){
    x[t] ~ dnorm(x[t - 1],tau_add)
  }

  #### Priors
  x[1] ~ dnorm(x_ic,tau_ic)
  tau_obs ~ dgamma(a_obs,r_obs)
  tau_add ~ dgamma(a_add,r_add)
}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn dynamic_linear_text() {
        let options = DynamicLinearOptions {
            covariates: vec![Covariate::new("temp", true)],
            ..DynamicLinearOptions::default()
        };
        let text = render(&dynamic_linear(&options).unwrap());
        assert!(text.contains(
            "    mu[t] <- x[t - 1] + beta_IC + beta_X*x[t - 1] + beta_temp*Xf[t,1]\n"
        ));
        assert!(text.contains("    x[t] ~ dnorm(mu[t],tau_add)\n"));
        assert!(text.contains("  beta_temp ~ dnorm(0,0.001)\n"));
        assert!(text.contains("    Xf[t,1] ~ dnorm(mu_Xf[1],tau_Xf[1])\n"));
    }

    #[test]
    fn parentheses_only_where_needed() {
        let a = || Expr::var("a");
        let b = || Expr::var("b");
        let c = || Expr::var("c");
        assert_eq!(expr_text(&(a() - (b() + c()))), "a - (b + c)");
        assert_eq!(expr_text(&((a() + b()) + c())), "a + b + c");
        assert_eq!(expr_text(&((a() + b()) * c())), "(a + b)*c");
        assert_eq!(expr_text(&(a() / (b() * c()))), "a/(b*c)");
        assert_eq!(expr_text(&Expr::num(0.5)), "0.5");
        assert_eq!(expr_text(&Expr::num(2.0)), "2");
    }

    #[test]
    fn rendering_is_deterministic() {
        let model = random_walk();
        assert_eq!(render(&model), render(&model.clone()));
    }
}
