//! Markdown tables and one-line status for fit results.

use std::fmt::Write;

use crate::pipeline::FitSummary;
use crate::summary::{HeldOutReport, ModelComparison, ScalarSummary};

fn num(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else if v != 0.0 && (v.abs() >= 1e5 || v.abs() < 1e-3) {
        format!("{v:.3e}")
    } else {
        format!("{v:.3}")
    }
}

fn pct(p: f64) -> String {
    format!("{}%", num(p * 100.0).trim_end_matches('0').trim_end_matches('.'))
}

/// Full report: band, parameters, diagnostics, held-out table.
pub fn fit_markdown(summary: &FitSummary) -> String {
    let mut out = String::new();
    let probs = summary.band.probs;
    let _ = writeln!(out, "# {} fit `{}`", summary.model, summary.fit_id);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} chains, {} draws. Band over `{}` on the {} scale.",
        summary.n_chains,
        summary.n_draws,
        summary.state_group,
        summary.band.transform
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Credible band");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| time | {} | median | {} |",
        pct(probs.lower()),
        pct(probs.upper())
    );
    let _ = writeln!(out, "|---|---:|---:|---:|");
    if summary.timeline.is_empty() {
        for (i, p) in summary.band.points().enumerate() {
            let _ = writeln!(out, "| {} | {} | {} | {} |", i + 1, num(p.lower), num(p.median), num(p.upper));
        }
    } else {
        for p in &summary.timeline {
            let _ = writeln!(out, "| {} | {} | {} | {} |", p.time, num(p.lower), num(p.median), num(p.upper));
        }
    }

    if !summary.params.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Parameters");
        let _ = writeln!(out);
        params_table(&mut out, summary.params.iter().chain(&summary.std_devs));
    }

    if let Some(corr) = &summary.correlation {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Correlation");
        let _ = writeln!(out);
        let _ = writeln!(out, "| | {} |", corr.names.join(" | "));
        let _ = writeln!(out, "|---|{}", "---:|".repeat(corr.names.len()));
        for (name, row) in corr.names.iter().zip(&corr.values) {
            let cells: Vec<String> = row.iter().map(|v| num(*v)).collect();
            let _ = writeln!(out, "| {} | {} |", name, cells.join(" | "));
        }
    }

    let d = &summary.diagnostics;
    let _ = writeln!(out);
    let _ = writeln!(out, "## Diagnostics: {}", d.status);
    let _ = writeln!(out);
    if d.enabled {
        let _ = writeln!(out, "max R-hat {}, min ESS {}", num(d.max_r_hat), num(d.min_ess));
    }
    for line in d.failures.iter().map(|f| ("fail", f)).chain(d.warnings.iter().map(|w| ("warn", w))) {
        let _ = writeln!(out, "- {}: {}", line.0, line.1);
    }

    if let Some(report) = &summary.held_out {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Held-out");
        let _ = writeln!(out);
        held_out_table(&mut out, report);
    }
    out
}

fn params_table<'a>(out: &mut String, params: impl Iterator<Item = &'a ScalarSummary>) {
    let _ = writeln!(out, "| parameter | scale | mean | sd | lower | median | upper |");
    let _ = writeln!(out, "|---|---|---:|---:|---:|---:|---:|");
    for p in params {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            p.name,
            p.transform,
            num(p.mean),
            num(p.sd),
            num(p.lower),
            num(p.median),
            num(p.upper)
        );
    }
}

fn held_out_table(out: &mut String, report: &HeldOutReport) {
    let _ = writeln!(out, "| time | observed | median | lower | upper | residual | within |");
    let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|:---:|");
    for r in &report.rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            r.time,
            num(r.observed),
            num(r.median),
            num(r.lower),
            num(r.upper),
            num(r.residual),
            if r.within { "yes" } else { "no" }
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "coverage {}, MAE {}, RMSE {}, mean width {} over {} points",
        num(report.coverage),
        num(report.mae),
        num(report.rmse),
        num(report.mean_width),
        report.n_points
    );
    if !report.skipped.is_empty() {
        let _ = writeln!(out, "skipped (no observed value): {:?}", report.skipped);
    }
}

/// Side-by-side held-out metrics, best RMSE first.
pub fn comparison_markdown(comparison: &ModelComparison) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "| model | points | coverage | MAE | RMSE | mean width |");
    let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|");
    for name in comparison.ranked_by_rmse() {
        if let Some(m) = comparison.models.iter().find(|m| m.model == name) {
            let r = &m.report;
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                m.model,
                r.n_points,
                num(r.coverage),
                num(r.mae),
                num(r.rmse),
                num(r.mean_width)
            );
        }
    }
    out
}

/// `[fit-id] model: n=.. status=.. coverage=..`
pub fn summary_line(summary: &FitSummary) -> String {
    let mut line = format!(
        "[{}] {}: n={} draws={} diagnostics={}",
        summary.fit_id,
        summary.model,
        summary.band.len(),
        summary.n_draws,
        summary.diagnostics.status
    );
    if let Some(report) = &summary.held_out {
        let _ = write!(
            line,
            " held_out={} coverage={} rmse={}",
            report.n_points,
            num(report.coverage),
            num(report.rmse)
        );
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting() {
        assert_eq!(num(f64::NAN), "NA");
        assert_eq!(num(0.0), "0.000");
        assert_eq!(num(212.34567), "212.346");
        assert_eq!(num(0.0001), "1.000e-4");
        assert_eq!(pct(0.025), "2.5%");
        assert_eq!(pct(0.975), "97.5%");
        assert_eq!(pct(0.5), "50%");
    }
}
