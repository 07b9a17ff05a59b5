//! End-to-end fit: series in, bands and held-out tables out.
//!
//! [`prepare`] turns a table and a configuration into everything the sampler
//! needs. [`summarize`] turns a sample matrix into the report. [`run_fit`]
//! connects the two through a [`Sampler`]. Each step is usable on its own;
//! the `summarize` command replays CODA files straight into [`summarize`].

use serde::Serialize;
use ssm_common::{Error, FitId, Result};
use ssm_config::{validate_fit_config, BandSettings, DiagnosticThresholds, FitConfig, ModelKind};

use crate::config::ConfigError;
use crate::data::{CovariateMatrix, DataTable, FitData, HeldOutMask, HeldOutTruth, TimeSeries};
use crate::diagnostics::{diagnose, DiagnosticsReport};
use crate::inits::{bootstrap_inits, ChainInits};
use crate::logging::{event_names, LogContext, Stage};
use crate::model::{for_config, render, ModelSpec};
use crate::samples::{ColumnName, PosteriorSamples, SampleError};
use crate::sampler::{SampleRequest, Sampler};
use crate::summary::{
    align_to_time, compare_bands, correlation_matrix, credible_band, extract_group,
    summarize_scalar, BandProbs, CorrelationMatrix, CredibleBand, HeldOutReport, ScalarSummary,
    TimedBandPoint, Transform,
};

/// Sampler inputs for one fit, plus the withheld truth kept aside.
#[derive(Debug, Clone)]
pub struct PreparedFit {
    /// The selected series as read, before masking or transforms.
    pub series: TimeSeries,
    /// The series handed to the sampler: held-out values blanked, log scale
    /// when configured.
    pub fitting: TimeSeries,
    pub mask: HeldOutMask,
    pub truth: HeldOutTruth,
    pub data: FitData,
    pub model: ModelSpec,
    pub inits: Vec<ChainInits>,
}

impl PreparedFit {
    pub fn labels(&self) -> &[String] {
        &self.series.labels
    }
}

/// Build sampler inputs from a table.
///
/// The configuration is validated first, so a band transform that does not
/// match the fitting scale never reaches the sampler.
pub fn prepare(config: &FitConfig, table: &DataTable) -> Result<PreparedFit> {
    validate_fit_config(config).map_err(|source| ConfigError::Invalid { path: None, source })?;
    let series = table.series(config.data.column.as_deref())?;
    let mask = HeldOutMask::from_settings(&config.hold_out, series.len())?;
    let (masked, truth) = mask.apply(&series)?;
    let fitting = if config.data.log_transform {
        masked.log()?
    } else {
        masked
    };

    let mut data = FitData::new(&fitting, &config.priors);
    let mut missing = Vec::new();
    if config.model.kind == ModelKind::DynamicLinear && !config.model.covariates.is_empty() {
        let covariates = CovariateMatrix::from_table(table, &config.model.covariates)?;
        missing = covariates.missing_flags();
        data = data.with_covariates(covariates)?;
    }

    let model = for_config(&config.model, config.priors.beta_precision, &missing)?;
    model.check_data(&data.names())?;

    let inits = bootstrap_inits(&fitting.observed(), config.sampler.n_chains, config.sampler.seed)?;

    Ok(PreparedFit {
        series,
        fitting,
        mask,
        truth,
        data,
        model,
        inits,
    })
}

/// How to summarize a sample matrix.
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub state_group: String,
    pub probs: (f64, f64),
    pub transform: Transform,
    pub thresholds: DiagnosticThresholds,
}

impl SummaryOptions {
    pub fn from_config(bands: &BandSettings, thresholds: &DiagnosticThresholds) -> Self {
        SummaryOptions {
            state_group: bands.state_group.clone(),
            probs: (bands.lower, bands.upper),
            transform: bands.transform.into(),
            thresholds: thresholds.clone(),
        }
    }
}

impl Default for SummaryOptions {
    fn default() -> Self {
        let probs = BandProbs::default();
        SummaryOptions {
            state_group: "x".to_string(),
            probs: (probs.lower(), probs.upper()),
            transform: Transform::Identity,
            thresholds: DiagnosticThresholds::default(),
        }
    }
}

/// Everything reported about one fit.
#[derive(Debug, Clone, Serialize)]
pub struct FitSummary {
    pub fit_id: FitId,
    pub model: String,
    pub n_chains: usize,
    pub n_draws: usize,
    pub state_group: String,
    pub band: CredibleBand,
    /// The band with time labels; empty when no time index was supplied.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<TimedBandPoint>,
    /// Scalar parameters on the sampled scale.
    pub params: Vec<ScalarSummary>,
    /// Precisions (`tau_*`) as standard deviations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub std_devs: Vec<ScalarSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationMatrix>,
    pub diagnostics: DiagnosticsReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub held_out: Option<HeldOutReport>,
}

/// Summarize a posterior sample matrix.
///
/// `labels`, when given, must match the state group length exactly, and the
/// group must then have no gaps in its indices.
/// `held_out` adds the comparison table; its positions index the band.
pub fn summarize(
    samples: &PosteriorSamples,
    model: &str,
    options: &SummaryOptions,
    labels: Option<&[String]>,
    held_out: Option<(&HeldOutTruth, &HeldOutMask)>,
) -> Result<FitSummary> {
    let group = extract_group(samples, &options.state_group)?;
    if let (Some(_), Some(missing)) = (labels, group.missing_index()) {
        return Err(SampleError::NonContiguousGroup {
            group: options.state_group.clone(),
            missing,
        }
        .into());
    }
    let band = credible_band(group.columns(), options.probs, options.transform)?;
    let timeline = match labels {
        Some(labels) => align_to_time(&band, labels)?,
        None => Vec::new(),
    };

    let scalars: Vec<&str> = samples
        .ungrouped_names()
        .into_iter()
        .filter(|n| ColumnName::parse(n).is_scalar())
        .collect();
    let params = scalars
        .iter()
        .map(|name| summarize_scalar(samples, name, options.probs, Transform::Identity))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let std_devs = scalars
        .iter()
        .filter(|name| name.starts_with("tau_"))
        .map(|name| summarize_scalar(samples, name, options.probs, Transform::PrecisionToSd))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let correlation = if scalars.len() >= 2 {
        Some(correlation_matrix(samples, &scalars)?)
    } else {
        None
    };

    let diagnostics = diagnose(samples, &options.thresholds);
    let held_out = match held_out {
        Some((truth, mask)) if !mask.is_empty() => Some(compare_bands(&band, truth, mask)?),
        _ => None,
    };

    Ok(FitSummary {
        fit_id: FitId::new(),
        model: model.to_string(),
        n_chains: samples.n_chains(),
        n_draws: samples.n_draws(),
        state_group: options.state_group.clone(),
        band,
        timeline,
        params,
        std_devs,
        correlation,
        diagnostics,
        held_out,
    })
}

/// Prepare, sample, and summarize one fit.
pub fn run_fit(
    config: &FitConfig,
    table: &DataTable,
    sampler: &dyn Sampler,
    ctx: &LogContext,
) -> Result<FitSummary> {
    let fit_id = FitId::new();
    let ctx = &ctx.clone().with_fit_id(fit_id.to_string());
    let prepared = prepare(config, table)?;
    crate::log_event!(
        ctx,
        INFO,
        event_names::DATA_LOADED,
        Stage::Load,
        "series prepared",
        series = prepared.series.name.as_str(),
        n = prepared.series.len(),
        missing = prepared.fitting.n_missing(),
        held_out = prepared.mask.len()
    );
    crate::log_event!(
        ctx,
        DEBUG,
        event_names::MODEL_RENDERED,
        Stage::Model,
        "model assembled",
        model = config.model.kind.as_str(),
        text_len = render(&prepared.model).len()
    );

    let request = SampleRequest {
        model: &prepared.model,
        data: &prepared.data,
        inits: &prepared.inits,
        n_adapt: config.sampler.n_adapt,
        burn_in: config.sampler.burn_in,
        n_iter: config.sampler.n_iter,
        thin: config.sampler.thin,
    };
    crate::log_event!(
        ctx,
        INFO,
        event_names::SAMPLE_STARTED,
        Stage::Sample,
        "sampling",
        sampler = sampler.name(),
        n_chains = request.n_chains(),
        n_iter = config.sampler.n_iter
    );
    let samples = sampler.run(&request).map_err(Error::from)?;
    crate::log_event!(
        ctx,
        INFO,
        event_names::SAMPLE_FINISHED,
        Stage::Sample,
        "sampler finished",
        n_chains = samples.n_chains(),
        n_draws = samples.n_draws(),
        n_columns = samples.n_columns()
    );

    let options = SummaryOptions::from_config(&config.bands, &config.sampler.diagnostics);
    let mut summary = summarize(
        &samples,
        config.model.kind.as_str(),
        &options,
        Some(prepared.labels()),
        Some((&prepared.truth, &prepared.mask)),
    )?;
    summary.fit_id = fit_id;
    log_summary(ctx, &summary);
    Ok(summary)
}

/// Emit the band, diagnostics and comparison events for a finished summary.
pub fn log_summary(ctx: &LogContext, summary: &FitSummary) {
    crate::log_event!(
        ctx,
        INFO,
        event_names::SUMMARY_BAND,
        Stage::Summarize,
        "credible band computed",
        group = summary.state_group.as_str(),
        len = summary.band.len(),
        transform = summary.band.transform.name()
    );
    let diagnostics = &summary.diagnostics;
    match diagnostics.status {
        crate::diagnostics::QualityStatus::Ok => crate::log_event!(
            ctx,
            INFO,
            event_names::DIAGNOSTICS_STATUS,
            Stage::Summarize,
            "diagnostics ok",
            enabled = diagnostics.enabled,
            max_r_hat = diagnostics.max_r_hat,
            min_ess = diagnostics.min_ess
        ),
        status => {
            let status = status.to_string();
            crate::log_event!(
                ctx,
                WARN,
                event_names::DIAGNOSTICS_STATUS,
                Stage::Summarize,
                "convergence diagnostics flagged parameters",
                status = status.as_str(),
                max_r_hat = diagnostics.max_r_hat,
                min_ess = diagnostics.min_ess,
                flagged = diagnostics.warnings.len() + diagnostics.failures.len()
            )
        }
    }
    if let Some(report) = &summary.held_out {
        crate::log_event!(
            ctx,
            INFO,
            event_names::COMPARE_FINISHED,
            Stage::Compare,
            "held-out comparison",
            n_points = report.n_points,
            coverage = report.coverage,
            rmse = report.rmse
        );
    }
}
