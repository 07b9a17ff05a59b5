//! ssm-core command-line entry point.
//!
//! Subcommands:
//! - `fit`: hold out, sample with JAGS, summarize
//! - `summarize`: replay existing CODA output into bands and held-out tables
//! - `model render` / `inits`: inspect sampler inputs without running anything
//! - `check` / `config`: validate the environment and configuration

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use ssm_common::{Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use ssm_config::{validate_fit_config, BandTransform, HoldOutSettings, ModelKind};
use ssm_core::config::{load_config, ConfigError, ConfigOptions, FitConfig, ResolvedConfig};
use ssm_core::data::{load_table, HeldOutMask, HeldOutTruth};
use ssm_core::diagnostics::QualityStatus;
use ssm_core::exit_codes::ExitCode;
use ssm_core::inits::bootstrap_inits;
use ssm_core::log_event;
use ssm_core::logging::{
    event_names, generate_run_id, get_host_id, init_logging, LogConfig, LogContext, LogFormat,
    LogLevel, Stage,
};
use ssm_core::model::{for_config, render};
use ssm_core::output::{comparison_markdown, envelope, fit_markdown, summary_line, to_pretty};
use ssm_core::pipeline::{log_summary, run_fit, summarize, FitSummary, SummaryOptions};
use ssm_core::sampler::{CodaReplay, JagsSampler};
use ssm_core::summary::{compare_models, ModelComparison, Transform};
use std::path::PathBuf;

/// State-space posterior bands: fit with JAGS, summarize, compare held-out forecasts
#[derive(Parser)]
#[command(name = "ssm-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Fit configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in configuration preset (teaching, quick, thorough)
    #[arg(long, global = true)]
    preset: Option<String>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model with JAGS and summarize the posterior
    Fit(FitArgs),

    /// Summarize existing CODA output
    Summarize(SummarizeArgs),

    /// Model description commands
    Model(ModelArgs),

    /// Draw bootstrap initial values for each chain
    Inits(InitsArgs),

    /// Validate configuration, data and the sampler installation
    Check(CheckArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct DataArgs {
    /// Value column by header name (default: second column)
    #[arg(long)]
    column: Option<String>,

    /// Fit on the original scale instead of the log scale
    #[arg(long)]
    no_log: bool,
}

#[derive(Args, Debug)]
struct HoldOutArgs {
    /// Withhold the last N observations
    #[arg(long)]
    hold_out_last: Option<usize>,

    /// Withhold these 0-based positions
    #[arg(long = "hold-out", value_delimiter = ',')]
    hold_out: Vec<usize>,
}

impl HoldOutArgs {
    fn settings(&self) -> Option<HoldOutSettings> {
        if self.hold_out_last.is_none() && self.hold_out.is_empty() {
            return None;
        }
        Some(HoldOutSettings {
            last: self.hold_out_last,
            indices: self.hold_out.clone(),
        })
    }
}

#[derive(Args, Debug)]
struct BandArgs {
    /// Variable group summarized as the latent state
    #[arg(long)]
    group: Option<String>,

    /// Lower band probability
    #[arg(long)]
    lower: Option<f64>,

    /// Upper band probability
    #[arg(long)]
    upper: Option<f64>,

    /// Transform applied to draws before quantiles
    #[arg(long, value_enum)]
    transform: Option<TransformArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransformArg {
    Identity,
    Exp,
    PrecisionToSd,
}

impl From<TransformArg> for Transform {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::Identity => Transform::Identity,
            TransformArg::Exp => Transform::Exp,
            TransformArg::PrecisionToSd => Transform::PrecisionToSd,
        }
    }
}

#[derive(Args, Debug)]
struct ModelSelectArgs {
    /// Model family (random_walk, dynamic_linear)
    #[arg(long)]
    model: Option<ModelKind>,

    /// Covariate column for the dynamic linear model (repeatable)
    #[arg(long = "covariate")]
    covariates: Vec<String>,
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Time series file (delimited text or JSON)
    data: PathBuf,

    #[command(flatten)]
    data_opts: DataArgs,

    #[command(flatten)]
    model: ModelSelectArgs,

    #[command(flatten)]
    hold_out: HoldOutArgs,

    #[command(flatten)]
    band: BandArgs,

    /// JAGS executable (name on PATH or explicit path)
    #[arg(long)]
    jags: Option<String>,

    #[arg(long)]
    chains: Option<u32>,

    /// Iterations discarded before monitoring
    #[arg(long)]
    burn_in: Option<u64>,

    /// Monitored iterations per chain
    #[arg(long)]
    iter: Option<u64>,

    #[arg(long)]
    thin: Option<u64>,

    /// Seed for initial values and sampler RNGs
    #[arg(long)]
    seed: Option<u64>,

    /// Kill the sampler after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Keep the sampler working directory
    #[arg(long)]
    keep_workdir: bool,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// CODA directory, optionally named as NAME=DIR (repeatable)
    #[arg(long = "coda", required = true)]
    coda: Vec<String>,

    /// CODA file stem (`<stem>index.txt`, `<stem>chain1.txt`, ...)
    #[arg(long, default_value = "CODA")]
    stem: String,

    /// Draws to drop from the start of each chain
    #[arg(long, default_value_t = 0)]
    burn_in: usize,

    /// Keep every k-th draw of each chain
    #[arg(long, default_value_t = 1)]
    thin: usize,

    #[command(flatten)]
    band: BandArgs,

    /// Time series the fit was made on, for time labels and held-out truth
    #[arg(long)]
    data: Option<PathBuf>,

    /// Value column of `--data`
    #[arg(long)]
    column: Option<String>,

    #[command(flatten)]
    hold_out: HoldOutArgs,
}

#[derive(Args, Debug)]
struct ModelArgs {
    #[command(subcommand)]
    command: ModelCommands,
}

#[derive(Subcommand, Debug)]
enum ModelCommands {
    /// Print the model in the JAGS language
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    model: ModelSelectArgs,

    /// Covariate with gaps that needs an imputation model (repeatable)
    #[arg(long = "impute")]
    impute: Vec<String>,

    /// Drop the intercept term
    #[arg(long)]
    no_intercept: bool,

    /// Drop the density-dependence term
    #[arg(long)]
    no_autoregressive: bool,
}

#[derive(Args, Debug)]
struct InitsArgs {
    /// Time series file
    data: PathBuf,

    #[command(flatten)]
    data_opts: DataArgs,

    #[arg(long)]
    chains: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Also load this time series and prepare a fit from it
    #[arg(long)]
    data: Option<PathBuf>,

    /// JAGS executable to look for
    #[arg(long)]
    jags: Option<String>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,

    /// Print the JSON schema of the configuration file
    Schema,

    /// Print the built-in defaults (or the selected preset) as TOML
    Default,
}

fn main() {
    let cli = Cli::parse();

    let level = cli
        .global
        .log_level
        .or_else(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    init_logging(&LogConfig::from_env(level, cli.global.log_format));

    let ctx = LogContext::new(generate_run_id(), get_host_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "ssm-core started",
        version = env!("CARGO_PKG_VERSION")
    );

    let global = &cli.global;
    let result = match &cli.command {
        Commands::Fit(args) => run_fit_cmd(global, &ctx, args),
        Commands::Summarize(args) => run_summarize(global, &ctx, args),
        Commands::Model(args) => match &args.command {
            ModelCommands::Render(render_args) => run_model_render(global, &ctx, render_args),
        },
        Commands::Inits(args) => run_inits(global, &ctx, args),
        Commands::Check(args) => run_check(global, &ctx, args),
        Commands::Config(args) => run_config(global, &ctx, args),
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "ssm-core", &mut std::io::stdout());
            Ok(ExitCode::Ok)
        }
        Commands::Version => {
            print_version(global);
            Ok(ExitCode::Ok)
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(err) => output_error(global, &ctx, &err),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Report,
        "ssm-core finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared helpers
// ============================================================================

fn config_options(global: &GlobalOpts) -> ConfigOptions {
    ConfigOptions {
        config_path: global.config.clone(),
        preset: global.preset.clone(),
    }
}

fn load_resolved(global: &GlobalOpts, ctx: &LogContext) -> Result<ResolvedConfig, Error> {
    let resolved = load_config(&config_options(global))?;
    let source = resolved.source().to_string();
    match &resolved.path.path {
        Some(path) => {
            let path = path.display().to_string();
            log_event!(
                ctx,
                INFO,
                event_names::CONFIG_LOADED,
                Stage::Init,
                "configuration loaded",
                path = path.as_str(),
                source = source.as_str()
            )
        }
        None => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no configuration file, using built-in settings",
            source = source.as_str()
        ),
    }
    Ok(resolved)
}

/// Re-validate after command-line overrides.
fn revalidate(config: &FitConfig) -> Result<(), Error> {
    validate_fit_config(config).map_err(|source| ConfigError::Invalid { path: None, source })?;
    Ok(())
}

fn apply_data_args(config: &mut FitConfig, args: &DataArgs) {
    if let Some(column) = &args.column {
        config.data.column = Some(column.clone());
    }
    if args.no_log {
        config.data.log_transform = false;
        // A raw-scale fit has nothing to undo; an explicit --transform
        // applied later still wins and is validated.
        config.bands.transform = BandTransform::Identity;
    }
}

fn apply_model_args(config: &mut FitConfig, args: &ModelSelectArgs) {
    if let Some(kind) = args.model {
        config.model.kind = kind;
    }
    if !args.covariates.is_empty() {
        config.model.covariates = args.covariates.clone();
    }
}

fn summary_options(config: &FitConfig, args: &BandArgs) -> SummaryOptions {
    let mut options = SummaryOptions::from_config(&config.bands, &config.sampler.diagnostics);
    if let Some(group) = &args.group {
        options.state_group = group.clone();
    }
    if let Some(lower) = args.lower {
        options.probs.0 = lower;
    }
    if let Some(upper) = args.upper {
        options.probs.1 = upper;
    }
    if let Some(transform) = args.transform {
        options.transform = transform.into();
    }
    options
}

/// Print `payload` in the selected format.
fn emit(
    global: &GlobalOpts,
    ctx: &LogContext,
    command: &str,
    payload: &impl Serialize,
    markdown: impl FnOnce() -> String,
    line: impl FnOnce() -> String,
) {
    match global.format {
        OutputFormat::Json => println!("{}", to_pretty(&envelope(&ctx.run_id, command, payload))),
        OutputFormat::Md => print!("{}", markdown()),
        OutputFormat::Summary => println!("{}", line()),
    }
}

fn args_error(global: &GlobalOpts, ctx: &LogContext, message: &str) -> ExitCode {
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "error": { "code": ExitCode::ArgsError.as_i32(), "message": message },
            });
            eprintln!("{}", to_pretty(&response));
        }
        _ => eprintln!("error: {message}"),
    }
    ExitCode::ArgsError
}

fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    if exit_code == ExitCode::InternalError {
        let error = err.to_string();
        log_event!(
            ctx,
            ERROR,
            event_names::INTERNAL_ERROR,
            Stage::Report,
            "internal error",
            error = error.as_str()
        );
    }
    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err).with_context("run_id", &ctx.run_id);
            eprintln!("{}", structured.to_json_pretty());
        }
        OutputFormat::Summary => eprintln!("[{}] {}", ctx.run_id, err),
        OutputFormat::Md => eprintln!("{}", err.to_human()),
    }
    exit_code
}

fn worst_status(statuses: impl IntoIterator<Item = QualityStatus>) -> QualityStatus {
    statuses
        .into_iter()
        .fold(QualityStatus::Ok, |worst, status| match (worst, status) {
            (QualityStatus::Fail, _) | (_, QualityStatus::Fail) => QualityStatus::Fail,
            (QualityStatus::Warn, _) | (_, QualityStatus::Warn) => QualityStatus::Warn,
            _ => QualityStatus::Ok,
        })
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_fit_cmd(global: &GlobalOpts, ctx: &LogContext, args: &FitArgs) -> Result<ExitCode, Error> {
    let mut config = load_resolved(global, ctx)?.config;
    apply_data_args(&mut config, &args.data_opts);
    apply_model_args(&mut config, &args.model);
    if let Some(hold_out) = args.hold_out.settings() {
        config.hold_out = hold_out;
    }
    if let Some(group) = &args.band.group {
        config.bands.state_group = group.clone();
    }
    if let Some(lower) = args.band.lower {
        config.bands.lower = lower;
    }
    if let Some(upper) = args.band.upper {
        config.bands.upper = upper;
    }
    match args.band.transform {
        None => {}
        Some(TransformArg::Identity) => config.bands.transform = BandTransform::Identity,
        Some(TransformArg::Exp) => config.bands.transform = BandTransform::Exp,
        Some(TransformArg::PrecisionToSd) => {
            return Ok(args_error(
                global,
                ctx,
                "--transform precision-to-sd applies to `summarize` only",
            ))
        }
    }

    let sampler = &mut config.sampler;
    if let Some(jags) = &args.jags {
        sampler.executable = jags.clone();
    }
    if let Some(chains) = args.chains {
        sampler.n_chains = chains;
    }
    if let Some(burn_in) = args.burn_in {
        sampler.burn_in = burn_in;
    }
    if let Some(iter) = args.iter {
        sampler.n_iter = iter;
    }
    if let Some(thin) = args.thin {
        sampler.thin = thin;
    }
    if let Some(seed) = args.seed {
        sampler.seed = seed;
    }
    if let Some(timeout) = args.timeout {
        sampler.timeout_secs = Some(timeout);
    }
    sampler.keep_workdir |= args.keep_workdir;
    revalidate(&config)?;

    let table = load_table(&args.data)?;
    let jags = JagsSampler::from_settings(&config.sampler);
    let summary = run_fit(&config, &table, &jags, ctx)?;

    emit(
        global,
        ctx,
        "fit",
        &summary,
        || fit_markdown(&summary),
        || summary_line(&summary),
    );
    Ok(ExitCode::from_quality(summary.diagnostics.status))
}

/// `NAME=DIR`, or a bare directory named after its last component.
fn parse_coda_arg(arg: &str) -> (String, PathBuf) {
    match arg.split_once('=') {
        Some((name, dir)) if !name.is_empty() && !dir.is_empty() => {
            (name.to_string(), PathBuf::from(dir))
        }
        _ => {
            let dir = PathBuf::from(arg);
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "fit".to_string());
            (name, dir)
        }
    }
}

#[derive(Serialize)]
struct ComparedFits<'a> {
    fits: &'a [FitSummary],
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<ModelComparison>,
}

fn run_summarize(
    global: &GlobalOpts,
    ctx: &LogContext,
    args: &SummarizeArgs,
) -> Result<ExitCode, Error> {
    let mut config = load_resolved(global, ctx)?.config;
    if let Some(column) = &args.column {
        config.data.column = Some(column.clone());
    }
    if let Some(hold_out) = args.hold_out.settings() {
        config.hold_out = hold_out;
    }
    let options = summary_options(&config, &args.band);

    let named_dirs: Vec<(String, PathBuf)> = args.coda.iter().map(|s| parse_coda_arg(s)).collect();
    for (i, (name, _)) in named_dirs.iter().enumerate() {
        if named_dirs[..i].iter().any(|(other, _)| other == name) {
            return Ok(args_error(
                global,
                ctx,
                &format!("fit name '{name}' given twice; use NAME=DIR to tell them apart"),
            ));
        }
    }

    // Labels and truth come from the raw series; the band transform undoes
    // the fitting scale.
    let mut labels = None;
    let mut held_out: Option<(HeldOutTruth, HeldOutMask)> = None;
    if let Some(path) = &args.data {
        let table = load_table(path)?;
        let series = table.series(config.data.column.as_deref())?;
        let mask = HeldOutMask::from_settings(&config.hold_out, series.len())?;
        let (_, truth) = mask.apply(&series)?;
        let shown = path.display().to_string();
        log_event!(
            ctx,
            INFO,
            event_names::DATA_LOADED,
            Stage::Load,
            "time series loaded",
            path = shown.as_str(),
            n = series.len(),
            held_out = mask.len()
        );
        labels = Some(series.labels);
        held_out = Some((truth, mask));
    } else if args.hold_out.settings().is_some() {
        return Ok(args_error(
            global,
            ctx,
            "held-out positions need --data to read the withheld values",
        ));
    }

    let mut summaries = Vec::with_capacity(named_dirs.len());
    for (name, dir) in &named_dirs {
        let samples = CodaReplay::discover(dir, &args.stem)?
            .load()?
            .discard_burn_in(args.burn_in)?
            .thin(args.thin)?;
        let shown = dir.display().to_string();
        log_event!(
            ctx,
            INFO,
            event_names::SAMPLE_FINISHED,
            Stage::Sample,
            "CODA output loaded",
            fit = name.as_str(),
            dir = shown.as_str(),
            n_chains = samples.n_chains(),
            n_draws = samples.n_draws()
        );
        let summary = summarize(
            &samples,
            name,
            &options,
            labels.as_deref(),
            held_out.as_ref().map(|(truth, mask)| (truth, mask)),
        )?;
        log_summary(&ctx.clone().with_fit_id(summary.fit_id.to_string()), &summary);
        summaries.push(summary);
    }

    let status = worst_status(summaries.iter().map(|s| s.diagnostics.status));
    if let [summary] = summaries.as_slice() {
        emit(
            global,
            ctx,
            "summarize",
            summary,
            || fit_markdown(summary),
            || summary_line(summary),
        );
        return Ok(ExitCode::from_quality(status));
    }

    let comparison = match &held_out {
        Some((truth, mask)) if !mask.is_empty() => {
            let fits: Vec<(&str, _)> = summaries
                .iter()
                .map(|s| (s.model.as_str(), &s.band))
                .collect();
            let comparison = compare_models(&fits, truth, mask)?;
            log_event!(
                ctx,
                INFO,
                event_names::COMPARE_FINISHED,
                Stage::Compare,
                "held-out comparison finished",
                n_models = comparison.models.len(),
                best = comparison.ranked_by_rmse().first().copied().unwrap_or("")
            );
            Some(comparison)
        }
        _ => None,
    };

    let payload = ComparedFits {
        fits: &summaries,
        comparison,
    };
    emit(
        global,
        ctx,
        "summarize",
        &payload,
        || {
            let mut out: String = summaries.iter().map(fit_markdown).collect::<Vec<_>>().join("\n");
            if let Some(comparison) = &payload.comparison {
                out.push('\n');
                out.push_str(&comparison_markdown(comparison));
            }
            out
        },
        || {
            summaries
                .iter()
                .map(summary_line)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    Ok(ExitCode::from_quality(status))
}

fn run_model_render(
    global: &GlobalOpts,
    ctx: &LogContext,
    args: &RenderArgs,
) -> Result<ExitCode, Error> {
    let mut config = load_resolved(global, ctx)?.config;
    apply_model_args(&mut config, &args.model);
    if args.no_intercept {
        config.model.intercept = false;
    }
    if args.no_autoregressive {
        config.model.autoregressive = false;
    }
    if let Some(unknown) = args
        .impute
        .iter()
        .find(|name| !config.model.covariates.contains(name))
    {
        return Ok(args_error(
            global,
            ctx,
            &format!("--impute {unknown}: not one of the model's covariates"),
        ));
    }
    revalidate(&config)?;

    let missing: Vec<bool> = config
        .model
        .covariates
        .iter()
        .map(|name| args.impute.contains(name))
        .collect();
    let model = for_config(&config.model, config.priors.beta_precision, &missing)?;
    let text = render(&model);
    log_event!(
        ctx,
        DEBUG,
        event_names::MODEL_RENDERED,
        Stage::Model,
        "model rendered",
        model = model.name.as_str(),
        blocks = model.blocks.len()
    );

    let payload = serde_json::json!({
        "model": model.name,
        "text": text,
        "data": model.data_names(),
        "monitor": model.monitored(),
        "stochastic_nodes": model.stochastic_nodes(),
    });
    emit(
        global,
        ctx,
        "model render",
        &payload,
        || text.clone(),
        || {
            format!(
                "{}: {} blocks, {} stochastic nodes, monitors {}",
                model.name,
                model.blocks.len(),
                model.stochastic_nodes().len(),
                model.monitored().join(",")
            )
        },
    );
    Ok(ExitCode::Ok)
}

fn run_inits(global: &GlobalOpts, ctx: &LogContext, args: &InitsArgs) -> Result<ExitCode, Error> {
    let mut config = load_resolved(global, ctx)?.config;
    apply_data_args(&mut config, &args.data_opts);
    if let Some(chains) = args.chains {
        config.sampler.n_chains = chains;
    }
    if let Some(seed) = args.seed {
        config.sampler.seed = seed;
    }
    revalidate(&config)?;

    let table = load_table(&args.data)?;
    let mut series = table.series(config.data.column.as_deref())?;
    if config.data.log_transform {
        series = series.log()?;
    }
    let inits = bootstrap_inits(&series.observed(), config.sampler.n_chains, config.sampler.seed)?;

    let payload = serde_json::json!({
        "seed": config.sampler.seed,
        "log_scale": config.data.log_transform,
        "inits": inits,
    });
    emit(
        global,
        ctx,
        "inits",
        &payload,
        || {
            inits
                .iter()
                .map(|init| format!("## Chain {}\n\n```r\n{}```\n", init.chain, init.to_rdump()))
                .collect::<Vec<_>>()
                .join("\n")
        },
        || {
            inits
                .iter()
                .map(|init| {
                    format!(
                        "chain {}: tau_add={:.4} tau_obs={:.4} seed={}",
                        init.chain, init.tau_add, init.tau_obs, init.rng_seed
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    Ok(ExitCode::Ok)
}

#[derive(Debug, Serialize)]
struct CheckResult {
    check: &'static str,
    ok: bool,
    detail: String,
}

fn run_check(global: &GlobalOpts, ctx: &LogContext, args: &CheckArgs) -> Result<ExitCode, Error> {
    let mut results = Vec::new();
    let mut first_failure: Option<ExitCode> = None;
    let mut record = |check: &'static str, outcome: Result<String, Error>| {
        let (ok, detail) = match outcome {
            Ok(detail) => (true, detail),
            Err(err) => {
                first_failure.get_or_insert(ExitCode::from(&err));
                (false, err.to_string())
            }
        };
        results.push(CheckResult { check, ok, detail });
    };

    let config = match load_resolved(global, ctx) {
        Ok(resolved) => {
            record(
                "config",
                Ok(format!("{} ({})", resolved.config.model.kind, resolved.source())),
            );
            Some(resolved.config)
        }
        Err(err) => {
            record("config", Err(err));
            None
        }
    };

    let executable = args
        .jags
        .clone()
        .or_else(|| config.as_ref().map(|c| c.sampler.executable.clone()))
        .unwrap_or_else(|| FitConfig::default().sampler.executable);
    record(
        "sampler",
        JagsSampler::new(executable)
            .resolve_executable()
            .map(|path| path.display().to_string())
            .map_err(Error::from),
    );

    if let (Some(path), Some(config)) = (&args.data, &config) {
        let outcome = load_table(path).map_err(Error::from).and_then(|table| {
            ssm_core::prepare(config, &table).map(|prepared| {
                format!(
                    "{} observations, {} held out, {} chains",
                    prepared.series.len(),
                    prepared.mask.len(),
                    prepared.inits.len()
                )
            })
        });
        record("data", outcome);
    }

    let all_ok = results.iter().all(|r| r.ok);
    let payload = serde_json::json!({
        "status": if all_ok { "ok" } else { "failed" },
        "checks": results,
    });
    emit(
        global,
        ctx,
        "check",
        &payload,
        || {
            let mut out = String::from("# Check\n\n| Check | Status | Detail |\n|---|---|---|\n");
            for r in &results {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    r.check,
                    if r.ok { "ok" } else { "FAILED" },
                    r.detail
                ));
            }
            out
        },
        || {
            let failed: Vec<&str> = results.iter().filter(|r| !r.ok).map(|r| r.check).collect();
            if failed.is_empty() {
                format!("check ok: {} checks passed", results.len())
            } else {
                format!("check failed: {}", failed.join(", "))
            }
        },
    );
    Ok(first_failure.unwrap_or(ExitCode::Ok))
}

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> Result<ExitCode, Error> {
    match args.command {
        ConfigCommands::Show => {
            let resolved = load_resolved(global, ctx)?;
            let snapshot = resolved.snapshot();
            let payload = serde_json::json!({
                "source": resolved.source().to_string(),
                "path": resolved.path.path.as_ref().map(|p| p.display().to_string()),
                "snapshot": snapshot,
                "config": resolved.config,
            });
            emit(
                global,
                ctx,
                "config show",
                &payload,
                || {
                    let body = toml::to_string_pretty(&resolved.config).unwrap_or_default();
                    format!(
                        "# Configuration\n\nSource: {}\n\n```toml\n{}```\n",
                        resolved.source(),
                        body
                    )
                },
                || {
                    format!(
                        "config {} from {}: model={} chains={} iter={}",
                        snapshot.short_id(),
                        resolved.source(),
                        resolved.config.model.kind,
                        resolved.config.sampler.n_chains,
                        resolved.config.sampler.n_iter
                    )
                },
            );
        }
        ConfigCommands::Schema => {
            let schema = schemars::schema_for!(FitConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        ConfigCommands::Default => {
            let config = match &global.preset {
                Some(_) => {
                    load_config(&ConfigOptions {
                        config_path: None,
                        preset: global.preset.clone(),
                    })?
                    .config
                }
                None => FitConfig::default(),
            };
            match global.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                _ => print!(
                    "{}",
                    toml::to_string_pretty(&config)
                        .map_err(|e| Error::Config(format!("cannot render as TOML: {e}")))?
                ),
            }
        }
    }
    Ok(ExitCode::Ok)
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "ssm_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => println!("{}", to_pretty(&version_info)),
        _ => {
            println!("ssm-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}
