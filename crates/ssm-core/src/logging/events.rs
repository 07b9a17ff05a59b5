//! Structured event definitions.
//!
//! Every event carries the run id, the fit id when one exists, and the
//! pipeline stage that emitted it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading the series and building sampler data.
    Load,
    /// Assembling and rendering the model text.
    Model,
    /// Running the external sampler.
    Sample,
    /// Posterior bands and parameter summaries.
    Summarize,
    /// Held-out comparison.
    Compare,
    /// Rendering output.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Model => "model",
            Stage::Sample => "sample",
            Stage::Summarize => "summarize",
            Stage::Compare => "compare",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Event names used as tracing targets.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    pub const DATA_LOADED: &str = "data.loaded";
    pub const DATA_HELD_OUT: &str = "data.held_out";

    pub const MODEL_RENDERED: &str = "model.rendered";

    pub const SAMPLE_STARTED: &str = "sample.started";
    pub const SAMPLE_FINISHED: &str = "sample.finished";

    pub const SUMMARY_BAND: &str = "summary.band";
    pub const DIAGNOSTICS_STATUS: &str = "diagnostics.status";
    pub const COMPARE_FINISHED: &str = "compare.finished";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// One structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,
    /// Event name, e.g. `sample.finished`.
    pub event: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_id: Option<String>,
    pub stage: Stage,
    pub host_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        host_id: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            fit_id: None,
            stage,
            host_id: host_id.into(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_fit_id(mut self, fit_id: impl Into<String>) -> Self {
        self.fit_id = Some(fit_id.into());
        self
    }

    /// Add a field; values that fail to serialize are dropped.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Correlation ids shared by every event of one run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub fit_id: Option<String>,
    pub host_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            fit_id: None,
            host_id: host_id.into(),
        }
    }

    pub fn with_fit_id(mut self, fit_id: impl Into<String>) -> Self {
        self.fit_id = Some(fit_id.into());
        self
    }

    pub fn event(
        &self,
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        let mut e = LogEvent::new(level, event, &self.run_id, &self.host_id, stage, message);
        e.fit_id.clone_from(&self.fit_id);
        e
    }

    pub fn info(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Info, event, stage, message)
    }

    pub fn warn(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Warn, event, stage, message)
    }

    pub fn error(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Error, event, stage, message)
    }
}
