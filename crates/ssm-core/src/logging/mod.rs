//! Structured logging for ssm-core.
//!
//! Two output modes, both on stderr so stdout stays reserved for command
//! payloads:
//! - human-readable lines for interactive use
//! - JSONL records carrying `run_id`, `fit_id` and `stage` for automation
//!
//! ```ignore
//! use ssm_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let ctx = LogContext::new(generate_run_id(), get_host_id());
//! ssm_core::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "starting fit");
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;

use sha2::{Digest, Sha256};
use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Call once, before anything logs.
///
/// `RUST_LOG` directives win over the configured level when present.
/// A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config.level)));

    let result = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };
    let _ = result;
}

/// Event targets are dotted names (`sample.finished`), so the filter covers
/// them alongside the crate's own module paths.
fn filter_directive(level: LogLevel) -> String {
    if level == LogLevel::Off {
        return "off".to_string();
    }
    format!("ssm_core={level},ssm_config={level},{level}")
}

pub fn generate_run_id() -> String {
    ssm_common::RunId::new().to_string()
}

/// Stable short host identifier: machine-id when readable, else a hash of
/// `HOSTNAME`, else random.
pub fn get_host_id() -> String {
    if let Ok(id) = std::fs::read_to_string("/etc/machine-id") {
        let id = id.trim();
        if id.len() >= 8 {
            return format!("host-{}", &id[..8]);
        }
    }
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        let digest = hex::encode(Sha256::digest(hostname.as_bytes()));
        return format!("host-{}", &digest[..8]);
    }
    format!("host-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

/// Emit a tracing event whose target is the event name, tagged with the
/// context ids and stage.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::SAMPLE_FINISHED, Stage::Sample, "sampler finished",
///     n_chains = 3, draws = 3000);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            target: $event,
            run_id = %$ctx.run_id,
            fit_id = $ctx.fit_id.as_deref(),
            host_id = %$ctx.host_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            target: $event,
            run_id = %$ctx.run_id,
            fit_id = $ctx.fit_id.as_deref(),
            host_id = %$ctx.host_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            target: $event,
            run_id = %$ctx.run_id,
            fit_id = $ctx.fit_id.as_deref(),
            host_id = %$ctx.host_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            target: $event,
            run_id = %$ctx.run_id,
            fit_id = $ctx.fit_id.as_deref(),
            host_id = %$ctx.host_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
}
