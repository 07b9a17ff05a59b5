//! Command payload rendering for stdout.
//!
//! Every JSON payload is wrapped in the same envelope (`schema_version`,
//! `run_id`, `generated_at`, `command`). Markdown and one-line summaries are
//! built from the same typed results.

pub mod markdown;

pub use markdown::{comparison_markdown, fit_markdown, summary_line};

use serde::Serialize;
use serde_json::{Map, Value};
use ssm_common::SCHEMA_VERSION;

/// Wrap a payload in the standard envelope. Object payloads are merged into
/// the envelope; anything else lands under `result`.
pub fn envelope(run_id: &str, command: &str, payload: &impl Serialize) -> Value {
    let mut obj = Map::new();
    obj.insert("schema_version".into(), Value::from(SCHEMA_VERSION));
    obj.insert("run_id".into(), Value::from(run_id));
    obj.insert(
        "generated_at".into(),
        Value::from(chrono::Utc::now().to_rfc3339()),
    );
    obj.insert("command".into(), Value::from(command));
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => {
            for (k, v) in fields {
                obj.entry(k).or_insert(v);
            }
        }
        Ok(other) => {
            obj.insert("result".into(), other);
        }
        Err(e) => {
            obj.insert("error".into(), Value::from(e.to_string()));
        }
    }
    Value::Object(obj)
}

/// Pretty JSON text of a value.
pub fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        n: usize,
        command: &'static str,
    }

    #[test]
    fn envelope_merges_objects_without_overwriting() {
        let v = envelope("run-1", "fit", &Payload { n: 3, command: "other" });
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
        assert_eq!(v["run_id"], "run-1");
        assert_eq!(v["command"], "fit");
        assert_eq!(v["n"], 3);
        assert!(v["generated_at"].as_str().is_some());
    }

    #[test]
    fn envelope_wraps_scalars() {
        let v = envelope("run-1", "version", &"0.1.0");
        assert_eq!(v["result"], "0.1.0");
    }
}
