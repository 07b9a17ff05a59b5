//! CLI help output tests for ssm-core.
//!
//! Every command and subcommand must print its help text without errors.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the ssm-core binary.
fn ssm_core() -> Command {
    cargo_bin_cmd!("ssm-core")
}

mod top_level {
    use super::*;

    #[test]
    fn help_flag_works() {
        ssm_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("State-space posterior bands"));
    }

    #[test]
    fn version_flag_works() {
        ssm_core()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ssm-core"));
    }

    #[test]
    fn help_shows_all_commands() {
        ssm_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("fit"))
            .stdout(predicate::str::contains("summarize"))
            .stdout(predicate::str::contains("model"))
            .stdout(predicate::str::contains("inits"))
            .stdout(predicate::str::contains("check"))
            .stdout(predicate::str::contains("config"))
            .stdout(predicate::str::contains("completions"));
    }

    #[test]
    fn help_shows_global_options() {
        ssm_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--format"))
            .stdout(predicate::str::contains("--config"))
            .stdout(predicate::str::contains("--preset"))
            .stdout(predicate::str::contains("--log-format"));
    }
}

mod subcommands {
    use super::*;

    #[test]
    fn fit_help_lists_sampler_options() {
        ssm_core()
            .args(["fit", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--jags"))
            .stdout(predicate::str::contains("--hold-out-last"))
            .stdout(predicate::str::contains("--chains"))
            .stdout(predicate::str::contains("--covariate"));
    }

    #[test]
    fn summarize_help_lists_replay_options() {
        ssm_core()
            .args(["summarize", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--coda"))
            .stdout(predicate::str::contains("--stem"))
            .stdout(predicate::str::contains("--transform"))
            .stdout(predicate::str::contains("precision-to-sd"));
    }

    #[test]
    fn model_render_help() {
        ssm_core()
            .args(["model", "render", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--impute"));
    }

    #[test]
    fn config_help_lists_subcommands() {
        ssm_core()
            .args(["config", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("show"))
            .stdout(predicate::str::contains("schema"))
            .stdout(predicate::str::contains("default"));
    }

    #[test]
    fn completions_for_bash() {
        ssm_core()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ssm-core"));
    }

    #[test]
    fn version_subcommand_is_json() {
        let output = ssm_core().arg("version").assert().success();
        let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["ssm_core_version"], env!("CARGO_PKG_VERSION"));
        assert!(json["schema_version"].is_string());
    }
}
