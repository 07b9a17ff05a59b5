//! JAGS run as a batch subprocess.
//!
//! Each run gets a fresh working directory holding
//!
//! ```text
//! model.bug      rendered model
//! data.R         observations and prior hyperparameters (R dump)
//! inits<k>.R     initial values and RNG settings for chain k
//! script.cmd     command script passed to `jags`
//! jags.out/.err  captured output
//! CODAindex.txt, CODAchain<k>.txt
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use ssm_config::SamplerSettings;
use tracing::{debug, info, warn};

use super::{SampleRequest, Sampler, SamplerError};
use crate::model::render;
use crate::samples::{read_coda, CodaFiles, PosteriorSamples};

const CODA_STEM: &str = "CODA";
const STDERR_TAIL_LINES: usize = 20;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the `jags` command-line program.
#[derive(Debug, Clone)]
pub struct JagsSampler {
    executable: String,
    timeout: Option<Duration>,
    keep_workdir: bool,
}

impl JagsSampler {
    pub fn new(executable: impl Into<String>) -> Self {
        JagsSampler {
            executable: executable.into(),
            timeout: None,
            keep_workdir: false,
        }
    }

    pub fn from_settings(settings: &SamplerSettings) -> Self {
        JagsSampler {
            executable: settings.executable.clone(),
            timeout: settings.timeout_secs.map(Duration::from_secs),
            keep_workdir: settings.keep_workdir,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Locate the executable: an explicit path, or a name searched on `PATH`.
    pub fn resolve_executable(&self) -> Result<PathBuf, SamplerError> {
        let not_found = || SamplerError::ExecutableNotFound {
            path: self.executable.clone(),
        };
        let candidate = Path::new(&self.executable);
        if candidate.components().count() > 1 {
            return candidate
                .is_file()
                .then(|| candidate.to_path_buf())
                .ok_or_else(not_found);
        }
        std::env::var_os("PATH")
            .and_then(|paths| {
                std::env::split_paths(&paths)
                    .map(|dir| dir.join(&self.executable))
                    .find(|p| p.is_file())
            })
            .ok_or_else(not_found)
    }

    /// Write every input file for `request` into `dir`.
    pub fn write_inputs(&self, dir: &Path, request: &SampleRequest<'_>) -> Result<(), SamplerError> {
        write(dir, "model.bug", &render(request.model))?;
        write(dir, "data.R", &request.data.to_rdump())?;
        for init in request.inits {
            write(dir, &format!("inits{}.R", init.chain), &init.to_rdump())?;
        }
        write(dir, "script.cmd", &script(request))
    }

    fn execute(&self, executable: &Path, dir: &Path) -> Result<(), SamplerError> {
        let out_path = dir.join("jags.out");
        let err_path = dir.join("jags.err");
        let stdout = File::create(&out_path).map_err(|e| SamplerError::io(&out_path, e))?;
        let stderr = File::create(&err_path).map_err(|e| SamplerError::io(&err_path, e))?;

        let start = Instant::now();
        let mut child = Command::new(executable)
            .arg("script.cmd")
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| SamplerError::io(executable, e))?;

        let status = wait_with_deadline(&mut child, self.timeout, executable)?;
        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            success = status.success(),
            "sampler process finished"
        );

        if !status.success() {
            return Err(SamplerError::Failed {
                status: status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr: output_tail(dir),
            });
        }
        Ok(())
    }
}

impl Sampler for JagsSampler {
    fn name(&self) -> &str {
        "jags"
    }

    fn run(&self, request: &SampleRequest<'_>) -> Result<PosteriorSamples, SamplerError> {
        if request.n_chains() == 0 {
            return Err(SamplerError::NoChains);
        }
        let executable = self.resolve_executable()?;
        let workdir = tempfile::Builder::new()
            .prefix("ssm-jags-")
            .tempdir()
            .map_err(|e| SamplerError::io(std::env::temp_dir(), e))?;
        let dir = workdir.path().to_path_buf();

        debug!(
            executable = %executable.display(),
            workdir = %dir.display(),
            n_chains = request.n_chains(),
            n_iter = request.n_iter,
            "starting sampler"
        );

        let result = self
            .write_inputs(&dir, request)
            .and_then(|()| self.execute(&executable, &dir))
            .and_then(|()| {
                let files = CodaFiles::with_stem(&dir, CODA_STEM, request.n_chains());
                if !files.index.is_file() {
                    return Err(SamplerError::MissingOutput {
                        path: files.index.clone(),
                        stderr: output_tail(&dir),
                    });
                }
                Ok(read_coda(&files)?)
            });

        if self.keep_workdir {
            let kept = workdir.keep();
            info!(workdir = %kept.display(), "sampler working directory kept");
        }
        result
    }
}

/// The JAGS command script for a request.
pub fn script(request: &SampleRequest<'_>) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "model in \"model.bug\"");
    let _ = writeln!(s, "data in \"data.R\"");
    let _ = writeln!(s, "compile, nchains({})", request.n_chains());
    for init in request.inits {
        let _ = writeln!(
            s,
            "parameters in \"inits{}.R\", chain({})",
            init.chain, init.chain
        );
    }
    let _ = writeln!(s, "initialize");
    if request.n_adapt > 0 {
        let _ = writeln!(s, "adapt {}", request.n_adapt);
    }
    if request.burn_in > 0 {
        let _ = writeln!(s, "update {}", request.burn_in);
    }
    for var in request.monitor() {
        let _ = writeln!(s, "monitor {}, thin({})", var, request.thin.max(1));
    }
    let _ = writeln!(s, "update {}", request.n_iter);
    let _ = writeln!(s, "coda *, stem(\"{CODA_STEM}\")");
    let _ = writeln!(s, "exit");
    s
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<(), SamplerError> {
    let path = dir.join(name);
    std::fs::write(&path, contents).map_err(|e| SamplerError::io(path, e))
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
    executable: &Path,
) -> Result<std::process::ExitStatus, SamplerError> {
    let deadline = timeout.map(|t| (Instant::now() + t, t));
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => return Err(SamplerError::io(executable, e)),
        }
        if let Some((at, limit)) = deadline {
            if Instant::now() >= at {
                warn!(timeout_secs = limit.as_secs(), "sampler timed out, killing");
                let _ = child.kill();
                let _ = child.wait();
                return Err(SamplerError::Timeout {
                    seconds: limit.as_secs(),
                });
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Last lines of the captured stderr, or stdout if stderr is empty. JAGS
/// reports script errors on either.
fn output_tail(dir: &Path) -> String {
    let read = |name: &str| std::fs::read_to_string(dir.join(name)).unwrap_or_default();
    let mut text = read("jags.err");
    if text.trim().is_empty() {
        text = read("jags.out");
    }
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
