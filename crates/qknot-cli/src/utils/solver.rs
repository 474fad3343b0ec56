use crate::error::{CliError, Result};
use qknot::engine::error::EngineError;
use qknot::engine::sampler::{QuboSampler, SampleSet, SolverRequest};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, info, instrument};

/// An annealing solver run as a child process.
///
/// The request JSON is written to the child's stdin and a sample set JSON is
/// expected on its stdout. The timeout bounds spawning, writing and waiting
/// together, and the child is killed when it elapses.
pub struct ExternalSolver {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    handle: Handle,
}

impl ExternalSolver {
    /// Splits `command` on whitespace into a program and its arguments.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(command: &str, timeout: Duration) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| CliError::Argument("solver command is empty".to_string()))?;
        let handle = Handle::try_current().map_err(|e| CliError::Other(e.into()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
            handle,
        })
    }

    /// Runs the whole exchange under the timeout. On expiry the child is
    /// dropped, which kills it.
    async fn run(&self, input: Vec<u8>) -> std::result::Result<Vec<u8>, EngineError> {
        tokio::time::timeout(self.timeout, self.exchange(input))
            .await
            .map_err(|_| {
                EngineError::Solver(format!(
                    "'{}' did not finish within {:.1} s",
                    self.program,
                    self.timeout.as_secs_f64()
                ))
            })?
    }

    async fn exchange(&self, input: Vec<u8>) -> std::result::Result<Vec<u8>, EngineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::Solver(format!("could not spawn '{}': {}", self.program, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Solver("failed to open solver stdin".to_string()))?;
        // Stdout is drained while the request is still being written.
        let write = async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output =
            output.map_err(|e| EngineError::Solver(format!("error waiting for solver: {}", e)))?;

        if !output.status.success() {
            return Err(EngineError::Solver(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        match written {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("Solver exited before reading the whole request.");
            }
            Err(e) => {
                return Err(EngineError::Solver(format!("error writing request: {}", e)));
            }
            Ok(()) => {}
        }
        Ok(output.stdout)
    }
}

impl QuboSampler for ExternalSolver {
    #[instrument(skip_all, name = "external_solver", fields(program = %self.program))]
    fn sample(&self, request: &SolverRequest) -> std::result::Result<SampleSet, EngineError> {
        let input = serde_json::to_vec(request)?;
        debug!(bytes = input.len(), "Sending request to solver.");

        let stdout = tokio::task::block_in_place(|| self.handle.block_on(self.run(input)))?;
        let samples: SampleSet = serde_json::from_slice(&stdout).map_err(|e| {
            EngineError::Solver(format!("solver output is not a sample set: {}", e))
        })?;
        info!("Solver produced {} sample(s).", samples.len());
        Ok(samples)
    }
}

/// Reads a precomputed sample set from a JSON file.
pub fn load_samples(path: &Path) -> Result<SampleSet> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| CliError::file(path, e))
}
