use super::error::EngineError;
use crate::core::models::sequence::Sequence;
use crate::core::models::structure::DotBracket;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A minimum-free-energy structure produced by a folding tool.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    pub structure: DotBracket,
    /// Free energy in kcal/mol.
    pub energy: f64,
}

/// A thermodynamic folding tool used to produce reference structures.
pub trait FoldingEngine {
    fn fold(&self, sequence: &Sequence) -> Result<FoldResult, EngineError>;
}

/// ViennaRNA's `RNAfold`, run as a child process.
#[derive(Debug, Clone)]
pub struct RnaFold {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for RnaFold {
    fn default() -> Self {
        Self {
            program: PathBuf::from("RNAfold"),
            args: vec!["--noPS".to_string()],
            timeout: None,
        }
    }
}

impl RnaFold {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Kills the process if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, EngineError> {
        let waiting =
            |e: io::Error| EngineError::Folding(format!("error waiting for process: {}", e));
        let Some(limit) = self.timeout else {
            return child.wait().map_err(waiting);
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait().map_err(waiting)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!("Could not kill '{}': {}", self.program.display(), e);
                }
                child.wait().map_err(waiting)?;
                return Err(EngineError::FoldingTimedOut {
                    program: self.program.display().to_string(),
                    seconds: limit.as_secs_f64(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Parses `RNAfold` stdout.
    ///
    /// The structure line directly follows the echoed sequence and reads
    /// `(((...))) ( -1.20)`; header lines starting with `>` are skipped.
    pub fn parse_output(stdout: &str, sequence: &Sequence) -> Result<FoldResult, EngineError> {
        let line = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('>'))
            .nth(1)
            .ok_or_else(|| {
                EngineError::Folding(format!(
                    "expected a sequence and a structure line, got:\n{}",
                    stdout
                ))
            })?;

        let (structure, annotation) = line.split_once(char::is_whitespace).ok_or_else(|| {
            EngineError::Folding(format!("structure line lacks an energy: '{}'", line))
        })?;
        let energy = annotation
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                EngineError::Folding(format!("unparsable energy annotation '{}'", annotation))
            })?;

        let structure = DotBracket::new(structure);
        if structure.len() != sequence.len() {
            return Err(EngineError::Folding(format!(
                "structure has length {}, sequence has length {}",
                structure.len(),
                sequence.len()
            )));
        }
        Ok(FoldResult { structure, energy })
    }
}

impl FoldingEngine for RnaFold {
    #[instrument(skip_all, name = "rnafold", fields(len = sequence.len()))]
    fn fold(&self, sequence: &Sequence) -> Result<FoldResult, EngineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::Folding(format!(
                    "could not spawn '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        let stdout = drain(child.stdout.take())?;
        let stderr = drain(child.stderr.take())?;
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| EngineError::Folding("failed to open stdin".to_string()))?;
            writeln!(stdin, "{}", sequence)
                .map_err(|e| EngineError::Folding(format!("error writing sequence: {}", e)))?;
        }

        let status = self.wait(&mut child)?;
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        if !status.success() {
            return Err(EngineError::Folding(format!(
                "'{}' exited with {}: {}",
                self.program.display(),
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&stdout);
        debug!(output = %stdout, "RNAfold finished.");
        Self::parse_output(&stdout, sequence)
    }
}

/// Reads a child pipe to its end on a separate thread.
fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> Result<JoinHandle<io::Result<Vec<u8>>>, EngineError> {
    let mut pipe =
        pipe.ok_or_else(|| EngineError::Folding("failed to open output pipe".to_string()))?;
    Ok(thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    }))
}

fn collect(reader: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, EngineError> {
    reader
        .join()
        .map_err(|_| EngineError::Folding("output reader panicked".to_string()))?
        .map_err(|e| EngineError::Folding(format!("error reading output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> Sequence {
        s.parse().unwrap()
    }

    #[test]
    fn parse_output_reads_structure_and_energy() {
        let out = "GGGAAACCC\n(((...))) ( -1.20)\n";
        let result = RnaFold::parse_output(out, &seq("GGGAAACCC")).unwrap();
        assert_eq!(result.structure.to_string(), "(((...)))");
        assert_eq!(result.energy, -1.2);
    }

    #[test]
    fn parse_output_skips_fasta_header() {
        let out = ">query\nGGGGAAAACCCC\n((((....)))) (-12.30)\n";
        let result = RnaFold::parse_output(out, &seq("GGGGAAAACCCC")).unwrap();
        assert_eq!(result.energy, -12.3);
    }

    #[test]
    fn parse_output_accepts_unstructured_result() {
        let out = "AAAA\n.... (  0.00)\n";
        let result = RnaFold::parse_output(out, &seq("AAAA")).unwrap();
        assert_eq!(result.structure, DotBracket::unpaired(4));
        assert_eq!(result.energy, 0.0);
    }

    #[test]
    fn parse_output_rejects_truncated_output() {
        let result = RnaFold::parse_output("GGGAAACCC\n", &seq("GGGAAACCC"));
        assert!(matches!(result, Err(EngineError::Folding(_))));
    }

    #[test]
    fn parse_output_rejects_length_mismatch() {
        let result = RnaFold::parse_output("GGGAAACCC\n((...)) (-1.00)\n", &seq("GGGAAACCC"));
        assert!(matches!(result, Err(EngineError::Folding(_))));
    }

    #[test]
    fn missing_program_is_reported_as_folding_error() {
        let engine = RnaFold::new().with_program("/nonexistent/qknot-test-RNAfold");
        let result = engine.fold(&seq("GGGAAACCC"));
        assert!(matches!(result, Err(EngineError::Folding(_))));
    }

    fn scripted(script: &str, timeout: Option<Duration>) -> RnaFold {
        RnaFold {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            timeout,
        }
    }

    #[test]
    fn fold_reads_structure_from_process_output() {
        let engine = scripted(
            "cat > /dev/null; printf 'GGGAAACCC\\n(((...))) ( -1.20)\\n'",
            Some(Duration::from_secs(10)),
        );
        let result = engine.fold(&seq("GGGAAACCC")).unwrap();
        assert_eq!(result.structure.to_string(), "(((...)))");
        assert_eq!(result.energy, -1.2);
    }

    #[test]
    fn slow_fold_is_killed_at_the_deadline() {
        let engine = scripted("sleep 5", Some(Duration::from_millis(100)));
        let started = Instant::now();
        let result = engine.fold(&seq("GGGAAACCC"));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(matches!(result, Err(EngineError::FoldingTimedOut { .. })));
    }

    #[test]
    fn failing_fold_reports_exit_status() {
        let engine = scripted("cat > /dev/null; echo broken >&2; exit 3", None);
        let Err(EngineError::Folding(message)) = engine.fold(&seq("GGGAAACCC")) else {
            panic!("expected a folding error");
        };
        assert!(message.contains("broken"));
    }
}
