use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use crate::util::truncate_tail;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const TAIL_MAX_CHARS: usize = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Passed,
    Failed,
    /// The wall-clock budget expired and the child was killed. A distinct
    /// terminal outcome, never retried, never merged with a later run.
    Timeout,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Timeout => "verification_timeout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationRun {
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCommand {
    pub command: String,
    pub source: String,
}

/// Fixed detection table: first matching project file wins.
const DETECTION_TABLE: &[(&str, &str)] = &[
    ("package.json", "npm test"),
    ("Cargo.toml", "cargo test"),
    ("pyproject.toml", "pytest"),
    ("pytest.ini", "pytest"),
    ("go.mod", "go test ./..."),
];

pub fn detect_verification_command(root: &Path) -> Option<DetectedCommand> {
    for (file, command) in DETECTION_TABLE {
        if root.join(file).exists() {
            return Some(DetectedCommand {
                command: (*command).to_string(),
                source: (*file).to_string(),
            });
        }
    }
    None
}

/// Runs the verification command synchronously with a bounded wall-clock
/// timeout. On expiry the child is hard-killed; there is no resumption.
pub fn run_verification_command(
    command: &str,
    cwd: &Path,
    timeout_ms: u64,
) -> Result<VerificationRun> {
    let started = Instant::now();
    let deadline = Duration::from_millis(timeout_ms);

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn verification command: {command}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("verification child has no stdout pipe"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("verification child has no stderr pipe"))?;

    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let mut timed_out = false;
    let exit_status = loop {
        if let Some(status) = child
            .try_wait()
            .context("failed to poll verification child")?
        {
            break Some(status);
        }

        if started.elapsed() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            timed_out = true;
            break None;
        }

        thread::sleep(POLL_INTERVAL);
    };

    let stdout_text = stdout_reader.join().unwrap_or_default();
    let stderr_text = stderr_reader.join().unwrap_or_default();
    let duration_ms = started.elapsed().as_millis() as u64;

    let (status, exit_code) = if timed_out {
        (RunStatus::Timeout, None)
    } else {
        let exit = exit_status.and_then(|status| status.code());
        if exit == Some(0) {
            (RunStatus::Passed, exit)
        } else {
            (RunStatus::Failed, exit)
        }
    };

    Ok(VerificationRun {
        status,
        exit_code,
        duration_ms,
        stdout_tail: truncate_tail(&stdout_text, TAIL_MAX_CHARS),
        stderr_tail: truncate_tail(&stderr_text, TAIL_MAX_CHARS),
    })
}

fn drain(mut pipe: impl Read) -> String {
    let mut buffer = String::new();
    let _ = pipe.read_to_string(&mut buffer);
    buffer
}

#[cfg(test)]
mod tests {
    use super::{RunStatus, detect_verification_command, run_verification_command};

    #[test]
    fn a_succeeding_command_passes_and_captures_stdout() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let run = run_verification_command("printf gate-ok", dir.path(), 10_000)
            .expect("command should run");
        assert_eq!(run.status, RunStatus::Passed);
        assert_eq!(run.exit_code, Some(0));
        assert_eq!(run.stdout_tail, "gate-ok");
    }

    #[test]
    fn a_failing_command_reports_its_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let run = run_verification_command("exit 3", dir.path(), 10_000)
            .expect("command should run");
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.exit_code, Some(3));
    }

    #[test]
    fn an_expired_budget_is_a_distinct_timeout_outcome() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let run = run_verification_command("sleep 30", dir.path(), 200)
            .expect("command should run");
        assert_eq!(run.status, RunStatus::Timeout);
        assert_eq!(run.status.as_str(), "verification_timeout");
        assert!(run.exit_code.is_none());
        assert!(run.duration_ms < 10_000);
    }

    #[test]
    fn detection_prefers_the_first_matching_project_file() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        std::fs::write(dir.path().join("Cargo.toml"), "[package]").expect("write should succeed");
        std::fs::write(dir.path().join("go.mod"), "module demo").expect("write should succeed");

        let detected =
            detect_verification_command(dir.path()).expect("detection should find a command");
        assert_eq!(detected.command, "cargo test");
        assert_eq!(detected.source, "Cargo.toml");
    }

    #[test]
    fn detection_yields_nothing_for_an_unknown_layout() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        assert!(detect_verification_command(dir.path()).is_none());
    }
}
