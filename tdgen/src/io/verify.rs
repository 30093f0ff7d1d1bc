//! Verification pipeline: compile then test, or compile only.
//!
//! The [`Verifier`] trait decouples cycle orchestration from process
//! execution. The batch flow only needs syntactic/type validity of generated
//! test files, so it uses [`Verifier::compile_only`]; running the full suite
//! after every generated file would be wasteful.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::ansi::strip_ansi;
use crate::io::config::CommandConfig;
use crate::io::process::run_command_with_timeout;

/// Normalized outcome of one verification run.
///
/// `exit_code` is `None` when the pipeline could not be started (or did not
/// produce an exit code); the caller surfaces that as a distinct environment
/// problem while still spending retry budget on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub exit_code: Option<i32>,
    pub log: String,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Abstraction over the build-and-test pipeline.
pub trait Verifier {
    /// Build, then run the test suite. Tests are skipped when the build
    /// fails; they are not trustworthy against code that does not compile.
    fn compile_and_test(&self) -> Result<VerificationResult>;

    /// Build only.
    fn compile_only(&self) -> Result<VerificationResult>;
}

/// Verifier that spawns the configured build and test commands.
pub struct CommandVerifier {
    workdir: PathBuf,
    build: CommandConfig,
    test: CommandConfig,
}

impl CommandVerifier {
    pub fn new(workdir: impl Into<PathBuf>, build: &CommandConfig, test: &CommandConfig) -> Self {
        Self {
            workdir: workdir.into(),
            build: build.clone(),
            test: test.clone(),
        }
    }

    #[instrument(skip_all, fields(command = ?stage.command))]
    fn run_stage(&self, stage: &CommandConfig) -> Result<VerificationResult> {
        let (program, args) = stage
            .command
            .split_first()
            .ok_or_else(|| anyhow!("verification command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.workdir);

        let timeout = Duration::from_secs(stage.timeout_secs);
        let output =
            match run_command_with_timeout(cmd, None, timeout, stage.output_limit_bytes) {
                Ok(output) => output,
                Err(err) => {
                    // Unstartable pipelines are reported by the caller, not thrown.
                    warn!(err = %err, "verification stage could not run");
                    return Ok(VerificationResult {
                        exit_code: None,
                        log: String::new(),
                    });
                }
            };

        if output.timed_out {
            warn!(timeout_secs = stage.timeout_secs, "verification stage timed out");
            return Ok(VerificationResult {
                exit_code: None,
                log: format!(
                    "[verification timed out after {}s]\n{}",
                    stage.timeout_secs,
                    strip_ansi(&output.combined_text())
                ),
            });
        }

        debug!(exit_code = ?output.exit_code, "verification stage finished");
        Ok(VerificationResult {
            exit_code: output.exit_code,
            log: strip_ansi(&output.combined_text()),
        })
    }
}

impl Verifier for CommandVerifier {
    fn compile_and_test(&self) -> Result<VerificationResult> {
        let build = self.run_stage(&self.build)?;
        if !build.passed() {
            return Ok(build);
        }
        self.run_stage(&self.test)
    }

    fn compile_only(&self) -> Result<VerificationResult> {
        self.run_stage(&self.build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(command: &[&str]) -> CommandConfig {
        CommandConfig {
            command: command.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 5,
            output_limit_bytes: 100_000,
        }
    }

    fn verifier(build: &[&str], test: &[&str]) -> CommandVerifier {
        let temp = std::env::temp_dir();
        CommandVerifier::new(temp, &stage(build), &stage(test))
    }

    #[test]
    fn passing_build_runs_tests() {
        let v = verifier(&["true"], &["sh", "-c", "echo 2 tests passed"]);
        let result = v.compile_and_test().expect("verify");
        assert!(result.passed());
        assert!(result.log.contains("2 tests passed"));
    }

    #[test]
    fn failing_build_skips_tests() {
        let v = verifier(
            &["sh", "-c", "echo build broke >&2; exit 2"],
            &["sh", "-c", "echo tests ran"],
        );
        let result = v.compile_and_test().expect("verify");
        assert_eq!(result.exit_code, Some(2));
        assert!(result.log.contains("build broke"));
        assert!(!result.log.contains("tests ran"));
    }

    #[test]
    fn compile_only_never_runs_tests() {
        let v = verifier(&["true"], &["sh", "-c", "echo tests ran"]);
        let result = v.compile_only().expect("verify");
        assert!(result.passed());
        assert!(!result.log.contains("tests ran"));
    }

    #[test]
    fn log_is_ansi_stripped() {
        let v = verifier(
            &["sh", "-c", "printf '\\033[31merror TS1005\\033[0m\\n'; exit 1"],
            &["true"],
        );
        let result = v.compile_and_test().expect("verify");
        assert_eq!(result.exit_code, Some(1));
        assert_eq!(result.log, "error TS1005\n");
    }

    #[test]
    fn unstartable_pipeline_yields_no_exit_code() {
        let v = verifier(&["tdgen-no-such-compiler-xyz"], &["true"]);
        let result = v.compile_and_test().expect("verify");
        assert_eq!(result.exit_code, None);
        assert_eq!(result.log, "");
    }
}
