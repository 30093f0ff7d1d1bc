//! Orchestration for one generate-verify-fix cycle against a single artifact.

use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument, warn};

use crate::core::conversation::{ConversationLog, ConversationTurn};
use crate::core::parse::parse_response;
use crate::core::retry::{RETRY_CEILING, RetryState};
use crate::io::attempt_log::{AttemptMeta, AttemptWriteRequest, cycle_dir_name, write_attempt};
use crate::io::model::Model;
use crate::io::prompt::{Flow, PromptEngine, fix_turns, generation_turns};
use crate::io::verify::{VerificationResult, Verifier};
use crate::io::workspace::Workspace;

/// Verification depth for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Build, then run the test suite (primary flow).
    CompileAndTest,
    /// Build only (batch test generation).
    CompileOnly,
}

/// Input for one cycle.
#[derive(Debug, Clone)]
pub struct CycleRequest {
    /// Workspace-relative path of the artifact to write.
    pub target: String,
    /// Caller-supplied input: combined test code, or one spec segment.
    pub input: String,
    pub flow: Flow,
    pub mode: VerifyMode,
}

/// Terminal state of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Verification reached exit code 0.
    Succeeded { fix_attempts: u32 },
    /// The retry ceiling was reached without a passing verification.
    Exhausted { fix_attempts: u32 },
    /// The model declared the task infeasible; the artifact was not written.
    Impossible { reason: String },
}

impl CycleOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, CycleOutcome::Succeeded { .. })
    }
}

/// Run one generate-verify-fix cycle.
///
/// State machine: Generating -> Verifying -> (Succeeded | Fixing -> Verifying
/// -> ...) until success, exhaustion, or a declared impossibility. A declared
/// impossibility is a terminal result, never retried. Capability errors
/// during generation propagate to the caller; capability errors during a fix
/// force the retry state to the ceiling instead of looping against a broken
/// environment.
#[instrument(skip_all, fields(target = %request.target))]
pub fn run_cycle<M: Model, V: Verifier>(
    workspace: &Workspace,
    model: &M,
    verifier: &V,
    engine: &PromptEngine,
    request: &CycleRequest,
) -> Result<CycleOutcome> {
    let start = Instant::now();
    let mut log = ConversationLog::new();
    let mut retry = RetryState::new(RETRY_CEILING);

    // Generating
    let prompt = engine.generation_prompt(request.flow)?;
    let turns = generation_turns(&prompt, &request.input);
    for turn in &turns {
        log.append(turn.clone());
    }
    let raw = model.send(&turns).context("send generation request")?;
    let outcome = parse_response(&raw);
    log.append(ConversationTurn::assistant(raw.clone()));
    if !outcome.possible {
        info!("model declared generation impossible");
        return Ok(CycleOutcome::Impossible {
            reason: outcome.content,
        });
    }

    workspace.create_file(&request.target)?;
    workspace.overwrite_file(&request.target, &outcome.content)?;
    let mut last_response = raw;

    // Verifying / Fixing
    let cycle_name = cycle_dir_name(&request.target);
    loop {
        let result = verify(verifier, request.mode)?;
        record_attempt(
            workspace,
            &cycle_name,
            request,
            retry.attempts(),
            &result,
            &last_response,
            start,
        )?;

        if result.passed() {
            info!(fix_attempts = retry.attempts(), "verification passed");
            return Ok(CycleOutcome::Succeeded {
                fix_attempts: retry.attempts(),
            });
        }
        if result.exit_code.is_none() {
            // Pipeline never ran; distinct surface, but still spends budget.
            warn!("verification pipeline unavailable");
        }
        if retry.exhausted() {
            info!(fix_attempts = retry.attempts(), "retry budget exhausted");
            return Ok(CycleOutcome::Exhausted {
                fix_attempts: retry.attempts(),
            });
        }

        match run_fix(workspace, model, engine, request, &mut log, &result) {
            Ok(response) => last_response = response,
            Err(err) => {
                warn!(err = %err, "fix cycle failed");
                retry.force_exhaust();
                return Ok(CycleOutcome::Exhausted {
                    fix_attempts: retry.attempts(),
                });
            }
        }
        retry.record_attempt();
    }
}

fn verify<V: Verifier>(verifier: &V, mode: VerifyMode) -> Result<VerificationResult> {
    match mode {
        VerifyMode::CompileAndTest => verifier.compile_and_test(),
        VerifyMode::CompileOnly => verifier.compile_only(),
    }
}

/// One Fixing transition: replay the transcript, send the fix request, write
/// the corrected artifact. Returns the raw model response.
fn run_fix<M: Model>(
    workspace: &Workspace,
    model: &M,
    engine: &PromptEngine,
    request: &CycleRequest,
    log: &mut ConversationLog,
    result: &VerificationResult,
) -> Result<String> {
    let code = workspace.read_file(&request.target)?;
    let prompt = engine.fix_prompt(request.flow)?;
    // The replayed transcript is rendered before the fix-specific turns are
    // appended to the log.
    let transcript = log.render();
    let turns = fix_turns(&transcript, &prompt, &result.log, &code);
    log.append(ConversationTurn::user(prompt));
    log.append(ConversationTurn::user(result.log.clone()));
    log.append(ConversationTurn::user(code));

    let raw = model.send(&turns).context("send fix request")?;
    let outcome = parse_response(&raw);
    log.append(ConversationTurn::assistant(raw.clone()));
    if !outcome.possible {
        return Err(anyhow!("Code Generation is impossible.{}", outcome.content));
    }
    workspace.overwrite_file(&request.target, &outcome.content)?;
    Ok(raw)
}

fn record_attempt(
    workspace: &Workspace,
    cycle: &str,
    request: &CycleRequest,
    attempt: u32,
    result: &VerificationResult,
    response: &str,
    started: Instant,
) -> Result<()> {
    let meta = AttemptMeta {
        target: request.target.clone(),
        attempt,
        exit_code: result.exit_code,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    write_attempt(&AttemptWriteRequest {
        root: workspace.root(),
        cycle,
        attempt,
        meta: &meta,
        response,
        verify_log: &result.log,
    })?;
    Ok(())
}
