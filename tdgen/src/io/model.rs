//! Model capability: send a conversation, receive the full response text.
//!
//! The [`Model`] trait decouples cycle orchestration from the actual model
//! backend (currently a chat CLI subprocess). Tests use scripted models that
//! return predetermined responses without spawning processes.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::conversation::ConversationTurn;
use crate::io::config::ModelConfig;
use crate::io::process::run_command_with_timeout;

/// Abstraction over generative-model backends.
///
/// `send` returns only after the response stream has fully accumulated;
/// callers parse the materialized text.
pub trait Model {
    fn send(&self, turns: &[ConversationTurn]) -> Result<String>;
}

/// Model backed by a chat CLI subprocess.
///
/// The transcript is rendered with role markers and piped to stdin; stdout is
/// drained incrementally until the process exits, then returned as the
/// response text.
pub struct CommandModel {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandModel {
    pub fn new(cfg: &ModelConfig) -> Self {
        Self {
            command: cfg.command.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        }
    }
}

/// Render turns as the text fed to the chat CLI, one role marker per turn.
fn render_turns(turns: &[ConversationTurn]) -> String {
    let mut buf = String::new();
    for turn in turns {
        buf.push_str(&format!("[{}]\n{}\n\n", turn.role.as_str(), turn.text));
    }
    buf
}

impl Model for CommandModel {
    #[instrument(skip_all, fields(turns = turns.len(), timeout_secs = self.timeout.as_secs()))]
    fn send(&self, turns: &[ConversationTurn]) -> Result<String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("model command is empty"))?;
        info!(command = %program, "sending model request");

        let mut cmd = Command::new(program);
        cmd.args(args);
        let rendered = render_turns(turns);

        let output = run_command_with_timeout(
            cmd,
            Some(rendered.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )
        .context("run model command")?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "model command timed out");
            return Err(anyhow!("model command timed out after {:?}", self.timeout));
        }
        if !output.success() {
            warn!(exit_code = ?output.exit_code, "model command failed");
            return Err(anyhow!(
                "model command failed with status {:?}",
                output.exit_code
            ));
        }

        debug!(bytes = output.stdout.len(), "model response accumulated");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
