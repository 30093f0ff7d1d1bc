//! Test-only scripted capabilities for driving cycles without subprocesses.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::core::conversation::ConversationTurn;
use crate::io::config::init_scaffold;
use crate::io::model::Model;
use crate::io::verify::{VerificationResult, Verifier};
use crate::io::workspace::Workspace;

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Respond with this text.
    Text(String),
    /// Fail the send with this message.
    Fail(String),
}

/// Model returning scripted responses in order; records every sent request.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    sent: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(
            responses
                .into_iter()
                .map(|text| ScriptedResponse::Text(text.into()))
                .collect(),
        )
    }

    pub fn with_script(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        self.sent.lock().expect("sent lock").len()
    }

    /// Every request sent so far, in order.
    pub fn sent_requests(&self) -> Vec<Vec<ConversationTurn>> {
        self.sent.lock().expect("sent lock").clone()
    }
}

impl Model for ScriptedModel {
    fn send(&self, turns: &[ConversationTurn]) -> Result<String> {
        self.sent.lock().expect("sent lock").push(turns.to_vec());
        match self.responses.lock().expect("responses lock").pop_front() {
            Some(ScriptedResponse::Text(text)) => Ok(text),
            Some(ScriptedResponse::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted model ran out of responses")),
        }
    }
}

/// Verifier returning scripted results in order; the last result repeats once
/// the script runs out. Both verification depths consume the same script.
pub struct ScriptedVerifier {
    results: Mutex<VecDeque<VerificationResult>>,
    last: Mutex<Option<VerificationResult>>,
    calls: Mutex<u32>,
}

impl ScriptedVerifier {
    pub fn new(results: Vec<VerificationResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    /// Verifier that always reports the given result.
    pub fn always(result: VerificationResult) -> Self {
        Self::new(vec![result])
    }

    pub fn passing() -> VerificationResult {
        VerificationResult {
            exit_code: Some(0),
            log: "ok".to_string(),
        }
    }

    pub fn failing(log: &str) -> VerificationResult {
        VerificationResult {
            exit_code: Some(1),
            log: log.to_string(),
        }
    }

    /// Pipeline that could not be started.
    pub fn unavailable() -> VerificationResult {
        VerificationResult {
            exit_code: None,
            log: String::new(),
        }
    }

    /// Number of verification runs so far.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().expect("calls lock")
    }

    fn next(&self) -> Result<VerificationResult> {
        *self.calls.lock().expect("calls lock") += 1;
        let mut results = self.results.lock().expect("results lock");
        if let Some(result) = results.pop_front() {
            *self.last.lock().expect("last lock") = Some(result.clone());
            return Ok(result);
        }
        self.last
            .lock()
            .expect("last lock")
            .clone()
            .ok_or_else(|| anyhow!("scripted verifier has no results"))
    }
}

impl Verifier for ScriptedVerifier {
    fn compile_and_test(&self) -> Result<VerificationResult> {
        self.next()
    }

    fn compile_only(&self) -> Result<VerificationResult> {
        self.next()
    }
}

/// Temp-dir project fixture with `.tdgen/` scaffolding.
pub struct TestProject {
    temp: tempfile::TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        init_scaffold(temp.path(), false)?;
        Ok(Self { temp })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::open(self.temp.path()).expect("open workspace")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        self.workspace()
            .overwrite_file(rel, contents)
            .expect("write fixture file");
    }
}

/// Wrap code in the fenced-block shape the model is instructed to produce.
pub fn fenced(tag: &str, code: &str) -> String {
    format!("```{tag}\n{code}\n```")
}
