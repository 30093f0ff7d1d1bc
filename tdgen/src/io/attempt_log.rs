//! Attempt logging under `.tdgen/cycles/`.
//!
//! Every verification attempt leaves a directory of artifacts so a run can be
//! inspected after the fact: the raw model response that produced the current
//! artifact, the verification log it earned, and a small metadata record.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Metadata record for one verification attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptMeta {
    /// Artifact this cycle targets, workspace-relative.
    pub target: String,
    /// 0 for the initial generation, 1.. for fix attempts.
    pub attempt: u32,
    /// Verification exit code; `None` when the pipeline could not run.
    pub exit_code: Option<i32>,
    /// Elapsed time since the cycle started.
    pub duration_ms: u64,
}

/// Canonical paths for one attempt directory.
#[derive(Debug, Clone)]
pub struct AttemptPaths {
    pub dir: PathBuf,
    pub meta_path: PathBuf,
    pub response_path: PathBuf,
    pub verify_log_path: PathBuf,
}

impl AttemptPaths {
    pub fn new(root: &Path, cycle: &str, attempt: u32) -> Self {
        let dir = root
            .join(".tdgen")
            .join("cycles")
            .join(cycle)
            .join(attempt.to_string());
        Self {
            meta_path: dir.join("meta.json"),
            response_path: dir.join("response.md"),
            verify_log_path: dir.join("verify.log"),
            dir,
        }
    }
}

/// Directory name for a cycle, derived from its target path.
pub fn cycle_dir_name(target: &str) -> String {
    target.replace(['/', '\\'], "-")
}

pub struct AttemptWriteRequest<'a> {
    pub root: &'a Path,
    pub cycle: &'a str,
    pub attempt: u32,
    pub meta: &'a AttemptMeta,
    /// Raw model response that produced the artifact under verification.
    pub response: &'a str,
    pub verify_log: &'a str,
}

pub fn write_attempt(request: &AttemptWriteRequest<'_>) -> Result<AttemptPaths> {
    let paths = AttemptPaths::new(request.root, request.cycle, request.attempt);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create attempt dir {}", paths.dir.display()))?;

    // Write in deterministic order to keep logs stable.
    write_json(&paths.meta_path, request.meta)?;
    write_text(&paths.response_path, request.response)?;
    write_text(&paths.verify_log_path, request.verify_log)?;

    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}
