//! Filesystem capability over a configured project root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;
use walkdir::WalkDir;

/// File read/write/discovery rooted at the project directory.
///
/// All paths handed to the workspace are relative to `root`. Content writes
/// fully replace the target, never merge.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open a workspace. Fails when the root directory does not exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(anyhow!("no workspace at {}", root.display()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    pub fn read_file(&self, rel: impl AsRef<Path>) -> Result<String> {
        let path = self.resolve(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    /// Create a file if missing (idempotent), including parent directories.
    pub fn create_file(&self, rel: impl AsRef<Path>) -> Result<()> {
        let path = self.resolve(rel);
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, "").with_context(|| format!("create {}", path.display()))
    }

    /// Replace the file's entire content atomically (temp file + rename).
    pub fn overwrite_file(&self, rel: impl AsRef<Path>, contents: &str) -> Result<()> {
        let path = self.resolve(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let tmp = path.with_extension("tdgen.tmp");
        fs::write(&tmp, contents).with_context(|| format!("write temp {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("replace {}", path.display()))?;
        debug!(path = %path.display(), bytes = contents.len(), "artifact written");
        Ok(())
    }

    /// List files under `dir` whose names end in `suffix`, sorted for
    /// deterministic prompt assembly.
    pub fn list_test_files(&self, dir: impl AsRef<Path>, suffix: &str) -> Result<Vec<PathBuf>> {
        let dir = self.resolve(dir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walk {}", dir.display()))?;
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(suffix)
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Concatenate every test file under `dir` into one combined input.
    pub fn combined_test_input(&self, dir: impl AsRef<Path>, suffix: &str) -> Result<String> {
        let files = self.list_test_files(dir, suffix)?;
        let mut buf = String::new();
        for path in &files {
            let contents =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            buf.push_str(&contents);
            if !contents.ends_with('\n') {
                buf.push('\n');
            }
        }
        Ok(buf)
    }
}
