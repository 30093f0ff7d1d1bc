//! Loop configuration stored under `.tdgen/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Generation loop configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values for a TypeScript
/// project verified with `tsc` and jest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoopConfig {
    /// Implementation file the primary flow overwrites.
    pub source_file: String,

    /// Directory scanned for test files (primary input, batch output).
    pub test_dir: String,

    /// File-name suffix that marks a test file.
    pub test_suffix: String,

    /// Specification document consumed by the batch flow.
    pub spec_file: String,

    /// File-name pattern for generated test files; `{index}` is 1-based.
    pub test_file_pattern: String,

    /// Test framework named in the test-generation prompt.
    pub framework: String,

    pub model: ModelConfig,
    pub build: CommandConfig,
    pub test: CommandConfig,
}

/// Chat CLI invoked with the rendered transcript on stdin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    pub command: Vec<String>,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

/// One verification stage (build or test).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandConfig {
    pub command: Vec<String>,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            source_file: "src/index.ts".to_string(),
            test_dir: "src/test".to_string(),
            test_suffix: ".test.ts".to_string(),
            spec_file: "test-case.md".to_string(),
            test_file_pattern: "test-case-{index}.test.ts".to_string(),
            framework: "jest".to_string(),
            model: ModelConfig::default(),
            build: CommandConfig {
                command: vec!["npx".to_string(), "tsc".to_string()],
                ..CommandConfig::default()
            },
            test: CommandConfig {
                command: vec!["npm".to_string(), "run".to_string(), "test".to_string()],
                ..CommandConfig::default()
            },
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "codex".to_string(),
                "exec".to_string(),
                "--skip-git-repo-check".to_string(),
                "-".to_string(),
            ],
            timeout_secs: 10 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: 10 * 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source_file.trim().is_empty() {
            return Err(anyhow!("source_file must not be empty"));
        }
        if self.test_dir.trim().is_empty() {
            return Err(anyhow!("test_dir must not be empty"));
        }
        if self.test_suffix.trim().is_empty() {
            return Err(anyhow!("test_suffix must not be empty"));
        }
        if !self.test_file_pattern.contains("{index}") {
            return Err(anyhow!("test_file_pattern must contain '{{index}}'"));
        }
        validate_command("model.command", &self.model.command)?;
        validate_command("build.command", &self.build.command)?;
        validate_command("test.command", &self.test.command)?;
        for (label, secs) in [
            ("model.timeout_secs", self.model.timeout_secs),
            ("build.timeout_secs", self.build.timeout_secs),
            ("test.timeout_secs", self.test.timeout_secs),
        ] {
            if secs == 0 {
                return Err(anyhow!("{label} must be > 0"));
            }
        }
        for (label, bytes) in [
            ("model.output_limit_bytes", self.model.output_limit_bytes),
            ("build.output_limit_bytes", self.build.output_limit_bytes),
            ("test.output_limit_bytes", self.test.output_limit_bytes),
        ] {
            if bytes == 0 {
                return Err(anyhow!("{label} must be > 0"));
            }
        }
        Ok(())
    }
}

fn validate_command(label: &str, command: &[String]) -> Result<()> {
    if command.is_empty() || command[0].trim().is_empty() {
        return Err(anyhow!("{label} must be a non-empty array"));
    }
    Ok(())
}

/// All canonical paths within `.tdgen/` for a project root.
#[derive(Debug, Clone)]
pub struct TdgenPaths {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub cycles_dir: PathBuf,
    pub gitignore_path: PathBuf,
}

impl TdgenPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = root.join(".tdgen");
        Self {
            root,
            config_path: state_dir.join("config.toml"),
            cycles_dir: state_dir.join("cycles"),
            gitignore_path: state_dir.join(".gitignore"),
            state_dir,
        }
    }
}

const TDGEN_GITIGNORE: &str = "cycles/\n";

/// Create `.tdgen/` scaffolding in `root`.
///
/// Fails if `.tdgen/` already exists unless `force` is set.
pub fn init_scaffold(root: &Path, force: bool) -> Result<TdgenPaths> {
    let paths = TdgenPaths::new(root);
    if paths.state_dir.exists() && !force {
        return Err(anyhow!(
            "tdgen init: .tdgen already exists (use --force to overwrite)"
        ));
    }
    fs::create_dir_all(&paths.state_dir)
        .with_context(|| format!("create {}", paths.state_dir.display()))?;
    fs::create_dir_all(&paths.cycles_dir)
        .with_context(|| format!("create {}", paths.cycles_dir.display()))?;
    fs::write(&paths.gitignore_path, TDGEN_GITIGNORE)
        .with_context(|| format!("write {}", paths.gitignore_path.display()))?;
    write_config(&paths.config_path, &LoopConfig::default())?;
    Ok(paths)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LoopConfig::default()`.
pub fn load_config(path: &Path) -> Result<LoopConfig> {
    if !path.exists() {
        let cfg = LoopConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LoopConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LoopConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, LoopConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = LoopConfig::default();
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn validate_rejects_missing_index_placeholder() {
        let cfg = LoopConfig {
            test_file_pattern: "generated.test.ts".to_string(),
            ..LoopConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("{index}"));
    }

    #[test]
    fn validate_rejects_empty_build_command() {
        let cfg = LoopConfig {
            build: CommandConfig {
                command: Vec::new(),
                ..CommandConfig::default()
            },
            ..LoopConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("build.command"));
    }

    #[test]
    fn init_scaffold_writes_config_and_gitignore() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_scaffold(temp.path(), false).expect("init");
        assert!(paths.config_path.is_file());
        assert!(paths.cycles_dir.is_dir());
        assert!(paths.gitignore_path.is_file());

        let err = init_scaffold(temp.path(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        init_scaffold(temp.path(), true).expect("force reinit");
    }
}
