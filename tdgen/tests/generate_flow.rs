//! End-to-end generate flow: scripted model, real verification commands.

use tdgen::cycle::{CycleOutcome, CycleRequest, VerifyMode, run_cycle};
use tdgen::io::config::CommandConfig;
use tdgen::io::prompt::{Flow, PromptEngine};
use tdgen::io::verify::CommandVerifier;
use tdgen::test_support::{ScriptedModel, TestProject, fenced};

fn stage(command: &[&str]) -> CommandConfig {
    CommandConfig {
        command: command.iter().map(|s| s.to_string()).collect(),
        ..CommandConfig::default()
    }
}

fn request(input: &str) -> CycleRequest {
    CycleRequest {
        target: "src/index.ts".to_string(),
        input: input.to_string(),
        flow: Flow::Implementation,
        mode: VerifyMode::CompileAndTest,
    }
}

/// The verification pipeline judges the artifact the cycle actually wrote:
/// the first response fails the build check, the fix response passes it.
#[test]
fn fix_cycle_repairs_the_artifact_until_the_pipeline_passes() {
    let project = TestProject::new().expect("project");
    let workspace = project.workspace();

    let model = ScriptedModel::new([
        fenced("js: index.js", "let placeholder = 1;"),
        fenced("js: index.js", "export const sum = (a: number, b: number) => a + b;"),
    ]);
    let verifier = CommandVerifier::new(
        project.root(),
        &stage(&["sh", "-c", "grep -q 'const sum' src/index.ts"]),
        &stage(&["true"]),
    );
    let engine = PromptEngine::new("jest");

    let outcome = run_cycle(
        &workspace,
        &model,
        &verifier,
        &engine,
        &request("test('adds', () => expect(sum(1, 2)).toBe(3));"),
    )
    .expect("cycle");

    assert_eq!(outcome, CycleOutcome::Succeeded { fix_attempts: 1 });
    let artifact = workspace.read_file("src/index.ts").expect("read artifact");
    assert!(artifact.contains("const sum"));
}

/// A pipeline that never passes runs the full retry budget and leaves one
/// attempt directory per verification.
#[test]
fn persistent_build_failure_exhausts_the_budget_with_attempt_logs() {
    let project = TestProject::new().expect("project");
    let workspace = project.workspace();

    let model = ScriptedModel::new(vec![fenced("js", "still broken"); 6]);
    let verifier = CommandVerifier::new(
        project.root(),
        &stage(&["sh", "-c", "echo 'error TS2304' >&2; exit 2"]),
        &stage(&["true"]),
    );
    let engine = PromptEngine::new("jest");

    let outcome = run_cycle(&workspace, &model, &verifier, &engine, &request("tests"))
        .expect("cycle");

    assert_eq!(outcome, CycleOutcome::Exhausted { fix_attempts: 5 });
    let cycles_dir = project.root().join(".tdgen/cycles/src-index.ts");
    for attempt in 0..=5 {
        let dir = cycles_dir.join(attempt.to_string());
        assert!(dir.join("meta.json").is_file(), "missing attempt {attempt}");
        let log = std::fs::read_to_string(dir.join("verify.log")).expect("read verify log");
        assert!(log.contains("error TS2304"));
    }
    assert!(!cycles_dir.join("6").exists());
}

/// Re-running against an already-satisfiable input takes the straight
/// Generating -> Verifying -> Succeeded path with zero fix cycles.
#[test]
fn immediately_passing_pipeline_needs_no_fixes() {
    let project = TestProject::new().expect("project");
    let workspace = project.workspace();

    let model = ScriptedModel::new([fenced("js", "export const ok = true;")]);
    let verifier = CommandVerifier::new(project.root(), &stage(&["true"]), &stage(&["true"]));
    let engine = PromptEngine::new("jest");

    let outcome = run_cycle(&workspace, &model, &verifier, &engine, &request("tests"))
        .expect("cycle");

    assert_eq!(outcome, CycleOutcome::Succeeded { fix_attempts: 0 });
    assert_eq!(model.calls(), 1);
}
