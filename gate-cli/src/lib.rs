//! Stage binaries — thin wiring around the engine.
//!
//! Each binary resolves the repository, configuration, stage policy
//! and fact scope, then hands off to `run_stage_gate`. All decisions
//! live in the engine; the binaries only translate the environment
//! into parameters and errors into exit codes.

use std::path::{Path, PathBuf};

use gate_core::{resolve_policy_for_stage, GateConfig, GateError, GateStage};
use gate_engine::{run_stage_gate, FileEvidenceStore, GateScope, StageGateParams};
use gate_git::{resolve_ci_range, resolve_pre_push_range, GitRepo};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber once per process. `RUST_LOG`
/// controls verbosity, default `warn`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .try_init();
}

/// Entry point shared by the three binaries: run the gate for `stage`
/// and return the process exit code.
pub fn run(stage: GateStage) -> i32 {
    init_tracing();
    match try_run(stage) {
        Ok(exit_code) => exit_code,
        Err(err) => {
            // Fail safe: no evidence is written past this point.
            error!(%stage, %err, "gate run aborted");
            eprintln!("changegate {stage}: {err}");
            1
        }
    }
}

fn try_run(stage: GateStage) -> Result<i32, GateError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let repo = GitRepo::discover(&cwd)?;
    let root = repo.root().to_path_buf();

    let config = GateConfig::load(&root)?;
    let repo = repo.with_max_content_bytes(config.files.max_content_bytes);

    let scope = resolve_scope(stage, &root)?;
    let resolved = resolve_policy_for_stage(stage, &root);

    run_stage_gate(
        &StageGateParams {
            policy: resolved.policy,
            policy_trace: resolved.trace,
            scope,
        },
        &repo,
        &FileEvidenceStore,
    )
}

fn resolve_scope(stage: GateStage, repo_root: &Path) -> Result<GateScope, GateError> {
    match stage {
        GateStage::PreCommit => Ok(GateScope::Staged),
        GateStage::PrePush => {
            let range = resolve_pre_push_range(repo_root)?;
            Ok(GateScope::Range {
                from_ref: range.from_ref,
                to_ref: range.to_ref,
            })
        }
        GateStage::Ci => {
            let base = std::env::var("GITHUB_BASE_REF").ok();
            let range = resolve_ci_range(repo_root, base.as_deref())?;
            Ok(GateScope::Range {
                from_ref: range.from_ref,
                to_ref: range.to_ref,
            })
        }
    }
}
