//! Evaluation engine for the changegate admission gate.
//!
//! Pure passes over facts and rules (evaluation, traceability, churn
//! analytics, TDD/BDD enforcement) plus the generic stage runner that
//! composes them. Fact collection and evidence persistence are
//! injected through the traits in [`runner`].

pub mod evaluator;
pub mod hotspots;
pub mod platform;
pub mod presets;
pub mod runner;
pub mod stage;
pub mod tdd;
pub mod traceability;

pub use evaluator::{evaluate_rules, evaluate_rules_with_coverage, RuleEvaluation};
pub use runner::{
    run_stage_gate, EvidenceStore, FileEvidenceStore, GateScope, GitFacts, StageGateParams,
};
pub use traceability::attach_finding_traceability;
