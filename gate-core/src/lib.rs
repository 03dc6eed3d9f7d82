//! Core data model for the changegate admission engine.
//!
//! Facts, rules, findings, gate policy and the merge semantics that
//! protect locked baseline rules. Everything here is plain immutable
//! data plus pure functions; all I/O lives in the sibling crates.

pub mod config;
pub mod errors;
pub mod facts;
pub mod findings;
pub mod hash;
pub mod policy;
pub mod rules;

pub use config::{EnforcementConfig, FilesConfig, GateConfig, HotspotConfig};
pub use errors::{ConfigError, EvidenceError, GateError, GitError};
pub use facts::{ChangeType, Fact};
pub use findings::Finding;
pub use policy::{
    evaluate_gate, resolve_policy_for_stage, GateDecision, GateOutcome, GatePolicy, GateStage,
    PolicyTrace, ResolvedStagePolicy,
};
pub use rules::{
    merge_rule_sets, Condition, FileChangeWhere, FindingTemplate, HeuristicWhere, MergeOptions,
    RuleDefinition, RuleScope, RuleSet, Severity,
};
