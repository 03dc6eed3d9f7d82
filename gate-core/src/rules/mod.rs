//! Rule model — declarative, serializable rule records and the merge
//! semantics that combine baseline, bundle and project rule sources.

pub mod condition;
pub mod definition;
pub mod merge;
pub mod severity;

pub use condition::{Condition, FileChangeWhere, HeuristicWhere};
pub use definition::{FindingTemplate, RuleDefinition, RuleScope, RuleSet};
pub use merge::{merge_rule_sets, MergeOptions};
pub use severity::Severity;
