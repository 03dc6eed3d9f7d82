//! Rule definitions — serializable records, not a class hierarchy.
//! Platform catalogs are plain lists loaded from versioned bundles.

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::severity::Severity;

/// A flat list of rules with unique ids.
pub type RuleSet = Vec<RuleDefinition>;

/// The finding emitted when a rule matches. `code` falls back to the
/// rule id when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// Restricts rule applicability by path glob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleScope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl RuleScope {
    /// True when the path survives the exclude globs and matches at
    /// least one include glob (or no includes are set).
    pub fn allows(&self, path: &str) -> bool {
        let matches_any = |patterns: &[String]| {
            patterns.iter().any(|pattern| {
                glob::Pattern::new(pattern)
                    .map(|p| p.matches(path))
                    .unwrap_or(false)
                    || path.starts_with(prefix_of(pattern))
            })
        };
        if !self.exclude.is_empty() && matches_any(&self.exclude) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        matches_any(&self.include)
    }
}

/// Glob prefix up to the first wildcard, so `apps/backend/*` also
/// behaves as an `apps/backend/` prefix filter.
fn prefix_of(pattern: &str) -> &str {
    match pattern.find(['*', '?', '[']) {
        Some(index) => &pattern[..index],
        None => pattern,
    }
}

/// One declarative rule. `id` is globally unique and stable — it is
/// also the join key for project-level overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Baseline protection: a locked rule's severity may not be
    /// silently weakened by a project override.
    #[serde(default)]
    pub locked: bool,
    pub when: Condition,
    pub then: FindingTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<RuleScope>,
}

fn default_platform() -> String {
    "generic".to_string()
}

impl RuleDefinition {
    /// The finding code this rule emits.
    pub fn finding_code(&self) -> &str {
        self.then.code.as_deref().unwrap_or(&self.id)
    }

    /// True when `path` is inside this rule's scope.
    pub fn applies_to_path(&self, path: &str) -> bool {
        match &self.scope {
            Some(scope) => scope.allows(path),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped(include: &[&str], exclude: &[&str]) -> RuleScope {
        RuleScope {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn scope_include_acts_as_prefix() {
        let scope = scoped(&["apps/backend/*"], &[]);
        assert!(scope.allows("apps/backend/src/main.ts"));
        assert!(!scope.allows("apps/frontend/src/App.tsx"));
    }

    #[test]
    fn scope_exclude_wins_over_include() {
        let scope = scoped(&["apps/*"], &["apps/legacy/*"]);
        assert!(scope.allows("apps/backend/src/main.ts"));
        assert!(!scope.allows("apps/legacy/src/old.ts"));
    }

    #[test]
    fn empty_scope_allows_everything() {
        assert!(RuleScope::default().allows("anything/at/all.swift"));
    }

    #[test]
    fn finding_code_falls_back_to_rule_id() {
        let rule = RuleDefinition {
            id: "rule.code.fallback".to_string(),
            description: "fallback".to_string(),
            severity: Severity::Error,
            platform: "generic".to_string(),
            locked: false,
            when: Condition::any_file_change(),
            then: FindingTemplate {
                code: None,
                message: "matched".to_string(),
            },
            scope: None,
        };
        assert_eq!(rule.finding_code(), "rule.code.fallback");
    }
}
