//! Scope classification: decides whether a change set requires
//! test-first evidence at all.

use gate_core::{ChangeType, EnforcementConfig, Fact};
use gate_evidence::schema::{TddBddScope, TddBddScopeMetrics};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Classification result. A change is in scope when it adds
/// implementation files (new feature) or crosses a complexity signal.
#[derive(Debug, Clone)]
pub struct ScopeDecision {
    pub in_scope: bool,
    pub is_new_feature: bool,
    pub is_complex_change: bool,
    pub reasons: Vec<String>,
    pub changed_files: u32,
    pub estimated_loc: u32,
    pub critical_path_files: u32,
    pub public_interface_files: u32,
}

impl ScopeDecision {
    pub fn to_snapshot_scope(&self) -> TddBddScope {
        TddBddScope {
            in_scope: self.in_scope,
            is_new_feature: self.is_new_feature,
            is_complex_change: self.is_complex_change,
            reasons: self.reasons.clone(),
            metrics: TddBddScopeMetrics {
                changed_files: self.changed_files,
                estimated_loc: self.estimated_loc,
                critical_path_files: self.critical_path_files,
                public_interface_files: self.public_interface_files,
            },
        }
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

fn is_test_path(path: &str) -> bool {
    let normalized = normalize(path);
    const TEST_SUFFIXES: &[&str] = &[
        ".spec.ts", ".spec.tsx", ".spec.js", ".spec.jsx", ".test.ts", ".test.tsx", ".test.js",
        ".test.jsx", "test.swift", "tests.swift", "test.kt", "tests.kt", "_test.rs", "_test.go",
    ];
    normalized.contains("/__tests__/")
        || normalized.contains("/tests/")
        || normalized.contains("/test/")
        || TEST_SUFFIXES.iter().any(|suffix| normalized.ends_with(suffix))
}

fn is_feature_path(path: &str) -> bool {
    normalize(path).ends_with(".feature")
}

fn is_implementation_path(path: &str) -> bool {
    let normalized = normalize(path);
    if is_test_path(&normalized) || is_feature_path(&normalized) {
        return false;
    }
    const IMPLEMENTATION_EXTENSIONS: &[&str] =
        &["ts", "tsx", "js", "jsx", "swift", "kt", "kts", "dart", "rs", "go"];
    normalized
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMPLEMENTATION_EXTENSIONS.contains(&ext))
}

const CRITICAL_PATH_SEGMENTS: &[&str] = &[
    "/domain/",
    "/application/",
    "/core/",
    "/use-cases/",
    "/presentation/",
    "/api/",
    "/controllers/",
    "/contracts/",
];

fn touches_critical_path(path: &str) -> bool {
    let normalized = normalize(path);
    CRITICAL_PATH_SEGMENTS
        .iter()
        .any(|segment| normalized.contains(segment))
}

fn public_interface_regexes() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\bexport\s+class\b",
            r"\bexport\s+interface\b",
            r"\bexport\s+type\b",
            r"\bexport\s+function\b",
            r"(?i)\bpublic\s+(?:func|class|interface|type|enum)\b",
            r"(?i)\bprotocol\s+[A-Za-z0-9_]+",
            r"(?i)\bopen\s+class\b",
            r"\bpub\s+(?:fn|struct|enum|trait)\b",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

fn has_public_interface_token(content: &str) -> bool {
    public_interface_regexes()
        .iter()
        .any(|regex| regex.is_match(content))
}

/// Classify the change set against the complexity thresholds.
pub fn classify_tdd_bdd_scope(facts: &[Fact], config: &EnforcementConfig) -> ScopeDecision {
    let mut changed: FxHashSet<String> = FxHashSet::default();
    let mut added: FxHashSet<String> = FxHashSet::default();
    let mut critical: FxHashSet<String> = FxHashSet::default();
    let mut public_interface: FxHashSet<String> = FxHashSet::default();
    let mut estimated_loc: u32 = 0;

    for fact in facts {
        match fact {
            Fact::FileChange {
                path, change_type, ..
            } => {
                if !is_implementation_path(path) {
                    continue;
                }
                let normalized = path.replace('\\', "/");
                changed.insert(normalized.clone());
                if *change_type == ChangeType::Added {
                    added.insert(normalized.clone());
                }
                if touches_critical_path(&normalized) {
                    critical.insert(normalized);
                }
            }
            Fact::FileContent { path, content, .. } => {
                if !is_implementation_path(path) {
                    continue;
                }
                let normalized = path.replace('\\', "/");
                estimated_loc += content.lines().count() as u32;
                if touches_critical_path(&normalized) {
                    critical.insert(normalized.clone());
                }
                if has_public_interface_token(content) {
                    public_interface.insert(normalized);
                }
            }
            Fact::Heuristic { .. } => {}
        }
    }

    let mut reasons = Vec::new();
    if changed.len() as u32 > config.max_slice_files {
        reasons.push("complex.changed_files_threshold".to_string());
    }
    if estimated_loc > config.max_slice_lines {
        reasons.push("complex.estimated_loc_threshold".to_string());
    }
    if !critical.is_empty() {
        reasons.push("complex.critical_paths_touched".to_string());
    }
    if !public_interface.is_empty() {
        reasons.push("complex.public_interface_changed".to_string());
    }

    let is_new_feature = !added.is_empty();
    let is_complex_change = !reasons.is_empty();
    ScopeDecision {
        in_scope: is_new_feature || is_complex_change,
        is_new_feature,
        is_complex_change,
        reasons,
        changed_files: changed.len() as u32,
        estimated_loc,
        critical_path_files: critical.len() as u32,
        public_interface_files: public_interface.len() as u32,
    }
}
