//! Rule conditions — a closed, recursive sum type matched
//! exhaustively by the evaluator.

use serde::{Deserialize, Serialize};

use crate::facts::ChangeType;

/// Narrows a `FileChange` condition to a path prefix and/or a change
/// type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileChangeWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
}

/// Narrows a `Heuristic` condition to a producing rule id and,
/// optionally, a code or a file path prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicWhere {
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path_prefix: Option<String>,
}

/// The condition grammar. Evaluation is pure and stateless given a
/// fact set; adding a variant forces every match site to handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Condition {
    /// Matches when any qualifying `FileChange` fact exists.
    FileChange {
        #[serde(default, skip_serializing_if = "Option::is_none", rename = "where")]
        filter: Option<FileChangeWhere>,
    },
    /// Matches a file whose content satisfies every `contains` term
    /// and every `regex` pattern. Multiple terms combine with AND
    /// within one file.
    FileContent {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        contains: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        regex: Vec<String>,
    },
    /// Matches any `Heuristic` fact produced under the given rule id.
    Heuristic {
        #[serde(rename = "where")]
        filter: HeuristicWhere,
    },
    /// Matches when every child matches.
    All { conditions: Vec<Condition> },
    /// Matches when at least one child matches.
    Any { conditions: Vec<Condition> },
    /// Matches when the inner condition has no match across the whole
    /// fact set. Used for "requires presence of X" rules.
    Not { condition: Box<Condition> },
}

impl Condition {
    /// Convenience constructor for a bare file-change condition.
    pub fn any_file_change() -> Self {
        Condition::FileChange { filter: None }
    }

    /// Convenience constructor for a contains-only content condition.
    pub fn content_contains<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::FileContent {
            contains: terms.into_iter().map(Into::into).collect(),
            regex: Vec::new(),
        }
    }

    /// Convenience constructor for a heuristic mapping condition.
    pub fn heuristic(rule_id: impl Into<String>) -> Self {
        Condition::Heuristic {
            filter: HeuristicWhere {
                rule_id: rule_id.into(),
                code: None,
                file_path_prefix: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_round_trips_with_where_key() {
        let condition = Condition::FileChange {
            filter: Some(FileChangeWhere {
                path_prefix: Some("apps/backend/".to_string()),
                change_type: Some(ChangeType::Modified),
            }),
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["kind"], "FileChange");
        assert_eq!(json["where"]["path_prefix"], "apps/backend/");
        let back: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(back, condition);
    }

    #[test]
    fn not_condition_nests() {
        let condition = Condition::Not {
            condition: Box::new(Condition::content_contains(["token"])),
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["condition"]["kind"], "FileContent");
    }
}
