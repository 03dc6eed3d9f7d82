//! Waivers: explicit, auditable, time-bounded exceptions to the
//! test-first evidence requirement.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const WAIVER_FILE: &str = ".gate_waiver.json";

/// On-disk waiver record. `branch`, when present, limits the waiver
/// to that branch.
#[derive(Debug, Clone, Deserialize)]
pub struct Waiver {
    pub reason: String,
    pub approved_by: String,
    pub approved_at: String,
    pub expires_at: String,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Result of waiver resolution. Invalid waivers are recorded, never
/// silently honored.
#[derive(Debug, Clone)]
pub enum WaiverResolution {
    Absent,
    Invalid { path: String, reason: String },
    Applied { path: String, waiver: Waiver },
}

/// Resolve the active waiver under `repo_root` for `branch` at `now`.
pub fn resolve_active_waiver(
    repo_root: &Path,
    branch: Option<&str>,
    now: DateTime<Utc>,
) -> WaiverResolution {
    let path = repo_root.join(WAIVER_FILE);
    if !path.exists() {
        return WaiverResolution::Absent;
    }
    let display_path = path.display().to_string();

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) => {
            return WaiverResolution::Invalid {
                path: display_path,
                reason: format!("unreadable: {error}"),
            }
        }
    };
    let waiver: Waiver = match serde_json::from_str(&raw) {
        Ok(waiver) => waiver,
        Err(error) => {
            return WaiverResolution::Invalid {
                path: display_path,
                reason: format!("malformed: {error}"),
            }
        }
    };

    if waiver.approved_by.trim().is_empty() {
        return WaiverResolution::Invalid {
            path: display_path,
            reason: "approved_by is required".to_string(),
        };
    }
    let expires_at = match DateTime::parse_from_rfc3339(&waiver.expires_at) {
        Ok(expires_at) => expires_at.with_timezone(&Utc),
        Err(_) => {
            return WaiverResolution::Invalid {
                path: display_path,
                reason: "expires_at is not a valid timestamp".to_string(),
            }
        }
    };
    if expires_at <= now {
        return WaiverResolution::Invalid {
            path: display_path,
            reason: "expired".to_string(),
        };
    }
    if let (Some(waiver_branch), Some(current)) = (waiver.branch.as_deref(), branch) {
        if waiver_branch != current {
            return WaiverResolution::Invalid {
                path: display_path,
                reason: format!("scoped to branch {waiver_branch}"),
            };
        }
    }

    WaiverResolution::Applied {
        path: display_path,
        waiver,
    }
}
