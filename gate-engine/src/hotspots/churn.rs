//! File churn/ownership aggregation over a trailing history window.
//!
//! Parsing is pure over the text of one `git log --numstat` walk; the
//! VCS layer supplies the text. Commit boundaries are delimited by a
//! marker line so the line-oriented format stays unambiguous.

use chrono::DateTime;
use gate_core::GateError;
use rustc_hash::{FxHashMap, FxHashSet};

/// Delimits commits in the log output the parser consumes.
pub const COMMIT_MARKER: &str = "__GATE_COMMIT__";

pub const DEFAULT_SINCE_DAYS: u32 = 90;

/// Aggregated churn and ownership for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChurnOwnershipSignal {
    pub path: String,
    pub commits: u32,
    pub distinct_authors: u32,
    pub churn_added_lines: u64,
    pub churn_deleted_lines: u64,
    pub churn_total_lines: u64,
    pub last_touched_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChurnOptions {
    pub since_days: u32,
    pub extensions: Vec<String>,
}

impl Default for ChurnOptions {
    fn default() -> Self {
        Self {
            since_days: DEFAULT_SINCE_DAYS,
            extensions: Vec::new(),
        }
    }
}

impl ChurnOptions {
    /// Fails fast on a zero window before any history is walked.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.since_days == 0 {
            return Err(GateError::InvalidParameter {
                name: "since_days".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

/// Arguments for the history walk whose output `parse_churn_log`
/// consumes.
pub fn churn_log_args(since_days: u32) -> Vec<String> {
    vec![
        "log".to_string(),
        "--no-merges".to_string(),
        "--numstat".to_string(),
        "--date=iso-strict".to_string(),
        format!("--pretty=format:{COMMIT_MARKER}%n%H|%aN|%aE|%aI"),
        format!("--since={since_days}.days"),
    ]
}

/// History provider for the churn walk. The VCS layer implements it
/// with a real `git log`; tests supply canned output.
pub trait HistorySource {
    fn history_log(&self, args: &[String]) -> Result<String, gate_core::GitError>;
}

/// Run one history walk and aggregate churn/ownership per file.
pub fn collect_file_churn_ownership(
    source: &dyn HistorySource,
    options: &ChurnOptions,
) -> Result<Vec<FileChurnOwnershipSignal>, GateError> {
    options.validate()?;
    let log = source.history_log(&churn_log_args(options.since_days))?;
    Ok(parse_churn_log(&log, &options.extensions))
}

#[derive(Default)]
struct MutableSignal {
    commits: FxHashSet<String>,
    authors: FxHashSet<String>,
    added: u64,
    deleted: u64,
    last_touched_at: Option<String>,
}

struct CommitMeta {
    hash: String,
    author_key: String,
    authored_at: Option<String>,
}

fn parse_commit_meta(line: &str) -> Option<CommitMeta> {
    let mut parts = line.splitn(4, '|');
    let hash = parts.next()?.trim().to_string();
    if hash.is_empty() {
        return None;
    }
    let name = parts.next().unwrap_or("").trim();
    let email = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let authored_raw = parts.next().unwrap_or("").trim();
    let author_key = if !email.is_empty() {
        email
    } else if !name.is_empty() {
        name.to_string()
    } else {
        "unknown-author".to_string()
    };
    let authored_at = DateTime::parse_from_rfc3339(authored_raw)
        .ok()
        .map(|_| authored_raw.to_string());
    Some(CommitMeta {
        hash,
        author_key,
        authored_at,
    })
}

/// Normalize numstat rename syntax (`old => new`, `pre{old => new}post`)
/// to the destination path.
fn normalize_numstat_path(raw: &str) -> String {
    if let (Some(open), Some(close)) = (raw.find('{'), raw.find('}')) {
        if open < close {
            let inner = &raw[open + 1..close];
            if let Some((_, to)) = inner.split_once(" => ") {
                return format!("{}{}{}", &raw[..open], to, &raw[close + 1..])
                    .trim()
                    .to_string();
            }
        }
    }
    if let Some(index) = raw.rfind(" => ") {
        return raw[index + 4..].trim().to_string();
    }
    raw.trim().to_string()
}

fn parse_count(raw: &str) -> u64 {
    // Binary changes render as "-": zero line churn.
    raw.trim().parse::<u64>().unwrap_or(0)
}

fn has_allowed_extension(path: &str, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    extensions.iter().any(|extension| {
        let suffix = extension.trim_start_matches('.');
        path.rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(suffix))
    })
}

fn most_recent(left: Option<String>, right: Option<&str>) -> Option<String> {
    match (left, right) {
        (None, right) => right.map(str::to_string),
        (left, None) => left,
        (Some(left), Some(right)) => {
            let left_time = DateTime::parse_from_rfc3339(&left).ok();
            let right_time = DateTime::parse_from_rfc3339(right).ok();
            match (left_time, right_time) {
                (Some(a), Some(b)) if b > a => Some(right.to_string()),
                (None, Some(_)) => Some(right.to_string()),
                _ => Some(left),
            }
        }
    }
}

/// Aggregate per-file churn from one marker-delimited numstat log.
///
/// Renamed paths normalize to their destination; binary changes count
/// the commit, author and timestamp but contribute zero line churn.
pub fn parse_churn_log(log: &str, extensions: &[String]) -> Vec<FileChurnOwnershipSignal> {
    let mut by_path: FxHashMap<String, MutableSignal> = FxHashMap::default();
    let mut expects_meta = false;
    let mut current: Option<CommitMeta> = None;

    for line in log.lines() {
        if line.trim() == COMMIT_MARKER {
            expects_meta = true;
            current = None;
            continue;
        }
        if expects_meta {
            expects_meta = false;
            current = parse_commit_meta(line);
            continue;
        }
        let Some(meta) = &current else {
            continue;
        };

        let mut columns = line.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path_raw)) =
            (columns.next(), columns.next(), columns.next())
        else {
            continue;
        };
        let path = normalize_numstat_path(path_raw);
        if path.is_empty() || !has_allowed_extension(&path, extensions) {
            continue;
        }

        let entry = by_path.entry(path).or_default();
        entry.commits.insert(meta.hash.clone());
        entry.authors.insert(meta.author_key.clone());
        entry.added += parse_count(added);
        entry.deleted += parse_count(deleted);
        entry.last_touched_at = most_recent(
            entry.last_touched_at.take(),
            meta.authored_at.as_deref(),
        );
    }

    let mut signals: Vec<FileChurnOwnershipSignal> = by_path
        .into_iter()
        .map(|(path, signal)| FileChurnOwnershipSignal {
            path,
            commits: signal.commits.len() as u32,
            distinct_authors: signal.authors.len() as u32,
            churn_added_lines: signal.added,
            churn_deleted_lines: signal.deleted,
            churn_total_lines: signal.added + signal.deleted,
            last_touched_at: signal.last_touched_at,
        })
        .collect();

    signals.sort_by(|a, b| {
        b.churn_total_lines
            .cmp(&a.churn_total_lines)
            .then(b.commits.cmp(&a.commits))
            .then(b.distinct_authors.cmp(&a.distinct_authors))
            .then(a.path.cmp(&b.path))
    });
    signals
}
