//! Parsing of `git diff --name-status` output.

use gate_core::ChangeType;

/// One parsed name-status line, already normalized to the destination
/// path for renames and copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatusEntry {
    pub path: String,
    pub change_type: ChangeType,
}

/// Parse `--name-status` output.
///
/// Renames (`R<score>\told\tnew`) and copies surface as the
/// destination path; renames count as modified, copies as added.
/// Unknown status letters are skipped.
pub fn parse_name_status(output: &str) -> Vec<NameStatusEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut columns = line.split('\t');
            let status = columns.next()?.trim();
            let first_path = columns.next()?.trim();
            let second_path = columns.next().map(str::trim);

            let (change_type, path) = match status.chars().next()? {
                'A' => (ChangeType::Added, first_path),
                'M' | 'T' => (ChangeType::Modified, first_path),
                'D' => (ChangeType::Deleted, first_path),
                'R' => (ChangeType::Modified, second_path?),
                'C' => (ChangeType::Added, second_path?),
                _ => return None,
            };
            if path.is_empty() {
                return None;
            }
            Some(NameStatusEntry {
                path: path.replace('\\', "/"),
                change_type,
            })
        })
        .collect()
}

/// Keep only entries whose path carries one of `extensions` (matched
/// case-insensitively, with or without a leading dot). An empty list
/// keeps everything.
pub fn filter_by_extension(
    entries: Vec<NameStatusEntry>,
    extensions: &[String],
) -> Vec<NameStatusEntry> {
    if extensions.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| {
            extensions.iter().any(|extension| {
                let suffix = extension.trim_start_matches('.');
                entry
                    .path
                    .rsplit_once('.')
                    .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(suffix))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_plain_statuses() {
        let entries = parse_name_status("A\tsrc/new.ts\nM\tsrc/app.ts\nD\tsrc/old.ts\n");
        assert_eq!(
            entries,
            vec![
                NameStatusEntry {
                    path: "src/new.ts".to_string(),
                    change_type: ChangeType::Added,
                },
                NameStatusEntry {
                    path: "src/app.ts".to_string(),
                    change_type: ChangeType::Modified,
                },
                NameStatusEntry {
                    path: "src/old.ts".to_string(),
                    change_type: ChangeType::Deleted,
                },
            ]
        );
    }

    #[test]
    fn renames_resolve_to_the_destination() {
        let entries = parse_name_status("R100\tsrc/old.ts\tsrc/new.ts\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "src/new.ts");
        assert_eq!(entries[0].change_type, ChangeType::Modified);
    }

    #[test]
    fn unknown_statuses_and_blank_lines_are_skipped() {
        let entries = parse_name_status("U\tsrc/conflict.ts\n\nM\tsrc/app.ts\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "src/app.ts");
    }

    #[test]
    fn extension_filter_keeps_only_configured_suffixes() {
        let entries = parse_name_status("M\tsrc/app.ts\nM\tREADME.md\nM\tlogo.PNG\n");
        let filtered = filter_by_extension(entries, &["ts".to_string(), ".png".to_string()]);
        let paths: Vec<&str> = filtered.iter().map(|entry| entry.path.as_str()).collect();
        assert_eq!(paths, vec!["src/app.ts", "logo.PNG"]);
    }
}
