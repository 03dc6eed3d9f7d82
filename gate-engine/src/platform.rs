//! Platform detection from fact paths. Drives which baseline rule
//! bundles are loaded and is recorded into evidence.

use std::collections::BTreeMap;

use gate_core::Fact;
use gate_evidence::PlatformState;

const PLATFORM_EXTENSIONS: &[(&str, &[&str])] = &[
    ("ios", &["swift"]),
    ("android", &["kt", "kts"]),
    ("flutter", &["dart"]),
    ("backend", &["ts", "tsx", "js", "jsx"]),
];

fn extension_of(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, extension)| extension)
}

/// Detect platforms from the change set.
///
/// A platform is detected when at least one changed file carries one
/// of its extensions; confidence is the share of changed files that
/// do. Files matching no platform fall under `generic`.
pub fn detect_platforms_from_facts(facts: &[Fact]) -> BTreeMap<String, PlatformState> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    let mut total: u32 = 0;

    for fact in facts {
        let Fact::FileChange { path, .. } = fact else {
            continue;
        };
        total += 1;
        let extension = extension_of(path).unwrap_or("").to_ascii_lowercase();
        let platform = PLATFORM_EXTENSIONS
            .iter()
            .find(|(_, extensions)| extensions.contains(&extension.as_str()))
            .map(|(platform, _)| *platform)
            .unwrap_or("generic");
        *counts.entry(platform).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(platform, count)| {
            (
                platform.to_string(),
                PlatformState {
                    detected: true,
                    confidence: if total == 0 {
                        0.0
                    } else {
                        f64::from(count) / f64::from(total)
                    },
                },
            )
        })
        .collect()
}

/// The detected platform names, in stable order.
pub fn detected_platform_names(platforms: &BTreeMap<String, PlatformState>) -> Vec<String> {
    platforms
        .iter()
        .filter(|(_, state)| state.detected)
        .map(|(platform, _)| platform.clone())
        .collect()
}
