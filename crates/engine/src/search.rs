//! Plain-text search over the artifact pool.

use crate::artifact::ArtifactPool;

/// Matches reported per artifact.
pub const MAX_MATCHES_PER_ARTIFACT: usize = 3;
/// Artifacts reported per search.
pub const MAX_ARTIFACTS: usize = 10;
/// Matched lines are trimmed and cut to this many characters.
pub const MAX_LINE_CHARS: usize = 70;

/// A matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// 1-based.
    pub line_number: usize,
    pub text: String,
}

/// Matches within one artifact.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub name: String,
    pub path: String,
    pub matches: Vec<LineMatch>,
}

/// Case-insensitive line search across loaded artifacts, in pool order.
pub fn search_pool(pool: &ArtifactPool, needle: &str) -> Vec<SearchHit> {
    let needle = needle.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    pool.loaded()
        .filter_map(|artifact| {
            let matches: Vec<LineMatch> = artifact
                .content
                .split('\n')
                .enumerate()
                .filter(|(_, line)| line.to_lowercase().contains(&needle))
                .take(MAX_MATCHES_PER_ARTIFACT)
                .map(|(i, line)| LineMatch {
                    line_number: i + 1,
                    text: line.trim().chars().take(MAX_LINE_CHARS).collect(),
                })
                .collect();

            (!matches.is_empty()).then(|| SearchHit {
                name: artifact.name.clone(),
                path: artifact.path.clone(),
                matches,
            })
        })
        .take(MAX_ARTIFACTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;

    #[test]
    fn finds_lines_case_insensitively() {
        let mut pool = ArtifactPool::new();
        pool.insert(Artifact::from_content("a.rs", "use tokio;\n\n    Tokio::spawn(x);\nfn main() {}"));

        let hits = search_pool(&pool, "TOKIO");
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].matches,
            vec![
                LineMatch { line_number: 1, text: "use tokio;".into() },
                LineMatch { line_number: 3, text: "Tokio::spawn(x);".into() },
            ]
        );
    }

    #[test]
    fn limits_matches_and_artifacts() {
        let mut pool = ArtifactPool::new();
        for i in 0..15 {
            pool.insert(Artifact::from_content(format!("f{i:02}.txt"), "hit\nhit\nhit\nhit\nhit"));
        }
        let hits = search_pool(&pool, "hit");
        assert_eq!(hits.len(), MAX_ARTIFACTS);
        assert!(hits.iter().all(|h| h.matches.len() == MAX_MATCHES_PER_ARTIFACT));
    }

    #[test]
    fn long_lines_are_cut() {
        let mut pool = ArtifactPool::new();
        pool.insert(Artifact::from_content("long.txt", format!("   needle {}", "x".repeat(200))));
        let hits = search_pool(&pool, "needle");
        assert_eq!(hits[0].matches[0].text.chars().count(), MAX_LINE_CHARS);
        assert!(hits[0].matches[0].text.starts_with("needle"));
    }

    #[test]
    fn failed_and_empty_needle_yield_nothing() {
        let mut pool = ArtifactPool::new();
        pool.insert(Artifact::from_error("bad.txt", "unreadable"));
        assert!(search_pool(&pool, "bad").is_empty());
        pool.insert(Artifact::from_content("ok.txt", "anything"));
        assert!(search_pool(&pool, "").is_empty());
    }
}
