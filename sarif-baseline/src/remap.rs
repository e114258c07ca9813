//! Path remapping between baseline and current runs.
//!
//! When files move between scans, location-sensitive comparers stop
//! matching. The calculator here guesses directory renames from the URIs
//! each side mentions and produces prefix rewrites that the bucketed matcher
//! retries with when a direct lookup finds nothing.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::constants::{DEFAULT_MAX_REMAPPING_CANDIDATES, MAX_PAIRINGS_PER_FILE_NAME};
use crate::extracted::{resolve_artifact_uri, ExtractedResult};
use crate::sarif::Run;

/// Where a remapping guess came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RemappingSource {
    /// Both runs checked out the same repository to different roots.
    VersionControl,
    /// Files with a common path suffix appear under different directories.
    PathSuffix,
}

/// A prefix rewrite from current-side URIs to baseline-side URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemappingCandidate {
    pub current_prefix: String,
    pub baseline_prefix: String,
    /// Number of file pairings that support this rewrite.
    pub votes: usize,
    pub source: RemappingSource,
}

impl RemappingCandidate {
    /// Whether any location of `result` lives under `current_prefix`.
    pub fn applies_to(&self, result: &ExtractedResult<'_>) -> bool {
        match result.location_uris() {
            Ok(uris) => uris
                .iter()
                .flatten()
                .any(|uri| uri.starts_with(&self.current_prefix)),
            Err(_) => false,
        }
    }

    /// Returns a copy of `result` with matching URIs moved to `baseline_prefix`.
    pub fn remap<'a>(&self, result: &ExtractedResult<'a>) -> ExtractedResult<'a> {
        result.with_rewritten_uris(|uri| {
            uri.strip_prefix(self.current_prefix.as_str())
                .map(|rest| format!("{}{}", self.baseline_prefix, rest))
        })
    }
}

/// Derives remapping candidates from two result collections.
#[derive(Debug, Clone, Copy)]
pub struct RemappingCalculator {
    max_candidates: usize,
}

impl Default for RemappingCalculator {
    fn default() -> Self {
        RemappingCalculator::new(DEFAULT_MAX_REMAPPING_CANDIDATES)
    }
}

impl RemappingCalculator {
    pub fn new(max_candidates: usize) -> Self {
        RemappingCalculator { max_candidates }
    }

    /// Computes at most `max_candidates` rewrites, best first.
    ///
    /// Version-control mappings come first, then path-suffix guesses ordered
    /// by votes (descending) and then lexically.
    pub fn calculate_candidates(
        &self,
        baseline: &[ExtractedResult<'_>],
        current: &[ExtractedResult<'_>],
    ) -> Vec<RemappingCandidate> {
        if self.max_candidates == 0 {
            return Vec::new();
        }

        let mut candidates = version_control_candidates(&runs_of(baseline), &runs_of(current));

        let baseline_uris = resolved_uris(baseline);
        let current_uris = resolved_uris(current);
        let mut suffix_candidates = path_suffix_candidates(
            current_uris.difference(&baseline_uris).map(String::as_str),
            baseline_uris.difference(&current_uris).map(String::as_str),
        );
        suffix_candidates.retain(|candidate| {
            !candidates.iter().any(|existing: &RemappingCandidate| {
                existing.current_prefix == candidate.current_prefix
                    && existing.baseline_prefix == candidate.baseline_prefix
            })
        });
        candidates.extend(suffix_candidates);
        candidates.truncate(self.max_candidates);

        for candidate in &candidates {
            debug!(
                from = %candidate.current_prefix,
                to = %candidate.baseline_prefix,
                votes = candidate.votes,
                source = ?candidate.source,
                "remapping candidate"
            );
        }
        candidates
    }
}

/// Distinct runs of `results`, in first-seen order.
fn runs_of<'a>(results: &[ExtractedResult<'a>]) -> Vec<&'a Run> {
    let mut runs: Vec<&'a Run> = Vec::new();
    for result in results {
        if !runs.iter().any(|run| std::ptr::eq(*run, result.run())) {
            runs.push(result.run());
        }
    }
    runs
}

fn resolved_uris(results: &[ExtractedResult<'_>]) -> BTreeSet<String> {
    results
        .iter()
        .filter_map(|result| result.location_uris().ok())
        .flatten()
        .flatten()
        .collect()
}

fn version_control_candidates(baseline: &[&Run], current: &[&Run]) -> Vec<RemappingCandidate> {
    let mut candidates = Vec::new();
    for baseline_run in baseline {
        for b in &baseline_run.version_control_provenance {
            let Some(baseline_root) = mapped_root(b.mapped_to.as_ref(), baseline_run) else {
                continue;
            };
            for current_run in current {
                for c in &current_run.version_control_provenance {
                    if c.repository_uri != b.repository_uri {
                        continue;
                    }
                    let Some(current_root) = mapped_root(c.mapped_to.as_ref(), current_run) else {
                        continue;
                    };
                    let candidate = RemappingCandidate {
                        current_prefix: current_root,
                        baseline_prefix: baseline_root.clone(),
                        votes: 0,
                        source: RemappingSource::VersionControl,
                    };
                    if candidate.current_prefix != candidate.baseline_prefix
                        && !candidates.contains(&candidate)
                    {
                        candidates.push(candidate);
                    }
                }
            }
        }
    }
    candidates
}

fn mapped_root(location: Option<&crate::sarif::ArtifactLocation>, run: &Run) -> Option<String> {
    let uri = resolve_artifact_uri(location?, run).ok()??;
    Some(as_directory(&uri))
}

fn as_directory(uri: &str) -> String {
    if uri.ends_with('/') {
        uri.to_string()
    } else {
        format!("{}/", uri)
    }
}

fn file_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Votes on prefix rewrites implied by same-named files on both sides.
fn path_suffix_candidates<'u>(
    current_only: impl Iterator<Item = &'u str>,
    baseline_only: impl Iterator<Item = &'u str>,
) -> Vec<RemappingCandidate> {
    let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for uri in baseline_only {
        by_name.entry(file_name(uri)).or_default().push(uri);
    }

    let mut votes: BTreeMap<(String, String), usize> = BTreeMap::new();
    for current in current_only {
        let Some(baselines) = by_name.get(file_name(current)) else {
            continue;
        };
        for baseline in baselines.iter().take(MAX_PAIRINGS_PER_FILE_NAME) {
            if let Some(mapping) = prefix_mapping(current, baseline) {
                *votes.entry(mapping).or_insert(0) += 1;
            }
        }
    }

    let mut candidates: Vec<RemappingCandidate> = votes
        .into_iter()
        .map(|((current_prefix, baseline_prefix), votes)| RemappingCandidate {
            current_prefix,
            baseline_prefix,
            votes,
            source: RemappingSource::PathSuffix,
        })
        .collect();
    // Stable sort keeps the BTreeMap's lexical order among equal votes.
    candidates.sort_by(|a, b| b.votes.cmp(&a.votes));
    candidates
}

/// Strips the longest common segment suffix from two URIs.
fn prefix_mapping(current: &str, baseline: &str) -> Option<(String, String)> {
    let current_segments: Vec<&str> = current.split('/').collect();
    let baseline_segments: Vec<&str> = baseline.split('/').collect();

    let common = current_segments
        .iter()
        .rev()
        .zip(baseline_segments.iter().rev())
        .take_while(|(c, b)| c == b)
        .count();
    if common == 0 {
        return None;
    }

    let current_prefix = join_prefix(&current_segments[..current_segments.len() - common]);
    let baseline_prefix = join_prefix(&baseline_segments[..baseline_segments.len() - common]);
    if current_prefix == baseline_prefix {
        return None;
    }
    Some((current_prefix, baseline_prefix))
}

fn join_prefix(segments: &[&str]) -> String {
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extracted::extract_results;
    use crate::sarif::{
        ArtifactLocation, Location, Region, SarifResult, Tool, VersionControlDetails,
    };

    fn run_at(uris: &[&str]) -> Run {
        let mut run = Run::new(Tool::named("lint"));
        run.results = uris
            .iter()
            .map(|uri| {
                SarifResult::new("R1", "m")
                    .with_location(Location::physical(*uri, Region::line(1)))
            })
            .collect();
        run
    }

    #[test]
    fn test_prefix_mapping() {
        assert_eq!(
            prefix_mapping("src/new/File.cs", "src/old/File.cs"),
            Some(("src/new/".to_string(), "src/old/".to_string()))
        );
        assert_eq!(
            prefix_mapping("lib/a/b.rs", "a/b.rs"),
            Some(("lib/".to_string(), String::new()))
        );
        assert_eq!(prefix_mapping("x/a.rs", "y/b.rs"), None);
    }

    #[test]
    fn test_votes_order_candidates() {
        let baseline = run_at(&["old/a.cs", "old/b.cs", "legacy/c.cs"]);
        let current = run_at(&["new/a.cs", "new/b.cs", "other/c.cs"]);
        let b = extract_results(std::iter::once(&baseline), true);
        let c = extract_results(std::iter::once(&current), true);

        let candidates = RemappingCalculator::default().calculate_candidates(&b, &c);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].current_prefix, "new/");
        assert_eq!(candidates[0].baseline_prefix, "old/");
        assert_eq!(candidates[0].votes, 2);
        assert_eq!(candidates[1].current_prefix, "other/");
    }

    #[test]
    fn test_shared_uris_are_not_paired() {
        let baseline = run_at(&["src/a.cs"]);
        let current = run_at(&["src/a.cs"]);
        let b = extract_results(std::iter::once(&baseline), true);
        let c = extract_results(std::iter::once(&current), true);

        assert!(RemappingCalculator::default().calculate_candidates(&b, &c).is_empty());
    }

    #[test]
    fn test_candidate_cap() {
        let baseline = run_at(&["a/x.cs", "b/y.cs", "c/z.cs"]);
        let current = run_at(&["d/x.cs", "e/y.cs", "f/z.cs"]);
        let b = extract_results(std::iter::once(&baseline), true);
        let c = extract_results(std::iter::once(&current), true);

        assert_eq!(RemappingCalculator::new(1).calculate_candidates(&b, &c).len(), 1);
        assert!(RemappingCalculator::new(0).calculate_candidates(&b, &c).is_empty());
    }

    #[test]
    fn test_version_control_candidate_first() {
        let mut baseline = run_at(&["file:///agent1/repo/src/a.cs"]);
        baseline.version_control_provenance.push(VersionControlDetails {
            repository_uri: "https://example.com/repo".to_string(),
            mapped_to: Some(ArtifactLocation::from_uri("file:///agent1/repo")),
            ..Default::default()
        });
        let mut current = run_at(&["file:///agent2/repo/src/a.cs"]);
        current.version_control_provenance.push(VersionControlDetails {
            repository_uri: "https://example.com/repo".to_string(),
            mapped_to: Some(ArtifactLocation::from_uri("file:///agent2/repo/")),
            ..Default::default()
        });
        let b = extract_results(std::iter::once(&baseline), true);
        let c = extract_results(std::iter::once(&current), true);

        let candidates = RemappingCalculator::default().calculate_candidates(&b, &c);

        assert_eq!(candidates[0].source, RemappingSource::VersionControl);
        assert_eq!(candidates[0].current_prefix, "file:///agent2/repo/");
        assert_eq!(candidates[0].baseline_prefix, "file:///agent1/repo/");
    }

    #[test]
    fn test_remap_rewrites_prefix() {
        let run = run_at(&["src/new/File.cs"]);
        let extracted = ExtractedResult::new(&run.results[0], &run, 0);
        let candidate = RemappingCandidate {
            current_prefix: "src/new/".to_string(),
            baseline_prefix: "src/old/".to_string(),
            votes: 1,
            source: RemappingSource::PathSuffix,
        };

        assert!(candidate.applies_to(&extracted));
        let remapped = candidate.remap(&extracted);
        assert_eq!(
            remapped.location_uris().unwrap(),
            vec![Some("src/old/File.cs".to_string())]
        );
    }
}
