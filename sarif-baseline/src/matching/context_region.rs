//! Context region comparer.
//!
//! Two results match when they flag the same artifacts with the same
//! surrounding source text, regardless of line numbers. A result's identity
//! is the set of `(uri, context snippet)` pairs over its locations. A
//! snippet without an artifact URI still counts, keyed on no URI.

use std::collections::BTreeSet;

use crate::extracted::ExtractedResult;
use crate::hashing::TextDigest;

type ContextIdentity = BTreeSet<(Option<String>, String)>;

/// Collects the identity of `result`.
///
/// Returns `None` when no location has a context snippet, or when any
/// location references an artifact the run lacks.
fn identity(result: &ExtractedResult<'_>) -> Option<ContextIdentity> {
    let mut identity = ContextIdentity::new();
    for location in &result.result().locations {
        let Some(physical) = location.physical_location.as_ref() else {
            continue;
        };
        let Some(snippet) = physical.context_snippet() else {
            continue;
        };
        let uri = match physical.artifact_location.as_ref() {
            Some(artifact) => match result.resolve_uri(artifact) {
                Ok(uri) => uri,
                Err(_) => return None,
            },
            None => None,
        };
        identity.insert((uri, snippet.to_string()));
    }

    if identity.is_empty() {
        None
    } else {
        Some(identity)
    }
}

pub(super) fn applies_to(result: &ExtractedResult<'_>) -> bool {
    identity(result).is_some()
}

pub(super) fn hash(result: &ExtractedResult<'_>) -> i32 {
    let mut digest = TextDigest::new();
    if let Some(identity) = identity(result) {
        for (uri, snippet) in &identity {
            digest.update(uri.as_deref().unwrap_or_default());
            digest.update(snippet);
        }
    }
    digest.finish_i32()
}

pub(super) fn equal(a: &ExtractedResult<'_>, b: &ExtractedResult<'_>) -> bool {
    match (identity(a), identity(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::run_of;
    use crate::matching::{MatcherKind, MatchingComparer, StructuralKinds};
    use crate::sarif::{ArtifactLocation, Location, PhysicalLocation, Region, SarifResult};

    fn comparer() -> MatchingComparer {
        MatchingComparer::for_kind(MatcherKind::ContextRegion, StructuralKinds::all())
    }

    fn at(uri: &str, line: u32, context: &str) -> SarifResult {
        SarifResult::new("R1", "m").with_location(
            Location::physical(uri, Region::line(line))
                .with_context(Region::line(line).with_snippet(context)),
        )
    }

    #[test]
    fn test_line_drift_still_equal() {
        let run = run_of(vec![
            at("src/a.c", 10, "int x = y / 0;"),
            at("src/a.c", 42, "int x = y / 0;"),
        ]);
        let before = ExtractedResult::new(&run.results[0], &run, 0);
        let after = ExtractedResult::new(&run.results[1], &run, 1);

        let comparer = comparer();
        assert!(comparer.applies_to(&before));
        assert!(comparer.equal(&before, &after));
        assert_eq!(comparer.hash(&before), comparer.hash(&after));
    }

    #[test]
    fn test_different_file_not_equal() {
        let run = run_of(vec![
            at("src/a.c", 10, "int x = y / 0;"),
            at("src/b.c", 10, "int x = y / 0;"),
        ]);
        let a = ExtractedResult::new(&run.results[0], &run, 0);
        let b = ExtractedResult::new(&run.results[1], &run, 1);

        assert!(!comparer().equal(&a, &b));
    }

    #[test]
    fn test_missing_snippet_does_not_apply() {
        let run = run_of(vec![
            SarifResult::new("R1", "m").with_location(Location::physical("a.c", Region::line(1)))
        ]);
        let result = ExtractedResult::new(&run.results[0], &run, 0);

        assert!(!comparer().applies_to(&result));
    }

    #[test]
    fn test_snippet_without_uri_applies() {
        let unanchored = |line: u32| {
            SarifResult::new("R1", "m").with_location(Location {
                physical_location: Some(PhysicalLocation {
                    artifact_location: None,
                    region: Some(Region::line(line)),
                    context_region: Some(Region::line(line).with_snippet("foo(bar);")),
                }),
                ..Default::default()
            })
        };
        let run = run_of(vec![unanchored(5), unanchored(9), at("a.c", 5, "foo(bar);")]);
        let before = ExtractedResult::new(&run.results[0], &run, 0);
        let after = ExtractedResult::new(&run.results[1], &run, 1);
        let anchored = ExtractedResult::new(&run.results[2], &run, 2);

        let comparer = comparer();
        assert!(comparer.applies_to(&before));
        assert!(comparer.equal(&before, &after));
        assert_eq!(comparer.hash(&before), comparer.hash(&after));
        assert!(!comparer.equal(&before, &anchored));
    }

    #[test]
    fn test_unresolvable_artifact_does_not_apply() {
        let mut result = at("a.c", 1, "ctx");
        if let Some(physical) = result.locations[0].physical_location.as_mut() {
            physical.artifact_location = Some(ArtifactLocation::from_index(3));
        }
        let run = run_of(vec![result]);
        let extracted = ExtractedResult::new(&run.results[0], &run, 0);

        assert!(!comparer().applies_to(&extracted));
    }
}
