//! Identical result comparer.
//!
//! Matches results that are the same record apart from baselining
//! bookkeeping: guids, baseline state, provenance and the result-matching
//! property are ignored, and artifact references are compared by resolved
//! URI rather than by index.

use crate::constants::RESULT_MATCHING_PROPERTY;
use crate::extracted::ExtractedResult;
use crate::hashing::fx_hash;
use crate::sarif::{LogicalLocation, Message, PropertyBag, Region};

/// A location with its artifact reference resolved.
#[derive(Debug, PartialEq, Eq, Hash)]
struct ResolvedLocation<'r> {
    uri: Option<String>,
    region: Option<&'r Region>,
    context_region: Option<&'r Region>,
    logical_locations: &'r [LogicalLocation],
    message: Option<&'r Message>,
}

fn resolved_locations<'r>(result: &'r ExtractedResult<'_>) -> Option<Vec<ResolvedLocation<'r>>> {
    let uris = result.location_uris().ok()?;
    let locations = result
        .result()
        .locations
        .iter()
        .zip(uris)
        .map(|(location, uri)| {
            let physical = location.physical_location.as_ref();
            ResolvedLocation {
                uri,
                region: physical.and_then(|p| p.region.as_ref()),
                context_region: physical.and_then(|p| p.context_region.as_ref()),
                logical_locations: &location.logical_locations,
                message: location.message.as_ref(),
            }
        })
        .collect();
    Some(locations)
}

fn comparable_properties(
    properties: &PropertyBag,
) -> impl Iterator<Item = (&String, &serde_json::Value)> {
    properties
        .iter()
        .filter(|(key, _)| key.as_str() != RESULT_MATCHING_PROPERTY)
}

pub(super) fn applies_to(result: &ExtractedResult<'_>) -> bool {
    result.location_uris().is_ok()
}

pub(super) fn hash(result: &ExtractedResult<'_>) -> i32 {
    let r = result.result();
    // Property values are not `Hash`; they only take part in `equal`.
    fx_hash(&(
        result.rule_id(),
        r.kind.as_deref(),
        r.effective_level(),
        &r.message,
        resolved_locations(result),
        &r.partial_fingerprints,
        &r.fingerprints,
        &r.stacks,
        &r.code_flows,
        &r.graphs,
        &r.graph_traversals,
    ))
}

pub(super) fn equal(a: &ExtractedResult<'_>, b: &ExtractedResult<'_>) -> bool {
    let (ra, rb) = (a.result(), b.result());
    if a.rule_id() != b.rule_id()
        || ra.kind != rb.kind
        || ra.effective_level() != rb.effective_level()
        || ra.message != rb.message
        || ra.partial_fingerprints != rb.partial_fingerprints
        || ra.fingerprints != rb.fingerprints
        || ra.stacks != rb.stacks
        || ra.code_flows != rb.code_flows
        || ra.graphs != rb.graphs
        || ra.graph_traversals != rb.graph_traversals
    {
        return false;
    }

    if !comparable_properties(&ra.properties).eq(comparable_properties(&rb.properties)) {
        return false;
    }

    match (resolved_locations(a), resolved_locations(b)) {
        (Some(la), Some(lb)) => la == lb,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::run_of;
    use crate::matching::{MatcherKind, MatchingComparer, StructuralKinds};
    use crate::sarif::{
        Artifact, ArtifactLocation, BaselineState, Location, PhysicalLocation, SarifResult,
    };

    fn comparer() -> MatchingComparer {
        MatchingComparer::for_kind(MatcherKind::IdenticalResult, StructuralKinds::all())
    }

    fn finding() -> SarifResult {
        SarifResult::new("R1", "null dereference")
            .with_location(Location::physical("src/a.c", Region::line(4)))
    }

    #[test]
    fn test_bookkeeping_is_ignored() {
        let mut annotated = finding();
        annotated.guid = Some("g1".to_string());
        annotated.correlation_guid = Some("c1".to_string());
        annotated.baseline_state = Some(BaselineState::Unchanged);
        annotated.properties.insert(
            RESULT_MATCHING_PROPERTY.to_string(),
            serde_json::json!({ "Run": "r" }),
        );

        let run = run_of(vec![finding(), annotated]);
        let plain = ExtractedResult::new(&run.results[0], &run, 0);
        let annotated = ExtractedResult::new(&run.results[1], &run, 1);

        let comparer = comparer();
        assert!(comparer.equal(&plain, &annotated));
        assert_eq!(comparer.hash(&plain), comparer.hash(&annotated));
    }

    #[test]
    fn test_index_and_inline_uri_are_identical() {
        let mut baseline = run_of(vec![SarifResult::new("R1", "null dereference").with_location(
            Location {
                physical_location: Some(PhysicalLocation {
                    artifact_location: Some(ArtifactLocation::from_index(0)),
                    region: Some(Region::line(4)),
                    context_region: None,
                }),
                ..Default::default()
            },
        )]);
        baseline.artifacts.push(Artifact::at("src/a.c"));
        let current = run_of(vec![finding()]);

        let by_index = ExtractedResult::new(&baseline.results[0], &baseline, 0);
        let inline = ExtractedResult::new(&current.results[0], &current, 0);

        assert!(comparer().equal(&by_index, &inline));
        assert_eq!(comparer().hash(&by_index), comparer().hash(&inline));
    }

    #[test]
    fn test_moved_line_is_not_identical() {
        let moved = SarifResult::new("R1", "null dereference")
            .with_location(Location::physical("src/a.c", Region::line(5)));
        let run = run_of(vec![finding(), moved]);
        let a = ExtractedResult::new(&run.results[0], &run, 0);
        let b = ExtractedResult::new(&run.results[1], &run, 1);

        assert!(!comparer().equal(&a, &b));
    }

    #[test]
    fn test_other_properties_count() {
        let mut tagged = finding();
        tagged
            .properties
            .insert("severity".to_string(), serde_json::json!("high"));
        let run = run_of(vec![finding(), tagged]);
        let a = ExtractedResult::new(&run.results[0], &run, 0);
        let b = ExtractedResult::new(&run.results[1], &run, 1);

        assert!(!comparer().equal(&a, &b));
    }

    #[test]
    fn test_unresolvable_does_not_apply() {
        let broken = SarifResult::new("R1", "m").with_location(Location {
            physical_location: Some(PhysicalLocation {
                artifact_location: Some(ArtifactLocation::from_index(9)),
                ..Default::default()
            }),
            ..Default::default()
        });
        let run = run_of(vec![broken]);
        let extracted = ExtractedResult::new(&run.results[0], &run, 0);

        assert!(!comparer().applies_to(&extracted));
    }
}
