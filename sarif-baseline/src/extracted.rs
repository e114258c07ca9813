//! Results paired with the run they came from.
//!
//! An [`ExtractedResult`] borrows its result and run for the length of one
//! matching pass. Comparers that need a location's identity resolve artifact
//! references through the owning run; a remapped result owns a rewritten copy
//! of its record but keeps borrowing the original run.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::sarif::{ArtifactLocation, BaselineState, Location, Run, SarifResult};

/// A result together with the run context needed to compare it.
#[derive(Debug, Clone)]
pub struct ExtractedResult<'a> {
    result: Cow<'a, SarifResult>,
    run: &'a Run,
    /// Position of the result within its side of the comparison.
    ordinal: usize,
    remapped: bool,
}

impl<'a> ExtractedResult<'a> {
    /// Wraps `result`, which must belong to `run`.
    pub fn new(result: &'a SarifResult, run: &'a Run, ordinal: usize) -> Self {
        ExtractedResult {
            result: Cow::Borrowed(result),
            run,
            ordinal,
            remapped: false,
        }
    }

    /// Returns the wrapped result.
    pub fn result(&self) -> &SarifResult {
        &self.result
    }

    /// Returns the run that produced the result.
    pub fn run(&self) -> &'a Run {
        self.run
    }

    /// Returns the result's position within its input side.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Whether this is a remapped copy rather than the original record.
    pub fn is_remapped(&self) -> bool {
        self.remapped
    }

    /// Returns the rule id, looking it up through `rule_index` when the
    /// result does not carry one inline.
    pub fn rule_id(&self) -> Option<&str> {
        if let Some(id) = self.result.rule_id.as_deref() {
            return Some(id);
        }
        let index = usize::try_from(self.result.rule_index?).ok()?;
        self.run
            .tool
            .driver
            .rules
            .get(index)
            .map(|rule| rule.id.as_str())
    }

    /// Resolves an artifact location against this result's run.
    pub fn resolve_uri(&self, location: &ArtifactLocation) -> Result<Option<String>> {
        resolve_artifact_uri(location, self.run)
    }

    /// Resolves the artifact URI of every location, in order.
    ///
    /// Fails if any location references an artifact missing from the run.
    pub fn location_uris(&self) -> Result<Vec<Option<String>>> {
        self.result
            .locations
            .iter()
            .map(|location| match location.artifact_location() {
                Some(artifact) => self.resolve_uri(artifact),
                None => Ok(None),
            })
            .collect()
    }

    /// Returns a copy whose location URIs have been passed through `rewrite`.
    ///
    /// Locations for which `rewrite` returns `None` keep their resolved URI.
    /// Every rewritten location holds an inline URI afterwards, with no
    /// artifact index or base id left to resolve.
    pub fn with_rewritten_uris<F>(&self, rewrite: F) -> ExtractedResult<'a>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = self.result.clone().into_owned();
        for location in &mut result.locations {
            rewrite_location(location, self.run, &rewrite);
        }

        ExtractedResult {
            result: Cow::Owned(result),
            run: self.run,
            ordinal: self.ordinal,
            remapped: true,
        }
    }
}

/// Passes the resolved URI of `location` through `rewrite`, storing the
/// result inline.
pub(crate) fn rewrite_location<F>(location: &mut Location, run: &Run, rewrite: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(artifact) = location
        .physical_location
        .as_mut()
        .and_then(|physical| physical.artifact_location.as_mut())
    else {
        return;
    };

    // Unresolvable locations are left alone; the comparer will decline them.
    let Ok(Some(uri)) = resolve_artifact_uri(artifact, run) else {
        return;
    };

    if let Some(rewritten) = rewrite(&uri) {
        *artifact = ArtifactLocation::from_uri(rewritten);
    }
}

/// Resolves an artifact location to a comparable URI string.
///
/// An `index` is looked up in `run.artifacts`; otherwise the inline `uri` is
/// used. A relative URI with a `uri_base_id` known to the run is joined onto
/// that base. Backslashes are normalised to forward slashes.
pub fn resolve_artifact_uri(location: &ArtifactLocation, run: &Run) -> Result<Option<String>> {
    let location = match location.index {
        Some(index) if index >= 0 => {
            let artifact = usize::try_from(index)
                .ok()
                .and_then(|i| run.artifacts.get(i))
                .ok_or(Error::UnresolvableArtifact {
                    index,
                    len: run.artifacts.len(),
                })?;
            // An artifact without a location falls back to the inline fields.
            artifact.location.as_ref().unwrap_or(location)
        }
        _ => location,
    };

    let Some(uri) = location.uri.as_deref() else {
        return Ok(None);
    };

    let base = location
        .uri_base_id
        .as_ref()
        .and_then(|id| run.original_uri_base_ids.get(id))
        .and_then(|base| base.uri.as_deref());

    let joined = match base {
        Some(base) if !is_absolute_uri(uri) => {
            format!("{}/{}", base.trim_end_matches('/'), uri.trim_start_matches('/'))
        }
        _ => uri.to_string(),
    };

    Ok(Some(joined.replace('\\', "/")))
}

fn is_absolute_uri(uri: &str) -> bool {
    uri.contains("://") || uri.starts_with('/')
}

/// Wraps every result of `runs`, numbering them in iteration order.
///
/// With `skip_absent`, results already marked [`BaselineState::Absent`] are
/// left out: they were carried forward from an older comparison and have no
/// counterpart to find.
pub fn extract_results<'a, I>(runs: I, skip_absent: bool) -> Vec<ExtractedResult<'a>>
where
    I: IntoIterator<Item = &'a Run>,
{
    let mut extracted = Vec::new();
    for run in runs {
        for result in &run.results {
            if skip_absent && result.baseline_state == Some(BaselineState::Absent) {
                continue;
            }
            let ordinal = extracted.len();
            extracted.push(ExtractedResult::new(result, run, ordinal));
        }
    }
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sarif::{Artifact, Region, ReportingDescriptor, Tool};

    fn run_with_artifacts(uris: &[&str]) -> Run {
        let mut run = Run::new(Tool::named("lint"));
        run.artifacts = uris.iter().map(|uri| Artifact::at(*uri)).collect();
        run
    }

    #[test]
    fn test_resolve_inline_uri() {
        let run = Run::new(Tool::named("lint"));
        let location = ArtifactLocation::from_uri("src\\main.c");

        assert_eq!(
            resolve_artifact_uri(&location, &run).unwrap(),
            Some("src/main.c".to_string())
        );
    }

    #[test]
    fn test_resolve_through_artifact_index() {
        let run = run_with_artifacts(&["a.c", "b.c"]);
        let location = ArtifactLocation::from_index(1);

        assert_eq!(
            resolve_artifact_uri(&location, &run).unwrap(),
            Some("b.c".to_string())
        );
    }

    #[test]
    fn test_resolve_index_out_of_range() {
        let run = run_with_artifacts(&["a.c"]);
        let location = ArtifactLocation::from_index(5);

        let err = resolve_artifact_uri(&location, &run).unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvableArtifact { index: 5, len: 1 }
        ));
    }

    #[test]
    fn test_resolve_with_uri_base_id() {
        let mut run = Run::new(Tool::named("lint"));
        run.original_uri_base_ids.insert(
            "SRCROOT".to_string(),
            ArtifactLocation::from_uri("file:///work/"),
        );
        let location = ArtifactLocation {
            uri: Some("lib/x.rs".to_string()),
            uri_base_id: Some("SRCROOT".to_string()),
            index: None,
        };

        assert_eq!(
            resolve_artifact_uri(&location, &run).unwrap(),
            Some("file:///work/lib/x.rs".to_string())
        );
    }

    #[test]
    fn test_rule_id_through_rule_index() {
        let mut run = Run::new(Tool::named("lint"));
        run.tool.driver.rules.push(ReportingDescriptor {
            id: "R7".to_string(),
            ..Default::default()
        });
        let result = SarifResult {
            rule_index: Some(0),
            ..Default::default()
        };

        let extracted = ExtractedResult::new(&result, &run, 0);
        assert_eq!(extracted.rule_id(), Some("R7"));
    }

    #[test]
    fn test_rewritten_uris_are_inline() {
        let run = run_with_artifacts(&["src/old/File.cs"]);
        let mut result = SarifResult::new("R1", "msg");
        result.locations.push(Location {
            physical_location: Some(crate::sarif::PhysicalLocation {
                artifact_location: Some(ArtifactLocation::from_index(0)),
                region: Some(Region::line(3)),
                context_region: None,
            }),
            ..Default::default()
        });

        let extracted = ExtractedResult::new(&result, &run, 0);
        let remapped =
            extracted.with_rewritten_uris(|uri| Some(uri.replace("src/old/", "src/new/")));

        assert!(remapped.is_remapped());
        assert!(!extracted.is_remapped());
        assert_eq!(
            remapped.location_uris().unwrap(),
            vec![Some("src/new/File.cs".to_string())]
        );
        assert_eq!(
            extracted.location_uris().unwrap(),
            vec![Some("src/old/File.cs".to_string())]
        );
    }

    #[test]
    fn test_extract_skips_absent() {
        let mut run = Run::new(Tool::named("lint"));
        run.results.push(SarifResult::new("R1", "kept"));
        let mut absent = SarifResult::new("R2", "gone");
        absent.baseline_state = Some(BaselineState::Absent);
        run.results.push(absent);

        let runs = vec![run];
        assert_eq!(extract_results(&runs, true).len(), 1);
        assert_eq!(extract_results(&runs, false).len(), 2);
    }
}
