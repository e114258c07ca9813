//! Output annotation of baselined results.

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::constants::{RESULT_MATCHING_PROPERTY, RESULT_MATCHING_RUN_KEY};
use crate::extracted::ExtractedResult;
use crate::sarif::{BaselineState, ResultProvenance, SarifResult};

use super::BaselinedEntry;

/// Builds the output record for `entry`.
///
/// Returns `None` only for an entry with neither side, which the
/// orchestrator never produces.
pub(super) fn annotate(entry: &BaselinedEntry<'_>, now: DateTime<Utc>) -> Option<SarifResult> {
    let own = entry.result()?;
    let counterpart = match entry.state {
        BaselineState::Absent => None,
        _ => entry.pair.baseline.as_ref(),
    };

    let mut result = own.result().clone();
    result.baseline_state = Some(entry.state);

    if result.guid.is_none() {
        result.guid = Some(fresh_guid());
    }
    // A matched result inherits the identity of the baseline result.
    let correlation = match counterpart {
        Some(baseline) => {
            let baseline = baseline.result();
            baseline.correlation_guid.clone().or_else(|| baseline.guid.clone())
        }
        None => result.correlation_guid.clone().or_else(|| result.guid.clone()),
    };
    result.correlation_guid = Some(correlation.unwrap_or_else(fresh_guid));

    let first_detection = first_detection_time(counterpart.unwrap_or(own), now);
    result
        .provenance
        .get_or_insert_with(ResultProvenance::default)
        .first_detection_time_utc = Some(first_detection);

    if let Some(run_guid) = own.run().automation_guid() {
        result.properties.insert(
            RESULT_MATCHING_PROPERTY.to_string(),
            json!({ RESULT_MATCHING_RUN_KEY: run_guid }),
        );
    }

    Some(result)
}

fn fresh_guid() -> String {
    Uuid::new_v4().to_string()
}

/// The earliest known detection time of `source`.
fn first_detection_time(source: &ExtractedResult<'_>, now: DateTime<Utc>) -> DateTime<Utc> {
    source
        .result()
        .provenance
        .as_ref()
        .and_then(|p| p.first_detection_time_utc)
        .or_else(|| source.run().invocation_time())
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{MatchedPair, MatcherKind};
    use crate::sarif::{Invocation, Run, RunAutomationDetails, Tool};
    use chrono::TimeZone;

    fn run_with_guid(guid: &str) -> Run {
        let mut run = Run::new(Tool::named("lint"));
        run.automation_details = Some(RunAutomationDetails {
            id: None,
            guid: Some(guid.to_string()),
        });
        run
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_matched_inherits_baseline_identity() {
        let mut baseline_run = run_with_guid("baseline-run");
        let detected = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let mut old = SarifResult::new("R1", "m");
        old.guid = Some("old-guid".to_string());
        old.provenance = Some(ResultProvenance {
            first_detection_time_utc: Some(detected),
            last_detection_time_utc: None,
        });
        baseline_run.results.push(old);

        let mut current_run = run_with_guid("current-run");
        current_run.results.push(SarifResult::new("R1", "m"));

        let entry = BaselinedEntry {
            pair: MatchedPair::matched(
                ExtractedResult::new(&baseline_run.results[0], &baseline_run, 0),
                ExtractedResult::new(&current_run.results[0], &current_run, 0),
                MatcherKind::IdenticalResult,
                false,
            ),
            state: BaselineState::Unchanged,
        };

        let result = annotate(&entry, now()).unwrap();
        assert_eq!(result.correlation_guid.as_deref(), Some("old-guid"));
        assert!(result.guid.is_some());
        assert_ne!(result.guid.as_deref(), Some("old-guid"));
        assert_eq!(result.baseline_state, Some(BaselineState::Unchanged));
        assert_eq!(
            result.provenance.unwrap().first_detection_time_utc,
            Some(detected)
        );
        assert_eq!(
            result.properties[RESULT_MATCHING_PROPERTY],
            json!({ "Run": "current-run" })
        );
    }

    #[test]
    fn test_new_result_uses_own_identity_and_invocation_time() {
        let started = Utc.with_ymd_and_hms(2024, 4, 30, 8, 0, 0).unwrap();
        let mut run = Run::new(Tool::named("lint"));
        run.invocations.push(Invocation {
            start_time_utc: Some(started),
            end_time_utc: None,
            execution_successful: true,
        });
        let mut result = SarifResult::new("R1", "m");
        result.guid = Some("own".to_string());
        run.results.push(result);

        let entry = BaselinedEntry {
            pair: MatchedPair::unmatched_current(ExtractedResult::new(&run.results[0], &run, 0)),
            state: BaselineState::New,
        };

        let result = annotate(&entry, now()).unwrap();
        assert_eq!(result.guid.as_deref(), Some("own"));
        assert_eq!(result.correlation_guid.as_deref(), Some("own"));
        assert_eq!(
            result.provenance.unwrap().first_detection_time_utc,
            Some(started)
        );
        assert!(!result.properties.contains_key(RESULT_MATCHING_PROPERTY));
    }

    #[test]
    fn test_absent_uses_baseline_run() {
        let mut run = run_with_guid("baseline-run");
        run.results.push(SarifResult::new("R1", "m"));

        let entry = BaselinedEntry {
            pair: MatchedPair::unmatched_baseline(ExtractedResult::new(&run.results[0], &run, 0)),
            state: BaselineState::Absent,
        };

        let result = annotate(&entry, now()).unwrap();
        assert_eq!(result.baseline_state, Some(BaselineState::Absent));
        assert!(result.guid.is_some());
        assert_eq!(result.correlation_guid, result.guid);
        assert_eq!(
            result.provenance.unwrap().first_detection_time_utc,
            Some(now())
        );
        assert_eq!(
            result.properties[RESULT_MATCHING_PROPERTY],
            json!({ "Run": "baseline-run" })
        );
    }
}
