//! Rule-id-only classification.
//!
//! A coarse mode that never pairs individual results: a current result is
//! unchanged when its rule fired in the baseline at all, and a baseline
//! result is absent when its rule no longer fires.

use rustc_hash::FxHashSet;

use crate::extracted::ExtractedResult;
use crate::matching::MatchedPair;
use crate::sarif::BaselineState;

use super::BaselinedEntry;

pub(super) fn classify<'a>(
    baseline: Vec<ExtractedResult<'a>>,
    current: Vec<ExtractedResult<'a>>,
) -> Vec<BaselinedEntry<'a>> {
    let baseline_rules: FxHashSet<Option<String>> = baseline
        .iter()
        .map(|result| result.rule_id().map(str::to_string))
        .collect();
    let current_rules: FxHashSet<Option<String>> = current
        .iter()
        .map(|result| result.rule_id().map(str::to_string))
        .collect();

    let mut entries = Vec::with_capacity(baseline.len() + current.len());
    for result in current {
        let known = baseline_rules.contains(&result.rule_id().map(str::to_string));
        entries.push(BaselinedEntry {
            pair: MatchedPair::unmatched_current(result),
            state: if known {
                BaselineState::Unchanged
            } else {
                BaselineState::New
            },
        });
    }
    for result in baseline {
        if !current_rules.contains(&result.rule_id().map(str::to_string)) {
            entries.push(BaselinedEntry {
                pair: MatchedPair::unmatched_baseline(result),
                state: BaselineState::Absent,
            });
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extracted::extract_results;
    use crate::sarif::{Run, SarifResult, Tool};

    fn run_of(rules: &[&str]) -> Run {
        let mut run = Run::new(Tool::named("lint"));
        run.results = rules.iter().map(|rule| SarifResult::new(*rule, "m")).collect();
        run
    }

    #[test]
    fn test_classify_by_rule_id() {
        let baseline = run_of(&["R1", "R2", "R2"]);
        let current = run_of(&["R1", "R1", "R3"]);

        let entries = classify(
            extract_results(std::iter::once(&baseline), true),
            extract_results(std::iter::once(&current), false),
        );
        let states: Vec<BaselineState> = entries.iter().map(|e| e.state).collect();

        assert_eq!(
            states,
            vec![
                BaselineState::Unchanged,
                BaselineState::Unchanged,
                BaselineState::New,
                BaselineState::Absent,
                BaselineState::Absent,
            ]
        );
        assert!(entries.iter().all(|e| e.pair.matched_by.is_none()));
    }
}
