//! Baselining: pairing the results of two scans and classifying them.
//!
//! [`Baseliner`] runs the configured matcher chain over a baseline and a
//! current set of runs. Each matcher only sees what earlier matchers left
//! unmatched. The outcome classifies every current result as new, unchanged
//! or updated, and lists baseline results that disappeared as absent.

mod annotate;
mod log_matcher;
mod match_log;
mod rule_id;

pub use log_matcher::SarifLogMatcher;
pub use match_log::{MatchLog, MatcherStats};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{BaselineConfig, MatchMode};
use crate::extracted::{extract_results, ExtractedResult};
use crate::matching::{BucketedMatcher, MatchedPair, MatchingComparer};
use crate::remap::RemappingCalculator;
use crate::sarif::{BaselineState, Run, SarifResult};

/// A pair together with its classification.
#[derive(Debug, Clone)]
pub struct BaselinedEntry<'a> {
    pub pair: MatchedPair<'a>,
    pub state: BaselineState,
}

impl<'a> BaselinedEntry<'a> {
    /// Returns the result this entry reports: the current side, or the
    /// baseline side for absent entries.
    pub fn result(&self) -> Option<&ExtractedResult<'a>> {
        self.pair.current.as_ref().or(self.pair.baseline.as_ref())
    }
}

/// Everything a baselining pass produced.
#[derive(Debug, Clone)]
pub struct BaselineOutcome<'a> {
    /// Current-side entries in current input order, then absent entries in
    /// baseline input order.
    entries: Vec<BaselinedEntry<'a>>,
    match_log: MatchLog,
}

impl<'a> BaselineOutcome<'a> {
    /// Returns every entry.
    pub fn entries(&self) -> &[BaselinedEntry<'a>] {
        &self.entries
    }

    /// Returns the entries for current results.
    pub fn current_entries(&self) -> impl Iterator<Item = &BaselinedEntry<'a>> {
        self.entries
            .iter()
            .filter(|entry| entry.state != BaselineState::Absent)
    }

    /// Returns the entries for baseline results with no current counterpart.
    pub fn absent(&self) -> impl Iterator<Item = &BaselinedEntry<'a>> {
        self.entries
            .iter()
            .filter(|entry| entry.state == BaselineState::Absent)
    }

    /// Counts entries in `state`.
    pub fn count(&self, state: BaselineState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    /// Returns the statistics of the pass.
    pub fn match_log(&self) -> &MatchLog {
        &self.match_log
    }

    /// Produces the annotated output results, current entries first.
    ///
    /// Each result gets its baseline state, a correlation guid linking it to
    /// its baseline counterpart, a guid, a first detection time and the
    /// result-matching property.
    pub fn annotated_results(&self) -> Vec<SarifResult> {
        self.annotated_results_at(Utc::now())
    }

    /// Like [`annotated_results`](Self::annotated_results), using `now` when
    /// no detection time can be derived from the inputs.
    pub fn annotated_results_at(&self, now: DateTime<Utc>) -> Vec<SarifResult> {
        self.entries
            .iter()
            .filter_map(|entry| annotate::annotate(entry, now))
            .collect()
    }
}

/// Runs the matcher chain configured by a [`BaselineConfig`].
#[derive(Debug, Clone, Default)]
pub struct Baseliner {
    config: BaselineConfig,
}

impl Baseliner {
    pub fn new(config: BaselineConfig) -> Self {
        Baseliner { config }
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    /// Baselines `current_runs` against `baseline_runs`.
    ///
    /// Baseline results already marked absent are skipped.
    pub fn baseline<'a, B, C>(&self, baseline_runs: B, current_runs: C) -> BaselineOutcome<'a>
    where
        B: IntoIterator<Item = &'a Run>,
        C: IntoIterator<Item = &'a Run>,
    {
        let baseline = extract_results(baseline_runs, true);
        let current = extract_results(current_runs, false);
        self.baseline_results(baseline, current)
    }

    /// Baselines already extracted results.
    ///
    /// Ordinals must number each side in input order.
    pub fn baseline_results<'a>(
        &self,
        baseline: Vec<ExtractedResult<'a>>,
        current: Vec<ExtractedResult<'a>>,
    ) -> BaselineOutcome<'a> {
        warn_unresolvable("baseline", &baseline);
        warn_unresolvable("current", &current);

        let mut match_log = MatchLog::new();
        let entries = match self.config.mode {
            MatchMode::Full => self.match_chain(baseline, current, &mut match_log),
            MatchMode::RuleId => rule_id::classify(baseline, current),
        };

        for entry in &entries {
            match_log.record_state(entry.state);
        }
        info!(
            new = match_log.count_by_state(BaselineState::New),
            unchanged = match_log.count_by_state(BaselineState::Unchanged),
            updated = match_log.count_by_state(BaselineState::Updated),
            absent = match_log.count_by_state(BaselineState::Absent),
            "baselining complete"
        );

        BaselineOutcome { entries, match_log }
    }

    fn match_chain<'a>(
        &self,
        baseline: Vec<ExtractedResult<'a>>,
        current: Vec<ExtractedResult<'a>>,
        match_log: &mut MatchLog,
    ) -> Vec<BaselinedEntry<'a>> {
        let remappings = match self.config.remapping_budget() {
            0 => Vec::new(),
            budget => RemappingCalculator::new(budget).calculate_candidates(&baseline, &current),
        };
        match_log.record_remapping_candidates(remappings.len());

        let mut baseline_residual = baseline;
        let mut current_residual = current;
        let mut matched: Vec<MatchedPair<'a>> = Vec::new();

        for &kind in &self.config.matchers {
            if baseline_residual.is_empty() || current_residual.is_empty() {
                match_log.record_stage(MatcherStats {
                    matcher: kind,
                    matched: 0,
                    remapped: 0,
                    ambiguous: 0,
                });
                continue;
            }
            let comparer = MatchingComparer::for_kind(kind, self.config.structural_kinds);
            let output = BucketedMatcher::new(comparer, self.config.ambiguity)
                .with_remappings(&remappings)
                .match_results(baseline_residual, current_residual);

            debug!(
                matcher = %kind,
                matched = output.pairs.len(),
                remapped = output.remapped,
                ambiguous = output.ambiguous,
                "matcher stage"
            );
            match_log.record_stage(MatcherStats {
                matcher: kind,
                matched: output.pairs.len(),
                remapped: output.remapped,
                ambiguous: output.ambiguous,
            });

            matched.extend(output.pairs);
            baseline_residual = output.unmatched_baseline;
            current_residual = output.unmatched_current;
        }

        let mut entries: Vec<BaselinedEntry<'a>> = matched
            .into_iter()
            .map(|pair| {
                let state = matched_state(&pair);
                BaselinedEntry { pair, state }
            })
            .chain(current_residual.into_iter().map(|current| BaselinedEntry {
                pair: MatchedPair::unmatched_current(current),
                state: BaselineState::New,
            }))
            .collect();
        entries.sort_by_key(|entry| entry.pair.current.as_ref().map(|c| c.ordinal()));

        entries.extend(baseline_residual.into_iter().map(|baseline| BaselinedEntry {
            pair: MatchedPair::unmatched_baseline(baseline),
            state: BaselineState::Absent,
        }));
        entries
    }
}

/// Classifies a linked pair.
///
/// A pair whose rule id, message text or effective level changed is updated.
fn matched_state(pair: &MatchedPair<'_>) -> BaselineState {
    let (Some(baseline), Some(current)) = (&pair.baseline, &pair.current) else {
        return BaselineState::New;
    };
    let (b, c) = (baseline.result(), current.result());
    if baseline.rule_id() == current.rule_id()
        && b.message.text == c.message.text
        && b.effective_level() == c.effective_level()
    {
        BaselineState::Unchanged
    } else {
        BaselineState::Updated
    }
}

fn warn_unresolvable(side: &str, results: &[ExtractedResult<'_>]) {
    let broken = results
        .iter()
        .filter(|result| result.location_uris().is_err())
        .count();
    if broken > 0 {
        warn!(
            side,
            results = broken,
            "results reference artifacts missing from their run"
        );
    }
}
