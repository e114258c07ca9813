//! Per-matcher statistics for a baselining pass.
//!
//! The log records what each matcher stage linked and how the final states
//! came out. It can be written as plain text or serialized as JSON.

use std::io::Write;

use serde::Serialize;

use crate::matching::MatcherKind;
use crate::sarif::BaselineState;

/// What one matcher stage did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatcherStats {
    pub matcher: MatcherKind,
    /// Pairs linked by this stage.
    pub matched: usize,
    /// Of those, pairs found only after remapping.
    pub remapped: usize,
    /// Current results whose candidates were not exclusively theirs.
    pub ambiguous: usize,
}

/// Log of a baselining pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchLog {
    stages: Vec<MatcherStats>,
    remapping_candidates: usize,
    new: usize,
    unchanged: usize,
    updated: usize,
    absent: usize,
}

impl MatchLog {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one matcher stage.
    pub fn record_stage(&mut self, stats: MatcherStats) {
        self.stages.push(stats);
    }

    /// Records how many remapping candidates were computed.
    pub fn record_remapping_candidates(&mut self, count: usize) {
        self.remapping_candidates = count;
    }

    /// Records one classified result.
    pub fn record_state(&mut self, state: BaselineState) {
        match state {
            BaselineState::New => self.new += 1,
            BaselineState::Unchanged => self.unchanged += 1,
            BaselineState::Updated => self.updated += 1,
            BaselineState::Absent => self.absent += 1,
        }
    }

    /// Returns the stages in the order they ran.
    pub fn stages(&self) -> &[MatcherStats] {
        &self.stages
    }

    /// Returns the number of remapping candidates computed.
    pub fn remapping_candidates(&self) -> usize {
        self.remapping_candidates
    }

    /// Counts results classified as `state`.
    pub fn count_by_state(&self, state: BaselineState) -> usize {
        match state {
            BaselineState::New => self.new,
            BaselineState::Unchanged => self.unchanged,
            BaselineState::Updated => self.updated,
            BaselineState::Absent => self.absent,
        }
    }

    /// Total pairs linked across all stages.
    pub fn matched_count(&self) -> usize {
        self.stages.iter().map(|s| s.matched).sum()
    }

    /// Total ambiguous lookups across all stages.
    pub fn ambiguous_count(&self) -> usize {
        self.stages.iter().map(|s| s.ambiguous).sum()
    }

    /// Writes a human-readable summary.
    pub fn write_summary<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for state in BaselineState::ALL {
            writeln!(writer, "{:<10} {}", state.as_str(), self.count_by_state(state))?;
        }

        if !self.stages.is_empty() {
            writeln!(writer)?;
            writeln!(
                writer,
                "{:<20} {:>8} {:>8} {:>9}",
                "matcher", "matched", "remapped", "ambiguous"
            )?;
            for stage in &self.stages {
                writeln!(
                    writer,
                    "{:<20} {:>8} {:>8} {:>9}",
                    stage.matcher.name(),
                    stage.matched,
                    stage.remapped,
                    stage.ambiguous
                )?;
            }
        }

        if self.remapping_candidates > 0 {
            writeln!(writer)?;
            writeln!(writer, "remapping candidates: {}", self.remapping_candidates)?;
        }
        Ok(())
    }

    /// Folds another log into this one.
    ///
    /// Stages with the same matcher are summed; the log matcher uses this to
    /// report one total across tools.
    pub fn merge(&mut self, other: &MatchLog) {
        for stats in &other.stages {
            match self.stages.iter_mut().find(|s| s.matcher == stats.matcher) {
                Some(existing) => {
                    existing.matched += stats.matched;
                    existing.remapped += stats.remapped;
                    existing.ambiguous += stats.ambiguous;
                }
                None => self.stages.push(stats.clone()),
            }
        }
        self.remapping_candidates += other.remapping_candidates;
        self.new += other.new;
        self.unchanged += other.unchanged;
        self.updated += other.updated;
        self.absent += other.absent;
    }
}
