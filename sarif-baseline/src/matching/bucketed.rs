//! Hash-bucketed matching of two result collections.
//!
//! `BucketedMatcher` indexes the baseline side by comparer hash, then walks
//! the current side in input order looking up equal, not yet consumed
//! baseline results. Lookups only ever compare results that share a bucket.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::extracted::ExtractedResult;
use crate::remap::RemappingCandidate;

use super::{AmbiguityPolicy, MatchedPair, MatchingComparer};

/// What one matcher produced from its inputs.
#[derive(Debug, Default)]
pub struct MatcherOutput<'a> {
    /// Linked pairs, in current input order.
    pub pairs: Vec<MatchedPair<'a>>,
    /// Baseline results left for later matchers, in input order.
    pub unmatched_baseline: Vec<ExtractedResult<'a>>,
    /// Current results left for later matchers, in input order.
    pub unmatched_current: Vec<ExtractedResult<'a>>,
    /// Current results with several candidates, or whose only candidate was
    /// also claimed by another current result.
    pub ambiguous: usize,
    /// Pairs that were only found after remapping paths.
    pub remapped: usize,
}

/// Runs one comparer over two result collections.
#[derive(Debug, Clone, Copy)]
pub struct BucketedMatcher<'c> {
    comparer: MatchingComparer,
    ambiguity: AmbiguityPolicy,
    remappings: &'c [RemappingCandidate],
}

impl<'c> BucketedMatcher<'c> {
    /// Creates a matcher with no path remappings.
    pub fn new(comparer: MatchingComparer, ambiguity: AmbiguityPolicy) -> Self {
        BucketedMatcher {
            comparer,
            ambiguity,
            remappings: &[],
        }
    }

    /// Sets the remapping candidates tried when a direct lookup finds nothing.
    ///
    /// Candidates are tried in the given order and the first that yields a
    /// match wins.
    pub fn with_remappings(mut self, remappings: &'c [RemappingCandidate]) -> Self {
        self.remappings = remappings;
        self
    }

    /// Returns the comparer this matcher runs.
    pub fn comparer(&self) -> MatchingComparer {
        self.comparer
    }

    /// Matches `current` against `baseline`.
    ///
    /// Every input result ends up in exactly one of the output's pairs or
    /// unmatched lists. Candidates are looked up before anything is consumed,
    /// so a current result is ambiguous when it equals several baseline
    /// results or when another current result claims its only candidate.
    /// The ambiguity policy decides what happens to ambiguous results.
    pub fn match_results<'a>(
        &self,
        baseline: Vec<ExtractedResult<'a>>,
        current: Vec<ExtractedResult<'a>>,
    ) -> MatcherOutput<'a> {
        let mut buckets: FxHashMap<i32, Vec<usize>> = FxHashMap::default();
        for (index, result) in baseline.iter().enumerate() {
            if self.comparer.applies_to(result) {
                buckets
                    .entry(self.comparer.hash(result))
                    .or_default()
                    .push(index);
            }
        }

        let mut claims = vec![0usize; baseline.len()];
        let mut lookups: Vec<(ExtractedResult<'a>, Lookup)> = Vec::with_capacity(current.len());
        for result in current {
            let lookup = if self.comparer.applies_to(&result) {
                self.lookup(&result, &baseline, &buckets)
            } else {
                Lookup::default()
            };
            for &index in &lookup.candidates {
                claims[index] += 1;
            }
            lookups.push((result, lookup));
        }

        let mut consumed = vec![false; baseline.len()];
        let mut output = MatcherOutput::default();
        let mut links: Vec<(usize, ExtractedResult<'a>, bool)> = Vec::new();

        for (result, lookup) in lookups {
            let Some(&first) = lookup.candidates.first() else {
                output.unmatched_current.push(result);
                continue;
            };

            let contested = lookup.candidates.len() > 1 || claims[first] > 1;
            if contested {
                output.ambiguous += 1;
                debug!(
                    matcher = %self.comparer.kind(),
                    current = result.ordinal(),
                    candidates = lookup.candidates.len(),
                    "ambiguous match"
                );
            }

            let chosen = match self.ambiguity {
                AmbiguityPolicy::Defer if contested => None,
                _ => lookup
                    .candidates
                    .iter()
                    .copied()
                    .find(|&index| !consumed[index]),
            };

            match chosen {
                Some(index) => {
                    consumed[index] = true;
                    if lookup.remapped {
                        output.remapped += 1;
                    }
                    links.push((index, result, lookup.remapped));
                }
                None => output.unmatched_current.push(result),
            }
        }

        let mut baseline: Vec<Option<ExtractedResult<'a>>> =
            baseline.into_iter().map(Some).collect();
        for (index, current, remapped) in links {
            if let Some(matched) = baseline[index].take() {
                output.pairs.push(MatchedPair::matched(
                    matched,
                    current,
                    self.comparer.kind(),
                    remapped,
                ));
            }
        }
        output.unmatched_baseline = baseline.into_iter().flatten().collect();

        output
    }

    /// Finds the baseline results equal to `result`, directly or else through
    /// the first remapping that yields any.
    fn lookup(
        &self,
        result: &ExtractedResult<'_>,
        baseline: &[ExtractedResult<'_>],
        buckets: &FxHashMap<i32, Vec<usize>>,
    ) -> Lookup {
        let candidates = self.find_candidates(result, baseline, buckets);
        if !candidates.is_empty() {
            return Lookup {
                candidates,
                remapped: false,
            };
        }
        match self.find_remapped(result, baseline, buckets) {
            Some(candidates) => Lookup {
                candidates,
                remapped: true,
            },
            None => Lookup::default(),
        }
    }

    /// Returns baseline indices equal to `result`, in input order.
    fn find_candidates(
        &self,
        result: &ExtractedResult<'_>,
        baseline: &[ExtractedResult<'_>],
        buckets: &FxHashMap<i32, Vec<usize>>,
    ) -> Vec<usize> {
        debug_assert!(self.comparer.applies_to(result));
        let Some(bucket) = buckets.get(&self.comparer.hash(result)) else {
            return Vec::new();
        };
        bucket
            .iter()
            .copied()
            .filter(|&index| self.comparer.equal(&baseline[index], result))
            .collect()
    }

    /// Retries the lookup with each applicable remapping of `result`.
    fn find_remapped(
        &self,
        result: &ExtractedResult<'_>,
        baseline: &[ExtractedResult<'_>],
        buckets: &FxHashMap<i32, Vec<usize>>,
    ) -> Option<Vec<usize>> {
        for remapping in self.remappings {
            if !remapping.applies_to(result) {
                continue;
            }
            let remapped = remapping.remap(result);
            if !self.comparer.applies_to(&remapped) {
                continue;
            }
            let candidates = self.find_candidates(&remapped, baseline, buckets);
            if !candidates.is_empty() {
                debug!(
                    matcher = %self.comparer.kind(),
                    from = %remapping.current_prefix,
                    to = %remapping.baseline_prefix,
                    "matched after remapping"
                );
                return Some(candidates);
            }
        }
        None
    }
}

/// Baseline candidates found for one current result.
#[derive(Debug, Default)]
struct Lookup {
    candidates: Vec<usize>,
    remapped: bool,
}
