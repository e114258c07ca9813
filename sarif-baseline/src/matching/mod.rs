//! Result matching strategies.
//!
//! This module provides the comparers that decide whether a current result
//! corresponds to a baseline result, and the bucketed matcher that turns any
//! comparer into a matcher over two result collections. Each comparer is a
//! variant of [`MatchingComparer`]; the orchestrator runs them in a fixed
//! priority order over whatever earlier matchers left unmatched.

mod bucketed;
mod context_region;
mod fingerprint;
mod identical;
mod structural;

pub use bucketed::{BucketedMatcher, MatcherOutput};
pub use fingerprint::fingerprint_hash;
pub use structural::StructuralKinds;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::extracted::ExtractedResult;
use fingerprint::FingerprintSet::{Full, Partial};

/// Identifies a matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherKind {
    /// Whole-record equality, ignoring baselining bookkeeping.
    IdenticalResult,
    /// Tool-supplied full fingerprints.
    FullFingerprint,
    /// Tool-supplied partial fingerprints.
    PartialFingerprint,
    /// Source text surrounding the flagged region.
    ContextRegion,
    /// Stacks, graphs, graph traversals and code flows.
    StructuralData,
}

impl MatcherKind {
    /// Default priority order of the matcher chain.
    pub const DEFAULT_ORDER: [MatcherKind; 5] = [
        MatcherKind::IdenticalResult,
        MatcherKind::FullFingerprint,
        MatcherKind::PartialFingerprint,
        MatcherKind::ContextRegion,
        MatcherKind::StructuralData,
    ];

    /// Returns the kebab-case name used in configuration and reports.
    pub fn name(&self) -> &'static str {
        match self {
            MatcherKind::IdenticalResult => "identical-result",
            MatcherKind::FullFingerprint => "full-fingerprint",
            MatcherKind::PartialFingerprint => "partial-fingerprint",
            MatcherKind::ContextRegion => "context-region",
            MatcherKind::StructuralData => "structural-data",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatcherKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MatcherKind::DEFAULT_ORDER
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown matcher '{}'", s)))
    }
}

/// What a matcher does when a current result equals several baseline results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Match the candidate that comes first in baseline input order.
    #[default]
    FirstByInputOrder,
    /// Leave the current result unmatched for this matcher.
    Defer,
}

impl FromStr for AmbiguityPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" | "first-by-input-order" => Ok(AmbiguityPolicy::FirstByInputOrder),
            "defer" => Ok(AmbiguityPolicy::Defer),
            _ => Err(Error::InvalidArgument(format!(
                "unknown ambiguity policy '{}'",
                s
            ))),
        }
    }
}

/// A matching strategy: an applicability predicate, a hash and an equality.
///
/// `equal(a, b)` implies `hash(a) == hash(b)`. All three operations are
/// total: a result the comparer cannot handle simply does not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingComparer {
    IdenticalResult,
    FullFingerprint,
    PartialFingerprint,
    ContextRegion,
    StructuralData(StructuralKinds),
}

impl MatchingComparer {
    /// Creates the comparer for `kind`.
    ///
    /// `structural_kinds` selects the collections compared by the
    /// structural-data comparer and is ignored by the others.
    pub fn for_kind(kind: MatcherKind, structural_kinds: StructuralKinds) -> Self {
        match kind {
            MatcherKind::IdenticalResult => MatchingComparer::IdenticalResult,
            MatcherKind::FullFingerprint => MatchingComparer::FullFingerprint,
            MatcherKind::PartialFingerprint => MatchingComparer::PartialFingerprint,
            MatcherKind::ContextRegion => MatchingComparer::ContextRegion,
            MatcherKind::StructuralData => MatchingComparer::StructuralData(structural_kinds),
        }
    }

    /// Returns the strategy this comparer implements.
    pub fn kind(&self) -> MatcherKind {
        match self {
            MatchingComparer::IdenticalResult => MatcherKind::IdenticalResult,
            MatchingComparer::FullFingerprint => MatcherKind::FullFingerprint,
            MatchingComparer::PartialFingerprint => MatcherKind::PartialFingerprint,
            MatchingComparer::ContextRegion => MatcherKind::ContextRegion,
            MatchingComparer::StructuralData(_) => MatcherKind::StructuralData,
        }
    }

    /// Whether the result carries enough data for this comparer.
    pub fn applies_to(&self, result: &ExtractedResult<'_>) -> bool {
        match self {
            MatchingComparer::IdenticalResult => identical::applies_to(result),
            MatchingComparer::FullFingerprint => fingerprint::applies_to(result, Full),
            MatchingComparer::PartialFingerprint => fingerprint::applies_to(result, Partial),
            MatchingComparer::ContextRegion => context_region::applies_to(result),
            MatchingComparer::StructuralData(kinds) => structural::applies_to(result, *kinds),
        }
    }

    /// Bucket key of the result.
    pub fn hash(&self, result: &ExtractedResult<'_>) -> i32 {
        match self {
            MatchingComparer::IdenticalResult => identical::hash(result),
            MatchingComparer::FullFingerprint => fingerprint::hash(result, Full),
            MatchingComparer::PartialFingerprint => fingerprint::hash(result, Partial),
            MatchingComparer::ContextRegion => context_region::hash(result),
            MatchingComparer::StructuralData(kinds) => structural::hash(result, *kinds),
        }
    }

    /// Full equality check between two applicable results.
    pub fn equal(&self, a: &ExtractedResult<'_>, b: &ExtractedResult<'_>) -> bool {
        match self {
            MatchingComparer::IdenticalResult => identical::equal(a, b),
            MatchingComparer::FullFingerprint => fingerprint::equal(a, b, Full),
            MatchingComparer::PartialFingerprint => fingerprint::equal(a, b, Partial),
            MatchingComparer::ContextRegion => context_region::equal(a, b),
            MatchingComparer::StructuralData(kinds) => structural::equal(a, b, *kinds),
        }
    }
}

/// A baseline/current correspondence, or a result left unmatched.
///
/// At most one side is `None`: a lone current result is new, a lone baseline
/// result is absent.
#[derive(Debug, Clone)]
pub struct MatchedPair<'a> {
    pub baseline: Option<ExtractedResult<'a>>,
    pub current: Option<ExtractedResult<'a>>,
    /// The matcher that linked the two sides.
    pub matched_by: Option<MatcherKind>,
    /// Whether the link needed a path remapping.
    pub remapped: bool,
}

impl<'a> MatchedPair<'a> {
    /// Creates a pair linking both sides.
    pub fn matched(
        baseline: ExtractedResult<'a>,
        current: ExtractedResult<'a>,
        matched_by: MatcherKind,
        remapped: bool,
    ) -> Self {
        MatchedPair {
            baseline: Some(baseline),
            current: Some(current),
            matched_by: Some(matched_by),
            remapped,
        }
    }

    /// Creates an entry for a current result with no baseline counterpart.
    pub fn unmatched_current(current: ExtractedResult<'a>) -> Self {
        MatchedPair {
            baseline: None,
            current: Some(current),
            matched_by: None,
            remapped: false,
        }
    }

    /// Creates an entry for a baseline result with no current counterpart.
    pub fn unmatched_baseline(baseline: ExtractedResult<'a>) -> Self {
        MatchedPair {
            baseline: Some(baseline),
            current: None,
            matched_by: None,
            remapped: false,
        }
    }

    /// Whether both sides are present.
    pub fn is_match(&self) -> bool {
        self.baseline.is_some() && self.current.is_some()
    }
}
