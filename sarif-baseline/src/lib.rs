//! SARIF result baselining.
//!
//! This library compares the results of a static-analysis scan against an
//! earlier scan of the same code and decides, for every result, whether it is
//! new, unchanged, updated or gone.
//!
//! # Overview
//!
//! Results are paired by a chain of matchers, most specific first:
//!
//! - identical results, ignoring baselining bookkeeping
//! - tool-supplied partial fingerprints
//! - the source text surrounding the flagged region
//! - stacks, graphs and code flows
//!
//! Each matcher buckets results by hash and only compares results within a
//! bucket. When files move between scans, prefix remappings derived from the
//! URIs on both sides let location-sensitive matchers still find their
//! counterparts.
//!
//! # Example
//!
//! ```no_run
//! use sarif_baseline::{load_log, BaselineConfig, SarifLogMatcher};
//!
//! let baseline = load_log("baseline.sarif")?;
//! let current = load_log("current.sarif")?;
//! let matcher = SarifLogMatcher::new(BaselineConfig::default());
//! let matched = matcher.match_logs(&[baseline], &[current]);
//! sarif_baseline::save_log(&matched, "baselined.sarif")?;
//! # Ok::<(), sarif_baseline::Error>(())
//! ```

pub mod baseline;
pub mod config;
pub mod constants;
pub mod error;
pub mod extracted;
pub mod hashing;
pub mod matching;
pub mod remap;
pub mod sarif;

// Re-export commonly used types
pub use baseline::{
    BaselineOutcome, BaselinedEntry, Baseliner, MatchLog, MatcherStats, SarifLogMatcher,
};
pub use config::{BaselineConfig, MatchMode, PropertyBagMergeBehavior, RemappingConfig};
pub use constants::*;
pub use error::{Error, Result};
pub use extracted::{extract_results, resolve_artifact_uri, ExtractedResult};
pub use matching::{
    fingerprint_hash, AmbiguityPolicy, BucketedMatcher, MatchedPair, MatcherKind, MatcherOutput,
    MatchingComparer, StructuralKinds,
};
pub use remap::{RemappingCalculator, RemappingCandidate, RemappingSource};
pub use sarif::{load_log, parse_log, save_log, BaselineState, Run, SarifLog, SarifResult};
