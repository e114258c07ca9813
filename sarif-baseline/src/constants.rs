//! Constants used throughout the baseliner.

/// Seed for the partial fingerprint hash. Any non-zero value works; the hash
/// of an empty map is this value.
pub const FINGERPRINT_HASH_SEED: i32 = -1_324_097_150;

/// Upper bound on remapping candidates tried for a single unmatched result.
pub const DEFAULT_MAX_REMAPPING_CANDIDATES: usize = 8;

/// Upper bound on baseline paths paired with one current path sharing its
/// file name while voting on remappings.
pub const MAX_PAIRINGS_PER_FILE_NAME: usize = 16;

/// Result property bag entry carrying baselining bookkeeping.
pub const RESULT_MATCHING_PROPERTY: &str = "ResultMatching";

/// Key inside [`RESULT_MATCHING_PROPERTY`] naming the run a result came from.
pub const RESULT_MATCHING_RUN_KEY: &str = "Run";

/// Level a SARIF result has when none is given.
pub const DEFAULT_LEVEL: &str = "warning";

/// SARIF version written to output logs.
pub const SARIF_VERSION: &str = "2.1.0";

/// Schema URI written to output logs.
pub const SARIF_SCHEMA_URI: &str = "https://json.schemastore.org/sarif-2.1.0.json";
