//! Fingerprint comparers.
//!
//! Tool-assigned fingerprints are the most stable identity a result can
//! carry, so these comparers ignore locations entirely. The full comparer
//! reads `fingerprints`, the partial one `partialFingerprints`.

use std::collections::BTreeMap;

use crate::constants::FINGERPRINT_HASH_SEED;
use crate::extracted::ExtractedResult;
use crate::hashing::string_hash;

/// Which fingerprint map of a result a comparer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FingerprintSet {
    Full,
    Partial,
}

impl FingerprintSet {
    fn of<'r>(self, result: &'r ExtractedResult<'_>) -> &'r BTreeMap<String, String> {
        match self {
            FingerprintSet::Full => &result.result().fingerprints,
            FingerprintSet::Partial => &result.result().partial_fingerprints,
        }
    }
}

pub(super) fn applies_to(result: &ExtractedResult<'_>, set: FingerprintSet) -> bool {
    !set.of(result).is_empty()
}

pub(super) fn hash(result: &ExtractedResult<'_>, set: FingerprintSet) -> i32 {
    fingerprint_hash(set.of(result))
}

pub(super) fn equal(a: &ExtractedResult<'_>, b: &ExtractedResult<'_>, set: FingerprintSet) -> bool {
    set.of(a) == set.of(b)
}

/// Order-independent hash of a fingerprint map.
///
/// Each entry contributes `rotl(hash(key), 16) ^ hash(value)`; entries are
/// combined with XOR starting from [`FINGERPRINT_HASH_SEED`].
pub fn fingerprint_hash(fingerprints: &BTreeMap<String, String>) -> i32 {
    fingerprints
        .iter()
        .fold(FINGERPRINT_HASH_SEED, |hash, (key, value)| {
            let key_hash = (string_hash(key) as u32).rotate_left(16) as i32;
            hash ^ key_hash ^ string_hash(value)
        })
}
