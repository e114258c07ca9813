//! Deterministic 32-bit hash helpers shared by the comparers.
//!
//! Bucket keys must not depend on per-process random state, so nothing here
//! uses `std::collections::hash_map::RandomState`.

use std::hash::{Hash, Hasher};

use md5::{Digest, Md5};
use rustc_hash::FxHasher;

/// Computes a hash code compatible with Java's `String.hashCode()`.
///
/// Java's algorithm: `s[0]*31^(n-1) + s[1]*31^(n-2) + ... + s[n-1]`
/// over UTF-16 code units, with wrapping `int` arithmetic.
pub fn string_hash(s: &str) -> i32 {
    let mut hash: i32 = 0;
    for code in s.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(code as i32);
    }
    hash
}

/// Folds the first four bytes of an MD5 digest into a signed 32-bit value.
pub fn digest_to_i32(digest: &[u8; 16]) -> i32 {
    // Signed bytes, sign-extended, matching Java's byte arithmetic.
    let b0 = digest[0] as i8 as i32;
    let b1 = digest[1] as i8 as i32;
    let b2 = digest[2] as i8 as i32;
    let b3 = digest[3] as i8 as i32;
    b0.wrapping_add(b1 << 8)
        .wrapping_add(b2 << 16)
        .wrapping_add(b3 << 24)
}

/// Incremental MD5 digest over a sequence of strings.
///
/// Each part is terminated with a separator byte that cannot occur in UTF-8,
/// so `["ab", "c"]` and `["a", "bc"]` digest differently.
pub struct TextDigest {
    hasher: Md5,
}

impl Default for TextDigest {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDigest {
    /// Creates an empty digest.
    pub fn new() -> Self {
        TextDigest { hasher: Md5::new() }
    }

    /// Feeds one string part.
    pub fn update(&mut self, part: &str) {
        self.hasher.update(part.as_bytes());
        self.hasher.update([0xff]);
    }

    /// Finishes the digest and folds it to 32 bits.
    pub fn finish_i32(self) -> i32 {
        let digest: [u8; 16] = self.hasher.finalize().into();
        digest_to_i32(&digest)
    }
}

/// Hashes any `Hash` value with `FxHasher` and folds the result to 32 bits.
pub fn fx_hash<T: Hash + ?Sized>(value: &T) -> i32 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    fold_u64(hasher.finish())
}

/// Folds a 64-bit hash into 32 bits, keeping entropy from both halves.
pub fn fold_u64(value: u64) -> i32 {
    ((value >> 32) ^ value) as u32 as i32
}
