//! Column Layout Hash
//!
//! CRC32 fingerprint of an ordered column list. A fitted model records the
//! hash of the feature columns it was trained on and refuses any matrix whose
//! hash differs (different columns, or same columns in another order).

use crc32fast::Hasher;

/// Layout format version, part of every hash
pub const LAYOUT_VERSION: u8 = 1;

/// Compute CRC32 hash of an ordered column layout
pub fn layout_hash<S: AsRef<str>>(columns: &[S]) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[LAYOUT_VERSION]);

    for name in columns {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}
