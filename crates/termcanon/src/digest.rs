//! Name segment hashing (FNV-1a 64-bit).
//!
//! The host compiler normally owns name hashes. This is the default provider
//! used when a name is built without an explicit hash:
//!
//! - anonymous root: [`ANONYMOUS_NAME_HASH`]
//! - string segment: FNV-1a over `parent hash (LE) | 's' | utf-8 bytes`
//! - numeric segment: FNV-1a over `parent hash (LE) | 'n' | value (LE)`
//!
//! The segment tag keeps `Foo.5` (numeric) and `Foo.«5»` (string) apart.
//! This is not a security primitive; it is a stability/identity tool.

/// Hash of the anonymous name.
pub const ANONYMOUS_NAME_HASH: u64 = 1723;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

const STRING_SEGMENT_TAG: u8 = b's';
const NUMERIC_SEGMENT_TAG: u8 = b'n';

/// Compute FNV-1a 64-bit over arbitrary bytes.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    add(&mut hash, bytes);
    hash
}

fn add(hash: &mut u64, bytes: &[u8]) {
    for b in bytes {
        *hash ^= (*b) as u64;
        *hash = hash.wrapping_mul(FNV_PRIME);
    }
}

pub fn string_segment_hash(parent: u64, segment: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    add(&mut hash, &parent.to_le_bytes());
    add(&mut hash, &[STRING_SEGMENT_TAG]);
    add(&mut hash, segment.as_bytes());
    hash
}

pub fn numeric_segment_hash(parent: u64, segment: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    add(&mut hash, &parent.to_le_bytes());
    add(&mut hash, &[NUMERIC_SEGMENT_TAG]);
    add(&mut hash, &segment.to_le_bytes());
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_matches_reference_vectors() {
        assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn segment_kind_is_part_of_the_hash() {
        let root = ANONYMOUS_NAME_HASH;
        assert_ne!(string_segment_hash(root, "5"), numeric_segment_hash(root, 5));
    }

    #[test]
    fn parent_is_part_of_the_hash() {
        let a = string_segment_hash(ANONYMOUS_NAME_HASH, "A");
        let b = string_segment_hash(ANONYMOUS_NAME_HASH, "B");
        assert_ne!(string_segment_hash(a, "x"), string_segment_hash(b, "x"));
    }
}
