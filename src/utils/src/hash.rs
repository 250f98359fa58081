use std::hash::Hasher;

/// hash_key computes a hash of key. Hash is always non-zero.
pub fn hash_key(key: &[u8]) -> u64 {
    let mut xx_hash = twox_hash::XxHash64::with_seed(0);
    xx_hash.write(key);
    let mut h = xx_hash.finish();

    if h == 0 {
        h = 1;
    }

    h
}

/// hash_parts hashes a sequence of byte strings. Each part is length-prefixed so
/// that `["ab", "c"]` and `["a", "bc"]` hash differently.
pub fn hash_parts<'a, I>(parts: I) -> u64
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut buf = Vec::new();
    for part in parts {
        buf.extend_from_slice((part.len() as u32).to_be_bytes().as_slice());
        buf.extend_from_slice(part);
    }
    hash_key(buf.as_slice())
}

#[cfg(test)]
mod tests {
    use crate::hash::{hash_key, hash_parts};

    #[test]
    fn test_hash_non_zero() {
        assert_ne!(hash_key([2, 3, 4, 5].as_slice()), 0);
        assert_ne!(hash_key(&[]), 0);
    }

    #[test]
    fn test_hash_parts_boundaries() {
        let a = hash_parts(["ab".as_bytes(), "c".as_bytes()]);
        let b = hash_parts(["a".as_bytes(), "bc".as_bytes()]);
        assert_ne!(a, b);
        assert_eq!(a, hash_parts(["ab".as_bytes(), "c".as_bytes()]));
    }
}
