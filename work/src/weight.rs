//! Hash to weight conversion.

use xdag_types::{Difficulty, U256};

/// Weight of a hash: `U256::MAX / hash`, reading the hash as a little-endian
/// 256-bit integer. Lower hashes weigh more. An all-zero hash gets the
/// maximum weight instead of dividing by zero.
pub fn hash_to_weight(hash: &[u8; 32]) -> Difficulty {
    let value = U256::from_little_endian(hash);
    if value.is_zero() {
        return U256::MAX;
    }
    U256::MAX / value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_with_top(top: u64) -> [u8; 32] {
        let mut bytes = [0xffu8; 32];
        bytes[24..].copy_from_slice(&top.to_le_bytes());
        bytes
    }

    #[test]
    fn zero_hash_is_max_weight() {
        assert_eq!(hash_to_weight(&[0; 32]), U256::MAX);
    }

    #[test]
    fn max_hash_weighs_one() {
        assert_eq!(hash_to_weight(&[0xff; 32]), U256::one());
    }

    #[test]
    fn lower_hash_weighs_more() {
        let light = hash_to_weight(&hash_with_top(1 << 40));
        let heavy = hash_to_weight(&hash_with_top(1 << 20));
        assert!(heavy > light);
    }

    #[test]
    fn low_bytes_are_least_significant() {
        let mut a = [0u8; 32];
        a[31] = 1;
        let mut b = [0u8; 32];
        b[0] = 1;
        assert!(hash_to_weight(&b) > hash_to_weight(&a));
    }
}
