use proptest::prelude::*;

use xdag_types::{AmountError, BlockFlag, BlockFlags, BlockHash, XAmount, XUnit, XdagTime};

proptest! {
    /// Checked addition agrees with i64 arithmetic and never wraps.
    #[test]
    fn add_matches_checked_i64(a in any::<i64>(), b in any::<i64>()) {
        let sum = XAmount::from_nano(a).checked_add(XAmount::from_nano(b));
        match a.checked_add(b) {
            Some(v) => prop_assert_eq!(sum, Ok(XAmount::from_nano(v))),
            None => prop_assert!(sum.is_err()),
        }
    }

    /// Subtraction undoes addition whenever both succeed.
    #[test]
    fn sub_inverts_add(a in -(1i64 << 62)..(1i64 << 62), b in -(1i64 << 62)..(1i64 << 62)) {
        let x = XAmount::from_nano(a);
        let y = XAmount::from_nano(b);
        let sum = x.checked_add(y).unwrap();
        prop_assert_eq!(sum.checked_sub(y).unwrap(), x);
    }

    /// Rendering at full precision and parsing back is lossless.
    #[test]
    fn decimal_string_round_trip(nano in any::<i64>()) {
        let amount = XAmount::from_nano(nano);
        let text = amount.to_decimal_string(9, XUnit::Xdag);
        prop_assert_eq!(XAmount::parse_decimal(&text, XUnit::Xdag).unwrap(), amount);
    }

    /// Legacy 32.32 conversion drifts by at most one nano.
    #[test]
    fn legacy_conversion_within_one_nano(nano in 0i64..(1i64 << 40)) {
        let amount = XAmount::from_nano(nano);
        let back = XAmount::from_xamount(amount.to_xamount().unwrap()).unwrap();
        prop_assert!((back.nano() - nano).abs() <= 1);
    }

    /// Flags survive the single-byte encoding.
    #[test]
    fn flags_bits_round_trip(bits in any::<u8>()) {
        let flags = BlockFlags::from_bits(bits);
        prop_assert_eq!(flags.bits(), bits);
        let rebuilt = BlockFlag::ALL
            .iter()
            .filter(|f| flags.contains(**f))
            .fold(BlockFlags::empty(), |acc, f| acc.with(*f));
        prop_assert_eq!(rebuilt, flags);
    }

    /// HashLow keys are stable under bincode.
    #[test]
    fn hash_low_bincode_round_trip(bytes in prop::array::uniform32(0u8..)) {
        let low = BlockHash::new(bytes).hash_low();
        let encoded = bincode::serialize(&low).unwrap();
        let decoded: xdag_types::HashLow = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, low);
    }

    /// Every tick of a round maps to that round.
    #[test]
    fn round_of_any_tick(round in 0u64..(1 << 40), offset in 0u64..(1 << 16)) {
        let t = XdagTime::new((round << 16) | offset);
        prop_assert_eq!(t.round(), round);
        prop_assert_eq!(t.is_end_of_round(), offset == 0xffff);
    }
}

#[test]
fn max_plus_one_fails() {
    assert_eq!(
        XAmount::from_nano(i64::MAX).checked_add(XAmount::from_nano(1)),
        Err(AmountError::Overflow)
    );
}
