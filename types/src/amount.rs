//! Fixed-point XDAG amounts.
//!
//! Amounts are stored as signed 64-bit nano units (1 XDAG = 10^9 nano).
//! Every arithmetic operation is checked and reports overflow as an
//! [`AmountError`]; nothing wraps and nothing saturates.

use crate::error::AmountError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Denomination used when converting to and from decimal notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XUnit {
    NanoXdag,
    MicroXdag,
    MilliXdag,
    Xdag,
    MegaXdag,
}

impl XUnit {
    /// Power of ten separating this unit from nano.
    pub const fn exponent(self) -> u32 {
        match self {
            Self::NanoXdag => 0,
            Self::MicroXdag => 3,
            Self::MilliXdag => 6,
            Self::Xdag => 9,
            Self::MegaXdag => 15,
        }
    }

    fn factor(self) -> i64 {
        10i64.pow(self.exponent())
    }
}

/// Nano units per XDAG.
pub const NANO_PER_XDAG: i64 = 1_000_000_000;

/// Fractional bits of the legacy 32.32 fixed-point amount encoding.
const LEGACY_FRACTION_BITS: u32 = 32;

/// Longest decimal string accepted by [`XAmount::parse_decimal`] (digits only).
const MAX_DECIMAL_DIGITS: usize = 36;

/// An exact XDAG amount in nano units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct XAmount(i64);

impl XAmount {
    pub const ZERO: Self = Self(0);

    /// Wrap a raw nano value.
    pub const fn from_nano(nano: i64) -> Self {
        Self(nano)
    }

    /// `value` expressed in `unit`, e.g. `XAmount::of(1, XUnit::Xdag)`.
    pub fn of(value: i64, unit: XUnit) -> Result<Self, AmountError> {
        value
            .checked_mul(unit.factor())
            .map(Self)
            .ok_or(if value < 0 {
                AmountError::Underflow
            } else {
                AmountError::Overflow
            })
    }

    pub const fn nano(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self, AmountError> {
        match self.0.checked_add(other.0) {
            Some(v) => Ok(Self(v)),
            None if other.0 < 0 => Err(AmountError::Underflow),
            None => Err(AmountError::Overflow),
        }
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, AmountError> {
        match self.0.checked_sub(other.0) {
            Some(v) => Ok(Self(v)),
            None if other.0 > 0 => Err(AmountError::Underflow),
            None => Err(AmountError::Overflow),
        }
    }

    pub fn checked_neg(self) -> Result<Self, AmountError> {
        self.0.checked_neg().map(Self).ok_or(AmountError::Overflow)
    }

    pub fn checked_mul(self, factor: i64) -> Result<Self, AmountError> {
        self.0.checked_mul(factor).map(Self).ok_or(AmountError::Overflow)
    }

    /// Render in `unit` with exactly `scale` fractional digits.
    ///
    /// Digits beyond `scale` are dropped with floor rounding (toward negative
    /// infinity): `-1.5 XDAG` at scale 0 renders as `-2`, and `-1` nano at
    /// scale 8 as `-0.00000001`.
    pub fn to_decimal_string(&self, scale: u32, unit: XUnit) -> String {
        let exp = unit.exponent();
        let nano = i128::from(self.0);
        // Value expressed in units of 10^-scale.
        let scaled = if scale >= exp {
            nano * 10i128.pow(scale - exp)
        } else {
            nano.div_euclid(10i128.pow(exp - scale))
        };

        let sign = if scaled < 0 { "-" } else { "" };
        let magnitude = scaled.unsigned_abs();
        if scale == 0 {
            return format!("{sign}{magnitude}");
        }
        let divisor = 10u128.pow(scale);
        format!(
            "{sign}{}.{:0width$}",
            magnitude / divisor,
            magnitude % divisor,
            width = scale as usize
        )
    }

    /// Parse a decimal string expressed in `unit`.
    ///
    /// Digits finer than one nano are floored, matching
    /// [`to_decimal_string`](Self::to_decimal_string).
    pub fn parse_decimal(s: &str, unit: XUnit) -> Result<Self, AmountError> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(AmountError::Parse(s.to_string()));
        }
        if int_part.len() + frac_part.len() > MAX_DECIMAL_DIGITS {
            return Err(AmountError::Parse(format!("{s}: too many digits")));
        }

        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| AmountError::Parse(s.to_string()))?;
            mantissa = mantissa * 10 + i128::from(digit);
        }
        if negative {
            mantissa = -mantissa;
        }

        let frac_len = frac_part.len() as u32;
        let exp = unit.exponent();
        let nano = if frac_len <= exp {
            mantissa * 10i128.pow(exp - frac_len)
        } else {
            mantissa.div_euclid(10i128.pow(frac_len - exp))
        };

        i64::try_from(nano).map(Self).map_err(|_| {
            if nano < 0 {
                AmountError::Underflow
            } else {
                AmountError::Overflow
            }
        })
    }

    /// Convert to the legacy 32.32 fixed-point encoding, rounding half up.
    pub fn to_xamount(&self) -> Result<u64, AmountError> {
        if self.0 < 0 {
            return Err(AmountError::Negative(self.0));
        }
        let nano = self.0 as u128;
        let half = (NANO_PER_XDAG / 2) as u128;
        let legacy = ((nano << LEGACY_FRACTION_BITS) + half) / NANO_PER_XDAG as u128;
        u64::try_from(legacy).map_err(|_| AmountError::Overflow)
    }

    /// Convert from the legacy 32.32 fixed-point encoding, rounding half up.
    pub fn from_xamount(legacy: u64) -> Result<Self, AmountError> {
        let half = 1u128 << (LEGACY_FRACTION_BITS - 1);
        let nano = (u128::from(legacy) * NANO_PER_XDAG as u128 + half) >> LEGACY_FRACTION_BITS;
        i64::try_from(nano)
            .map(Self)
            .map_err(|_| AmountError::Overflow)
    }
}

impl fmt::Display for XAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} XDAG", self.to_decimal_string(9, XUnit::Xdag))
    }
}

/// Parses a plain decimal number of XDAG (`"1.5"`), not the `Display` form.
impl FromStr for XAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s, XUnit::Xdag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_xdag_is_a_billion_nano() {
        assert_eq!(
            XAmount::of(1, XUnit::Xdag).unwrap(),
            XAmount::from_nano(1_000_000_000)
        );
        assert_eq!(
            XAmount::of(5, XUnit::MilliXdag).unwrap(),
            XAmount::from_nano(5_000_000)
        );
    }

    #[test]
    fn add_overflow_fails_instead_of_wrapping() {
        let max = XAmount::from_nano(i64::MAX);
        assert_eq!(max.checked_add(XAmount::from_nano(1)), Err(AmountError::Overflow));
        let min = XAmount::from_nano(i64::MIN);
        assert_eq!(min.checked_sub(XAmount::from_nano(1)), Err(AmountError::Underflow));
    }

    #[test]
    fn of_rejects_unrepresentable_values() {
        assert!(XAmount::of(i64::MAX / 10, XUnit::Xdag).is_err());
        assert!(XAmount::of(-(i64::MAX / 10), XUnit::Xdag).is_err());
    }

    #[test]
    fn decimal_rendering_floors() {
        let a = XAmount::from_nano(1_999_999_999);
        assert_eq!(a.to_decimal_string(9, XUnit::Xdag), "1.999999999");
        assert_eq!(a.to_decimal_string(2, XUnit::Xdag), "1.99");
        assert_eq!(a.to_decimal_string(0, XUnit::Xdag), "1");
        let neg = XAmount::from_nano(-1_500_000_000);
        assert_eq!(neg.to_decimal_string(0, XUnit::Xdag), "-2");
        assert_eq!(neg.to_decimal_string(1, XUnit::Xdag), "-1.5");
        assert_eq!(XAmount::from_nano(-1).to_decimal_string(8, XUnit::Xdag), "-0.00000001");
    }

    #[test]
    fn decimal_rendering_pads_finer_scales() {
        let a = XAmount::from_nano(1_500);
        assert_eq!(a.to_decimal_string(4, XUnit::MicroXdag), "1.5000");
        assert_eq!(a.to_decimal_string(0, XUnit::NanoXdag), "1500");
    }

    #[test]
    fn parse_decimal_floors_sub_nano_digits() {
        assert_eq!(
            XAmount::parse_decimal("1.0000000019", XUnit::Xdag).unwrap(),
            XAmount::from_nano(1_000_000_001)
        );
        assert_eq!(
            XAmount::parse_decimal("-0.0000000001", XUnit::Xdag).unwrap(),
            XAmount::from_nano(-1)
        );
        assert_eq!("12.5".parse::<XAmount>().unwrap(), XAmount::from_nano(12_500_000_000));
        assert_eq!(
            XAmount::parse_decimal(".25", XUnit::Xdag).unwrap(),
            XAmount::from_nano(250_000_000)
        );
    }

    #[test]
    fn parse_decimal_rejects_garbage() {
        assert!(XAmount::parse_decimal("", XUnit::Xdag).is_err());
        assert!(XAmount::parse_decimal("1.2.3", XUnit::Xdag).is_err());
        assert!(XAmount::parse_decimal("abc", XUnit::Xdag).is_err());
        assert!(XAmount::parse_decimal("99999999999", XUnit::Xdag).is_err());
    }

    #[test]
    fn legacy_format_conversion() {
        let one = XAmount::of(1, XUnit::Xdag).unwrap();
        assert_eq!(one.to_xamount().unwrap(), 1u64 << 32);
        assert_eq!(XAmount::from_xamount(1u64 << 32).unwrap(), one);
        // 0.5 XDAG is exactly representable in both encodings.
        assert_eq!(XAmount::from_xamount(1u64 << 31).unwrap(), XAmount::from_nano(500_000_000));
        assert!(XAmount::from_nano(-1).to_xamount().is_err());
    }

    #[test]
    fn display_uses_nine_decimals() {
        assert_eq!(XAmount::from_nano(1_000_000_001).to_string(), "1.000000001 XDAG");
    }
}
