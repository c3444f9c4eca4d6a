//! Arbitrary precision integer type

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Arbitrary precision signed integer, serialized as a decimal string
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int(BigInt);

impl Serialize for Int {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Int {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BigInt::from_str(&s)
            .map(Int)
            .map_err(serde::de::Error::custom)
    }
}

impl Int {
    pub fn from_u64(n: u64) -> Self {
        Self(BigInt::from(n))
    }

    pub fn from_i64(n: i64) -> Self {
        Self(BigInt::from(n))
    }

    /// `n * 10^decimals`, the usual way to express whole token units
    pub fn with_decimal(n: u64, decimals: u32) -> Self {
        Self(BigInt::from(n) * BigInt::from(10u8).pow(decimals))
    }

    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }
}

impl FromStr for Int {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(BigInt::from_str(s)?))
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Int {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Int {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_string() {
        let value = Int::from_str("600000000000000000000").unwrap();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"600000000000000000000\"");

        let back: Int = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_with_decimal() {
        assert_eq!(Int::with_decimal(1, 18).to_string(), "1000000000000000000");
        assert_eq!(Int::with_decimal(7, 0), Int::from_u64(7));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Int::zero().is_zero());
        assert!(Int::from_i64(-1).is_negative());
        assert!(Int::from_u64(1).is_positive());
        assert_eq!(Int::from_u64(5) - Int::from_u64(7), Int::from_i64(-2));
    }
}
