//! Serde adapters for the ledger's JSON conventions
//!
//! 64-bit integers travel as decimal strings and byte strings as base64.
//! Decoders also accept bare numbers and `null`, which nodes emit for
//! zero values and empty fields.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber<T> {
    String(String),
    Number(T),
}

/// `u64` encoded as a decimal string
pub mod u64_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Option::<StringOrNumber<u64>>::deserialize(deserializer)? {
            Some(StringOrNumber::String(s)) if s.is_empty() => Ok(0),
            Some(StringOrNumber::String(s)) => s.parse().map_err(serde::de::Error::custom),
            Some(StringOrNumber::Number(n)) => Ok(n),
            None => Ok(0),
        }
    }
}

/// `i64` encoded as a decimal string
pub mod i64_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Option::<StringOrNumber<i64>>::deserialize(deserializer)? {
            Some(StringOrNumber::String(s)) if s.is_empty() => Ok(0),
            Some(StringOrNumber::String(s)) => s.parse().map_err(serde::de::Error::custom),
            Some(StringOrNumber::Number(n)) => Ok(n),
            None => Ok(0),
        }
    }
}

/// Bytes encoded as standard base64; `null` decodes to empty
pub mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => STANDARD.decode(s).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// `null` decodes to `T::default()`
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        #[serde(with = "u64_string", default)]
        sequence: u64,
        #[serde(with = "i64_string", default)]
        height: i64,
        #[serde(with = "base64_bytes", default)]
        data: Vec<u8>,
        #[serde(deserialize_with = "null_as_default", default)]
        names: Vec<String>,
    }

    #[test]
    fn test_accepts_strings_numbers_and_null() {
        let a: Sample =
            serde_json::from_str(r#"{"sequence":"12","height":-3,"data":"AQI=","names":null}"#)
                .unwrap();
        assert_eq!(
            a,
            Sample {
                sequence: 12,
                height: -3,
                data: vec![1, 2],
                names: vec![],
            }
        );

        let b: Sample = serde_json::from_str(r#"{"sequence":7,"height":"","data":null}"#).unwrap();
        assert_eq!(b.sequence, 7);
        assert_eq!(b.height, 0);
        assert!(b.data.is_empty());
    }

    #[test]
    fn test_serializes_strings() {
        let sample = Sample {
            sequence: 1,
            height: 2,
            data: vec![0xff],
            names: vec!["a".into()],
        };
        assert_eq!(
            serde_json::to_string(&sample).unwrap(),
            r#"{"sequence":"1","height":"2","data":"/w==","names":["a"]}"#
        );
    }
}
