//! Serde helpers for the numeric encodings builders use on the wire.
//! Go builders send fees as bare JSON integers of any size, others send quantities as
//! (hex or decimal) strings, so decoding is lenient while encoding is fixed.
use alloy_primitives::{I256, U256, U64};
use serde::{de, Deserialize, Deserializer, Serializer};
use serde_json::value::RawValue;

/// Decimal or 0x-prefixed hex integer, optionally signed.
pub fn parse_signed_quantity(s: &str) -> Result<I256, String> {
    let s = s.trim();
    let parsed = if s.trim_start_matches(['-', '+']).starts_with("0x") {
        I256::from_hex_str(s)
    } else {
        I256::from_dec_str(s)
    };
    parsed.map_err(|err| format!("invalid quantity {s:?}: {err}"))
}

/// Reads the raw JSON token so integers wider than 64 bits keep their precision.
fn signed_from_raw(raw: &RawValue) -> Result<I256, String> {
    let text = raw.get();
    if text.starts_with('"') {
        let s: String = serde_json::from_str(text).map_err(|err| err.to_string())?;
        parse_signed_quantity(&s)
    } else {
        I256::from_dec_str(text).map_err(|err| format!("invalid quantity {text}: {err}"))
    }
}

/// Bare JSON numbers up to 128 bits, decimal strings beyond.
fn serialize_signed<S: Serializer>(value: &I256, serializer: S) -> Result<S::Ok, S::Error> {
    if let Ok(v) = u64::try_from(*value) {
        serializer.serialize_u64(v)
    } else if let Ok(v) = i64::try_from(*value) {
        serializer.serialize_i64(v)
    } else if let Ok(v) = u128::try_from(*value) {
        serializer.serialize_u128(v)
    } else if let Ok(v) = i128::try_from(*value) {
        serializer.serialize_i128(v)
    } else {
        serializer.collect_str(value)
    }
}

/// `Option<I256>` fee fields. `null` or a missing key is `None`.
pub mod option_signed_quantity {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<I256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serialize_signed(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<I256>, D::Error> {
        Option::<Box<RawValue>>::deserialize(deserializer)?
            .map(|raw| signed_from_raw(&raw).map_err(de::Error::custom))
            .transpose()
    }
}

/// `u64` quantities sent either as JSON numbers or hex strings, always written as numbers.
pub mod quantity {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(U64::deserialize(deserializer)?.to::<u64>())
    }
}

/// U256 written as a JSON number when it fits 128 bits, as a decimal string otherwise.
pub mod u256_decimal {
    use super::*;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        if let Ok(v) = u64::try_from(*value) {
            serializer.serialize_u64(v)
        } else if let Ok(v) = u128::try_from(*value) {
            serializer.serialize_u128(v)
        } else {
            serializer.collect_str(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        U256::deserialize(deserializer)
    }
}
