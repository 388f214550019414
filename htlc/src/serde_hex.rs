//! Serde helpers for the `0x`-prefixed hex strings used by Ethereum JSON-RPC.

use hex::{FromHex, FromHexError};
use serde::{de, de::Visitor, Deserializer, Serializer};
use std::{fmt, marker::PhantomData};

pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(value)))
}

/// A deserializer for 0x prefixed hex-strings
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromHex<Error = FromHexError>,
{
    struct HexVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for HexVisitor<T>
    where
        T: FromHex<Error = FromHexError>,
    {
        type Value = T;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a 0x-prefixed hex-string")
        }

        fn visit_str<E>(self, v: &str) -> Result<T, E>
        where
            E: de::Error,
        {
            let stripped = v
                .strip_prefix("0x")
                .ok_or_else(|| E::custom(format!("missing 0x prefix in {:?}", v)))?;

            T::from_hex(stripped).map_err(|e| match e {
                FromHexError::InvalidHexCharacter { c, index } => E::invalid_value(
                    de::Unexpected::Char(c),
                    &format!("a hex character at position {}", index).as_str(),
                ),
                FromHexError::InvalidStringLength => {
                    E::invalid_length(stripped.len(), &"a hex string of the expected length")
                }
                FromHexError::OddLength => E::invalid_length(stripped.len(), &"an even length"),
            })
        }
    }

    deserializer.deserialize_str(HexVisitor(PhantomData))
}

/// Quantities such as a receipt's `status` are compact hex (`"0x1"`). Nodes
/// may leave them out or send `null`, both read as `None`.
pub mod quantity {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format!("{:#x}", value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|string| -> Result<u64, D::Error> {
                let digits = string.strip_prefix("0x").ok_or_else(|| {
                    de::Error::custom(format!("missing 0x prefix in {:?}", string))
                })?;

                u64::from_str_radix(digits, 16).map_err(de::Error::custom)
            })
            .transpose()
    }
}
