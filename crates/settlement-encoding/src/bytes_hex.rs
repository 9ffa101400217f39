//! Serialization of byte sequences as `0x` prefixed hex strings.

use {
    serde::{Deserialize, Deserializer, Serializer, de},
    std::borrow::Cow,
};

pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]> + ?Sized,
{
    serializer.serialize_str(&format!("0x{}", const_hex::encode(bytes.as_ref())))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Cow<str> = Deserialize::deserialize(deserializer)?;
    let hex = s.strip_prefix("0x").ok_or_else(|| {
        de::Error::custom(format!(
            "{s:?} can't be decoded as hex bytes because it does not start with '0x'"
        ))
    })?;
    const_hex::decode(hex)
        .map_err(|err| de::Error::custom(format!("failed to decode {s:?} as hex bytes: {err}")))
}
