//! Serde helpers for positional control parameters.

pub mod sequence {
    use serde::{
        Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned, ser::SerializeSeq,
    };

    pub fn serialize<S, T>(val: &T, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut seq = s.serialize_seq(Some(1))?;
        seq.serialize_element(val)?;
        seq.end()
    }

    /// Deserializes a sequence containing exactly one element.
    pub fn deserialize<'de, T, D>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let mut seq = Vec::<T>::deserialize(d)?;
        let len = seq.len();
        match seq.pop() {
            Some(val) if len == 1 => Ok(val),
            _ => Err(serde::de::Error::custom(format!(
                "expected params sequence with length 1 but got {len}"
            ))),
        }
    }
}

/// Deserializes `[]` or no parameters.
pub mod empty_params {
    use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

    pub fn serialize<S: Serializer>(_: &(), s: S) -> Result<S::Ok, S::Error> {
        s.serialize_seq(Some(0))?.end()
    }

    pub fn deserialize<'de, D>(d: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        let seq = Option::<Vec<()>>::deserialize(d)?.unwrap_or_default();
        if !seq.is_empty() {
            return Err(serde::de::Error::custom(format!(
                "expected params sequence with length 0 but got {}",
                seq.len()
            )));
        }
        Ok(())
    }
}

/// A single chain id parameter, `0x` hex string, decimal string or number.
pub mod lenient_chain_id {
    use alloy_primitives::ChainId;
    use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(chain_id: &ChainId, s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(1))?;
        seq.serialize_element(&format!("{chain_id:#x}"))?;
        seq.end()
    }

    pub fn deserialize<'de, D>(d: D) -> Result<ChainId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [value] = <[Value; 1]>::deserialize(d)?;
        crate::provider::parse_chain_id(&value).map_err(serde::de::Error::custom)
    }
}
