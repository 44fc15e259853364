//! Header + postcard encoding.
//!
//! Every stored value and every exported snapshot starts with a 4-byte magic
//! and a 1-byte format version:
//!
//! ```text
//! +--------+---------+---------------------+
//! | magic  | version | postcard payload    |
//! | 4 B    | 1 B     | ...                 |
//! +--------+---------+---------------------+
//! ```

use crate::error::{FleetError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Magic of a single stored record.
pub const RECORD_MAGIC: [u8; 4] = *b"FPMR";

/// Magic of a whole-fleet snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"FPMS";

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 5;

/// Encode a value behind `magic`.
pub fn encode_framed<T: Serialize>(magic: [u8; 4], value: &T) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(value)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&magic);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a value framed with `magic`, checking magic and version.
pub fn decode_framed<T: DeserializeOwned>(magic: [u8; 4], bytes: &[u8]) -> Result<T> {
    let Some((header, payload)) = bytes.split_at_checked(HEADER_LEN) else {
        return Err(FleetError::Format(format!(
            "truncated header: {} bytes",
            bytes.len()
        )));
    };
    if header[..4] != magic {
        return Err(FleetError::Format("bad magic".to_string()));
    }
    if header[4] != FORMAT_VERSION {
        return Err(FleetError::Format(format!(
            "unsupported version {} (expected {})",
            header[4], FORMAT_VERSION
        )));
    }
    Ok(postcard::from_bytes(payload)?)
}

/// Encode a record for the store.
pub fn encode_record<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    encode_framed(RECORD_MAGIC, value)
}

/// Decode a stored record.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    decode_framed(RECORD_MAGIC, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FuelLevel;

    #[test]
    fn header_is_written() {
        let bytes = encode_record(&42u64).unwrap_or_default();
        assert_eq!(&bytes[..4], b"FPMR");
        assert_eq!(bytes[4], FORMAT_VERSION);
        assert_eq!(decode_record::<u64>(&bytes).ok(), Some(42));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode_record(&7u64).unwrap_or_default();
        bytes[0] = b'X';
        assert!(matches!(decode_record::<u64>(&bytes), Err(FleetError::Format(_))));
        let snapshot = encode_framed(SNAPSHOT_MAGIC, &7u64).unwrap_or_default();
        assert!(decode_record::<u64>(&snapshot).is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode_record(&7u64).unwrap_or_default();
        bytes[4] = FORMAT_VERSION + 1;
        assert!(matches!(decode_record::<u64>(&bytes), Err(FleetError::Format(_))));
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(decode_record::<u64>(b"FPM").is_err());
        assert!(decode_record::<u64>(&[]).is_err());
    }

    #[test]
    fn out_of_range_fuel_fails_to_decode() {
        let bytes = encode_record(&150u8).unwrap_or_default();
        assert!(decode_record::<FuelLevel>(&bytes).is_err());
    }
}
