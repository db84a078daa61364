//! Voyage record decoding
//!
//! Intercepted payloads are a fixed-size array of voyage records. Decoding
//! is explicit and bounds-checked: the client fills bays contiguously, so a
//! record whose first name byte is zero ends the batch and later slots are
//! left untouched.

use purser_sdk::records::{
    BAY_COUNT, VOYAGE_DATE_OFFSET, VOYAGE_NAME_LEN, VOYAGE_NAME_OFFSET, VOYAGE_RECORD_SIZE,
};

/// Errors surfaced while decoding an intercepted payload
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Payload ended before the record currently being read
    #[error("Payload truncated at record {slot}: {len} bytes")]
    Truncated { slot: usize, len: usize },

    /// The client passed a null payload pointer
    #[error("Payload pointer is null")]
    NullPayload,
}

/// One decoded voyage record, tagged with its bay slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoyageRecord {
    /// Bay index, stable per physical bay across updates
    pub slot: usize,
    /// Vessel name, NUL-trimmed
    pub name: String,
    /// Voyage return time, Unix seconds
    pub date: u32,
}

/// Decode the leading run of valid records from a payload.
///
/// Stops at the first sentinel record (empty name), bounding per-call work
/// to at most [`BAY_COUNT`] entries. Fails only if the payload is shorter
/// than a record that should be present.
pub fn decode_batch(payload: &[u8]) -> Result<Vec<VoyageRecord>, ExtractError> {
    let mut records = Vec::new();

    for slot in 0..BAY_COUNT {
        let offset = slot * VOYAGE_RECORD_SIZE;
        let Some(record) = payload.get(offset..offset + VOYAGE_RECORD_SIZE) else {
            return Err(ExtractError::Truncated {
                slot,
                len: payload.len(),
            });
        };

        let name_field = &record[VOYAGE_NAME_OFFSET..VOYAGE_NAME_OFFSET + VOYAGE_NAME_LEN];
        if name_field[0] == 0 {
            break;
        }

        let end = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(VOYAGE_NAME_LEN);
        let name = String::from_utf8_lossy(&name_field[..end]).into_owned();

        let date = u32::from_le_bytes([
            record[VOYAGE_DATE_OFFSET],
            record[VOYAGE_DATE_OFFSET + 1],
            record[VOYAGE_DATE_OFFSET + 2],
            record[VOYAGE_DATE_OFFSET + 3],
        ]);

        records.push(VoyageRecord { slot, name, date });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use purser_sdk::records::VOYAGE_BATCH_SIZE;

    fn payload(entries: &[(&str, u32)]) -> Vec<u8> {
        let mut bytes = vec![0u8; VOYAGE_BATCH_SIZE];
        for (slot, (name, date)) in entries.iter().enumerate() {
            let offset = slot * VOYAGE_RECORD_SIZE;
            bytes[offset..offset + name.len()].copy_from_slice(name.as_bytes());
            bytes[offset + VOYAGE_DATE_OFFSET..offset + VOYAGE_DATE_OFFSET + 4]
                .copy_from_slice(&date.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn decodes_full_batch() {
        let bytes = payload(&[
            ("Unsinkable II", 1_700_000_000),
            ("Tonberry", 1_700_000_600),
            ("Whale", 1_700_001_200),
            ("Barracuda", 1_700_001_800),
        ]);

        let records = decode_batch(&bytes).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].name, "Unsinkable II");
        assert_eq!(records[0].slot, 0);
        assert_eq!(records[3].date, 1_700_001_800);
    }

    #[test]
    fn stops_at_sentinel() {
        // Entry 2 of 4 is the empty sentinel: only slots 0 and 1 decode.
        let mut bytes = payload(&[
            ("Alpha", 100),
            ("Beta", 200),
            ("Gamma", 300),
            ("Delta", 400),
        ]);
        bytes[2 * VOYAGE_RECORD_SIZE] = 0;

        let records = decode_batch(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].slot, 0);
        assert_eq!(records[1].slot, 1);
    }

    #[test]
    fn empty_batch_decodes_to_nothing() {
        let bytes = vec![0u8; VOYAGE_BATCH_SIZE];
        assert!(decode_batch(&bytes).unwrap().is_empty());
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let bytes = payload(&[("Alpha", 100)]);
        let result = decode_batch(&bytes[..VOYAGE_RECORD_SIZE / 2]);
        assert!(matches!(
            result,
            Err(ExtractError::Truncated { slot: 0, .. })
        ));
    }

    #[test]
    fn name_field_is_nul_trimmed() {
        let bytes = payload(&[("Ada", 100)]);
        let records = decode_batch(&bytes).unwrap();
        assert_eq!(records[0].name, "Ada");
    }
}
