//! Record parsing and wire encoding (component C1 of the loader pipeline).
//!
//! Pure and thread-safe: no shared state, safe to call concurrently from any
//! number of parse workers.

mod record;
mod wire;

pub use record::{parse_line, store_key, ParseError, Record};
pub use wire::{decode_payload, encode_payload, WireError};

/// An encoded record ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedItem {
    /// File-local 0-based line ordinal, used only for logging.
    pub line_num: u64,
    /// `devType:devId`.
    pub key: String,
    pub payload: Vec<u8>,
}

/// Encode a validated `Record` into the item a writer worker will store.
pub fn encode_item(line_num: u64, record: &Record) -> EncodedItem {
    EncodedItem {
        line_num,
        key: store_key(&record.dev_type, &record.dev_id),
        payload: encode_payload(record.lat, record.lon, &record.apps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_item_builds_key_and_payload() {
        let record = parse_line("idfa\tA\t1.0\t2.0\t1,2").unwrap();
        let item = encode_item(7, &record);
        assert_eq!(item.line_num, 7);
        assert_eq!(item.key, "idfa:A");
        let (lat, lon, apps) = decode_payload(&item.payload).unwrap();
        assert_eq!(lat, 1.0);
        assert_eq!(lon, 2.0);
        assert_eq!(apps, vec![1, 2]);
    }
}
