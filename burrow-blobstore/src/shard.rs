//! Fixed-size shard record and the reference that addresses one (spec
//! §4.4). A blob is a singly linked chain of shards, each living in some
//! storage log; `LogRef` is the (log, seqno) pair that addresses one link.

/// Shards hold at most this many payload bytes each.
pub const SHARD_BYTES: usize = 16 * 1024;

/// Shards per storage log — together with `SHARD_BYTES` this bounds a log
/// file at roughly 16 MiB.
pub const SHARDS_PER_LOG: u64 = 1024;

const NO_NEXT: u64 = u64::MAX;

/// Addresses one shard: the storage log it lives in and its seqno within
/// that log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogRef {
    pub log_id: u64,
    pub seqno: u64,
}

impl LogRef {
    pub fn log_name(&self) -> String {
        format!("shard-{:016x}.woof", self.log_id)
    }

    /// Encodes `Option<LogRef>` into the 16-byte wire form the shard record
    /// uses: `log_id == u64::MAX` is the spec's "invalid sentinel" standing
    /// in for null, `log_id` otherwise always being a real log's 64-bit id.
    fn encode_opt(r: Option<LogRef>) -> [u8; 16] {
        let (log_id, seqno) = match r {
            Some(r) => (r.log_id, r.seqno),
            None => (NO_NEXT, 0),
        };
        let mut buf = [0u8; 16];
        buf[0..8].copy_from_slice(&log_id.to_le_bytes());
        buf[8..16].copy_from_slice(&seqno.to_le_bytes());
        buf
    }

    fn decode_opt(buf: &[u8]) -> Option<LogRef> {
        let log_id = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        let seqno = u64::from_le_bytes(buf[8..16].try_into().unwrap());
        if log_id == NO_NEXT {
            None
        } else {
            Some(LogRef { log_id, seqno })
        }
    }
}

/// One link of a blob's shard chain. `data_remaining` is the number of
/// payload bytes from this shard to the end of the blob (spec §4.4):
/// at the head shard it equals the blob's total length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub next: Option<LogRef>,
    pub data_remaining: u64,
    pub bytes: Vec<u8>,
}

/// `next (16) + data_remaining (8) + len (2) + payload (SHARD_BYTES)`.
pub const SHARD_RECORD_SIZE: u32 = (16 + 8 + 2 + SHARD_BYTES) as u32;

impl Shard {
    pub fn encode(&self) -> Vec<u8> {
        assert!(self.bytes.len() <= SHARD_BYTES, "shard payload exceeds SHARD_BYTES");
        let mut buf = Vec::with_capacity(SHARD_RECORD_SIZE as usize);
        buf.extend_from_slice(&LogRef::encode_opt(self.next));
        buf.extend_from_slice(&self.data_remaining.to_le_bytes());
        buf.extend_from_slice(&(self.bytes.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.bytes);
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < 26 {
            return None;
        }
        let next = LogRef::decode_opt(&buf[0..16]);
        let data_remaining = u64::from_le_bytes(buf[16..24].try_into().ok()?);
        let len = u16::from_le_bytes(buf[24..26].try_into().ok()?) as usize;
        let bytes = buf.get(26..26 + len)?.to_vec();
        Some(Shard {
            next,
            data_remaining,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_a_shard_with_a_next_ref() {
        let shard = Shard {
            next: Some(LogRef { log_id: 7, seqno: 3 }),
            data_remaining: 40_000,
            bytes: vec![9u8; SHARD_BYTES],
        };
        let encoded = shard.encode();
        assert_eq!(encoded.len(), SHARD_RECORD_SIZE as usize);
        assert_eq!(Shard::decode(&encoded).unwrap(), shard);
    }

    #[test]
    fn roundtrips_a_tail_shard_with_no_next() {
        let shard = Shard {
            next: None,
            data_remaining: 0,
            bytes: vec![],
        };
        let encoded = shard.encode();
        assert_eq!(Shard::decode(&encoded).unwrap(), shard);
    }

    #[test]
    fn log_name_is_stable_hex_of_the_id() {
        let r = LogRef { log_id: 0xdead_beef, seqno: 1 };
        assert_eq!(r.log_name(), "shard-00000000deadbeef.woof");
    }
}
