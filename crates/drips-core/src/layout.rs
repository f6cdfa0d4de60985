//! Packed persistent layout of list records.
//!
//! Records are stored as 32-byte big-endian words with fields packed from
//! the least significant end, so a stored record is bit-identical to the
//! original on-chain representation:
//!
//! | record         | word | bits      | field              |
//! |----------------|------|-----------|--------------------|
//! | weights entry  | 0    | 0..160    | `next`             |
//! |                | 0    | 160..192  | receiver weight    |
//! |                | 0    | 192..224  | proxy weight       |
//! |                | 0    | 224..256  | attached (u32)     |
//! | cycle entry    | 0    | 0..64     | `next`             |
//! |                | 0    | 64..192   | this-cycle delta   |
//! |                | 0    | 192..256  | attached (u64)     |
//! |                | 1    | 0..128    | next-cycle delta   |
//! |                | 1    | 128..256  | zero padding       |
//!
//! Inside an attached cycle entry the end of the chain is written as
//! `u64::MAX`, which is why that cycle can never hold deltas.

use crate::error::LayoutError;
use crate::types::{AccountId, CycleId, Deltas, Entry, ListKey, Payload, Weights};

/// Size of one storage word in bytes.
pub const WORD_BYTES: usize = 32;

type Word = [u8; WORD_BYTES];

/// Byte range of the field occupying bits `lo..lo + width` of a word.
fn field_range(lo: usize, width: usize) -> std::ops::Range<usize> {
    let end = WORD_BYTES - lo / 8;
    end - width / 8..end
}

fn put(word: &mut Word, lo: usize, bytes: &[u8]) {
    word[field_range(lo, bytes.len() * 8)].copy_from_slice(bytes);
}

fn get<const N: usize>(word: &Word, lo: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&word[field_range(lo, N * 8)]);
    out
}

fn word_at(bytes: &[u8], index: usize) -> Word {
    let mut word = [0u8; WORD_BYTES];
    word.copy_from_slice(&bytes[index * WORD_BYTES..(index + 1) * WORD_BYTES]);
    word
}

fn check_len(bytes: &[u8], words: usize) -> Result<(), LayoutError> {
    let expected = words * WORD_BYTES;
    if bytes.len() != expected {
        return Err(LayoutError::InvalidLength {
            got: bytes.len(),
            expected,
        });
    }
    Ok(())
}

fn flag(value: u64) -> Result<bool, LayoutError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(LayoutError::InvalidFlag(other)),
    }
}

/// A key domain with a fixed packed record layout.
pub trait PackedLayout: ListKey {
    /// Payload stored alongside keys of this domain.
    type Payload: Payload;

    /// Number of storage words per record.
    const WORDS: usize;

    /// Fixed-width key encoding, ordered like the key.
    fn key_bytes(&self) -> Vec<u8>;

    fn pack(entry: &Entry<Self, Self::Payload>) -> Vec<u8>;

    fn unpack(bytes: &[u8]) -> Result<Entry<Self, Self::Payload>, LayoutError>;
}

impl PackedLayout for AccountId {
    type Payload = Weights;
    const WORDS: usize = 1;

    fn key_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn pack(entry: &Entry<Self, Weights>) -> Vec<u8> {
        let mut word = [0u8; WORD_BYTES];
        put(&mut word, 0, entry.next.as_bytes());
        put(&mut word, 160, &entry.payload.receiver.to_be_bytes());
        put(&mut word, 192, &entry.payload.proxy.to_be_bytes());
        put(&mut word, 224, &u32::from(entry.attached).to_be_bytes());
        word.to_vec()
    }

    fn unpack(bytes: &[u8]) -> Result<Entry<Self, Weights>, LayoutError> {
        check_len(bytes, Self::WORDS)?;
        let word = word_at(bytes, 0);
        Ok(Entry {
            next: AccountId(get::<20>(&word, 0)),
            payload: Weights {
                receiver: u32::from_be_bytes(get(&word, 160)),
                proxy: u32::from_be_bytes(get(&word, 192)),
            },
            attached: flag(u64::from(u32::from_be_bytes(get(&word, 224))))?,
        })
    }
}

impl PackedLayout for CycleId {
    type Payload = Deltas;
    const WORDS: usize = 2;

    fn key_bytes(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }

    fn pack(entry: &Entry<Self, Deltas>) -> Vec<u8> {
        let next = if entry.attached && entry.next == CycleId::ROOT {
            CycleId::MAX
        } else {
            entry.next
        };
        let mut first = [0u8; WORD_BYTES];
        put(&mut first, 0, &next.0.to_be_bytes());
        put(&mut first, 64, &entry.payload.this_cycle.to_be_bytes());
        put(&mut first, 192, &u64::from(entry.attached).to_be_bytes());
        let mut second = [0u8; WORD_BYTES];
        put(&mut second, 0, &entry.payload.next_cycle.to_be_bytes());

        let mut bytes = Vec::with_capacity(Self::WORDS * WORD_BYTES);
        bytes.extend_from_slice(&first);
        bytes.extend_from_slice(&second);
        bytes
    }

    fn unpack(bytes: &[u8]) -> Result<Entry<Self, Deltas>, LayoutError> {
        check_len(bytes, Self::WORDS)?;
        let first = word_at(bytes, 0);
        let second = word_at(bytes, 1);
        if second[field_range(128, 128)].iter().any(|b| *b != 0) {
            return Err(LayoutError::NonZeroPadding);
        }
        let next = match CycleId(u64::from_be_bytes(get(&first, 0))) {
            CycleId::MAX => CycleId::ROOT,
            other => other,
        };
        Ok(Entry {
            next,
            payload: Deltas {
                this_cycle: i128::from_be_bytes(get(&first, 64)),
                next_cycle: i128::from_be_bytes(get(&second, 0)),
            },
            attached: flag(u64::from_be_bytes(get(&first, 192)))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_ranges() {
        assert_eq!(field_range(0, 160), 12..32);
        assert_eq!(field_range(160, 32), 8..12);
        assert_eq!(field_range(224, 32), 0..4);
        assert_eq!(field_range(64, 128), 8..24);
    }

    #[test]
    fn weights_word_layout() {
        let entry = Entry {
            next: AccountId([0x11; 20]),
            payload: Weights { receiver: 0x0102_0304, proxy: 0x0A0B_0C0D },
            attached: true,
        };
        let bytes = AccountId::pack(&entry);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..8], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(&bytes[8..12], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[12..32], &[0x11; 20]);
        assert_eq!(AccountId::unpack(&bytes).unwrap(), entry);
    }

    #[test]
    fn detached_weights_entry_is_zero_word() {
        let entry: Entry<AccountId, Weights> = Entry::default();
        assert_eq!(AccountId::pack(&entry), vec![0u8; 32]);
    }

    #[test]
    fn cycle_words_layout() {
        let entry = Entry {
            next: CycleId(0x0102),
            payload: Deltas { this_cycle: -1, next_cycle: 5 },
            attached: true,
        };
        let bytes = CycleId::pack(&entry);
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[0..8], &1u64.to_be_bytes());
        assert_eq!(&bytes[8..24], &[0xFF; 16]);
        assert_eq!(&bytes[24..32], &0x0102u64.to_be_bytes());
        assert_eq!(&bytes[32..48], &[0u8; 16]);
        assert_eq!(&bytes[48..64], &5i128.to_be_bytes());
        assert_eq!(CycleId::unpack(&bytes).unwrap(), entry);
    }

    #[test]
    fn cycle_chain_end_uses_max_marker() {
        let last = Entry {
            next: CycleId::ROOT,
            payload: Deltas { this_cycle: 3, next_cycle: 0 },
            attached: true,
        };
        let bytes = CycleId::pack(&last);
        assert_eq!(&bytes[24..32], &u64::MAX.to_be_bytes());
        assert_eq!(CycleId::unpack(&bytes).unwrap().next, CycleId::ROOT);

        let root: Entry<CycleId, Deltas> = Entry::default();
        assert_eq!(CycleId::pack(&root), vec![0u8; 64]);
    }

    #[test]
    fn unpack_rejects_bad_input() {
        assert_eq!(
            AccountId::unpack(&[0u8; 31]),
            Err(LayoutError::InvalidLength { got: 31, expected: 32 })
        );

        let mut bad_flag = [0u8; 32];
        bad_flag[3] = 2;
        assert_eq!(AccountId::unpack(&bad_flag), Err(LayoutError::InvalidFlag(2)));

        let mut padded = vec![0u8; 64];
        padded[32] = 1;
        assert_eq!(CycleId::unpack(&padded), Err(LayoutError::NonZeroPadding));
    }

    #[test]
    fn key_bytes_are_fixed_width() {
        assert_eq!(AccountId([7; 20]).key_bytes(), vec![7; 20]);
        assert_eq!(CycleId(258).key_bytes(), vec![0, 0, 0, 0, 0, 0, 1, 2]);
    }
}
