//! Key and record types shared by both lists.
//!
//! Every list is keyed by a [`ListKey`] whose zero value is the root
//! sentinel. Records are [`Entry`] values holding the `next` link, the
//! list-specific [`Payload`] and the attachment flag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::error::ListError;

/// Key domain of a storage-embedded list.
///
/// `ROOT` is the default value of the domain. It heads the list and doubles
/// as the end-of-list marker returned by iteration.
pub trait ListKey:
    Copy + Eq + Ord + Hash + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// List head; never a valid entry.
    const ROOT: Self;

    /// Whether an entry may be attached under this key.
    fn is_attachable(&self) -> bool;

    /// Check [`is_attachable`](Self::is_attachable), producing `InvalidKey`.
    fn ensure_attachable(&self) -> Result<(), ListError> {
        if self.is_attachable() {
            Ok(())
        } else {
            Err(ListError::InvalidKey(self.to_string()))
        }
    }
}

/// Per-entry data carried by a list.
pub trait Payload: Copy + Default + Eq + fmt::Debug + Send + Sync + 'static {
    /// An all-zero payload marks its entry as logically removed.
    fn is_zero(&self) -> bool;
}

/// A 20-byte account identifier.
///
/// The all-zero account is the root sentinel of a [`ReceiverWeights`](crate::ReceiverWeights) list.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// The zero account, used as the list root.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an AccountId from a byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = ListError;

    /// Parse a hex account, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ListError::InvalidKey(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ListKey for AccountId {
    const ROOT: Self = Self::ZERO;

    fn is_attachable(&self) -> bool {
        !self.is_zero()
    }
}

/// A monotonically increasing accounting cycle number.
///
/// Cycle 0 is the root sentinel and `u64::MAX` is reserved as the packed
/// end-of-chain marker, so neither can hold deltas.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct CycleId(pub u64);

impl CycleId {
    pub const ROOT: Self = Self(0);
    /// Reserved; used as the end marker in the packed layout.
    pub const MAX: Self = Self(u64::MAX);

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle {}", self.0)
    }
}

impl From<u64> for CycleId {
    fn from(cycle: u64) -> Self {
        Self(cycle)
    }
}

impl ListKey for CycleId {
    const ROOT: Self = CycleId::ROOT;

    fn is_attachable(&self) -> bool {
        *self != Self::ROOT && *self != Self::MAX
    }
}

/// Weights of a single account in a [`ReceiverWeights`](crate::ReceiverWeights) list.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Weights {
    /// Share received directly.
    pub receiver: u32,
    /// Share forwarded when the account acts as a proxy.
    pub proxy: u32,
}

impl Payload for Weights {
    fn is_zero(&self) -> bool {
        self.receiver == 0 && self.proxy == 0
    }
}

/// Signed amount changes recorded against one cycle.
///
/// A stream change usually lands on two boundaries: a pro-rated first
/// cycle and the steady state from the cycle after it.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Deltas {
    /// Change effective from this cycle.
    pub this_cycle: i128,
    /// Change effective from the following cycle.
    pub next_cycle: i128,
}

impl Payload for Deltas {
    fn is_zero(&self) -> bool {
        self.this_cycle == 0 && self.next_cycle == 0
    }
}

/// One record of a storage-embedded list.
///
/// The record stored under `K::ROOT` only uses `next`, which points at the
/// most recently attached entry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Entry<K, P> {
    /// Following key in the chain, `K::ROOT` at the end.
    pub next: K,
    pub payload: P,
    pub attached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_root_is_zero() {
        assert_eq!(AccountId::ROOT, AccountId::ZERO);
        assert_eq!(AccountId::default(), AccountId::ROOT);
        assert!(!AccountId::ROOT.is_attachable());
        assert!(AccountId([1; 20]).is_attachable());
    }

    #[test]
    fn cycle_reserved_keys() {
        assert!(!CycleId(0).is_attachable());
        assert!(!CycleId(u64::MAX).is_attachable());
        assert!(CycleId(1).is_attachable());
        assert!(CycleId(u64::MAX - 1).is_attachable());
    }

    #[test]
    fn ensure_attachable_reports_key() {
        let err = CycleId::MAX.ensure_attachable().unwrap_err();
        assert_eq!(err, ListError::InvalidKey(format!("cycle {}", u64::MAX)));
    }

    #[test]
    fn account_display_and_parse() {
        let account = AccountId([0xAB; 20]);
        let text = account.to_string();
        assert_eq!(text, format!("0x{}", "ab".repeat(20)));
        assert_eq!(text.parse::<AccountId>().unwrap(), account);
        assert_eq!("ab".repeat(20).parse::<AccountId>().unwrap(), account);
    }

    #[test]
    fn account_parse_rejects_bad_length() {
        assert!("0x1234".parse::<AccountId>().is_err());
        assert!("zz".repeat(20).parse::<AccountId>().is_err());
    }

    #[test]
    fn zero_payloads() {
        assert!(Weights::default().is_zero());
        assert!(!Weights { receiver: 0, proxy: 1 }.is_zero());
        assert!(Deltas::default().is_zero());
        assert!(!Deltas { this_cycle: -1, next_cycle: 0 }.is_zero());
    }

    #[test]
    fn default_entry_is_detached() {
        let entry: Entry<CycleId, Deltas> = Entry::default();
        assert_eq!(entry.next, CycleId::ROOT);
        assert!(!entry.attached);
        assert!(entry.payload.is_zero());
    }

    #[test]
    fn payloads_serialize_as_plain_json() {
        let weights = Weights { receiver: 3, proxy: 4 };
        let json = serde_json::to_string(&weights).unwrap();
        assert_eq!(json, r#"{"receiver":3,"proxy":4}"#);
        assert_eq!(serde_json::from_str::<Weights>(&json).unwrap(), weights);

        let deltas = Deltas { this_cycle: -5, next_cycle: 5 };
        let json = serde_json::to_string(&deltas).unwrap();
        assert_eq!(json, r#"{"this_cycle":-5,"next_cycle":5}"#);
        assert_eq!(serde_json::from_str::<Deltas>(&json).unwrap(), deltas);

        assert_eq!(serde_json::to_string(&CycleId(7)).unwrap(), "7");
        let account = AccountId([9; 20]);
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(serde_json::from_str::<AccountId>(&json).unwrap(), account);
    }
}
