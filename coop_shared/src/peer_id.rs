//! Peer identifiers.
//!
//! A peer is identified by the platform's 64-bit account id. The same number
//! space is shared with replicated entity ids on the wire, which is why the
//! entity allocator has to steer around live peer ids.
//!
//! ```text
//! 64-bit peer id layout (individual accounts):
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Universe (8) │ Type (4) │ Instance (20) │ Account ID (32)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bits 32..64 of an ordinary desktop account in the public universe.
const INDIVIDUAL_PUBLIC_DESKTOP: u64 = (1 << 56) | (1 << 52) | (1 << 32);

/// A 64-bit peer id.
///
/// # Examples
/// ```
/// use coop_shared::peer_id::PeerId;
///
/// let id = PeerId::from_account_id(52079950);
/// assert!(id.is_valid());
/// assert_eq!(id.as_u64(), 76561198012345678);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PeerId(u64);

impl PeerId {
    /// The unknown/absent peer.
    pub const NIL: PeerId = PeerId(0);

    pub const fn from_u64(id: u64) -> Self {
        PeerId(id)
    }

    /// Builds the id of an individual desktop account from its 32-bit account number.
    pub const fn from_account_id(account_id: u32) -> Self {
        PeerId(INDIVIDUAL_PUBLIC_DESKTOP | account_id as u64)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Lower 32 bits, the number players see in dumps and kick messages.
    pub const fn account_id(&self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    pub const fn is_nil(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error parsing a peer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerIdParseError {
    Empty,
    InvalidFormat(String),
}

impl fmt::Display for PeerIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerIdParseError::Empty => write!(f, "empty peer id"),
            PeerIdParseError::InvalidFormat(s) => write!(f, "invalid peer id: {s}"),
        }
    }
}

impl std::error::Error for PeerIdParseError {}

impl FromStr for PeerId {
    type Err = PeerIdParseError;

    /// Accepts a raw 64-bit number or the bracketed `[U:1:<account>]` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PeerIdParseError::Empty);
        }

        if let Some(inner) = s.strip_prefix("[U:1:").and_then(|r| r.strip_suffix(']')) {
            return inner
                .parse::<u32>()
                .map(PeerId::from_account_id)
                .map_err(|_| PeerIdParseError::InvalidFormat(s.to_string()));
        }

        s.parse::<u64>()
            .map(PeerId)
            .map_err(|_| PeerIdParseError::InvalidFormat(s.to_string()))
    }
}

impl From<u64> for PeerId {
    fn from(v: u64) -> Self {
        PeerId(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_roundtrip() {
        let id = PeerId::from_account_id(12345);
        assert_eq!(id.account_id(), 12345);
        assert!(id.is_valid());
    }

    #[test]
    fn nil_is_invalid() {
        assert!(PeerId::NIL.is_nil());
        assert!(!PeerId::from_u64(0).is_valid());
        assert_eq!(PeerId::default(), PeerId::NIL);
    }

    #[test]
    fn parse_raw_and_bracketed() {
        assert_eq!("76561198012345678".parse::<PeerId>().unwrap().account_id(), 52079950);
        assert_eq!(
            "[U:1:52079950]".parse::<PeerId>().unwrap(),
            PeerId::from_u64(76561198012345678)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<PeerId>(), Err(PeerIdParseError::Empty));
        assert!("not_a_peer".parse::<PeerId>().is_err());
        assert!("[U:1:abc]".parse::<PeerId>().is_err());
    }
}
