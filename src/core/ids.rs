use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the party (client) that submitted a posting instruction.
///
/// # Examples
///
/// ```
/// use posting_limits::core::ids::PartyId;
///
/// let card_network = PartyId::new("CARD-NETWORK");
/// let faster_payments = PartyId::new("FPS");
/// assert_ne!(card_network, faster_payments);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier shared by every posting of one transaction chain, as assigned
/// by the submitting party.
///
/// Chain ids are only unique per party; use [`ChainKey`] to address a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Globally unique address of a transaction chain: (party id, chain id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainKey {
    pub party_id: PartyId,
    pub chain_id: ChainId,
}

impl ChainKey {
    pub fn new(party_id: PartyId, chain_id: ChainId) -> Self {
        Self { party_id, chain_id }
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.party_id, self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_key_display() {
        let key = ChainKey::new(PartyId::new("FPS"), ChainId::new("tx-1"));
        assert_eq!(format!("{}", key), "FPS:tx-1");
    }

    #[test]
    fn test_same_chain_id_different_party() {
        let a = ChainKey::new(PartyId::new("A"), ChainId::new("1"));
        let b = ChainKey::new(PartyId::new("B"), ChainId::new("1"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_chain_key_ordering() {
        let a = ChainKey::new(PartyId::new("A"), ChainId::new("2"));
        let b = ChainKey::new(PartyId::new("B"), ChainId::new("1"));
        assert!(a < b);
    }
}
