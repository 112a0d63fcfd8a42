use crate::core::denomination::Denomination;
use crate::core::ids::{ChainId, ChainKey, PartyId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Balance address used when a posting does not name one.
pub const DEFAULT_ADDRESS: &str = "DEFAULT";
/// Asset used when a posting does not name one.
pub const DEFAULT_ASSET: &str = "COMMERCIAL_BANK_MONEY";

/// Errors raised while building a posting from untrusted input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PostingError {
    #[error("posting amount must be non-negative, got {0}")]
    NegativeAmount(Decimal),
    #[error("unknown posting kind '{0}'")]
    UnknownKind(String),
    #[error("unknown posting direction '{0}', expected 'credit' or 'debit'")]
    UnknownDirection(String),
}

/// The instruction type of a posting.
///
/// `Authorisation`, `AuthorisationAdjustment`, `Settlement` and `Release` are
/// chain-typed: their effect depends on the postings before them in the
/// chain. `HardSettlement` and `Transfer` are one-shot and always form a
/// chain of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingKind {
    Authorisation,
    AuthorisationAdjustment,
    Settlement { is_final: bool },
    Release,
    HardSettlement,
    Transfer,
}

impl PostingKind {
    pub fn is_chain_typed(&self) -> bool {
        !matches!(self, PostingKind::HardSettlement | PostingKind::Transfer)
    }

    /// Parse the short input name of a kind. Settlements need the separate
    /// finality flag, which only input conversion knows about.
    pub fn parse(name: &str, is_final: bool) -> Result<Self, PostingError> {
        match name {
            "authorisation" | "authorization" => Ok(PostingKind::Authorisation),
            "adjustment" | "authorisation_adjustment" => Ok(PostingKind::AuthorisationAdjustment),
            "settlement" => Ok(PostingKind::Settlement { is_final }),
            "release" => Ok(PostingKind::Release),
            "hard_settlement" => Ok(PostingKind::HardSettlement),
            "transfer" => Ok(PostingKind::Transfer),
            other => Err(PostingError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for PostingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostingKind::Authorisation => write!(f, "authorisation"),
            PostingKind::AuthorisationAdjustment => write!(f, "adjustment"),
            PostingKind::Settlement { is_final: true } => write!(f, "final settlement"),
            PostingKind::Settlement { is_final: false } => write!(f, "settlement"),
            PostingKind::Release => write!(f, "release"),
            PostingKind::HardSettlement => write!(f, "hard settlement"),
            PostingKind::Transfer => write!(f, "transfer"),
        }
    }
}

/// Direction of a posting from the account's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Inbound. Signed amounts are positive.
    Credit,
    /// Outbound. Signed amounts are negative.
    Debit,
}

impl FromStr for Direction {
    type Err = PostingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Direction::Credit),
            "debit" => Ok(Direction::Debit),
            other => Err(PostingError::UnknownDirection(other.to_string())),
        }
    }
}

/// An atomic, immutable ledger instruction against one account.
///
/// The stored `amount` is a non-negative magnitude; `direction` carries the
/// sign. Everything downstream works in the signed convention returned by
/// [`Posting::signed_amount`]: credits are positive, debits negative.
///
/// # Examples
///
/// ```
/// use posting_limits::core::denomination::Denomination;
/// use posting_limits::core::ids::{ChainId, PartyId};
/// use posting_limits::core::posting::{Direction, Posting, PostingKind};
/// use chrono::Utc;
/// use rust_decimal_macros::dec;
///
/// let posting = Posting::new(
///     PartyId::new("CARD-NETWORK"),
///     ChainId::new("auth-1"),
///     PostingKind::Authorisation,
///     dec!(90),
///     Direction::Debit,
///     Denomination::new("GBP"),
///     Utc::now(),
/// );
///
/// assert_eq!(posting.signed_amount(), dec!(-90));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PostingRecord")]
pub struct Posting {
    id: Uuid,
    party_id: PartyId,
    chain_id: ChainId,
    kind: PostingKind,
    /// Magnitude. Never negative.
    amount: Decimal,
    direction: Direction,
    denomination: Denomination,
    address: String,
    asset: String,
    /// Instant the posting takes effect. Chains are ordered by this.
    value_at: DateTime<Utc>,
    /// Free-form instruction details, e.g. `PAYMENT_TYPE -> ATM`.
    details: BTreeMap<String, String>,
}

/// Serialized form of a [`Posting`], checked before it becomes one.
#[derive(Deserialize)]
struct PostingRecord {
    id: Uuid,
    party_id: PartyId,
    chain_id: ChainId,
    kind: PostingKind,
    amount: Decimal,
    direction: Direction,
    denomination: Denomination,
    address: String,
    asset: String,
    value_at: DateTime<Utc>,
    #[serde(default)]
    details: BTreeMap<String, String>,
}

impl TryFrom<PostingRecord> for Posting {
    type Error = PostingError;

    fn try_from(record: PostingRecord) -> Result<Self, Self::Error> {
        let posting = Posting::try_new(
            record.party_id,
            record.chain_id,
            record.kind,
            record.amount,
            record.direction,
            record.denomination,
            record.value_at,
        )?;
        Ok(Posting {
            id: record.id,
            address: record.address,
            asset: record.asset,
            details: record.details,
            ..posting
        })
    }
}

impl Posting {
    /// Create a posting against the default address and asset.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is negative. Use [`Posting::try_new`] for input
    /// that has not been validated.
    pub fn new(
        party_id: PartyId,
        chain_id: ChainId,
        kind: PostingKind,
        amount: Decimal,
        direction: Direction,
        denomination: Denomination,
        value_at: DateTime<Utc>,
    ) -> Self {
        assert!(
            amount >= Decimal::ZERO,
            "Posting amount must be non-negative, got {}",
            amount
        );
        Self {
            id: Uuid::new_v4(),
            party_id,
            chain_id,
            kind,
            amount,
            direction,
            denomination,
            address: DEFAULT_ADDRESS.to_string(),
            asset: DEFAULT_ASSET.to_string(),
            value_at,
            details: BTreeMap::new(),
        }
    }

    /// Fallible counterpart of [`Posting::new`].
    pub fn try_new(
        party_id: PartyId,
        chain_id: ChainId,
        kind: PostingKind,
        amount: Decimal,
        direction: Direction,
        denomination: Denomination,
        value_at: DateTime<Utc>,
    ) -> Result<Self, PostingError> {
        if amount < Decimal::ZERO {
            return Err(PostingError::NegativeAmount(amount));
        }
        Ok(Self::new(
            party_id,
            chain_id,
            kind,
            amount,
            direction,
            denomination,
            value_at,
        ))
    }

    /// Set a specific ID (useful for testing / determinism).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = asset.into();
        self
    }

    /// Attach one instruction detail.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn party_id(&self) -> &PartyId {
        &self.party_id
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn chain_key(&self) -> ChainKey {
        ChainKey::new(self.party_id.clone(), self.chain_id.clone())
    }

    pub fn kind(&self) -> PostingKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    /// Amount in the account's sign convention: credit +, debit -.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }

    pub fn denomination(&self) -> &Denomination {
        &self.denomination
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn value_at(&self) -> DateTime<Utc> {
        self.value_at
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}
