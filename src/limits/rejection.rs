use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse reason attached to a rejected batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// The batch would breach a limit in the product terms.
    AgainstTermsAndConditions,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::AgainstTermsAndConditions => write!(f, "against terms and conditions"),
        }
    }
}

/// A limit check failed. Surfaced unchanged to whoever submitted the batch.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} ({reason})")]
pub struct Rejection {
    pub message: String,
    pub reason: RejectionReason,
}

impl Rejection {
    pub fn against_terms(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: RejectionReason::AgainstTermsAndConditions,
        }
    }
}
