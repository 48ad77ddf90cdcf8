//! Error types for input validation and share tokens.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected [`crate::model::MortgageInput`] values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },
    #[error("loan term must be at least one year")]
    ZeroTerm,
    #[error("loan term of {term_years} years exceeds the {max} year maximum")]
    TermTooLong { term_years: u32, max: u32 },
    #[error("down payment {down_payment} exceeds home price {home_price}")]
    DownPaymentExceedsPrice {
        down_payment: Decimal,
        home_price: Decimal,
    },
    #[error("{field} of {rate}% is above 100%")]
    RateOutOfRange { field: &'static str, rate: Decimal },
}

/// Failures while building or reading a share token.
///
/// `Invalid` and `Expired` are kept apart so a page can tell a broken link
/// from one that simply aged out.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("invalid share token: {0}")]
    Invalid(String),
    #[error("share token expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
    #[error("could not serialize share snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("expiration for a snapshot created at {created_at} is out of range")]
    ExpiryOutOfRange { created_at: DateTime<Utc> },
}

impl ShareError {
    pub fn is_expired(&self) -> bool {
        matches!(self, ShareError::Expired { .. })
    }

    /// Copy a page can show to whoever opened the link.
    pub fn user_message(&self) -> &'static str {
        match self {
            ShareError::Expired { .. } => {
                "This shared calculation has expired. Ask the sender for a new link."
            }
            ShareError::Invalid(_) => "This share link is broken or incomplete.",
            ShareError::Serialize(_) | ShareError::ExpiryOutOfRange { .. } => {
                "This calculation could not be shared."
            }
        }
    }
}
