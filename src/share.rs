//! Self-contained share tokens.
//!
//! A token is the JSON form of a [`ShareSnapshot`] encoded with the URL-safe
//! base64 alphabet and no padding, so it fits in a single path segment.
//! Nothing is stored server side: whoever holds the token holds the
//! calculation.
//!
//! Tokens are neither signed nor encrypted. Anyone can decode one, edit the
//! numbers and encode it again, so a decoded snapshot must never be treated
//! as trusted data.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::ShareConfig;
use crate::error::ShareError;
use crate::model::{MortgageInput, MortgageOutput};

/// Tokens stay valid for this many calendar months after creation.
pub const TOKEN_LIFETIME_MONTHS: u32 = 12;

/// The part of a [`MortgageOutput`] carried inside a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSummary {
    /// The level principal-and-interest installment.
    pub monthly_principal_and_interest: Decimal,
    /// First-month escrow.
    pub monthly_escrow: Decimal,
    /// Principal and interest plus escrow.
    pub total_monthly_payment: Decimal,
    /// Home price minus down payment.
    pub loan_amount: Decimal,
    /// Cash paid over the whole schedule.
    pub total_paid: Decimal,
    /// Interest paid over the whole schedule.
    pub total_interest: Decimal,
    /// Month of the last installment.
    pub payoff_date: NaiveDate,
}

impl From<&MortgageOutput> for SharedSummary {
    fn from(output: &MortgageOutput) -> Self {
        Self {
            monthly_principal_and_interest: output.monthly_principal_and_interest,
            monthly_escrow: output.monthly_escrow,
            total_monthly_payment: output.total_monthly_payment,
            loan_amount: output.loan_amount,
            total_paid: output.total_paid,
            total_interest: output.total_interest,
            payoff_date: output.payoff_date,
        }
    }
}

/// Everything needed to redisplay a shared calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSnapshot {
    /// Short label chosen by whoever shared the calculation.
    pub title: String,
    /// Free-form note shown under the title.
    pub description: String,
    /// The loan configuration, enough to rerun the full schedule.
    pub input: MortgageInput,
    /// Headline figures as they were when the link was made.
    pub summary: SharedSummary,
    pub created_at: DateTime<Utc>,
    /// `created_at` plus [`TOKEN_LIFETIME_MONTHS`].
    pub expires_at: DateTime<Utc>,
}

impl ShareSnapshot {
    /// Snapshot stamped with the current time.
    pub fn create(
        title: impl Into<String>,
        description: impl Into<String>,
        input: MortgageInput,
        output: &MortgageOutput,
    ) -> Result<Self, ShareError> {
        Self::create_at(title, description, input, output, Utc::now())
    }

    /// Snapshot created at `created_at`, expiring one year later.
    pub fn create_at(
        title: impl Into<String>,
        description: impl Into<String>,
        input: MortgageInput,
        output: &MortgageOutput,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ShareError> {
        let expires_at = created_at
            .checked_add_months(Months::new(TOKEN_LIFETIME_MONTHS))
            .ok_or(ShareError::ExpiryOutOfRange { created_at })?;

        Ok(Self {
            title: title.into(),
            description: description.into(),
            input,
            summary: SharedSummary::from(output),
            created_at,
            expires_at,
        })
    }

    /// Whether the snapshot's lifetime ended before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Serializes `snapshot` into a URL-safe token.
pub fn encode(snapshot: &ShareSnapshot) -> Result<String, ShareError> {
    let json = serde_json::to_vec(snapshot).map_err(ShareError::Serialize)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a token, rejecting it if it is malformed or already expired.
pub fn decode(token: &str) -> Result<ShareSnapshot, ShareError> {
    decode_at(token, Utc::now())
}

/// [`decode`] against an explicit clock.
#[instrument(skip(token), fields(token_len = token.len()))]
pub fn decode_at(token: &str, now: DateTime<Utc>) -> Result<ShareSnapshot, ShareError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|err| {
        warn!(%err, "share token is not valid base64");
        ShareError::Invalid(err.to_string())
    })?;
    let snapshot: ShareSnapshot = serde_json::from_slice(&bytes).map_err(|err| {
        warn!(%err, "share token does not hold a snapshot");
        ShareError::Invalid(err.to_string())
    })?;

    if snapshot.is_expired_at(now) {
        warn!(expires_at = %snapshot.expires_at, "share token expired");
        return Err(ShareError::Expired {
            expired_at: snapshot.expires_at,
        });
    }

    debug!(title = %snapshot.title, "decoded share token");
    Ok(snapshot)
}

/// Full link for `token` under the configured base path.
pub fn share_url(config: &ShareConfig, token: &str) -> String {
    format!("{}/{}", config.base_path, token)
}

/// Pulls the token segment back out of a share link or request path.
///
/// Query strings and fragments are ignored. Anything other than exactly one
/// segment after the base path is rejected as [`ShareError::Invalid`].
pub fn token_from_path<'a>(config: &ShareConfig, path: &'a str) -> Result<&'a str, ShareError> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let rest = path
        .strip_prefix(config.base_path.as_str())
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| ShareError::Invalid(format!("{path} is not under {}", config.base_path)))?;
    let token = rest.trim_end_matches('/');

    if token.is_empty() || token.contains('/') {
        return Err(ShareError::Invalid(format!(
            "expected a single token segment, got {rest:?}"
        )));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::simulate;
    use crate::model::ExtraPayments;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 14, 30, 0).unwrap()
    }

    fn snapshot() -> ShareSnapshot {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut input = MortgageInput::new(dec!(450000), dec!(45000), 30, dec!(6.125), start)
            .with_property_tax_percent(dec!(1.1))
            .with_extra_payments(ExtraPayments {
                monthly: dec!(250),
                monthly_start: start,
                one_time: dec!(10000),
                one_time_date: NaiveDate::from_ymd_opt(2027, 3, 1).unwrap(),
                annual: dec!(0),
                annual_start_year: 2026,
            });
        input.home_insurance = dec!(1800);
        input.pmi_rate = dec!(0.55);
        input.hoa_fee = dec!(85);
        let output = simulate(&input);

        ShareSnapshot::create_at("Starter home", "15% down, extra $250", input, &output, created())
            .unwrap()
    }

    #[test]
    fn test_round_trip_before_expiry() {
        let original = snapshot();
        let token = encode(&original).unwrap();

        let decoded = decode_at(&token, created() + chrono::Duration::days(200)).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.summary.payoff_date, original.summary.payoff_date);
    }

    #[test]
    fn test_expiry_is_one_year_after_creation() {
        let original = snapshot();
        assert_eq!(
            original.expires_at,
            Utc.with_ymd_and_hms(2026, 5, 10, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_token_is_a_single_url_safe_segment() {
        let token = encode(&snapshot()).unwrap();

        assert!(!token.is_empty());
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_expired_token_is_not_reported_as_invalid() {
        let token = encode(&snapshot()).unwrap();

        let err = decode_at(&token, created() + chrono::Duration::days(400)).unwrap_err();

        assert!(matches!(err, ShareError::Expired { .. }));
    }

    #[test]
    fn test_decode_uses_current_clock() {
        let token = encode(&snapshot()).unwrap();
        assert!(decode(&token).unwrap_err().is_expired());

        let fresh = ShareSnapshot::create("Today", "", snapshot().input, &simulate(&snapshot().input))
            .unwrap();
        assert!(decode(&encode(&fresh).unwrap()).is_ok());
    }

    #[test]
    fn test_corrupted_tokens_are_invalid() {
        let token = encode(&snapshot()).unwrap();
        let now = created();

        let truncated = &token[..token.len() / 2];
        assert!(matches!(decode_at(truncated, now), Err(ShareError::Invalid(_))));

        let foreign = format!("{}+/=", &token[..8]);
        assert!(matches!(decode_at(&foreign, now), Err(ShareError::Invalid(_))));

        assert!(matches!(decode_at("", now), Err(ShareError::Invalid(_))));
        assert!(matches!(
            decode_at(&URL_SAFE_NO_PAD.encode(b"{\"title\":1}"), now),
            Err(ShareError::Invalid(_))
        ));
    }

    #[test]
    fn test_share_url_round_trip() {
        let config = ShareConfig::new("https://calc.example.com/share/");
        let token = encode(&snapshot()).unwrap();

        let url = share_url(&config, &token);

        assert_eq!(url, format!("https://calc.example.com/share/{token}"));
        assert_eq!(token_from_path(&config, &url).unwrap(), token);
        assert_eq!(
            token_from_path(&config, &format!("{url}/?utm_source=mail")).unwrap(),
            token
        );
    }

    #[test]
    fn test_token_from_path_rejects_other_shapes() {
        let config = ShareConfig::default();

        for path in ["/share", "/share/", "/share/a/b", "/other/abc", "/shared/abc"] {
            assert!(
                matches!(token_from_path(&config, path), Err(ShareError::Invalid(_))),
                "{path} should be rejected"
            );
        }
        assert_eq!(token_from_path(&config, "/share/abc").unwrap(), "abc");
    }
}
