//! Plain data types shared by the engine, the yearly rollup and the share codec.
//!
//! Money is carried as [`Decimal`] and calendar positions as [`NaiveDate`].
//! Only the month and year of a date are significant; the engine normalizes
//! every date to the first day of its month.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Longest loan term [`MortgageInput::validate`] accepts.
pub const MAX_TERM_YEARS: u32 = 50;

/// Extra principal the borrower pays on top of the scheduled installment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraPayments {
    /// Recurring amount added every month from `monthly_start` onward.
    pub monthly: Decimal,
    /// First month the recurring monthly extra is applied.
    pub monthly_start: NaiveDate,
    /// Single lump sum applied in the month of `one_time_date`.
    pub one_time: Decimal,
    /// Month the one-time extra is paid.
    pub one_time_date: NaiveDate,
    /// Recurring amount applied every January from `annual_start_year` onward.
    pub annual: Decimal,
    /// First year whose January receives the annual extra.
    pub annual_start_year: i32,
}

impl ExtraPayments {
    /// Sum of the extra principal configured for the month containing `date`.
    pub fn due_on(&self, date: NaiveDate) -> Decimal {
        let mut extra = Decimal::ZERO;
        if month_key(date) >= month_key(self.monthly_start) {
            extra += self.monthly;
        }
        if month_key(date) == month_key(self.one_time_date) {
            extra += self.one_time;
        }
        if date.month() == 1 && date.year() >= self.annual_start_year {
            extra += self.annual;
        }
        extra
    }

    /// Whether no extra principal is configured at all.
    pub fn is_empty(&self) -> bool {
        self.monthly.is_zero() && self.one_time.is_zero() && self.annual.is_zero()
    }
}

/// Loan configuration consumed by [`crate::amortization::simulate`].
///
/// Down payment and property tax are stored as amounts. Their percentage
/// forms are derived on read and written through the `with_*_percent`
/// helpers, so the two representations can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageInput {
    /// Purchase price of the home.
    pub home_price: Decimal,
    /// Cash paid up front; the loan covers the rest of the price.
    pub down_payment: Decimal,
    /// Loan term in years.
    pub term_years: u32,
    /// Nominal annual interest rate as a percentage (e.g., 7.0 for 7%).
    pub interest_rate: Decimal,
    /// Month of the first installment.
    pub start_date: NaiveDate,
    /// Annual property tax amount.
    pub property_tax: Decimal,
    /// Annual home insurance premium.
    pub home_insurance: Decimal,
    /// Annual PMI as a percentage of the loan amount.
    pub pmi_rate: Decimal,
    /// Monthly HOA fee.
    pub hoa_fee: Decimal,
    /// Any other monthly housing cost collected with the payment.
    pub other_costs: Decimal,
    /// Extra principal on top of the scheduled installment.
    #[serde(default)]
    pub extra_payments: ExtraPayments,
}

impl MortgageInput {
    /// A bare loan with no escrow items and no extra payments.
    pub fn new(
        home_price: Decimal,
        down_payment: Decimal,
        term_years: u32,
        interest_rate: Decimal,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            home_price,
            down_payment,
            term_years,
            interest_rate,
            start_date,
            property_tax: Decimal::ZERO,
            home_insurance: Decimal::ZERO,
            pmi_rate: Decimal::ZERO,
            hoa_fee: Decimal::ZERO,
            other_costs: Decimal::ZERO,
            extra_payments: ExtraPayments::default(),
        }
    }

    /// Home price minus down payment.
    pub fn loan_amount(&self) -> Decimal {
        self.home_price - self.down_payment
    }

    /// Down payment as a percentage of the home price, zero when the price is zero.
    pub fn down_payment_percent(&self) -> Decimal {
        percent_of(self.down_payment, self.home_price)
    }

    /// Sets the down payment from a percentage of the current home price.
    pub fn with_down_payment_percent(mut self, percent: Decimal) -> Self {
        self.down_payment = self.home_price * percent / dec!(100);
        self
    }

    /// Annual property tax as a percentage of the home price.
    pub fn property_tax_percent(&self) -> Decimal {
        percent_of(self.property_tax, self.home_price)
    }

    /// Sets the annual property tax from a percentage of the current home price.
    pub fn with_property_tax_percent(mut self, percent: Decimal) -> Self {
        self.property_tax = self.home_price * percent / dec!(100);
        self
    }

    pub fn with_extra_payments(mut self, extra_payments: ExtraPayments) -> Self {
        self.extra_payments = extra_payments;
        self
    }

    /// Checks the values a calculator form can produce but the engine does
    /// not defend against.
    pub fn validate(&self) -> Result<(), InputError> {
        let amounts = [
            ("home_price", self.home_price),
            ("down_payment", self.down_payment),
            ("interest_rate", self.interest_rate),
            ("property_tax", self.property_tax),
            ("home_insurance", self.home_insurance),
            ("pmi_rate", self.pmi_rate),
            ("hoa_fee", self.hoa_fee),
            ("other_costs", self.other_costs),
            ("extra_payments.monthly", self.extra_payments.monthly),
            ("extra_payments.one_time", self.extra_payments.one_time),
            ("extra_payments.annual", self.extra_payments.annual),
        ];
        if let Some((field, value)) = amounts.into_iter().find(|(_, value)| value.is_sign_negative()) {
            return Err(InputError::Negative { field, value });
        }
        if self.term_years == 0 {
            return Err(InputError::ZeroTerm);
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(InputError::TermTooLong {
                term_years: self.term_years,
                max: MAX_TERM_YEARS,
            });
        }
        if self.down_payment > self.home_price {
            return Err(InputError::DownPaymentExceedsPrice {
                down_payment: self.down_payment,
                home_price: self.home_price,
            });
        }
        for (field, rate) in [("interest_rate", self.interest_rate), ("pmi_rate", self.pmi_rate)] {
            if rate > dec!(100) {
                return Err(InputError::RateOutOfRange { field, rate });
            }
        }
        Ok(())
    }
}

/// Represents the payment details for a single month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPeriod {
    /// Position in the schedule, starting at 1.
    pub index: u32,
    /// First day of the month this installment belongs to.
    pub date: NaiveDate,
    /// The level principal-and-interest installment.
    pub scheduled_payment: Decimal,
    /// Scheduled principal repaid this month.
    pub principal: Decimal,
    /// Interest charged on the balance carried into the month.
    pub interest: Decimal,
    /// Extra principal actually applied, after capping at the balance.
    pub extra_principal: Decimal,
    /// Cash paid this month: principal, interest, escrow and extra.
    pub total_payment: Decimal,
    /// Loan balance after this month's payment.
    pub remaining_balance: Decimal,
    /// Interest paid from the first period through this one.
    pub cumulative_interest: Decimal,
    /// Cash paid from the first period through this one.
    pub cumulative_paid: Decimal,
    /// Taxes, insurance, PMI, HOA and other costs for the month.
    pub escrow: Decimal,
    /// PMI share of `escrow`.
    pub pmi: Decimal,
}

/// One calendar year of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    /// Calendar year.
    pub year: i32,
    /// Human readable span of the months present, e.g. `"Mar 2025 - Dec 2025"`.
    pub date_range: String,
    /// Number of installments falling in the year.
    pub months: u32,
    /// Interest paid during the year.
    pub interest: Decimal,
    /// Scheduled plus extra principal.
    pub principal: Decimal,
    /// Escrow collected during the year.
    pub escrow: Decimal,
    /// Balance after the year's last installment.
    pub ending_balance: Decimal,
}

/// How the simulation loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    /// The balance reached zero.
    PaidOff,
    /// The period cap was hit with principal still owed.
    DidNotConverge {
        /// Balance left after the last simulated period.
        remaining_balance: Decimal,
    },
}

impl ScheduleOutcome {
    /// Whether the schedule ran to a zero balance.
    pub fn is_paid_off(&self) -> bool {
        matches!(self, ScheduleOutcome::PaidOff)
    }
}

/// Contains the full result of a mortgage simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageOutput {
    /// The level principal-and-interest installment.
    pub monthly_principal_and_interest: Decimal,
    /// Escrow charged in the first month, PMI included when it applies.
    pub monthly_escrow: Decimal,
    /// Principal and interest plus escrow.
    pub total_monthly_payment: Decimal,
    /// Home price minus down payment.
    pub loan_amount: Decimal,
    /// Every installment in chronological order.
    pub periods: Vec<PaymentPeriod>,
    /// One rollup per calendar year touched by `periods`.
    pub annual: Vec<AnnualSummary>,
    /// Cash paid over the whole schedule, escrow included.
    pub total_paid: Decimal,
    /// Interest paid over the whole schedule.
    pub total_interest: Decimal,
    /// Month of the last installment.
    pub payoff_date: NaiveDate,
    /// Index of the first period whose balance fell to 80% of the home price.
    pub pmi_drop_off_period: Option<u32>,
    /// Whether the schedule paid the loan off or hit the period cap.
    pub outcome: ScheduleOutcome,
}

/// `(year, month)` ordering key; the day is ignored.
pub(crate) fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .map(|ratio| ratio * dec!(100))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    fn base_input() -> MortgageInput {
        MortgageInput::new(dec!(300000), dec!(60000), 30, dec!(7), date(2025, 1))
    }

    #[test]
    fn test_percent_helpers_write_the_amount() {
        let input = base_input()
            .with_down_payment_percent(dec!(10))
            .with_property_tax_percent(dec!(1.2));

        assert_eq!(input.down_payment, dec!(30000));
        assert_eq!(input.down_payment_percent(), dec!(10));
        assert_eq!(input.property_tax, dec!(3600));
        assert_eq!(input.property_tax_percent(), dec!(1.2));
        assert_eq!(input.loan_amount(), dec!(270000));
    }

    #[test]
    fn test_percent_of_zero_price_is_zero() {
        let mut input = base_input();
        input.home_price = Decimal::ZERO;
        assert_eq!(input.down_payment_percent(), Decimal::ZERO);
    }

    #[rstest]
    #[case(date(2025, 2), dec!(0))]
    #[case(date(2025, 3), dec!(100))]
    #[case(date(2025, 6), dec!(5100))]
    #[case(date(2026, 1), dec!(1100))]
    #[case(date(2024, 1), dec!(0))]
    fn test_extra_payments_due_on(#[case] on: NaiveDate, #[case] expected: Decimal) {
        let extra = ExtraPayments {
            monthly: dec!(100),
            monthly_start: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
            one_time: dec!(5000),
            one_time_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            annual: dec!(1000),
            annual_start_year: 2026,
        };
        assert_eq!(extra.due_on(on), expected);
    }

    #[test]
    fn test_validate_accepts_reasonable_input() {
        assert!(base_input().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut negative = base_input();
        negative.hoa_fee = dec!(-1);
        assert!(matches!(
            negative.validate(),
            Err(InputError::Negative { field: "hoa_fee", .. })
        ));

        let mut zero_term = base_input();
        zero_term.term_years = 0;
        assert!(matches!(zero_term.validate(), Err(InputError::ZeroTerm)));

        let mut over = base_input();
        over.down_payment = dec!(300001);
        assert!(matches!(
            over.validate(),
            Err(InputError::DownPaymentExceedsPrice { .. })
        ));

        let mut long = base_input();
        long.term_years = 1000;
        assert_eq!(
            long.validate(),
            Err(InputError::TermTooLong { term_years: 1000, max: MAX_TERM_YEARS })
        );

        let mut rate = base_input();
        rate.interest_rate = dec!(150);
        assert!(matches!(
            rate.validate(),
            Err(InputError::RateOutOfRange { field: "interest_rate", .. })
        ));
    }

    #[test]
    fn test_input_deserializes_without_extra_payments() {
        let json = r#"{
            "home_price": "300000", "down_payment": "60000", "term_years": 30,
            "interest_rate": "7", "start_date": "2025-01-01",
            "property_tax": "0", "home_insurance": "0", "pmi_rate": "0",
            "hoa_fee": "0", "other_costs": "0"
        }"#;
        let input: MortgageInput = serde_json::from_str(json).unwrap();
        assert_eq!(input, base_input());
        assert!(input.extra_payments.is_empty());
    }
}
