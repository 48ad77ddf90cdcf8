//! `mortgage_schedule` is the calculation core behind a mortgage calculator page.
//!
//! It provides:
//! - **Amortization**: a month-by-month schedule for a level-payment loan,
//!   including escrow (taxes, insurance, PMI, HOA, other costs) and extra
//!   principal payments, plus a per-year rollup.
//! - **Share tokens**: a calculation packed into an expiring, URL-safe string
//!   so it can be reopened later without any server-side storage.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use mortgage_schedule::{calculate_mortgage, MortgageInput};
//! use mortgage_schedule::share::{self, ShareSnapshot};
//! use rust_decimal_macros::dec;
//!
//! fn main() -> anyhow::Result<()> {
//!     let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//!     let input = MortgageInput::new(dec!(300_000), dec!(60_000), 30, dec!(7), start);
//!
//!     let output = calculate_mortgage(&input)?;
//!     println!("Monthly P&I:    {:.2}", output.monthly_principal_and_interest);
//!     println!("Total interest: {:.2}", output.total_interest);
//!     println!("Paid off:       {}", output.payoff_date);
//!
//!     let snapshot = ShareSnapshot::create("30y fixed", "20% down", input, &output)?;
//!     let token = share::encode(&snapshot)?;
//!     let reopened = share::decode(&token)?;
//!     assert_eq!(reopened.summary.loan_amount, dec!(240_000));
//!     Ok(())
//! }
//! ```

pub mod amortization;
pub mod annual;
pub mod config;
pub mod error;
pub mod model;
pub mod share;
pub mod store;

pub use amortization::{PayoffComparison, compare_extra_payments, simulate};
pub use annual::summarize;
pub use config::ShareConfig;
pub use error::{InputError, ShareError};
pub use model::{
    AnnualSummary, ExtraPayments, MortgageInput, MortgageOutput, PaymentPeriod, ScheduleOutcome,
};

/// Validates `input` and runs the full simulation.
///
/// This is the main entry point for callers that take values straight from
/// a form. [`simulate`] skips validation and trusts its input.
///
/// # Errors
///
/// Returns an error if the input fails [`MortgageInput::validate`].
pub fn calculate_mortgage(input: &MortgageInput) -> Result<MortgageOutput, anyhow::Error> {
    input.validate()?;
    Ok(simulate(input))
}
