//! Month-by-month mortgage simulation.
//!
//! The scheduled installment follows the Price (level payment) formula:
//! `PMT = P * [i(1 + i)^n] / [(1 + i)^n - 1]`. Each month the engine splits
//! that installment into interest and principal, adds whatever extra
//! principal the borrower configured, and stops once the balance is gone.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::annual::summarize;
use crate::model::{MAX_TERM_YEARS, MortgageInput, MortgageOutput, PaymentPeriod, ScheduleOutcome};

/// A balance at or below this amount counts as paid off.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

/// Periods simulated past the nominal term before giving up on payoff.
pub const SAFETY_MARGIN_PERIODS: u32 = 12;

/// Down payment share of the home price below which PMI is charged.
pub const PMI_EQUITY_THRESHOLD: Decimal = dec!(0.20);

/// Loan-to-value at which PMI stops being charged.
pub const PMI_DROP_OFF_LTV: Decimal = dec!(0.80);

/// Converts a nominal annual percentage into a monthly decimal rate.
///
/// 7.0 (% per year) becomes 0.0058333...
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / dec!(12) / dec!(100)
}

/// Level principal-and-interest installment for `total_months` payments.
///
/// A zero rate degrades to straight-line repayment. When there is no term to
/// spread the loan over, the whole amount falls due in a single installment.
/// If `(1 + i)^n` does not fit in a [`Decimal`] the installment takes its
/// limit for an endless term, `P * i`.
pub fn scheduled_payment(loan_amount: Decimal, monthly_rate: Decimal, total_months: u32) -> Decimal {
    if total_months == 0 {
        return loan_amount;
    }
    if monthly_rate.is_zero() {
        return loan_amount / Decimal::from(total_months);
    }

    // PMT = P * i * [(1 + i)^n / ((1 + i)^n - 1)], grouped so the
    // intermediate product stays within range.
    let interest_only = loan_amount * monthly_rate;
    let annuity_factor = (Decimal::ONE + monthly_rate)
        .checked_powu(total_months.into())
        .and_then(|i_plus_1_pow_n| i_plus_1_pow_n.checked_div(i_plus_1_pow_n - Decimal::ONE));

    match annuity_factor {
        Some(factor) => interest_only.checked_mul(factor).unwrap_or(interest_only),
        None => interest_only,
    }
}

/// Whether the down payment leaves less than 20% equity.
pub fn requires_pmi(input: &MortgageInput) -> bool {
    input
        .down_payment
        .checked_div(input.home_price)
        .is_some_and(|equity| equity < PMI_EQUITY_THRESHOLD)
}

/// Monthly PMI premium, zero when the down payment covers 20% of the price.
pub fn monthly_pmi(input: &MortgageInput) -> Decimal {
    if requires_pmi(input) {
        input.pmi_rate / dec!(100) * input.loan_amount() / dec!(12)
    } else {
        Decimal::ZERO
    }
}

/// Taxes, insurance, PMI, HOA and other costs collected each month.
pub fn monthly_escrow(input: &MortgageInput) -> Decimal {
    escrow_without_pmi(input) + monthly_pmi(input)
}

fn escrow_without_pmi(input: &MortgageInput) -> Decimal {
    input.property_tax / dec!(12) + input.home_insurance / dec!(12) + input.hoa_fee + input.other_costs
}

/// Runs the full schedule for `input`.
///
/// The engine trusts its input: negative or inconsistent values produce
/// nonsensical schedules rather than errors. Use
/// [`crate::calculate_mortgage`] for a validated entry point.
#[instrument(skip(input), fields(home_price = %input.home_price, term_years = input.term_years))]
pub fn simulate(input: &MortgageInput) -> MortgageOutput {
    let loan_amount = input.loan_amount();
    let rate = monthly_rate(input.interest_rate);
    let total_months = input.term_years.saturating_mul(12);
    let max_periods = total_months.saturating_add(SAFETY_MARGIN_PERIODS);

    let fixed_payment = scheduled_payment(loan_amount, rate, total_months);
    let base_escrow = escrow_without_pmi(input);
    let pmi_premium = monthly_pmi(input);
    let pmi_drop_off_balance = input.home_price * PMI_DROP_OFF_LTV;

    let start = first_of_month(input.start_date);
    let mut current_date = start;
    let mut current_balance = loan_amount;
    let mut total_interest = dec!(0);
    let mut total_paid = dec!(0);
    let mut pmi_active = requires_pmi(input);
    let mut pmi_drop_off_period = None;
    let mut periods: Vec<PaymentPeriod> =
        Vec::with_capacity(total_months.min(MAX_TERM_YEARS * 12) as usize);

    while current_balance > BALANCE_EPSILON && (periods.len() as u32) < max_periods {
        let index = periods.len() as u32 + 1;
        let interest_payment = current_balance * rate;
        let principal = (fixed_payment - interest_payment).min(current_balance);
        let extra_principal = input
            .extra_payments
            .due_on(current_date)
            .min(current_balance - principal);
        let pmi = if pmi_active { pmi_premium } else { Decimal::ZERO };
        let escrow = base_escrow + pmi;
        let total_payment = principal + interest_payment + escrow + extra_principal;

        current_balance -= principal + extra_principal;
        total_interest += interest_payment;
        total_paid += total_payment;

        if pmi_active && current_balance <= pmi_drop_off_balance {
            pmi_drop_off_period = Some(index);
            pmi_active = false;
        }

        periods.push(PaymentPeriod {
            index,
            date: current_date,
            scheduled_payment: fixed_payment,
            principal,
            interest: interest_payment,
            extra_principal,
            total_payment,
            remaining_balance: current_balance,
            cumulative_interest: total_interest,
            cumulative_paid: total_paid,
            escrow,
            pmi,
        });

        match current_date.checked_add_months(Months::new(1)) {
            Some(next) => current_date = next,
            None => break,
        }
    }

    let outcome = if current_balance <= BALANCE_EPSILON {
        ScheduleOutcome::PaidOff
    } else {
        warn!(
            periods = periods.len(),
            remaining_balance = %current_balance,
            "schedule did not converge before the period cap"
        );
        ScheduleOutcome::DidNotConverge {
            remaining_balance: current_balance,
        }
    };
    let payoff_date = periods.last().map_or(start, |period| period.date);
    let escrow = monthly_escrow(input);

    debug!(periods = periods.len(), %payoff_date, "simulated mortgage schedule");

    MortgageOutput {
        monthly_principal_and_interest: fixed_payment,
        monthly_escrow: escrow,
        total_monthly_payment: fixed_payment + escrow,
        loan_amount,
        annual: summarize(&periods),
        periods,
        total_paid,
        total_interest,
        payoff_date,
        pmi_drop_off_period,
        outcome,
    }
}

/// Interest and time saved by the configured extra payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffComparison {
    /// Total interest paid with no extra payments.
    pub baseline_interest: Decimal,
    /// Number of installments with no extra payments.
    pub baseline_periods: u32,
    /// Payoff month with no extra payments.
    pub baseline_payoff_date: NaiveDate,
    /// Total interest paid with the configured extra payments.
    pub interest: Decimal,
    /// Number of installments with the configured extra payments.
    pub periods: u32,
    /// Payoff month with the configured extra payments.
    pub payoff_date: NaiveDate,
    /// `baseline_interest - interest`.
    pub interest_saved: Decimal,
    /// `baseline_periods - periods`.
    pub months_saved: u32,
}

/// Simulates `input` with and without its extra payments.
pub fn compare_extra_payments(input: &MortgageInput) -> PayoffComparison {
    let with_extra = simulate(input);
    let baseline = if input.extra_payments.is_empty() {
        with_extra.clone()
    } else {
        simulate(&input.clone().with_extra_payments(Default::default()))
    };

    let periods = with_extra.periods.len() as u32;
    let baseline_periods = baseline.periods.len() as u32;

    PayoffComparison {
        baseline_interest: baseline.total_interest,
        baseline_periods,
        baseline_payoff_date: baseline.payoff_date,
        interest: with_extra.total_interest,
        periods,
        payoff_date: with_extra.payoff_date,
        interest_saved: baseline.total_interest - with_extra.total_interest,
        months_saved: baseline_periods.saturating_sub(periods),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
