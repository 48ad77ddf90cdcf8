//! Calendar-year rollup of a payment schedule.

use chrono::{Datelike, NaiveDate};

use crate::model::{AnnualSummary, PaymentPeriod};

/// Groups a chronological schedule into one [`AnnualSummary`] per calendar year.
///
/// Years without periods are skipped; a schedule starting in March yields a
/// first summary covering March to December only.
pub fn summarize(periods: &[PaymentPeriod]) -> Vec<AnnualSummary> {
    let mut summaries: Vec<AnnualSummary> = Vec::new();
    let mut first_month: Option<NaiveDate> = None;

    for period in periods {
        let year = period.date.year();
        if let Some(summary) = summaries.last_mut().filter(|summary| summary.year == year) {
            summary.months += 1;
            summary.interest += period.interest;
            summary.principal += period.principal + period.extra_principal;
            summary.escrow += period.escrow;
            summary.ending_balance = period.remaining_balance;
            if let Some(first) = first_month {
                summary.date_range = date_range(first, period.date);
            }
            continue;
        }

        first_month = Some(period.date);
        summaries.push(AnnualSummary {
            year,
            date_range: date_range(period.date, period.date),
            months: 1,
            interest: period.interest,
            principal: period.principal + period.extra_principal,
            escrow: period.escrow,
            ending_balance: period.remaining_balance,
        });
    }

    summaries
}

fn date_range(first: NaiveDate, last: NaiveDate) -> String {
    if first == last {
        first.format("%b %Y").to_string()
    } else {
        format!("{} - {}", first.format("%b %Y"), last.format("%b %Y"))
    }
}
