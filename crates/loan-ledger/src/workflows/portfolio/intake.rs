use std::ops::RangeInclusive;

use super::domain::{check_amount, ClientSubmission, InvalidAmount, PaymentSubmission};

/// Validation errors raised before anything reaches the evaluator or the ledger.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("client name must not be blank")]
    BlankName,
    #[error("e-mail address '{0}' is not valid")]
    InvalidEmail(String),
    #[error(transparent)]
    Amount(#[from] InvalidAmount),
    #[error("month must be between 1 and 12 (found {0})")]
    MonthOutOfRange(u32),
    #[error("year {found} is outside the accepted range {min}..={max}")]
    YearOutOfRange { found: i32, min: i32, max: i32 },
}

const DEFAULT_YEARS: RangeInclusive<i32> = 1900..=2200;

/// Guard that sanitizes inbound client and payment payloads.
#[derive(Debug, Clone)]
pub struct IntakeGuard {
    years: RangeInclusive<i32>,
}

impl Default for IntakeGuard {
    fn default() -> Self {
        Self::with_years(DEFAULT_YEARS)
    }
}

impl IntakeGuard {
    pub fn with_years(years: RangeInclusive<i32>) -> Self {
        Self { years }
    }

    /// Normalize a client submission: trimmed text, blank optionals dropped, property
    /// value zeroed when no property is declared.
    pub fn client_submission(
        &self,
        submission: ClientSubmission,
    ) -> Result<ClientSubmission, IntakeViolation> {
        let name = submission.name.trim().to_string();
        if name.is_empty() {
            return Err(IntakeViolation::BlankName);
        }

        let email = non_blank(submission.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(IntakeViolation::InvalidEmail(email.clone()));
            }
        }

        check_amount("salary", submission.salary)?;
        check_amount("other_income", submission.other_income)?;
        check_amount("housing_expense", submission.housing_expense)?;
        check_amount("requested_amount", submission.requested_amount)?;

        let property_value = if submission.has_property {
            check_amount("property_value", submission.property_value)?;
            submission.property_value
        } else {
            0.0
        };

        Ok(ClientSubmission {
            name,
            email,
            phone: non_blank(submission.phone),
            address: non_blank(submission.address),
            notes: non_blank(submission.notes),
            property_value,
            ..submission
        })
    }

    pub fn payment_submission(
        &self,
        submission: PaymentSubmission,
    ) -> Result<PaymentSubmission, IntakeViolation> {
        if !(1..=12).contains(&submission.month) {
            return Err(IntakeViolation::MonthOutOfRange(submission.month));
        }
        if !self.years.contains(&submission.year) {
            return Err(IntakeViolation::YearOutOfRange {
                found: submission.year,
                min: *self.years.start(),
                max: *self.years.end(),
            });
        }
        check_amount("amount", submission.amount)?;

        Ok(PaymentSubmission {
            description: non_blank(submission.description),
            ..submission
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
