use rust_decimal::Decimal;
use validator::ValidateEmail;

use crate::domain::customer::{CustomerDraft, ValidCustomer};
use crate::errors::{DomainError, FieldError, FieldErrors};

pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Email format is invalid";
pub const SPEND_NEGATIVE: &str = "Annual spend must not be negative";

/// Checks a draft and reports every offending field at once.
pub fn validate_customer(draft: CustomerDraft) -> Result<ValidCustomer, DomainError> {
    let mut errors = FieldErrors::default();

    let name = non_blank(draft.name);
    if name.is_none() {
        errors.push(FieldError::new("name", NAME_REQUIRED));
    }

    let email = non_blank(draft.email);
    match &email {
        None => errors.push(FieldError::new("email", EMAIL_REQUIRED)),
        Some(value) if !value.validate_email() => {
            errors.push(FieldError::new("email", EMAIL_INVALID));
        }
        Some(_) => {}
    }

    if draft.annual_spend.is_some_and(|spend| spend < Decimal::ZERO) {
        errors.push(FieldError::new("annualSpend", SPEND_NEGATIVE));
    }

    match (name, email) {
        (Some(name), Some(email)) if errors.is_empty() => Ok(ValidCustomer {
            name,
            email,
            annual_spend: draft.annual_spend,
            last_purchase_date: draft.last_purchase_date,
        }),
        _ => Err(DomainError::Validation(errors)),
    }
}

/// Whitespace only counts when deciding blankness; the value is kept as sent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}
