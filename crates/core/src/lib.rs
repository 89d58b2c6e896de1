pub mod config;
pub mod domain;
pub mod errors;
pub mod tier;
pub mod validation;

pub use domain::customer::{Customer, CustomerDraft, CustomerId, CustomerLookup, ValidCustomer};
pub use errors::{ApplicationError, DomainError, FieldError, FieldErrors, InterfaceError};
pub use tier::{classify, whole_months_between, Clock, FixedClock, SystemClock, Tier};
pub use validation::validate_customer;
