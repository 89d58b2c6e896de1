use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tier::Tier;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CustomerId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// A stored customer record.
///
/// `tier` is derived on read paths and is never written to storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}

impl Customer {
    pub fn new(id: CustomerId, data: ValidCustomer) -> Self {
        Self {
            id,
            name: data.name,
            email: data.email,
            annual_spend: data.annual_spend,
            last_purchase_date: data.last_purchase_date,
            tier: None,
        }
    }

    /// Overwrites every mutable field; `id` is left as is.
    pub fn apply(&mut self, data: ValidCustomer) {
        self.name = data.name;
        self.email = data.email;
        self.annual_spend = data.annual_spend;
        self.last_purchase_date = data.last_purchase_date;
        self.tier = None;
    }

    pub fn with_tier(mut self, today: NaiveDate) -> Self {
        self.tier = crate::tier::classify(self.annual_spend, self.last_purchase_date, today);
        self
    }
}

/// Caller-supplied customer fields, as decoded from a request body.
///
/// Unknown keys such as `id` or `tier` are ignored so callers can never set them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub annual_spend: Option<Decimal>,
    #[serde(default)]
    pub last_purchase_date: Option<NaiveDate>,
}

/// Customer fields that passed `validation::validate_customer`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidCustomer {
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<NaiveDate>,
}

/// The key a lookup was made with, kept for not-found reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomerLookup {
    Id(CustomerId),
    Name(String),
    Email(String),
}

impl CustomerLookup {
    pub fn not_found_message(&self) -> String {
        match self {
            Self::Id(id) => format!("Customer not found with ID: {id}"),
            Self::Name(detail) | Self::Email(detail) => format!("Customer not found: {detail}"),
        }
    }
}
