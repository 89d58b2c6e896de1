//! Loyalty tier derivation from annual spend and purchase recency.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const PLATINUM_MIN_SPEND: i64 = 10_000;
const GOLD_MIN_SPEND: i64 = 1_000;
const PLATINUM_MAX_MONTHS: i32 = 6;
const GOLD_MAX_MONTHS: i32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Platinum,
    Gold,
    Silver,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platinum => "Platinum",
            Self::Gold => "Gold",
            Self::Silver => "Silver",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of "today" for tier evaluation.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Classifies a customer. First matching rule wins:
///
/// 1. spend or date missing: no tier
/// 2. spend >= 10000 and at most 6 whole months since last purchase: Platinum
/// 3. 1000 <= spend < 10000 and at most 12 whole months: Gold
/// 4. spend < 1000: Silver, whatever the recency
/// 5. otherwise no tier
pub fn classify(
    annual_spend: Option<Decimal>,
    last_purchase_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<Tier> {
    let (spend, last_purchase) = annual_spend.zip(last_purchase_date)?;
    let months_since = whole_months_between(last_purchase, today);

    let platinum_floor = Decimal::from(PLATINUM_MIN_SPEND);
    let gold_floor = Decimal::from(GOLD_MIN_SPEND);

    if spend >= platinum_floor && months_since <= PLATINUM_MAX_MONTHS {
        Some(Tier::Platinum)
    } else if spend >= gold_floor && spend < platinum_floor && months_since <= GOLD_MAX_MONTHS {
        Some(Tier::Gold)
    } else if spend < gold_floor {
        Some(Tier::Silver)
    } else {
        None
    }
}

/// Number of complete months from `start` to `end`, truncated toward zero.
///
/// Negative when `end` precedes `start`.
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let start_index = start.year() * 12 + start.month0() as i32;
    let end_index = end.year() * 12 + end.month0() as i32;
    let mut months = end_index - start_index;

    if months > 0 && end.day() < start.day() {
        months -= 1;
    } else if months < 0 && end.day() > start.day() {
        months += 1;
    }

    months
}
