use std::str::FromStr;

use chrono::NaiveDate;
use membership_core::tier::{classify, Clock, SystemClock};
use rust_decimal::Decimal;

use crate::commands::{CommandResult, EXIT_INVALID_ARGUMENTS};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reports the tier label as the outcome message, or `none` when no tier applies.
pub fn run(annual_spend: &str, last_purchase: &str, today: Option<&str>) -> CommandResult {
    let annual_spend = match Decimal::from_str(annual_spend.trim()) {
        Ok(spend) => spend,
        Err(error) => return invalid(format!("annual spend `{annual_spend}`: {error}")),
    };
    let last_purchase = match parse_date("last purchase", last_purchase) {
        Ok(date) => date,
        Err(result) => return result,
    };
    let today = match today {
        Some(raw) => match parse_date("today", raw) {
            Ok(date) => date,
            Err(result) => return result,
        },
        None => SystemClock.today(),
    };

    let label = classify(Some(annual_spend), Some(last_purchase), today)
        .map(|tier| tier.as_str())
        .unwrap_or("none");

    CommandResult::success("tier", label)
}

fn parse_date(label: &str, raw: &str) -> Result<NaiveDate, CommandResult> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|error| invalid(format!("{label} `{raw}`: {error}")))
}

fn invalid(message: String) -> CommandResult {
    CommandResult::failure("tier", "invalid_arguments", message, EXIT_INVALID_ARGUMENTS)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::run;
    use crate::commands::CommandResult;

    fn outcome(result: &CommandResult) -> Value {
        serde_json::from_str(&result.output).expect("tier output is json")
    }

    #[test]
    fn classifies_with_explicit_today() {
        let result = run("12000", "2026-07-18", Some("2026-10-18"));
        assert_eq!(result.exit_code, 0);
        let payload = outcome(&result);
        assert_eq!(payload["command"], "tier");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "Platinum");

        let gold = run("1000", "2025-10-18", Some("2026-10-18"));
        assert_eq!(outcome(&gold)["message"], "Gold");
    }

    #[test]
    fn boundary_spend_past_recency_window_has_no_tier() {
        let result = run("10000", "2026-03-18", Some("2026-10-18"));
        assert_eq!(result.exit_code, 0);
        assert_eq!(outcome(&result)["message"], "none");
    }

    #[test]
    fn small_spend_is_silver_regardless_of_recency() {
        let result = run("500", "2016-01-01", Some("2026-10-18"));
        assert_eq!(outcome(&result)["message"], "Silver");
    }

    #[test]
    fn malformed_arguments_exit_with_invalid_arguments() {
        let spend = run("lots", "2026-07-18", None);
        assert_eq!(spend.exit_code, 6);
        assert!(spend.output.contains("\"error_class\":\"invalid_arguments\""));

        let date = run("100", "18/07/2026", Some("2026-10-18"));
        assert_eq!(date.exit_code, 6);
        assert!(date.output.contains("last purchase"));
    }
}
