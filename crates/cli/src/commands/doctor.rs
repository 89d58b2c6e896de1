use membership_core::config::{AppConfig, LoadOptions};
use membership_db::{connect_with_settings, DbPool};
use serde::Serialize;

use crate::commands::{
    current_thread_runtime, CommandResult, EXIT_CONFIG_VALIDATION, EXIT_DB_CONNECTIVITY,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn exit_code(&self) -> u8 {
        let failed = |name: &str| {
            self.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
        };
        if failed("config_validation") {
            EXIT_CONFIG_VALIDATION
        } else if self.overall_status == CheckStatus::Fail {
            EXIT_DB_CONNECTIVITY
        } else {
            0
        }
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = report.exit_code();

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                concat!(
                    "{{\"overall_status\":\"fail\",",
                    "\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}"
                ),
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped(
                "database_connectivity",
                "configuration did not load",
            ));
            checks.push(DoctorCheck::skipped("customer_schema", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck::skipped("customer_schema", "no async runtime"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck::skipped("customer_schema", "the database is unreachable"),
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };
        let schema = check_customer_schema(&pool).await;
        pool.close().await;

        vec![connectivity, schema]
    })
}

async fn check_customer_schema(pool: &DbPool) -> DoctorCheck {
    let lookup = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'customer'",
    )
    .fetch_one(pool)
    .await;

    match lookup {
        Ok(1) => DoctorCheck {
            name: "customer_schema",
            status: CheckStatus::Pass,
            details: "customer table present".to_string(),
        },
        Ok(_) => DoctorCheck {
            name: "customer_schema",
            status: CheckStatus::Fail,
            details: "customer table missing; run `membership migrate`".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "customer_schema",
            status: CheckStatus::Fail,
            details: format!("schema lookup failed: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{render_human, CheckStatus, DoctorCheck, DoctorReport};

    fn check(name: &'static str, status: CheckStatus, details: &str) -> DoctorCheck {
        DoctorCheck { name, status, details: details.to_string() }
    }

    fn report(checks: Vec<DoctorCheck>) -> DoctorReport {
        let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
        DoctorReport {
            overall_status: if all_pass { CheckStatus::Pass } else { CheckStatus::Fail },
            summary: "doctor".to_string(),
            checks,
        }
    }

    #[test]
    fn config_failures_take_the_config_exit_code() {
        let report = report(vec![
            check("config_validation", CheckStatus::Fail, "bad"),
            DoctorCheck::skipped("database_connectivity", "configuration did not load"),
        ]);

        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn database_failures_take_the_connectivity_exit_code() {
        let report = report(vec![
            check("config_validation", CheckStatus::Pass, ""),
            check("customer_schema", CheckStatus::Fail, ""),
        ]);

        assert_eq!(report.exit_code(), 4);
    }

    #[test]
    fn human_rendering_marks_each_check() {
        let report = report(vec![
            check("config_validation", CheckStatus::Pass, "loaded"),
            DoctorCheck::skipped("customer_schema", "no database"),
        ]);

        let rendered = render_human(&report);
        assert!(rendered.contains("- [ok] config_validation: loaded"));
        assert!(rendered.contains("- [skip] customer_schema: skipped because no database"));
        assert_eq!(report.exit_code(), 4);
    }
}
