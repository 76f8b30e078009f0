use dockbook_core::collab::AdminSecretSource;
use dockbook_core::config::{AppConfig, LoadOptions};
use dockbook_db::{connect, SqlSettingsRepository};
use serde::Serialize;

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

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            let (database, admin_secret) = check_database_and_secret(&config);
            checks.push(database);
            checks.push(admin_secret);
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "admin_secret_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    // A missing admin secret degrades one flow, it does not block startup.
    let all_pass = checks
        .iter()
        .all(|check| check.status == CheckStatus::Pass || check.name == "admin_secret_readiness");
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database_and_secret(config: &AppConfig) -> (DoctorCheck, DoctorCheck) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return (
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: details.clone(),
                },
                DoctorCheck {
                    name: "admin_secret_readiness",
                    status: CheckStatus::Skipped,
                    details,
                },
            );
        }
    };

    runtime.block_on(async {
        let pool = match connect(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return (
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck {
                        name: "admin_secret_readiness",
                        status: CheckStatus::Skipped,
                        details: "skipped because the database is unreachable".to_string(),
                    },
                );
            }
        };

        let database = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };

        let admin_secret = if config.admin.secret.is_some() {
            DoctorCheck {
                name: "admin_secret_readiness",
                status: CheckStatus::Pass,
                details: "administrator password provided by config or environment".to_string(),
            }
        } else {
            match SqlSettingsRepository::new(pool.clone()).admin_secret().await {
                Ok(Some(_)) => DoctorCheck {
                    name: "admin_secret_readiness",
                    status: CheckStatus::Pass,
                    details: "administrator password found in the settings table".to_string(),
                },
                Ok(None) => DoctorCheck {
                    name: "admin_secret_readiness",
                    status: CheckStatus::Skipped,
                    details: "no administrator password configured; the maintenance-block \
                              flow will refuse to start"
                        .to_string(),
                },
                Err(error) => DoctorCheck {
                    name: "admin_secret_readiness",
                    status: CheckStatus::Skipped,
                    details: format!("settings table not readable yet: {error}"),
                },
            }
        };

        pool.close().await;
        (database, admin_secret)
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }
    lines.join("\n")
}

fn escape_json(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn human_rendering_marks_failures_loudly() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck {
                    name: "config_validation",
                    status: CheckStatus::Pass,
                    details: "ok".to_string(),
                },
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: "no such file".to_string(),
                },
            ],
        };

        let rendered = render_human(&report);
        assert!(rendered.contains("[pass] config_validation"));
        assert!(rendered.contains("[FAIL] database_connectivity"));
    }
}
