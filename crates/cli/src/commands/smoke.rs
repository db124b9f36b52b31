use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::CommandResult;
use laundryops_core::collab::memory::InMemoryStore;
use laundryops_core::config::{AppConfig, LoadOptions};
use laundryops_core::{BookingEngine, ConversationId, RateCard, StaticFaqResponder};
use laundryops_db::{connect_with_settings, migrations};

/// One full happy-path booking, driven against the in-memory store. The final
/// reply must carry an order number.
const BOOKING_SCRIPT: &[&str] = &[
    "book",
    "Asha Rao",
    "Kothrud, Pune",
    "9876543210",
    "1",
    "1",
    "2",
    "1",
    "17 Feb 11am",
    "19 Feb 6pm",
    "no",
    "1",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config_started = Instant::now();
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms: config_started.elapsed().as_millis() as u64,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms: config_started.elapsed().as_millis() as u64,
                message: error.to_string(),
            });
            checks.push(skipped("telegram_token_sanity"));
            checks.push(skipped("db_connectivity"));
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("conversation_flow"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let token_started = Instant::now();
    let token = config.telegram.bot_token.expose_secret().trim().to_string();
    checks.push(if token.is_empty() {
        SmokeCheck {
            name: "telegram_token_sanity",
            status: SmokeStatus::Pass,
            elapsed_ms: token_started.elapsed().as_millis() as u64,
            message: "no bot token configured; the server will use the noop transport".to_string(),
        }
    } else if token.contains(':') {
        SmokeCheck {
            name: "telegram_token_sanity",
            status: SmokeStatus::Pass,
            elapsed_ms: token_started.elapsed().as_millis() as u64,
            message: "bot token has the expected `<bot-id>:<secret>` shape".to_string(),
        }
    } else {
        SmokeCheck {
            name: "telegram_token_sanity",
            status: SmokeStatus::Fail,
            elapsed_ms: token_started.elapsed().as_millis() as u64,
            message: "bot token does not look like a BotFather token".to_string(),
        }
    });

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("conversation_flow"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let db_started = Instant::now();
    let db_result = runtime.block_on(async {
        connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
    });

    match db_result {
        Ok(pool) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Pass,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("connected using `{}`", config.database.url),
            });

            let migration_started = Instant::now();
            let migration_result =
                runtime.block_on(async { migrations::run_pending(&pool).await });
            runtime.block_on(async {
                pool.close().await;
            });

            match migration_result {
                Ok(()) => checks.push(SmokeCheck {
                    name: "migration_visibility",
                    status: SmokeStatus::Pass,
                    elapsed_ms: migration_started.elapsed().as_millis() as u64,
                    message: "migrations are visible and executable".to_string(),
                }),
                Err(error) => checks.push(SmokeCheck {
                    name: "migration_visibility",
                    status: SmokeStatus::Fail,
                    elapsed_ms: migration_started.elapsed().as_millis() as u64,
                    message: format!("migration execution failed: {error}"),
                }),
            }
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("failed to connect: {error}"),
            });
            checks.push(skipped("migration_visibility"));
        }
    }

    let flow_started = Instant::now();
    let flow_result = runtime.block_on(run_booking_script());
    checks.push(match flow_result {
        Ok(order_number) => SmokeCheck {
            name: "conversation_flow",
            status: SmokeStatus::Pass,
            elapsed_ms: flow_started.elapsed().as_millis() as u64,
            message: format!("scripted booking confirmed with {order_number}"),
        },
        Err(message) => SmokeCheck {
            name: "conversation_flow",
            status: SmokeStatus::Fail,
            elapsed_ms: flow_started.elapsed().as_millis() as u64,
            message,
        },
    });

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// Drives the whole intake flow in memory; no network, no database.
async fn run_booking_script() -> Result<String, String> {
    let store = InMemoryStore::with_fixtures();
    let faq = StaticFaqResponder::new(RateCard::new([
        ("wash".to_string(), Decimal::new(5000, 2)),
        ("iron".to_string(), Decimal::new(2000, 2)),
    ]));
    let engine =
        BookingEngine::new(Arc::new(store.clone()), Arc::new(store), Arc::new(faq));
    let chat = ConversationId::new("smoke");

    let mut last = String::new();
    for message in BOOKING_SCRIPT {
        last = engine.handle(&chat, message).await;
    }

    match laundryops_core::OrderNumber::find_in_text(&last) {
        Some(number) => Ok(number.to_string()),
        None => Err(format!("booking script did not end in a confirmation: {last}")),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due to a previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
