use std::sync::Arc;

use laundryops_core::config::{AppConfig, ConfigError, LoadOptions};
use laundryops_core::domain::service::RateCard;
use laundryops_core::{BookingEngine, BookingStore, StaticFaqResponder};
use laundryops_db::{
    connect_with_settings, fixtures, migrations, DbPool, SqlBookingStore, SqlOrderDirectory,
};
use laundryops_telegram::{
    HttpTransport, LongPollRunner, NoopTransport, ReconnectPolicy, TelegramTransport,
    TransportError,
};
use thiserror::Error;
use tracing::{info, warn};

pub type SqlEngine = BookingEngine<SqlBookingStore, SqlOrderDirectory, StaticFaqResponder>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<SqlEngine>,
    pub runner: LongPollRunner,
    pub telegram_noop: bool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("reference data seed failed: {0}")]
    Seed(#[source] sqlx::Error),
    #[error("telegram transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let seeded = fixtures::seed_reference_data(&db_pool).await.map_err(BootstrapError::Seed)?;
    info!(
        event_name = "system.bootstrap.reference_data_ready",
        outlets_inserted = seeded.outlets_inserted,
        services_inserted = seeded.services_inserted,
        "reference data in place"
    );

    let store = Arc::new(SqlBookingStore::new(db_pool.clone()));
    let directory = Arc::new(SqlOrderDirectory::new(db_pool.clone()));
    let faq = Arc::new(StaticFaqResponder::new(load_rate_card(store.as_ref()).await));
    let engine = Arc::new(BookingEngine::new(store, directory, faq));

    let telegram_noop = config.telegram_disabled();
    let transport: Arc<dyn TelegramTransport> = if telegram_noop {
        Arc::new(NoopTransport)
    } else {
        Arc::new(HttpTransport::new(
            &config.telegram.api_base_url,
            config.telegram.bot_token.clone(),
            config.telegram.poll_timeout_secs,
        )?)
    };
    let runner = LongPollRunner::new(transport, engine.clone(), ReconnectPolicy::default());

    Ok(Application { config, db_pool, engine, runner, telegram_noop })
}

/// The FAQ responder answers pricing questions from a snapshot of the rate
/// catalog taken at startup. An unreadable catalog degrades to generic answers
/// instead of blocking bootstrap.
async fn load_rate_card(store: &SqlBookingStore) -> RateCard {
    match store.list_service_rates().await {
        Ok(rates) => RateCard::new(
            rates.into_iter().map(|(kind, rate)| (kind.code().to_string(), rate)),
        ),
        Err(error) => {
            warn!(
                event_name = "system.bootstrap.rate_card_unavailable",
                error = %error,
                "could not load service rates for FAQ answers"
            );
            RateCard::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use laundryops_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    const BOOKING_SCRIPT: &[&str] = &[
        "book",
        "Asha Rao",
        "12 Lane 5, Kothrud, Pune",
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

    fn valid_options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_a_malformed_bot_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                telegram_bot_token: Some("not-a-botfather-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("telegram.bot_token"));
    }

    #[tokio::test]
    async fn empty_token_selects_the_noop_transport() {
        let app = bootstrap(valid_options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed");
        assert!(app.telegram_noop);

        // The noop runner observes a closed stream and returns immediately.
        app.runner.start().await.expect("noop runner should stop cleanly");
        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn integration_smoke_books_an_order_through_the_sql_stack() {
        let app = bootstrap(valid_options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('customers', 'outlets', 'services', 'orders')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables should exist after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose the baseline intake tables");

        let chat = laundryops_core::ConversationId::new("smoke-1");
        let mut confirmation = String::new();
        for message in BOOKING_SCRIPT {
            confirmation = app.engine.handle(&chat, message).await;
        }

        assert!(confirmation.contains("ORD-"), "confirmation should carry the order number");
        assert!(confirmation.contains("FreshFold Kothrud"));

        let (order_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&app.db_pool)
            .await
            .expect("orders should be queryable");
        assert_eq!(order_count, 1);

        let thanks = app.engine.handle(&chat, "5").await;
        assert!(thanks.contains("5-star"), "unexpected rating reply: {thanks}");

        let (stars,): (i64,) = sqlx::query_as("SELECT stars FROM feedback LIMIT 1")
            .fetch_one(&app.db_pool)
            .await
            .expect("the closing rating should be recorded");
        assert_eq!(stars, 5);

        app.db_pool.close().await;
    }
}
