//! Readiness endpoint for the bot process. A database ping alone would say
//! nothing about whether a booking can actually complete, so the report also
//! covers the two reference tables a conversation dies without: active
//! outlets and the service rate card.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use laundryops_db::DbPool;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReadinessCheck {
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: CheckStatus,
    pub database: ReadinessCheck,
    pub outlets: ReadinessCheck,
    pub rate_card: ReadinessCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn spawn(bind_address: &str, port: u16, db_pool: DbPool) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool)).await {
            error!(
                event_name = "system.health.error",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let outlets = outlet_check(&state.db_pool).await;
    let rate_card = rate_card_check(&state.db_pool).await;

    let ready = [&database, &outlets, &rate_card]
        .iter()
        .all(|check| check.status == CheckStatus::Ready);

    let payload = HealthResponse {
        status: if ready { CheckStatus::Ready } else { CheckStatus::Degraded },
        database,
        outlets,
        rate_card,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> ReadinessCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => ReadinessCheck {
            status: CheckStatus::Ready,
            detail: "database reachable".to_string(),
        },
        Err(error) => ReadinessCheck {
            status: CheckStatus::Degraded,
            detail: format!("database query failed: {error}"),
        },
    }
}

/// Bookings are assigned to an active outlet at the terminal step; with zero
/// of them every confirmation will be refused.
async fn outlet_check(pool: &DbPool) -> ReadinessCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM outlets WHERE is_active = 1")
        .fetch_one(pool)
        .await
    {
        Ok(0) => ReadinessCheck {
            status: CheckStatus::Degraded,
            detail: "no active outlets; bookings cannot be assigned".to_string(),
        },
        Ok(count) => ReadinessCheck {
            status: CheckStatus::Ready,
            detail: format!("{count} active outlet(s)"),
        },
        Err(error) => ReadinessCheck {
            status: CheckStatus::Degraded,
            detail: format!("outlet lookup failed: {error}"),
        },
    }
}

/// An empty services table means every quote comes back unpriced.
async fn rate_card_check(pool: &DbPool) -> ReadinessCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services").fetch_one(pool).await {
        Ok(0) => ReadinessCheck {
            status: CheckStatus::Degraded,
            detail: "service rate card is empty; pricing unavailable".to_string(),
        },
        Ok(count) => ReadinessCheck {
            status: CheckStatus::Ready,
            detail: format!("{count} priced service(s)"),
        },
        Err(error) => ReadinessCheck {
            status: CheckStatus::Degraded,
            detail: format!("rate card lookup failed: {error}"),
        },
    }
}
