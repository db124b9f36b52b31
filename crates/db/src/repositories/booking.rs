use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use uuid::Uuid;

use laundryops_core::domain::customer::{ConversationId, Customer, CustomerId};
use laundryops_core::domain::order::{CreatedOrder, OrderDraft, OrderId, OrderNumber};
use laundryops_core::domain::outlet::{AreaMapping, Outlet, OutletId};
use laundryops_core::domain::service::ServiceKind;
use laundryops_core::{BookingStore, CollabError};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlBookingStore {
    pool: DbPool,
}

impl SqlBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, full_name, phone_number, address, telegram_chat_id, total_orders
             FROM customers WHERE phone_number = ?1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_customer).transpose()
    }

    async fn customer_by_chat(
        &self,
        chat_id: &ConversationId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, full_name, phone_number, address, telegram_chat_id, total_orders
             FROM customers WHERE telegram_chat_id = ?1
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(chat_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_customer).transpose()
    }

    async fn outlets(&self) -> Result<Vec<Outlet>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, is_active FROM outlets ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(Outlet {
                    id: OutletId(parse_uuid(&row.get::<String, _>("id"), "outlets.id")?),
                    name: row.get("name"),
                    is_active: row.get::<i64, _>("is_active") != 0,
                })
            })
            .collect()
    }

    async fn area_map(&self) -> Result<Vec<AreaMapping>, RepositoryError> {
        let rows = sqlx::query("SELECT area_name, outlet_id FROM pune_areas ORDER BY area_name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(AreaMapping {
                    area_name: row.get("area_name"),
                    outlet_id: OutletId(parse_uuid(
                        &row.get::<String, _>("outlet_id"),
                        "pune_areas.outlet_id",
                    )?),
                })
            })
            .collect()
    }

    async fn service_rates(&self) -> Result<Vec<(ServiceKind, Decimal)>, RepositoryError> {
        let rows = sqlx::query("SELECT code, rate_per_kg FROM services ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        let mut rates = Vec::with_capacity(rows.len());
        for row in rows {
            let code: String = row.get("code");
            // Rows for codes the engine does not know are skipped, not fatal.
            let Some(kind) = ServiceKind::from_code(&code) else {
                tracing::warn!(event_name = "services.unknown_code", code = %code);
                continue;
            };
            let rate = parse_decimal(&row.get::<String, _>("rate_per_kg"), "services.rate_per_kg")?;
            rates.push((kind, rate));
        }
        Ok(rates)
    }

    /// Customer upsert and order insert in one transaction, so a failure in
    /// either leaves nothing behind.
    async fn insert_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        let existing = sqlx::query("SELECT id FROM customers WHERE phone_number = ?1")
            .bind(&draft.phone_number)
            .fetch_optional(&mut *tx)
            .await?;

        let (customer_id, existing_customer) = match existing {
            Some(row) => {
                let id = parse_uuid(&row.get::<String, _>("id"), "customers.id")?;
                sqlx::query(
                    "UPDATE customers
                     SET full_name = ?1, address = ?2, telegram_chat_id = ?3,
                         total_orders = total_orders + 1, updated_at = ?4
                     WHERE id = ?5",
                )
                .bind(&draft.full_name)
                .bind(&draft.address)
                .bind(draft.chat_id.as_str())
                .bind(&now)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
                (id, true)
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "INSERT INTO customers
                         (id, full_name, phone_number, address, telegram_chat_id,
                          total_orders, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
                )
                .bind(id.to_string())
                .bind(&draft.full_name)
                .bind(&draft.phone_number)
                .bind(&draft.address)
                .bind(draft.chat_id.as_str())
                .bind(&now)
                .execute(&mut *tx)
                .await?;
                (id, false)
            }
        };

        let order_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO orders
                 (id, order_number, customer_id, outlet_id, telegram_chat_id, status, priority,
                  weight_kg, weight_note, total_price, express_fee, payment_method, pickup_mode,
                  pickup_address, delivery_address, pickup_window, delivery_window, instructions,
                  delivery_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19)",
        )
        .bind(order_id.to_string())
        .bind(draft.order_number.as_str())
        .bind(customer_id.to_string())
        .bind(draft.outlet_id.0.to_string())
        .bind(draft.chat_id.as_str())
        .bind(draft.tier.priority_code())
        .bind(draft.weight_kg.to_string())
        .bind(&draft.weight_note)
        .bind(draft.total_price.to_string())
        .bind(draft.express_fee.to_string())
        .bind(draft.payment_method.code())
        .bind(draft.pickup_mode.code())
        .bind(&draft.pickup_address)
        .bind(&draft.delivery_address)
        .bind(&draft.pickup_window)
        .bind(&draft.delivery_window)
        .bind(&draft.instructions)
        .bind(draft.delivery_time.to_rfc3339())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for kind in draft.selection.codes() {
            sqlx::query("INSERT INTO order_items (order_id, service_code) VALUES (?1, ?2)")
                .bind(order_id.to_string())
                .bind(kind.code())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO order_status_logs (order_id, status, note, created_at)
             VALUES (?1, 'pending', 'order placed', ?2)",
        )
        .bind(order_id.to_string())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CreatedOrder {
            order_id: OrderId(order_id),
            order_number: draft.order_number.clone(),
            customer_id: CustomerId(customer_id),
            existing_customer,
        })
    }

    async fn insert_feedback(&self, order_id: &OrderId, stars: u8) -> Result<(), RepositoryError> {
        let known = sqlx::query("SELECT id FROM orders WHERE id = ?1")
            .bind(order_id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if known.is_none() {
            tracing::warn!(event_name = "feedback.unknown_order", order_id = %order_id.0);
            return Ok(());
        }

        sqlx::query("INSERT INTO feedback (order_id, stars, created_at) VALUES (?1, ?2, ?3)")
            .bind(order_id.0.to_string())
            .bind(i64::from(stars))
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for SqlBookingStore {
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, CollabError> {
        self.customer_by_phone(phone).await.map_err(Into::into)
    }

    async fn find_customer_by_chat(
        &self,
        chat_id: &ConversationId,
    ) -> Result<Option<Customer>, CollabError> {
        self.customer_by_chat(chat_id).await.map_err(Into::into)
    }

    async fn list_outlets(&self) -> Result<Vec<Outlet>, CollabError> {
        self.outlets().await.map_err(Into::into)
    }

    async fn list_area_map(&self) -> Result<Vec<AreaMapping>, CollabError> {
        self.area_map().await.map_err(Into::into)
    }

    async fn list_service_rates(&self) -> Result<Vec<(ServiceKind, Decimal)>, CollabError> {
        self.service_rates().await.map_err(Into::into)
    }

    async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, CollabError> {
        self.insert_order(draft).await.map_err(Into::into)
    }

    async fn record_feedback(&self, order_id: &OrderId, stars: u8) -> Result<(), CollabError> {
        self.insert_feedback(order_id, stars).await.map_err(Into::into)
    }
}

fn row_to_customer(row: sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    Ok(Customer {
        id: CustomerId(parse_uuid(&row.get::<String, _>("id"), "customers.id")?),
        full_name: row.get("full_name"),
        phone_number: row.get("phone_number"),
        address: row.get("address"),
        chat_id: row.get::<Option<String>, _>("telegram_chat_id").map(ConversationId::new),
        total_orders: u32::try_from(row.get::<i64, _>("total_orders")).unwrap_or(0),
    })
}

pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value)
        .map_err(|_| RepositoryError::Decode(format!("{field} is not a uuid: `{value}`")))
}

pub(crate) fn parse_decimal(value: &str, field: &str) -> Result<Decimal, RepositoryError> {
    value
        .parse::<Decimal>()
        .map_err(|_| RepositoryError::Decode(format!("{field} is not a decimal: `{value}`")))
}

pub(crate) fn parse_timestamp(
    value: &str,
    field: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| RepositoryError::Decode(format!("{field} is not an RFC 3339 timestamp")))
}
