use async_trait::async_trait;
use sqlx::Row;

use laundryops_core::domain::customer::ConversationId;
use laundryops_core::domain::order::{OrderId, OrderNumber, OrderSummary};
use laundryops_core::{CollabError, OrderDirectory};

use super::booking::{parse_decimal, parse_timestamp, parse_uuid};
use super::RepositoryError;
use crate::DbPool;

pub struct SqlOrderDirectory {
    pool: DbPool,
}

impl SqlOrderDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn summary_rows(
        &self,
        rows: Vec<sqlx::sqlite::SqliteRow>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id: String = row.get("id");
            let services: Vec<String> = sqlx::query(
                "SELECT s.display_name FROM order_items oi
                 JOIN services s ON s.code = oi.service_code
                 WHERE oi.order_id = ?1
                 ORDER BY oi.id",
            )
            .bind(&order_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|service_row| service_row.get::<String, _>("display_name"))
            .collect();

            let order_number = OrderNumber::parse(&row.get::<String, _>("order_number"))
                .ok_or_else(|| {
                    RepositoryError::Decode("orders.order_number is malformed".to_string())
                })?;
            let delivery_time = row
                .get::<Option<String>, _>("delivery_time")
                .map(|value| parse_timestamp(&value, "orders.delivery_time"))
                .transpose()?;

            summaries.push(OrderSummary {
                order_id: OrderId(parse_uuid(&order_id, "orders.id")?),
                order_number,
                status: row.get("status"),
                services,
                total_price: parse_decimal(
                    &row.get::<String, _>("total_price"),
                    "orders.total_price",
                )?,
                delivery_time,
                outlet_name: row.get("outlet_name"),
                created_at: parse_timestamp(
                    &row.get::<String, _>("created_at"),
                    "orders.created_at",
                )?,
            });
        }
        Ok(summaries)
    }

    async fn by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<OrderSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT o.id, o.order_number, o.status, o.total_price, o.delivery_time,
                    o.created_at, ot.name AS outlet_name
             FROM orders o
             JOIN outlets ot ON ot.id = o.outlet_id
             WHERE o.order_number = ?1",
        )
        .bind(number.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(self.summary_rows(rows).await?.into_iter().next())
    }

    async fn recent_for(
        &self,
        chat_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT o.id, o.order_number, o.status, o.total_price, o.delivery_time,
                    o.created_at, ot.name AS outlet_name
             FROM orders o
             JOIN outlets ot ON ot.id = o.outlet_id
             WHERE o.telegram_chat_id = ?1
             ORDER BY o.created_at DESC, o.rowid DESC
             LIMIT ?2",
        )
        .bind(chat_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        self.summary_rows(rows).await
    }
}

#[async_trait]
impl OrderDirectory for SqlOrderDirectory {
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<OrderSummary>, CollabError> {
        self.by_number(number).await.map_err(Into::into)
    }

    async fn list_recent_for(
        &self,
        chat_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<OrderSummary>, CollabError> {
        self.recent_for(chat_id, limit).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use laundryops_core::domain::customer::ConversationId;
    use laundryops_core::domain::order::{
        DeliveryTier, OrderDraft, OrderNumber, PaymentMethod, PickupMode,
    };
    use laundryops_core::domain::service::ServiceSelection;
    use laundryops_core::{BookingStore, OrderDirectory};

    use crate::repositories::SqlBookingStore;
    use crate::{connect_with_settings, fixtures, migrations, DbPool};

    use super::SqlOrderDirectory;

    async fn prepared_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        fixtures::seed_reference_data(&pool).await.expect("seed");
        pool
    }

    async fn booked_order(pool: &DbPool, chat: &str) -> OrderDraft {
        let store = SqlBookingStore::new(pool.clone());
        let outlets = store.list_outlets().await.expect("outlets");
        let outlet = outlets.iter().find(|outlet| outlet.is_active).expect("active outlet");
        let draft = OrderDraft {
            order_number: OrderNumber::generate(),
            chat_id: ConversationId::new(chat),
            full_name: "Ravi Kulkarni".to_string(),
            phone_number: format!("98765{chat}0000"),
            address: "Baner, Pune".to_string(),
            outlet_id: outlet.id.clone(),
            tier: DeliveryTier::Standard,
            selection: ServiceSelection::WashIron,
            weight_kg: Decimal::new(300, 2),
            weight_note: None,
            total_price: Decimal::new(21_000, 2),
            express_fee: Decimal::ZERO,
            payment_method: PaymentMethod::CashOnDelivery,
            pickup_mode: PickupMode::SelfDrop,
            pickup_address: None,
            delivery_address: Some("Baner, Pune".to_string()),
            pickup_window: "20 Feb 10am".to_string(),
            delivery_window: "22 Feb 10am".to_string(),
            instructions: None,
            delivery_time: Utc::now(),
        };
        store.create_order(&draft).await.expect("create order");
        draft
    }

    #[tokio::test]
    async fn lookup_by_number_includes_services_and_outlet() {
        let pool = prepared_pool().await;
        let draft = booked_order(&pool, "700").await;

        let directory = SqlOrderDirectory::new(pool);
        let summary = directory
            .find_by_number(&draft.order_number)
            .await
            .expect("lookup")
            .expect("order exists");

        assert_eq!(summary.order_number, draft.order_number);
        assert_eq!(summary.status, "pending");
        assert_eq!(summary.services, vec!["Wash".to_string(), "Iron".to_string()]);
        assert_eq!(summary.total_price, Decimal::new(21_000, 2));
        assert!(summary.delivery_time.is_some());

        let missing = directory
            .find_by_number(&OrderNumber::generate())
            .await
            .expect("lookup of unknown order");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn recent_orders_are_scoped_to_the_conversation() {
        let pool = prepared_pool().await;
        booked_order(&pool, "801").await;
        let newest = booked_order(&pool, "801").await;
        booked_order(&pool, "802").await;

        let directory = SqlOrderDirectory::new(pool);
        let recent = directory
            .list_recent_for(&ConversationId::new("801"), 5)
            .await
            .expect("recent orders");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].order_number, newest.order_number);

        let other = directory
            .list_recent_for(&ConversationId::new("999"), 5)
            .await
            .expect("no orders");
        assert!(other.is_empty());
    }
}
