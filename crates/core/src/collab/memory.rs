//! In-memory implementations of the collaborator traits. Used by the engine
//! tests and the CLI smoke command; never in the server, which wires the
//! sqlite-backed versions instead.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::collab::{BookingStore, CollabError, OrderDirectory};
use crate::domain::customer::{ConversationId, Customer, CustomerId};
use crate::domain::order::{CreatedOrder, OrderDraft, OrderId, OrderNumber, OrderSummary};
use crate::domain::outlet::{AreaMapping, Outlet, OutletId};
use crate::domain::service::ServiceKind;

#[derive(Debug, Default)]
struct StoreState {
    customers: Vec<Customer>,
    outlets: Vec<Outlet>,
    areas: Vec<AreaMapping>,
    rates: Vec<(ServiceKind, Decimal)>,
    orders: Vec<(ConversationId, OrderSummary)>,
    feedback: Vec<(OrderId, u8)>,
    unavailable: bool,
}

/// Single in-memory store implementing both [`BookingStore`] and
/// [`OrderDirectory`], so an order booked through one trait is visible through
/// the other. Cloning shares the underlying state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two outlets (one under maintenance), their area mappings, and the full
    /// rate card. Mirrors the sqlite seed fixtures.
    pub fn with_fixtures() -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().expect("store lock poisoned");
            let kothrud = Outlet {
                id: OutletId(Uuid::new_v4()),
                name: "FreshFold Kothrud".to_string(),
                is_active: true,
            };
            let viman = Outlet {
                id: OutletId(Uuid::new_v4()),
                name: "FreshFold Viman Nagar".to_string(),
                is_active: false,
            };
            state.areas = vec![
                AreaMapping { area_name: "kothrud".to_string(), outlet_id: kothrud.id.clone() },
                AreaMapping { area_name: "viman nagar".to_string(), outlet_id: viman.id.clone() },
            ];
            state.outlets = vec![kothrud, viman];
            state.rates = vec![
                (ServiceKind::Wash, Decimal::new(5000, 2)),
                (ServiceKind::Iron, Decimal::new(2000, 2)),
                (ServiceKind::DryClean, Decimal::new(12000, 2)),
                (ServiceKind::ShoeClean, Decimal::new(10000, 2)),
            ];
        }
        store
    }

    /// Makes every subsequent call fail with [`CollabError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().expect("store lock poisoned").unavailable = unavailable;
    }

    pub fn clear_rates(&self) {
        self.state.lock().expect("store lock poisoned").rates.clear();
    }

    pub fn deactivate_all_outlets(&self) {
        let mut state = self.state.lock().expect("store lock poisoned");
        for outlet in &mut state.outlets {
            outlet.is_active = false;
        }
    }

    pub fn feedback(&self) -> Vec<(OrderId, u8)> {
        self.state.lock().expect("store lock poisoned").feedback.clone()
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().expect("store lock poisoned").orders.len()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, CollabError> {
        let state = self.state.lock().expect("store lock poisoned");
        if state.unavailable {
            return Err(CollabError::Unavailable);
        }
        Ok(state)
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, CollabError> {
        let state = self.guard()?;
        Ok(state.customers.iter().find(|customer| customer.phone_number == phone).cloned())
    }

    async fn find_customer_by_chat(
        &self,
        chat_id: &ConversationId,
    ) -> Result<Option<Customer>, CollabError> {
        let state = self.guard()?;
        Ok(state
            .customers
            .iter()
            .find(|customer| customer.chat_id.as_ref() == Some(chat_id))
            .cloned())
    }

    async fn list_outlets(&self) -> Result<Vec<Outlet>, CollabError> {
        Ok(self.guard()?.outlets.clone())
    }

    async fn list_area_map(&self) -> Result<Vec<AreaMapping>, CollabError> {
        Ok(self.guard()?.areas.clone())
    }

    async fn list_service_rates(&self) -> Result<Vec<(ServiceKind, Decimal)>, CollabError> {
        Ok(self.guard()?.rates.clone())
    }

    async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, CollabError> {
        let mut state = self.guard()?;

        let existing =
            state.customers.iter_mut().find(|customer| customer.phone_number == draft.phone_number);
        let (customer_id, existing_customer) = match existing {
            Some(customer) => {
                customer.full_name = draft.full_name.clone();
                customer.address = draft.address.clone();
                customer.chat_id = Some(draft.chat_id.clone());
                customer.total_orders += 1;
                (customer.id.clone(), true)
            }
            None => {
                let customer = Customer {
                    id: CustomerId(Uuid::new_v4()),
                    full_name: draft.full_name.clone(),
                    phone_number: draft.phone_number.clone(),
                    address: draft.address.clone(),
                    chat_id: Some(draft.chat_id.clone()),
                    total_orders: 1,
                };
                let id = customer.id.clone();
                state.customers.push(customer);
                (id, false)
            }
        };

        let outlet_name = state
            .outlets
            .iter()
            .find(|outlet| outlet.id == draft.outlet_id)
            .map(|outlet| outlet.name.clone())
            .unwrap_or_default();
        let order_id = OrderId(Uuid::new_v4());
        let summary = OrderSummary {
            order_id: order_id.clone(),
            order_number: draft.order_number.clone(),
            status: "pending".to_string(),
            services: draft
                .selection
                .codes()
                .iter()
                .map(|kind| kind.display_name().to_string())
                .collect(),
            total_price: draft.total_price,
            delivery_time: Some(draft.delivery_time),
            outlet_name,
            created_at: Utc::now(),
        };
        state.orders.push((draft.chat_id.clone(), summary));

        Ok(CreatedOrder {
            order_id,
            order_number: draft.order_number.clone(),
            customer_id,
            existing_customer,
        })
    }

    async fn record_feedback(&self, order_id: &OrderId, stars: u8) -> Result<(), CollabError> {
        let mut state = self.guard()?;
        state.feedback.push((order_id.clone(), stars));
        Ok(())
    }
}

#[async_trait]
impl OrderDirectory for InMemoryStore {
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<OrderSummary>, CollabError> {
        let state = self.guard()?;
        Ok(state
            .orders
            .iter()
            .find(|(_, summary)| &summary.order_number == number)
            .map(|(_, summary)| summary.clone()))
    }

    async fn list_recent_for(
        &self,
        chat_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<OrderSummary>, CollabError> {
        let state = self.guard()?;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|(chat, _)| chat == chat_id)
            .take(limit)
            .map(|(_, summary)| summary.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::collab::{BookingStore, CollabError, OrderDirectory};
    use crate::domain::customer::ConversationId;
    use crate::domain::order::{
        DeliveryTier, OrderDraft, OrderNumber, PaymentMethod, PickupMode,
    };
    use crate::domain::service::ServiceSelection;

    use super::InMemoryStore;

    async fn draft(store: &InMemoryStore, phone: &str) -> OrderDraft {
        let outlet_id = store.list_outlets().await.expect("outlets")[0].id.clone();
        OrderDraft {
            order_number: OrderNumber::generate(),
            chat_id: ConversationId::new("42"),
            full_name: "Asha Rao".to_string(),
            phone_number: phone.to_string(),
            address: "Kothrud, Pune".to_string(),
            outlet_id,
            tier: DeliveryTier::Standard,
            selection: ServiceSelection::WashOnly,
            weight_kg: Decimal::new(200, 2),
            weight_note: None,
            total_price: Decimal::new(10_000, 2),
            express_fee: Decimal::ZERO,
            payment_method: PaymentMethod::CashOnDelivery,
            pickup_mode: PickupMode::SelfDrop,
            pickup_address: None,
            delivery_address: None,
            pickup_window: "17 Feb 11am".to_string(),
            delivery_window: "19 Feb 11am".to_string(),
            instructions: None,
            delivery_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_order_upserts_the_customer_by_phone() {
        let store = InMemoryStore::with_fixtures();

        let first_draft = draft(&store, "9876543210").await;
        let first = store.create_order(&first_draft).await.expect("first order");
        assert!(!first.existing_customer);

        let second_draft = draft(&store, "9876543210").await;
        let second = store.create_order(&second_draft).await.expect("second order");
        assert!(second.existing_customer);
        assert_eq!(first.customer_id, second.customer_id);

        let customer = store
            .find_customer_by_phone("9876543210")
            .await
            .expect("lookup")
            .expect("customer exists");
        assert_eq!(customer.total_orders, 2);
    }

    #[tokio::test]
    async fn booked_orders_are_visible_through_the_directory() {
        let store = InMemoryStore::with_fixtures();
        let draft = draft(&store, "9876543210").await;
        store.create_order(&draft).await.expect("order");

        let found = store
            .find_by_number(&draft.order_number)
            .await
            .expect("lookup")
            .expect("order visible");
        assert_eq!(found.order_number, draft.order_number);

        let recent = store
            .list_recent_for(&ConversationId::new("42"), 5)
            .await
            .expect("recent orders");
        assert_eq!(recent.len(), 1);
        assert!(store
            .list_recent_for(&ConversationId::new("99"), 5)
            .await
            .expect("other chat")
            .is_empty());
    }

    #[tokio::test]
    async fn unavailable_flag_fails_every_call() {
        let store = InMemoryStore::with_fixtures();
        store.set_unavailable(true);
        let error = store.list_outlets().await.expect_err("unavailable");
        assert!(matches!(error, CollabError::Unavailable));
    }
}
