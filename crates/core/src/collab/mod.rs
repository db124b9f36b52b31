//! Seams between the conversation engine and everything it cannot own:
//! persistence, order lookup, and question answering. The engine only ever
//! sees these traits; sqlite-backed implementations live in the db crate and
//! in-memory ones in [`memory`] for tests and the smoke command.

pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::customer::{ConversationId, Customer};
use crate::domain::order::{CreatedOrder, OrderDraft, OrderId, OrderNumber, OrderSummary};
use crate::domain::outlet::{AreaMapping, Outlet};
use crate::domain::service::ServiceKind;
use crate::history::RecentExchanges;

/// Failures the engine turns into customer-facing degradation messages. The
/// three variants deliberately map to distinct replies: setup problems name a
/// fix for the operator, unavailability asks the customer to retry, and
/// integration failures apologize without detail.
#[derive(Debug, Error)]
pub enum CollabError {
    /// Schema or seed data is missing or malformed. The detail is logged and
    /// surfaced to operators, never to the customer verbatim.
    #[error("backing store is not set up: {detail}")]
    Setup { detail: String },
    /// Transient: the store exists but cannot be reached right now.
    #[error("backing store is unavailable")]
    Unavailable,
    /// An upstream integration failed in a way retrying will not fix.
    #[error("integration failure: {0}")]
    Integration(#[source] anyhow::Error),
}

/// Persistence the booking flow needs: reference data reads plus the terminal
/// customer-upsert and order-create writes.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, CollabError>;

    async fn find_customer_by_chat(
        &self,
        chat_id: &ConversationId,
    ) -> Result<Option<Customer>, CollabError>;

    /// All outlets, active and maintenance-flagged alike. Assignment needs to
    /// see inactive outlets to explain substitutions.
    async fn list_outlets(&self) -> Result<Vec<Outlet>, CollabError>;

    async fn list_area_map(&self) -> Result<Vec<AreaMapping>, CollabError>;

    /// Per-kilogram rate for each service currently offered.
    async fn list_service_rates(&self) -> Result<Vec<(ServiceKind, Decimal)>, CollabError>;

    /// Persists one completed booking. The customer is upserted atomically
    /// with the order, keyed by phone number; `existing_customer` on the
    /// result says whether the phone number was already known.
    async fn create_order(&self, draft: &OrderDraft) -> Result<CreatedOrder, CollabError>;

    /// Stores one star rating (1..=5) against an order, keyed by its id.
    async fn record_feedback(&self, order_id: &OrderId, stars: u8) -> Result<(), CollabError>;
}

/// Order lookup for tracking replies and "my orders" questions.
#[async_trait]
pub trait OrderDirectory: Send + Sync {
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<OrderSummary>, CollabError>;

    /// Most recent orders for the conversation, newest first.
    async fn list_recent_for(
        &self,
        chat_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<OrderSummary>, CollabError>;
}

/// Result of asking the question-answering collaborator. `NoContext` is not a
/// failure: it means nothing relevant was found and the generic fallback reply
/// should be used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaqOutcome {
    Answered(String),
    NoContext,
}

#[async_trait]
pub trait FaqResponder: Send + Sync {
    /// Answers a free-text question. The conversation's recent exchanges are
    /// supplied so context-aware responders can use them; the canned
    /// responder ignores them.
    async fn answer(
        &self,
        question: &str,
        recent: &RecentExchanges,
    ) -> Result<FaqOutcome, CollabError>;
}
