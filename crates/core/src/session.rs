//! In-memory conversation sessions. Each conversation owns one slot guarded by
//! its own async mutex so messages from the same chat are handled strictly in
//! arrival order while unrelated chats proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::customer::ConversationId;
use crate::domain::order::{DeliveryTier, PaymentMethod, PickupMode};
use crate::domain::service::ServiceSelection;
use crate::flows::states::BookingState;
use crate::history::RecentExchanges;
use crate::weight::ParsedWeight;

/// Answers collected so far. Fields fill in strictly in step order, so a field
/// is `Some` exactly when its step has been passed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingFields {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub tier: Option<DeliveryTier>,
    pub selection: Option<ServiceSelection>,
    pub weight: Option<ParsedWeight>,
    pub pickup_mode: Option<PickupMode>,
    pub pickup_address: Option<String>,
    pub pickup_window: Option<String>,
    pub delivery_window: Option<String>,
    pub instructions: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub chat_id: ConversationId,
    pub state: BookingState,
    pub fields: BookingFields,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn begin(chat_id: ConversationId) -> Self {
        Self {
            chat_id,
            state: BookingState::CollectingName,
            fields: BookingFields::default(),
            started_at: Utc::now(),
        }
    }
}

/// Per-conversation mutable state behind the slot lock: the active booking
/// session (if any) plus the short question/answer memory.
#[derive(Debug, Default)]
pub struct SessionSlot {
    pub session: Option<Session>,
    pub recent: RecentExchanges,
}

/// Hands out the per-conversation slot. The outer lock is a short std mutex
/// over the map only; the returned async mutex is what serializes message
/// handling for one chat.
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: std::sync::Mutex<HashMap<ConversationId, Arc<Mutex<SessionSlot>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, chat_id: &ConversationId) -> Arc<Mutex<SessionSlot>> {
        let mut slots = self.slots.lock().expect("session map lock poisoned");
        slots.entry(chat_id.clone()).or_default().clone()
    }

    /// Number of conversations with any retained state.
    pub fn len(&self) -> usize {
        self.slots.lock().expect("session map lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::domain::customer::ConversationId;
    use crate::flows::states::BookingState;

    use super::{Session, SessionStore};

    #[tokio::test]
    async fn same_chat_gets_the_same_slot() {
        let store = SessionStore::new();
        let chat = ConversationId::new("100");

        let first = store.slot(&chat);
        let second = store.slot(&chat);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);

        first.lock().await.session = Some(Session::begin(chat.clone()));
        assert!(second.lock().await.session.is_some());
    }

    #[tokio::test]
    async fn distinct_chats_do_not_share_state() {
        let store = SessionStore::new();
        let a = store.slot(&ConversationId::new("1"));
        let b = store.slot(&ConversationId::new("2"));
        assert!(!Arc::ptr_eq(&a, &b));

        a.lock().await.session = Some(Session::begin(ConversationId::new("1")));
        assert!(b.lock().await.session.is_none());
    }

    #[test]
    fn new_sessions_start_at_name_collection() {
        let session = Session::begin(ConversationId::new("7"));
        assert_eq!(session.state, BookingState::CollectingName);
        assert_eq!(session.fields, Default::default());
    }
}
