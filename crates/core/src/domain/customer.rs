use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable external chat handle, e.g. a Telegram chat id. One booking session
/// exists per conversation id at most.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub chat_id: Option<ConversationId>,
    pub total_orders: u32,
}

/// Digits-only normalization used for the at-most-one-customer-per-phone
/// invariant. Falls back to the conversation id when the message carried no
/// digits at all.
pub fn normalize_phone(raw: &str, chat: &ConversationId) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        format!("tg-{}", chat.as_str())
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_phone, ConversationId};

    #[test]
    fn normalization_keeps_digits_only() {
        let chat = ConversationId::new("12345");
        assert_eq!(normalize_phone("+91 98765-43210", &chat), "919876543210");
    }

    #[test]
    fn digitless_phone_falls_back_to_chat_handle() {
        let chat = ConversationId::new("12345");
        assert_eq!(normalize_phone("call me maybe", &chat), "tg-12345");
    }
}
