use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer::CustomerId;
use crate::domain::outlet::OutletId;
use crate::domain::service::ServiceSelection;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

/// Human-shareable order code: `ORD-` followed by 8 uppercase hex characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("ORD-{}", hex[..8].to_ascii_uppercase()))
    }

    /// Normalizes a code the customer typed: case-insensitive, the `ORD-`
    /// prefix and the hyphen are both optional.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().to_ascii_uppercase();
        let body = trimmed.strip_prefix("ORD-").or_else(|| trimmed.strip_prefix("ORD")).unwrap_or(&trimmed);
        if body.len() == 8 && body.chars().all(|ch| ch.is_ascii_hexdigit()) {
            Some(Self(format!("ORD-{body}")))
        } else {
            None
        }
    }

    /// Scans free text for an embedded order code (`ord-1a2b3c4d`, `ORD1A2B3C4D`).
    pub fn find_in_text(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        let mut search = lower.as_str();
        while let Some(at) = search.find("ord") {
            let rest = &search[at + 3..];
            let rest = rest.strip_prefix('-').unwrap_or(rest);
            if let Some(body) = rest.get(..8) {
                if body.chars().all(|ch| ch.is_ascii_hexdigit()) {
                    return Self::parse(body);
                }
            }
            search = &search[at + 3..];
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery tier: standard is ~48 hours, express is ~24 hours with a +30% fee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTier {
    #[default]
    Standard,
    Express,
}

impl DeliveryTier {
    pub fn expected_hours(&self) -> i64 {
        match self {
            Self::Standard => 48,
            Self::Express => 24,
        }
    }

    pub fn priority_code(&self) -> &'static str {
        match self {
            Self::Standard => "normal",
            Self::Express => "express",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard (about 48 hours)",
            Self::Express => "Express (about 24 hours)",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupMode {
    #[default]
    SelfDrop,
    HomePickup,
}

impl PickupMode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SelfDrop => "self_drop",
            Self::HomePickup => "home_pickup",
        }
    }
}

/// Recorded with the order; payment itself is never executed here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Upi,
    Card,
}

impl PaymentMethod {
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::CashOnDelivery),
            "2" => Some(Self::Upi),
            "3" => Some(Self::Card),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cod",
            Self::Upi => "upi",
            Self::Card => "card",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::Upi => "UPI",
            Self::Card => "Card",
        }
    }
}

/// Everything the repository needs to persist one completed booking. All
/// amounts are final: the engine prices the order before handing it over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub order_number: OrderNumber,
    pub chat_id: crate::domain::customer::ConversationId,
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub outlet_id: OutletId,
    pub tier: DeliveryTier,
    pub selection: ServiceSelection,
    pub weight_kg: Decimal,
    pub weight_note: Option<String>,
    pub total_price: Decimal,
    pub express_fee: Decimal,
    pub payment_method: PaymentMethod,
    pub pickup_mode: PickupMode,
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    pub pickup_window: String,
    pub delivery_window: String,
    pub instructions: Option<String>,
    pub delivery_time: DateTime<Utc>,
}

/// Returned by the repository after the terminal transition persists an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub customer_id: CustomerId,
    pub existing_customer: bool,
}

/// Read-model for tracking replies; assembled by the order-lookup collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub status: String,
    pub services: Vec<String>,
    pub total_price: Decimal,
    pub delivery_time: Option<DateTime<Utc>>,
    pub outlet_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{DeliveryTier, OrderNumber, PaymentMethod};

    #[test]
    fn generated_numbers_use_the_shareable_format() {
        let number = OrderNumber::generate();
        let text = number.as_str();
        assert!(text.starts_with("ORD-"));
        assert_eq!(text.len(), 12);
        assert!(text[4..].chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_lowercase()));
    }

    #[test]
    fn parse_accepts_prefix_and_hyphen_variants() {
        for raw in ["ORD-1A2B3C4D", "ord-1a2b3c4d", "ORD1A2B3C4D", "1a2b3c4d", " ord-1A2B3c4d "] {
            let parsed = OrderNumber::parse(raw).expect("should parse");
            assert_eq!(parsed.as_str(), "ORD-1A2B3C4D");
        }
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!(OrderNumber::parse("ORD-123").is_none());
        assert!(OrderNumber::parse("ORD-1A2B3C4Z").is_none());
        assert!(OrderNumber::parse("hello").is_none());
    }

    #[test]
    fn find_in_text_locates_embedded_codes() {
        let found = OrderNumber::find_in_text("where is ord-deadbeef please");
        assert_eq!(found.expect("embedded code").as_str(), "ORD-DEADBEEF");

        let found = OrderNumber::find_in_text("status of ORDCAFEF00D?");
        assert_eq!(found.expect("no-hyphen code").as_str(), "ORD-CAFEF00D");

        assert!(OrderNumber::find_in_text("ordinary words only").is_none());
    }

    #[test]
    fn express_tier_carries_24h_promise() {
        assert_eq!(DeliveryTier::Express.expected_hours(), 24);
        assert_eq!(DeliveryTier::Standard.expected_hours(), 48);
    }

    #[test]
    fn payment_menu_covers_three_methods() {
        assert_eq!(PaymentMethod::from_menu_choice("1"), Some(PaymentMethod::CashOnDelivery));
        assert_eq!(PaymentMethod::from_menu_choice("2"), Some(PaymentMethod::Upi));
        assert_eq!(PaymentMethod::from_menu_choice("3"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::from_menu_choice("4"), None);
    }
}
