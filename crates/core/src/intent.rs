//! Keyword intent routing for messages that arrive outside an active booking
//! session. Precedence is fixed: restart/greeting first, then order-related
//! phrasing, then booking keywords, then tracking, and finally the generic
//! question path. The order matters: "what about my order" must never start a
//! fresh booking.

use serde::{Deserialize, Serialize};

use crate::domain::order::OrderNumber;

/// Commands that always discard the active session and greet from scratch.
pub const RESTART_COMMANDS: &[&str] = &["/start", "start", "restart", "cancel"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Restart command or bare greeting: reply with the welcome menu.
    Greeting,
    /// The customer is asking what they recently asked.
    RecentQuestions,
    /// Natural-language question about their own orders.
    OrderQuery,
    /// Begin the booking flow.
    StartBooking,
    /// Track a specific order whose code appeared in the message.
    TrackByNumber(OrderNumber),
    /// Wants tracking but gave no code; ask for one.
    TrackPrompt,
    /// Anything else: handed to the question-answering collaborator.
    Question,
}

pub fn classify(text: &str) -> Intent {
    let raw = text.trim();
    let lower = raw.to_ascii_lowercase();

    if is_restart_command(&lower) || matches!(lower.as_str(), "hi" | "hello" | "hey") {
        return Intent::Greeting;
    }

    if asks_for_recent_questions(&lower) {
        return Intent::RecentQuestions;
    }

    if is_order_query(&lower) {
        return Intent::OrderQuery;
    }

    if contains_any(&lower, &["book", "pickup", "pick up", "schedule", "laundry"]) {
        return Intent::StartBooking;
    }

    if let Some(number) = OrderNumber::find_in_text(raw) {
        return Intent::TrackByNumber(number);
    }

    if contains_any(&lower, &["track", "status", "where is"]) {
        return Intent::TrackPrompt;
    }

    Intent::Question
}

pub fn is_restart_command(lower: &str) -> bool {
    RESTART_COMMANDS.contains(&lower.trim())
}

fn asks_for_recent_questions(lower: &str) -> bool {
    contains_any(
        lower,
        &["what did i ask", "what have i asked", "recent question", "previous question", "last question"],
    )
}

/// "my order", "order status", "my last order" and similar phrasing. Plain
/// "order" alone is not enough; it needs a possessive or status word nearby.
fn is_order_query(lower: &str) -> bool {
    if !lower.contains("order") {
        return false;
    }
    contains_any(lower, &["my order", "my last", "my recent", "order status", "orders"])
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
