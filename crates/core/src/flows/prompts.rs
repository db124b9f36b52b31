//! Every customer-facing reply in one place. Plain text only: the transport
//! layer sends these verbatim, so no markup beyond newlines and the rupee
//! sign.

use rust_decimal::Decimal;

use crate::domain::order::{DeliveryTier, OrderNumber, OrderSummary};
use crate::history::Exchange;
use crate::weight::TextileKind;

pub fn welcome(known_name: Option<&str>) -> String {
    let greeting = match known_name {
        Some(name) => format!("Welcome back, {name}!"),
        None => "Hi! I'm the FreshFold laundry assistant.".to_string(),
    };
    format!(
        "{greeting}\n\
         I can help you with:\n\
         - \"book\" to schedule a laundry pickup\n\
         - \"track ORD-XXXXXXXX\" to check an order\n\
         - questions about pricing, timing, or coverage\n\
         What would you like to do?"
    )
}

pub fn ask_name() -> String {
    "Let's get your pickup booked. What's your full name?".to_string()
}

pub fn ask_address() -> String {
    "Thanks! What's your address? Please include your area, e.g. \"12 Lane 5, Kothrud, Pune\"."
        .to_string()
}

pub fn outside_service_area(areas: &[String]) -> String {
    format!(
        "Sorry, we currently serve Pune only. Areas we cover: {}.\n\
         If your address is in one of these, please include the area name and try again.",
        areas.join(", ")
    )
}

pub fn address_accepted(nearby_outlet: Option<&str>) -> String {
    match nearby_outlet {
        Some(name) => {
            format!("Got it, that's in our service area (nearest outlet: {name}). What's your 10-digit phone number?")
        }
        None => "Got it, that's in our service area. What's your 10-digit phone number?".to_string(),
    }
}

pub fn invalid_phone() -> String {
    "That doesn't look like a phone number. Please send at least 10 digits.".to_string()
}

pub fn ask_delivery_tier(welcome_back: Option<&str>) -> String {
    let prefix = match welcome_back {
        Some(name) => format!("Welcome back, {name}! "),
        None => String::new(),
    };
    format!(
        "{prefix}How fast do you need it?\n\
         1. Standard (about 48 hours)\n\
         2. Express (about 24 hours, +30% fee)\n\
         Reply 1 or 2."
    )
}

pub fn invalid_delivery_tier() -> String {
    "Please reply 1 for Standard or 2 for Express.".to_string()
}

pub fn ask_service() -> String {
    "Which service would you like?\n\
     1. Wash only\n\
     2. Wash + iron\n\
     3. Dry cleaning (bedsheets, carpets, curtains)\n\
     4. Shoe cleaning\n\
     5. Ironing only\n\
     Reply with a number 1-5."
        .to_string()
}

pub fn invalid_service() -> String {
    "Please pick a service by number, 1 to 5.".to_string()
}

pub fn ask_shoe_quantity() -> String {
    "How many pairs of shoes?".to_string()
}

pub fn ask_textile_type() -> String {
    "What are we dry cleaning?\n\
     1. Bedsheets\n\
     2. Carpets\n\
     3. Curtains\n\
     Reply 1, 2 or 3."
        .to_string()
}

pub fn invalid_textile_type() -> String {
    "Please reply 1 for bedsheets, 2 for carpets or 3 for curtains.".to_string()
}

pub fn ask_textile_quantity(kind: TextileKind) -> String {
    format!("How many {}s?", kind.unit_label())
}

pub fn ask_iron_quantity() -> String {
    "How many pieces should we iron?".to_string()
}

pub fn ask_weight() -> String {
    "Roughly how much laundry is it? Send a weight in kg (e.g. \"3.5\") or item counts (e.g. \"5 shirts, 2 pants\").".to_string()
}

pub fn invalid_weight() -> String {
    "I couldn't work that out. Please send a weight between 0.5 and 100 kg, or item counts like \"5 shirts, 2 pants\".".to_string()
}

pub fn invalid_quantity() -> String {
    "Please send a count of at least 1, e.g. \"3\".".to_string()
}

pub fn ask_pickup_mode(estimated_total: Option<Decimal>) -> String {
    let prefix = match estimated_total {
        Some(total) => format!("That comes to an estimated ₹{total}. "),
        None => String::new(),
    };
    format!(
        "{prefix}How should we collect it?\n\
         1. I'll drop it off myself\n\
         2. Pick it up from my home\n\
         Reply 1 or 2."
    )
}

pub fn invalid_pickup_mode() -> String {
    "Please reply 1 for self drop-off or 2 for home pickup.".to_string()
}

pub fn ask_home_address() -> String {
    "Where should we pick it up from? Send the full pickup address.".to_string()
}

pub fn ask_pickup_window() -> String {
    "When suits you for pickup? e.g. \"17 Feb 11am\".".to_string()
}

pub fn ask_delivery_window() -> String {
    "And when should we deliver it back? e.g. \"19 Feb 6pm\".".to_string()
}

pub fn ask_instructions() -> String {
    "Any special instructions (delicates, stain notes)? Reply \"no\" to skip.".to_string()
}

pub fn ask_payment(estimated_total: Option<Decimal>) -> String {
    let prefix = match estimated_total {
        Some(total) => format!("Your estimated total is ₹{total}. "),
        None => String::new(),
    };
    format!(
        "{prefix}How would you like to pay?\n\
         1. Cash on delivery\n\
         2. UPI\n\
         3. Card\n\
         Reply 1, 2 or 3."
    )
}

pub fn invalid_payment() -> String {
    "Please reply 1 for cash on delivery, 2 for UPI or 3 for card.".to_string()
}

#[allow(clippy::too_many_arguments)]
pub fn order_confirmed(
    order_number: &OrderNumber,
    total: Decimal,
    express_fee: Decimal,
    tier: DeliveryTier,
    weight_kg: Decimal,
    weight_note: Option<&str>,
    outlet_name: &str,
    outlet_note: Option<&str>,
) -> String {
    let mut lines = vec![
        "Your order is confirmed! 🎉".to_string(),
        format!("Order number: {order_number}"),
        match weight_note {
            Some(note) => format!("Weight: {weight_kg} kg ({note})"),
            None => format!("Weight: {weight_kg} kg"),
        },
        format!("Total: ₹{total}"),
    ];
    if express_fee > Decimal::ZERO {
        lines.push(format!("(includes ₹{express_fee} express fee)"));
    }
    lines.push(format!("Expected back in about {} hours.", tier.expected_hours()));
    lines.push(format!("Serving outlet: {outlet_name}"));
    if let Some(note) = outlet_note {
        lines.push(note.to_string());
    }
    lines.push(
        "Keep the order number to track it any time. How was the booking experience? Rate 1-5, or \"skip\".".to_string(),
    );
    lines.join("\n")
}

pub fn rating_thanks(stars: u8) -> String {
    format!("Thanks for the {stars}-star rating! See you next time.")
}

pub fn rating_skipped() -> String {
    "No problem. Send \"book\" any time you need us.".to_string()
}

pub fn order_status(summary: &OrderSummary) -> String {
    let mut lines = vec![
        format!("Order {}", summary.order_number),
        format!("Status: {}", summary.status),
        format!("Services: {}", summary.services.join(", ")),
        format!("Total: ₹{}", summary.total_price),
        format!("Outlet: {}", summary.outlet_name),
    ];
    if let Some(at) = summary.delivery_time {
        lines.push(format!("Expected delivery: {}", at.format("%d %b %Y, %H:%M UTC")));
    }
    lines.join("\n")
}

pub fn order_not_found(number: &OrderNumber) -> String {
    format!("I couldn't find an order {number}. Please check the code and try again.")
}

pub fn ask_for_order_number() -> String {
    "Sure, which order? Send the order number, e.g. ORD-1A2B3C4D.".to_string()
}

pub fn recent_orders(summaries: &[OrderSummary]) -> String {
    let mut lines = vec!["Your recent orders:".to_string()];
    for summary in summaries {
        lines.push(format!(
            "- {} · {} · ₹{}",
            summary.order_number, summary.status, summary.total_price
        ));
    }
    lines.push("Send an order number to see its details.".to_string());
    lines.join("\n")
}

pub fn no_orders_yet() -> String {
    "You don't have any orders with us yet. Send \"book\" to schedule your first pickup!"
        .to_string()
}

pub fn recent_questions(exchanges: &[&Exchange]) -> String {
    let mut lines = vec!["You recently asked:".to_string()];
    for exchange in exchanges {
        lines.push(format!("- {}", exchange.question));
    }
    lines.join("\n")
}

pub fn no_recent_questions() -> String {
    "You haven't asked me anything yet in this chat.".to_string()
}

pub fn question_fallback() -> String {
    "I'm not sure about that one. I can book a pickup (\"book\"), track an order (\"track ORD-XXXXXXXX\"), or answer questions about pricing and delivery times.".to_string()
}

pub fn booking_cancelled() -> String {
    "Okay, I've cancelled that. Send \"book\" whenever you're ready.".to_string()
}

pub fn setup_problem() -> String {
    "Our booking system is still being set up. Please try again a little later.".to_string()
}

pub fn temporarily_unavailable() -> String {
    "Sorry, I'm having trouble reaching our systems right now. Please try again in a few minutes."
        .to_string()
}

pub fn integration_problem() -> String {
    "Something went wrong on our side. Please try again shortly.".to_string()
}

pub fn no_outlets_available() -> String {
    "All our outlets are temporarily closed, so I can't confirm the booking right now. Please try again later.".to_string()
}
