//! Telegram interface for laundryops.
//!
//! The bot speaks the Bot API over HTTPS long polling (no public URL needed):
//!
//! - **Updates** (`update`) - the minimal `getUpdates`/`sendMessage` payloads
//! - **Poller** (`poller`) - the long-poll loop with reconnection logic
//!
//! # Key Types
//!
//! - `LongPollRunner` - the poll loop; retries with backoff, never crashes the process
//! - `TelegramTransport` - seam between the loop and the wire (`HttpTransport`, `NoopTransport`)
//! - `MessageHandler` - where inbound texts go; implemented by the booking engine

pub mod poller;
pub mod update;

pub use poller::{
    HttpTransport, LongPollRunner, MessageHandler, NoopTransport, ReconnectPolicy,
    TelegramTransport, TransportError,
};
pub use update::Update;
