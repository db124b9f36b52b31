use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, warn};

use laundryops_core::collab::{BookingStore, FaqResponder, OrderDirectory};
use laundryops_core::domain::customer::ConversationId;
use laundryops_core::BookingEngine;

use crate::update::{ApiResponse, GetUpdatesRequest, SendMessageRequest, Update};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport poll failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 500, max_delay_ms: 30_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Long-poll transport seam. `fetch_updates` returning `Ok(None)` means the
/// transport has closed its stream and the runner should stop cleanly.
#[async_trait]
pub trait TelegramTransport: Send + Sync {
    async fn fetch_updates(&self, offset: i64) -> Result<Option<Vec<Update>>, TransportError>;
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;
}

/// Used when no bot token is configured: the runner starts, observes a closed
/// stream, and returns without touching the network.
#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl TelegramTransport for NoopTransport {
    async fn fetch_updates(&self, _offset: i64) -> Result<Option<Vec<Update>>, TransportError> {
        Ok(None)
    }

    async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Bot API transport over HTTPS long polling.
pub struct HttpTransport {
    client: reqwest::Client,
    api_base_url: String,
    bot_token: SecretString,
    poll_timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(
        api_base_url: &str,
        bot_token: SecretString,
        poll_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        // The HTTP timeout must outlast the long-poll window or every idle
        // poll reports a spurious failure.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs.saturating_add(10)))
            .build()
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bot_token,
            poll_timeout_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.bot_token.expose_secret(), method)
    }
}

#[async_trait]
impl TelegramTransport for HttpTransport {
    async fn fetch_updates(&self, offset: i64) -> Result<Option<Vec<Update>>, TransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: &["message"],
        };
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&request)
            .send()
            .await
            .map_err(|error| TransportError::Receive(error.to_string()))?;
        let payload: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|error| TransportError::Receive(error.to_string()))?;
        if !payload.ok {
            return Err(TransportError::Receive(
                payload.description.unwrap_or_else(|| "getUpdates rejected".to_string()),
            ));
        }
        Ok(Some(payload.result.unwrap_or_default()))
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let request = SendMessageRequest { chat_id, text };
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|error| TransportError::Send(error.to_string()))?;
        let payload: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|error| TransportError::Send(error.to_string()))?;
        if !payload.ok {
            return Err(TransportError::Send(
                payload.description.unwrap_or_else(|| "sendMessage rejected".to_string()),
            ));
        }
        Ok(())
    }
}

/// What the poll loop hands each inbound text to.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, chat_id: &ConversationId, text: &str) -> String;
}

#[async_trait]
impl<S, D, F> MessageHandler for BookingEngine<S, D, F>
where
    S: BookingStore,
    D: OrderDirectory,
    F: FaqResponder,
{
    async fn handle_message(&self, chat_id: &ConversationId, text: &str) -> String {
        self.handle(chat_id, text).await
    }
}

pub struct LongPollRunner {
    transport: Arc<dyn TelegramTransport>,
    handler: Arc<dyn MessageHandler>,
    reconnect_policy: ReconnectPolicy,
}

impl LongPollRunner {
    pub fn new(
        transport: Arc<dyn TelegramTransport>,
        handler: Arc<dyn MessageHandler>,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, handler, reconnect_policy }
    }

    /// Polls until the transport closes its stream. Transport failures retry
    /// with exponential backoff; once retries are exhausted the runner returns
    /// without crashing the process. The update offset survives reconnects so
    /// no message is handled twice.
    pub async fn start(&self) -> Result<()> {
        let mut offset = 0_i64;
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.pump(attempt, &mut offset).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "telegram long-poll transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "telegram retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn pump(&self, attempt: u32, offset: &mut i64) -> Result<(), TransportError> {
        info!(attempt, offset, "starting telegram long poll");

        loop {
            let Some(updates) = self.transport.fetch_updates(*offset).await? else {
                info!(attempt, "telegram update stream closed");
                return Ok(());
            };

            for update in updates {
                *offset = update.update_id + 1;

                let Some((chat, text)) = update.inbound_text() else {
                    debug!(
                        event_name = "ingress.telegram.update_skipped",
                        update_id = update.update_id,
                        "update carries no text; skipping"
                    );
                    continue;
                };

                info!(
                    event_name = "ingress.telegram.update_received",
                    update_id = update.update_id,
                    chat_id = chat,
                    "received telegram message"
                );

                let conversation = ConversationId::new(chat.to_string());
                let reply = self.handler.handle_message(&conversation, text).await;

                // A failed delivery must not stall the poll loop; the next
                // message from this chat re-prompts the current step anyway.
                if let Err(error) = self.transport.send_message(chat, &reply).await {
                    warn!(
                        event_name = "egress.telegram.send_failed",
                        update_id = update.update_id,
                        chat_id = chat,
                        error = %error,
                        "failed to deliver reply"
                    );
                } else {
                    debug!(
                        event_name = "egress.telegram.reply_sent",
                        update_id = update.update_id,
                        chat_id = chat,
                        "delivered reply"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use laundryops_core::domain::customer::ConversationId;

    use crate::update::{Chat, Message, Update};

    use super::{
        LongPollRunner, MessageHandler, ReconnectPolicy, TelegramTransport, TransportError,
    };

    fn text_update(update_id: i64, chat: i64, text: &str) -> Update {
        Update {
            update_id,
            message: Some(Message { chat: Chat { id: chat }, text: Some(text.to_string()) }),
        }
    }

    fn sticker_update(update_id: i64, chat: i64) -> Update {
        Update { update_id, message: Some(Message { chat: Chat { id: chat }, text: None }) }
    }

    #[derive(Default)]
    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        fetches: VecDeque<Result<Option<Vec<Update>>, TransportError>>,
        send_results: VecDeque<Result<(), TransportError>>,
        fetch_offsets: Vec<i64>,
        sent: Vec<(i64, String)>,
    }

    impl ScriptedTransport {
        fn with_script(
            fetches: Vec<Result<Option<Vec<Update>>, TransportError>>,
            send_results: Vec<Result<(), TransportError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    fetches: fetches.into(),
                    send_results: send_results.into(),
                    fetch_offsets: Vec::new(),
                    sent: Vec::new(),
                }),
            }
        }

        async fn fetch_offsets(&self) -> Vec<i64> {
            self.state.lock().await.fetch_offsets.clone()
        }

        async fn sent(&self) -> Vec<(i64, String)> {
            self.state.lock().await.sent.clone()
        }
    }

    #[async_trait]
    impl TelegramTransport for ScriptedTransport {
        async fn fetch_updates(
            &self,
            offset: i64,
        ) -> Result<Option<Vec<Update>>, TransportError> {
            let mut state = self.state.lock().await;
            state.fetch_offsets.push(offset);
            state.fetches.pop_front().unwrap_or(Ok(None))
        }

        async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.sent.push((chat_id, text.to_string()));
            state.send_results.pop_front().unwrap_or(Ok(()))
        }
    }

    struct EchoHandler;

    #[async_trait]
    impl MessageHandler for EchoHandler {
        async fn handle_message(&self, chat_id: &ConversationId, text: &str) -> String {
            format!("echo to {}: {text}", chat_id.as_str())
        }
    }

    #[tokio::test]
    async fn replies_to_text_updates_and_advances_the_offset() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Ok(Some(vec![text_update(10, 42, "hi"), sticker_update(11, 42)])),
                Ok(None),
            ],
            vec![],
        ));

        let runner = LongPollRunner::new(
            transport.clone(),
            Arc::new(EchoHandler),
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );
        runner.start().await.expect("runner should stop cleanly");

        assert_eq!(transport.sent().await, vec![(42, "echo to 42: hi".to_string())]);
        // Sticker updates carry no text but still advance the offset.
        assert_eq!(transport.fetch_offsets().await, vec![0, 12]);
    }

    #[tokio::test]
    async fn reconnects_after_a_poll_failure_without_losing_the_offset() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Ok(Some(vec![text_update(20, 7, "book")])),
                Err(TransportError::Receive("network down".to_string())),
                Ok(Some(vec![text_update(21, 7, "Asha")])),
                Ok(None),
            ],
            vec![],
        ));

        let runner = LongPollRunner::new(
            transport.clone(),
            Arc::new(EchoHandler),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );
        runner.start().await.expect("runner should recover");

        assert_eq!(transport.sent().await.len(), 2);
        assert_eq!(transport.fetch_offsets().await, vec![0, 21, 21, 22]);
    }

    #[tokio::test]
    async fn exhausts_retries_without_crashing() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Err(TransportError::Receive("fail-1".to_string())),
                Err(TransportError::Receive("fail-2".to_string())),
                Err(TransportError::Receive("fail-3".to_string())),
            ],
            vec![],
        ));

        let runner = LongPollRunner::new(
            transport.clone(),
            Arc::new(EchoHandler),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );
        runner.start().await.expect("runner should degrade gracefully");

        assert_eq!(transport.fetch_offsets().await.len(), 3);
    }

    #[tokio::test]
    async fn a_failed_delivery_does_not_stall_the_loop() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Ok(Some(vec![text_update(30, 1, "first"), text_update(31, 2, "second")])),
                Ok(None),
            ],
            vec![Err(TransportError::Send("blocked by user".to_string()))],
        ));

        let runner = LongPollRunner::new(
            transport.clone(),
            Arc::new(EchoHandler),
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );
        runner.start().await.expect("runner should continue past a send failure");

        let sent = transport.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].0, 2);
    }
}
