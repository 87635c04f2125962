//! Intent event feed
//!
//! WebSocket subscription to the node's event stream. Messages are JSON
//! envelopes `{"event": {"name": ..., ...}}`; intent-added events carry the
//! base64 payload and the decoded action list needed to derive the resource
//! profile. Everything else is forwarded as an ignored event. Malformed
//! messages are logged and dropped at this boundary.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{error, info, warn};

use crate::intent::ActionData;

/// Event name the node emits when an intent was admitted to its pool.
pub const INTENT_ADDED_EVENT: &str = "intent_added";

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    event: EventBody,
}

#[derive(Debug, Deserialize)]
struct EventBody {
    name: String,
    /// Base64 intent payload, present on intent-added events
    #[serde(default)]
    intent: Option<String>,
    /// Decoded actions, present on intent-added events
    #[serde(default)]
    actions: Vec<ActionData>,
}

/// A notification decoded from the feed.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A new intent was admitted to the node's intent pool.
    IntentAdded {
        /// Raw intent payload bytes
        payload: Vec<u8>,
        /// Decoded actions, input to profile extraction
        actions: Vec<ActionData>,
    },
    /// Any other event; observed and discarded by the solver.
    Ignored {
        /// Event name as delivered
        name: String,
    },
}

/// Parse one feed message into a typed event.
pub fn parse_event(text: &str) -> Result<NodeEvent> {
    let envelope: EventEnvelope =
        serde_json::from_str(text).context("Failed to parse event envelope")?;

    if envelope.event.name != INTENT_ADDED_EVENT {
        return Ok(NodeEvent::Ignored {
            name: envelope.event.name,
        });
    }

    let encoded = envelope
        .event
        .intent
        .context("Intent-added event is missing the intent payload")?;
    let payload = STANDARD
        .decode(encoded.as_bytes())
        .context("Intent payload is not valid base64")?;

    Ok(NodeEvent::IntentAdded {
        payload,
        actions: envelope.event.actions,
    })
}

/// WebSocket feed task.
///
/// Forwards parsed events into the solver's channel and reconnects with a
/// delay when the connection drops. Stops when the receiving side of the
/// channel is gone.
pub struct EventFeed {
    url: String,
    reconnect_delay: Duration,
}

impl EventFeed {
    /// Create a feed for the given WebSocket URL.
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
        }
    }

    /// Run the feed until the event channel closes.
    pub async fn run(self, events: mpsc::Sender<NodeEvent>) -> Result<()> {
        loop {
            match connect_async(&self.url).await {
                Ok((ws_stream, _)) => {
                    info!("Connected to event stream: {}", self.url);
                    let (_, mut read) = ws_stream.split();

                    while let Some(message) = read.next().await {
                        match message {
                            Ok(Message::Text(text)) => match parse_event(&text) {
                                Ok(event) => {
                                    if events.send(event).await.is_err() {
                                        info!("Event channel closed, stopping feed");
                                        return Ok(());
                                    }
                                }
                                Err(e) => {
                                    warn!("Dropping malformed event: {:#}", e);
                                }
                            },
                            Ok(Message::Close(_)) => {
                                warn!("Event stream closed by node");
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                error!("Event stream error: {}", e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Event stream connection error: {}", e);
                }
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }
    }
}
