//! Real-time messaging connection manager.
//!
//! Runs as its own task: opens the RTM websocket, announces the bot identity and
//! joined conversations, forwards message frames as [`BotEvent`]s, keeps the socket
//! alive with pings and reconnects when it drops. It never touches standup state.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use super::client::SlackClient;
use crate::core::models::{BotEvent, MessageRecord};
use crate::errors::SlackError;

pub const EVENT_QUEUE_CAPACITY: usize = 256;
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// What a single RTM text frame means to the connection loop.
#[derive(Debug)]
pub enum RtmFrame {
    Event(BotEvent),
    /// Slack is about to close the socket; open a new one.
    Goodbye,
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RtmMessageFrame {
    #[serde(default)]
    channel: Option<String>,
    #[serde(flatten)]
    message: MessageRecord,
}

/// Decodes one RTM text frame.
///
/// # Errors
///
/// Returns `ParseError` for frames that are not JSON objects with a usable shape.
pub fn decode_frame(text: &str) -> Result<RtmFrame, SlackError> {
    let value: Value = serde_json::from_str(text)?;
    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        // Replies to our own sends carry `reply_to` and no type.
        return Ok(RtmFrame::Ignored);
    };

    match kind {
        "message" => {
            let frame: RtmMessageFrame = serde_json::from_value(value)?;
            Ok(RtmFrame::Event(BotEvent::Message {
                channel: frame.channel.unwrap_or_default(),
                message: frame.message,
            }))
        }
        "error" => {
            let detail = value
                .get("error")
                .and_then(|e| e.get("msg"))
                .and_then(Value::as_str)
                .unwrap_or("unknown RTM error");
            Ok(RtmFrame::Event(BotEvent::TransportError(detail.to_string())))
        }
        "goodbye" => Ok(RtmFrame::Goodbye),
        _ => Ok(RtmFrame::Ignored),
    }
}

/// Owns the websocket lifecycle and feeds the dispatcher queue.
pub struct ConnectionManager {
    client: SlackClient,
    events: mpsc::Sender<BotEvent>,
    reconnect_delay: Duration,
    next_ping_id: u64,
    announced: bool,
}

/// Starts the connection manager on its own task and returns the event queue it feeds.
#[must_use]
pub fn spawn_connection_manager(
    client: SlackClient,
    reconnect_delay: Duration,
) -> (mpsc::Receiver<BotEvent>, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let manager = ConnectionManager::new(client, sender, reconnect_delay);
    (receiver, tokio::spawn(manager.run()))
}

impl ConnectionManager {
    #[must_use]
    pub fn new(
        client: SlackClient,
        events: mpsc::Sender<BotEvent>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            client,
            events,
            reconnect_delay,
            next_ping_id: 1,
            announced: false,
        }
    }

    /// Whether the session being opened still has to announce the identity and
    /// conversations. Only the first successful session does; the dispatcher keeps
    /// its state across reconnects.
    fn needs_announcement(&self) -> bool {
        !self.announced
    }

    /// Keeps a session open until the token is rejected or the dispatcher goes away.
    pub async fn run(mut self) {
        loop {
            match self.run_session().await {
                Ok(()) => info!("RTM connection closed, reconnecting"),
                Err(e) if e.is_fatal() => {
                    error!("Slack rejected the bot token: {}", e);
                    let _ = self.events.send(BotEvent::InvalidAuth(e.to_string())).await;
                    return;
                }
                Err(e) => {
                    warn!("RTM session ended with error: {}", e);
                    if self
                        .events
                        .send(BotEvent::TransportError(e.to_string()))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }

            if self.events.is_closed() {
                debug!("Event queue closed, stopping connection manager");
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn run_session(&mut self) -> Result<(), SlackError> {
        let session = self.client.rtm_connect().await?;
        let (stream, _response) = connect_async(session.url.as_str()).await?;
        info!(
            "RTM socket open for {} ({}) in team {}",
            session.identity.name, session.identity.id, session.identity.team_name
        );

        if self.needs_announcement() {
            let conversations = self
                .client
                .list_member_conversations()
                .await?
                .into_iter()
                .map(|summary| self.client.conversation(summary))
                .collect();
            self.emit(BotEvent::Connected {
                identity: session.identity,
                conversations,
            })
            .await?;
            self.announced = true;
        } else {
            debug!("RTM session resumed, keeping existing standups");
        }

        let (mut sink, mut source) = stream.split();
        let mut keepalive = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);

        loop {
            tokio::select! {
                frame = source.next() => {
                    let Some(frame) = frame else {
                        return Ok(());
                    };
                    match frame? {
                        WsMessage::Text(text) => match decode_frame(&text) {
                            Ok(RtmFrame::Event(event)) => self.emit(event).await?,
                            Ok(RtmFrame::Goodbye) => return Ok(()),
                            Ok(RtmFrame::Ignored) => {}
                            Err(e) => warn!("Dropping malformed RTM frame: {}", e),
                        },
                        WsMessage::Close(_) => return Ok(()),
                        _ => {}
                    }
                }
                _ = keepalive.tick() => {
                    let ping = json!({ "id": self.next_ping_id, "type": "ping" }).to_string();
                    self.next_ping_id += 1;
                    sink.send(WsMessage::Text(ping.into())).await?;
                }
            }
        }
    }

    async fn emit(&self, event: BotEvent) -> Result<(), SlackError> {
        self.events
            .send(event)
            .await
            .map_err(|_| SlackError::GeneralError("event queue closed".to_string()))
    }
}
