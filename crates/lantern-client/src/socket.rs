//! WebSocket push channel.
//!
//! The socket splits into a write half ([`WsConnection`], which the
//! transport owns for outbound stream requests) and a read half
//! ([`WsEvents`], which the app drives to pull inbound frames). Frames
//! are JSON text envelopes tagged by `event`.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use lantern_core::wire::{StreamEvent, StreamRequest};
use lantern_engine::{EngineError, PushConnection};

use crate::error::{ClientError, Result};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect to the streaming endpoint and split the socket.
pub async fn connect(url: &str) -> Result<(WsConnection, WsEvents)> {
    let (socket, _) = tokio_tungstenite::connect_async(url).await?;
    info!(url, "Stream socket connected");
    let (sink, stream) = socket.split();
    Ok((WsConnection { sink }, WsEvents { stream }))
}

/// Write half of the push channel.
pub struct WsConnection {
    sink: SplitSink<Socket, Message>,
}

#[async_trait]
impl PushConnection for WsConnection {
    async fn send(&mut self, request: &StreamRequest) -> std::result::Result<(), EngineError> {
        let payload =
            serde_json::to_string(request).map_err(|err| EngineError::Transport(err.to_string()))?;
        self.sink
            .send(Message::Text(payload))
            .await
            .map_err(|err| EngineError::Transport(err.to_string()))
    }

    async fn close(&mut self) {
        if let Err(err) = self.sink.send(Message::Close(None)).await {
            debug!(error = %err, "Close frame not delivered");
        }
    }
}

/// Read half of the push channel.
pub struct WsEvents {
    stream: SplitStream<Socket>,
}

impl WsEvents {
    /// Next stream event, skipping non-text frames.
    ///
    /// Returns `None` once the socket closes. A text frame that does not
    /// parse as a known event is an error; callers decide whether to
    /// drop it or tear down.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        loop {
            let frame = match self.stream.next().await? {
                Ok(frame) => frame,
                Err(err) => return Some(Err(err.into())),
            };
            match frame {
                Message::Text(text) => return Some(parse_event(&text)),
                Message::Close(_) => {
                    info!("Stream socket closed by server");
                    return None;
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => {
                    warn!(frame = ?other, "Ignoring unexpected frame type");
                    continue;
                }
            }
        }
    }
}

fn parse_event(text: &str) -> Result<StreamEvent> {
    serde_json::from_str(text).map_err(|err| {
        ClientError::MalformedFrame(format!("{}: {}", err, truncate(text, 120)))
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
