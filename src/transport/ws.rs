// src/transport/ws.rs

use futures::{SinkExt, StreamExt};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::errors::{GatewayError, Result};
use crate::models::GraphQLRequest;
use crate::transport::{EventStream, SubscriptionTransport};

pub const PROTOCOL: &str = "graphql-transport-ws";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Deserialize, Debug)]
struct ServerFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

/// GraphQL subscriptions over a WebSocket using the `graphql-transport-ws`
/// sub-protocol. Each subscription gets its own connection.
#[derive(Debug, Clone)]
pub struct WsTransport {
    endpoint: String,
}

impl WsTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    async fn connect(&self) -> Result<Socket> {
        let mut request = self.endpoint.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(PROTOCOL));

        let (mut socket, _) = connect_async(request).await?;
        send_frame(&mut socket, json!({"type": "connection_init", "payload": {}})).await?;

        while let Some(message) = socket.next().await {
            match message? {
                Message::Text(text) => {
                    let frame: ServerFrame = serde_json::from_str(&text)?;
                    match frame.kind.as_str() {
                        "connection_ack" => return Ok(socket),
                        "ping" => send_frame(&mut socket, json!({"type": "pong"})).await?,
                        "pong" => {}
                        other => {
                            return Err(GatewayError::Protocol(format!(
                                "expected connection_ack, got '{}'",
                                other
                            )));
                        }
                    }
                }
                Message::Ping(data) => socket.send(Message::Pong(data)).await?,
                Message::Close(_) => break,
                _ => {}
            }
        }

        Err(GatewayError::Protocol(
            "connection closed before connection_ack".to_string(),
        ))
    }
}

impl SubscriptionTransport for WsTransport {
    async fn subscribe(&self, request: GraphQLRequest) -> Result<EventStream> {
        let mut socket = self.connect().await?;
        let id = Uuid::new_v4().to_string();

        info!("📡 Subscribing {} on {}", id, self.endpoint);

        send_frame(
            &mut socket,
            json!({"id": id, "type": "subscribe", "payload": request}),
        )
        .await?;

        let events = futures::stream::unfold(Some((socket, id)), |state| async move {
            let (mut socket, id) = state?;
            match next_event(&mut socket, &id).await {
                Ok(Some(payload)) => Some((Ok(payload), Some((socket, id)))),
                Ok(None) => {
                    debug!("Subscription {} completed", id);
                    None
                }
                Err(e) => Some((Err(e), None)),
            }
        });

        Ok(events.boxed())
    }
}

async fn send_frame(socket: &mut Socket, frame: Value) -> Result<()> {
    socket.send(Message::Text(frame.to_string())).await?;
    Ok(())
}

/// Waits for the next `next` payload of subscription `id`.
/// `Ok(None)` means the server completed the subscription or hung up.
async fn next_event(socket: &mut Socket, id: &str) -> Result<Option<Value>> {
    while let Some(message) = socket.next().await {
        match message? {
            Message::Text(text) => {
                let frame: ServerFrame = serde_json::from_str(&text)?;
                if frame.id.as_deref().is_some_and(|frame_id| frame_id != id) {
                    continue;
                }
                match frame.kind.as_str() {
                    "next" => return Ok(Some(frame.payload.unwrap_or(Value::Null))),
                    "error" => {
                        let payload = frame.payload.unwrap_or(Value::Null);
                        return Err(GatewayError::Subscription(payload.to_string()));
                    }
                    "complete" => return Ok(None),
                    "ping" => send_frame(socket, json!({"type": "pong"})).await?,
                    other => debug!("Ignoring '{}' frame", other),
                }
            }
            Message::Ping(data) => socket.send(Message::Pong(data)).await?,
            Message::Close(_) => return Ok(None),
            _ => {}
        }
    }
    Ok(None)
}
