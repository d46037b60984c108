//! Websocket transport to the assistant, on `gloo-net`.
//!
//! The socket is split after the handshake. Outbound text goes through an
//! unbounded channel drained by a local task into the sink half; the stream
//! half becomes the connection's inbound frames, terminated by a close notice.

use std::pin::Pin;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{stream, Sink, SinkExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message, State, WebSocketError};
use wasm_bindgen_futures::spawn_local;

use chat_core::ports::{AssistantTransport, InboundStream, LinkConnection, LinkFrame};
use chat_types::{ChatError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl AssistantTransport for WsTransport {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn LinkConnection>> {
        let mut ws = WebSocket::open(endpoint)
            .map_err(|e| ChatError::Network(format!("{}: {}", endpoint, e)))?;

        // The sink becomes ready once the socket leaves CONNECTING
        futures::future::poll_fn(|cx| Pin::new(&mut ws).poll_ready(cx))
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        if !matches!(ws.state(), State::Open) {
            return Err(ChatError::Network(format!(
                "Handshake with {} failed",
                endpoint
            )));
        }

        let (mut sink, source) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded::<String>();

        spawn_local(async move {
            while let Some(text) = outbound_rx.next().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    log::warn!("WebSocket send failed: {}", e);
                    break;
                }
            }
            // Channel closed from our side, or the socket went away
            let _ = sink.close().await;
        });

        let inbound = source
            .map(|msg| match msg {
                Ok(Message::Text(text)) => LinkFrame::Text(text),
                Ok(Message::Bytes(bytes)) => {
                    LinkFrame::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                Err(WebSocketError::ConnectionClose(ev)) => LinkFrame::Closed {
                    reason: Some(format!("code {} {}", ev.code, ev.reason).trim().to_string()),
                },
                Err(e) => LinkFrame::Closed {
                    reason: Some(e.to_string()),
                },
            })
            .chain(stream::once(async { LinkFrame::Closed { reason: None } }));

        Ok(Box::new(WsConnection {
            outbound,
            inbound: Some(Box::pin(inbound)),
        }))
    }
}

pub struct WsConnection {
    outbound: mpsc::UnboundedSender<String>,
    inbound: Option<InboundStream>,
}

impl LinkConnection for WsConnection {
    fn send(&self, text: &str) -> Result<()> {
        self.outbound
            .unbounded_send(text.to_string())
            .map_err(|_| ChatError::NotConnected)
    }

    fn take_inbound(&mut self) -> Option<InboundStream> {
        self.inbound.take()
    }

    fn close(&mut self) {
        self.outbound.close_channel();
    }
}
