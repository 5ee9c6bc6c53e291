//! Websocket channel used for the live session connection.
//!
//! The channel only owns the socket. Message framing on top of it belongs to
//! whoever holds the channel after the handshake.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Result, RuntimeError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Payload frame received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	Text(String),
	Binary(Vec<u8>),
}

/// Open websocket connection split into its write and read halves.
pub struct WebSocketChannel {
	url: Url,
	sink: SplitSink<Socket, Message>,
	stream: SplitStream<Socket>,
}

impl WebSocketChannel {
	/// Connects to a `ws://` or `wss://` address.
	pub async fn connect(url: &Url) -> Result<Self> {
		match url.scheme() {
			"ws" | "wss" => {}
			other => return Err(RuntimeError::invalid_url(url.as_str(), format!("expected ws or wss, got {other}"))),
		}

		let (socket, response) = connect_async(url.as_str()).await?;
		debug!(target = "binder.runtime", url = %redacted(url), status = response.status().as_u16(), "websocket connected");

		let (sink, stream) = socket.split();
		Ok(Self {
			url: url.clone(),
			sink,
			stream,
		})
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
		let text: String = text.into();
		self.sink.send(Message::Text(text.into())).await?;
		Ok(())
	}

	pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<()> {
		self.sink.send(Message::Binary(bytes.into())).await?;
		Ok(())
	}

	pub async fn send_json(&mut self, value: &Value) -> Result<()> {
		self.send_text(serde_json::to_string(value)?).await
	}

	/// Next text or binary frame; `None` once the peer closes.
	///
	/// Ping/pong and raw frames are handled by the socket and skipped here.
	pub async fn recv(&mut self) -> Option<Result<Frame>> {
		while let Some(message) = self.stream.next().await {
			match message {
				Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.to_string()))),
				Ok(Message::Binary(bytes)) => return Some(Ok(Frame::Binary(bytes.to_vec()))),
				Ok(Message::Close(frame)) => {
					debug!(target = "binder.runtime", ?frame, "websocket closed by peer");
					return None;
				}
				Ok(other) => trace!(target = "binder.runtime", ?other, "skipping control frame"),
				Err(err) => return Some(Err(err.into())),
			}
		}
		None
	}

	/// Next frame parsed as JSON text.
	pub async fn recv_json(&mut self) -> Option<Result<Value>> {
		Some(self.recv().await?.and_then(|frame| match frame {
			Frame::Text(text) => serde_json::from_str(&text).map_err(RuntimeError::from),
			Frame::Binary(bytes) => serde_json::from_slice(&bytes).map_err(RuntimeError::from),
		}))
	}

	pub async fn close(mut self) -> Result<()> {
		self.sink.close().await?;
		Ok(())
	}
}

/// Address with its query removed, for logging.
fn redacted(url: &Url) -> Url {
	let mut url = url.clone();
	url.set_query(None);
	url
}
