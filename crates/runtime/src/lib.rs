//! Transport plumbing shared by the launch orchestration.
//!
//! * [`event_stream`] - `text/event-stream` decoding and a pull-based client
//! * [`websocket`] - bidirectional channel used for the live connection
//! * [`url_tools`] - query, trailing-slash, and websocket address helpers

pub mod error;
pub mod event_stream;
pub mod url_tools;
pub mod websocket;

pub use error::{Result, RuntimeError};
pub use event_stream::{EventSource, EventStreamDecoder, ServerEvent};
pub use websocket::{Frame, WebSocketChannel};
