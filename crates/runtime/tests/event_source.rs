//! EventSource against a local axum server speaking text/event-stream

use std::net::SocketAddr;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use binder_runtime::{EventSource, RuntimeError};

const BUILD_STREAM: &str = "\
: keep-alive\n\
data: {\"phase\":\"waiting\",\"message\":\"queued\"}\n\
\n\
data: {\"phase\":\"building\"}\n\
\n\
data: {\"phase\":\"ready\",\"url\":\"http://hub/user/a/\",\"token\":\"T\"}\n\
\n";

async fn build_stream() -> impl IntoResponse {
	([(header::CONTENT_TYPE, "text/event-stream")], BUILD_STREAM)
}

async fn plain_text() -> impl IntoResponse {
	([(header::CONTENT_TYPE, "text/plain")], "data: nope\n\n")
}

async fn missing() -> impl IntoResponse {
	(StatusCode::NOT_FOUND, "no such build")
}

async fn serve() -> SocketAddr {
	let app = Router::new()
		.route("/build/gh/org/repo/main", get(build_stream))
		.route("/plain", get(plain_text))
		.route("/missing", get(missing));
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	addr
}

#[tokio::test]
async fn reads_events_then_reports_stream_end() -> anyhow::Result<()> {
	let addr = serve().await;
	let client = reqwest::Client::new();
	let mut source = EventSource::open(&client, &format!("http://{addr}/build/gh/org/repo/main")).await?;

	let mut data = Vec::new();
	while let Some(event) = source.next_event().await {
		match event {
			Ok(event) => data.push(event.data),
			Err(RuntimeError::StreamEnded { .. }) => break,
			Err(other) => anyhow::bail!("unexpected error: {other}"),
		}
	}

	assert_eq!(data.len(), 3);
	assert!(data[0].contains("waiting"));
	assert!(data[2].contains("\"token\":\"T\""));
	Ok(())
}

#[tokio::test]
async fn rejects_non_event_stream_content() {
	let addr = serve().await;
	let client = reqwest::Client::new();
	let err = EventSource::open(&client, &format!("http://{addr}/plain")).await.err().unwrap();
	assert!(matches!(err, RuntimeError::ContentType { .. }));
}

#[tokio::test]
async fn rejects_error_status() {
	let addr = serve().await;
	let client = reqwest::Client::new();
	let err = EventSource::open(&client, &format!("http://{addr}/missing")).await.err().unwrap();
	assert!(matches!(err, RuntimeError::Status { status: 404, .. }));
}
