//! Subcommands against a local axum server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use binder::BootstrapConfig;
use binder_cli::cli::{Cli, Commands};
use binder_cli::commands::{dispatch, provision};
use binder_cli::error::CliError;
use clap::Parser;

#[derive(Clone, Default)]
struct Counters {
	shutdowns: Arc<AtomicUsize>,
}

async fn build_failed() -> impl IntoResponse {
	(
		[(header::CONTENT_TYPE, "text/event-stream")],
		"data: {\"phase\":\"failed\",\"message\":\"no such repo\"}\n\n",
	)
}

async fn build_ready() -> impl IntoResponse {
	(
		[(header::CONTENT_TYPE, "text/event-stream")],
		"data: {\"phase\":\"ready\",\"url\":\"http://127.0.0.1:9/user/a/\",\"token\":\"T\"}\n\n",
	)
}

async fn shutdown(State(counters): State<Counters>) -> impl IntoResponse {
	counters.shutdowns.fetch_add(1, Ordering::SeqCst);
	StatusCode::OK
}

async fn serve() -> (SocketAddr, Counters) {
	let counters = Counters::default();
	let app = Router::new()
		.route("/build/gh/org/broken/main", get(build_failed))
		.route("/build/gh/org/repo/main", get(build_ready))
		.route("/user/a/api/shutdown", post(shutdown))
		.with_state(counters.clone());
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	(addr, counters)
}

fn command(args: &[&str]) -> Commands {
	let mut argv = vec!["binder"];
	argv.extend_from_slice(args);
	Cli::parse_from(argv).command
}

#[tokio::test]
async fn shutdown_posts_to_the_hosting_server() -> anyhow::Result<()> {
	let (addr, counters) = serve().await;
	let session_url = format!("http://{addr}/user/a/pluto/");

	dispatch(command(&["shutdown", &session_url, "T"]), BootstrapConfig::default()).await?;

	assert_eq!(counters.shutdowns.load(Ordering::SeqCst), 1);
	Ok(())
}

#[tokio::test]
async fn provision_returns_the_ready_session() -> anyhow::Result<()> {
	let (addr, _) = serve().await;
	let binder_url = format!("http://{addr}/build/gh/org/repo/main");

	let session = provision::execute(&binder_url, Some(5_000), &BootstrapConfig::default()).await?;

	assert_eq!(session.session_url().as_str(), "http://127.0.0.1:9/user/a/pluto/");
	assert_eq!(session.token(), "T");
	Ok(())
}

#[tokio::test]
async fn provision_command_reports_failed_build() {
	let (addr, _) = serve().await;
	let binder_url = format!("http://{addr}/build/gh/org/broken/main");

	let err = dispatch(command(&["provision", &binder_url]), BootstrapConfig::default()).await.unwrap_err();
	assert!(matches!(err, CliError::Binder(binder::Error::ProvisioningFailed { .. })));
}

#[tokio::test]
async fn launch_reports_failed_build() {
	let (addr, _) = serve().await;
	let binder_url = format!("http://{addr}/build/gh/org/broken/main");
	let config = BootstrapConfig::default().with_telemetry_url(None);

	let err = dispatch(command(&["launch", &binder_url, "demo.jl"]), config).await.unwrap_err();

	match err {
		CliError::Launch(failure) => {
			assert!(matches!(failure.error, binder::Error::ProvisioningFailed { .. }));
			assert!(failure.shutdown.is_none());
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[tokio::test]
async fn launch_rejects_malformed_page_url() {
	let err = dispatch(
		command(&["launch", "https://mybinder.org/v2/gh/org/repo/main", "demo.jl", "--page-url", "not a url"]),
		BootstrapConfig::default(),
	)
	.await
	.unwrap_err();

	assert!(matches!(err, CliError::InvalidArgument(_)));
}
