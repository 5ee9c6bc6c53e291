//! Top-level bootstrap: provision, materialize, connect.

use std::sync::Arc;

use binder_protocol::LaunchPhase;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::BootstrapConfig;
use crate::error::{Error, Result};
use crate::handshake::{HandshakeOutcome, HandshakeSupervisor, LiveConnector, Navigator};
use crate::materialize::{DocumentMaterializer, DocumentOpenResult};
use crate::params::LaunchParams;
use crate::phase::{PhaseTracker, StateSink, StateUpdate};
use crate::provision::{ProvisionClient, build_stream_url};
use crate::session::{SessionHandle, ShutdownHook};
use crate::telemetry::count_stat;

/// Notice surfaced through [`StateSink::alert`] for every failed bootstrap.
pub const FAILURE_NOTICE: &str = "Something went wrong!\n\nWe failed to initialize the binder connection. \
	Please try again with a different browser, or come back later.";

/// Successful bootstrap.
#[derive(Debug)]
pub struct Launch<C> {
	pub session: SessionHandle,
	pub document: DocumentOpenResult,
	pub connection: HandshakeOutcome<C>,
	pub shutdown: ShutdownHook,
}

/// Failed bootstrap. `shutdown` is set when a session had already been
/// provisioned; it is left running.
#[derive(Debug, Error)]
#[error("binder launch failed: {error}")]
pub struct LaunchFailure {
	#[source]
	pub error: Error,
	pub shutdown: Option<ShutdownHook>,
}

/// Drives one bootstrap attempt per call.
pub struct Launcher {
	http: reqwest::Client,
	config: BootstrapConfig,
	state: Arc<dyn StateSink>,
	navigator: Arc<dyn Navigator>,
}

impl Launcher {
	pub fn new(config: BootstrapConfig, state: Arc<dyn StateSink>, navigator: Arc<dyn Navigator>) -> Result<Self> {
		let http = reqwest::Client::builder()
			.connect_timeout(config.connect_timeout())
			.build()
			.map_err(Error::Client)?;
		Ok(Self::with_client(http, config, state, navigator))
	}

	pub fn with_client(http: reqwest::Client, config: BootstrapConfig, state: Arc<dyn StateSink>, navigator: Arc<dyn Navigator>) -> Self {
		Self {
			http,
			config,
			state,
			navigator,
		}
	}

	pub fn config(&self) -> &BootstrapConfig {
		&self.config
	}

	pub fn http(&self) -> &reqwest::Client {
		&self.http
	}

	/// Runs a full bootstrap for `params`.
	///
	/// Any failure is logged and surfaced once as [`FAILURE_NOTICE`]; nothing
	/// is rolled back.
	pub async fn bootstrap<C>(&self, params: &LaunchParams, connector: &C) -> std::result::Result<Launch<C::Connection>, LaunchFailure>
	where
		C: LiveConnector + ?Sized,
	{
		if let Some(beacon) = self.config.telemetry_url.as_deref() {
			count_stat(&self.http, beacon, "binder-start");
		}

		let tracker = PhaseTracker::new(self.state.as_ref());
		let mut shutdown = None;

		match self.run(params, connector, &tracker, &mut shutdown).await {
			Ok(launch) => Ok(launch),
			Err(err) => {
				error!(target = "binder.launch", error = %err, phase = %tracker.current(), "failed to initialize binder");
				self.state.alert(FAILURE_NOTICE).await;
				Err(LaunchFailure { error: err, shutdown })
			}
		}
	}

	async fn run<C>(
		&self,
		params: &LaunchParams,
		connector: &C,
		tracker: &PhaseTracker<'_>,
		shutdown_slot: &mut Option<ShutdownHook>,
	) -> Result<Launch<C::Connection>>
	where
		C: LiveConnector + ?Sized,
	{
		tracker.advance(LaunchPhase::Requesting).await?;

		let session = self.provision(&params.binder_url).await?;
		info!(target = "binder.launch", url = %session.session_url(), "binder session created");

		let shutdown = ShutdownHook::new(self.http.clone(), &session);
		*shutdown_slot = Some(shutdown.clone());

		tracker
			.publish(StateUpdate::phase(LaunchPhase::Created).with_session(session.clone()))
			.await?;

		let document = DocumentMaterializer::new(&self.http, self.config.open_fallback)
			.materialize(&session, params)
			.await?;

		tracker
			.publish(StateUpdate::phase(LaunchPhase::NotebookRunning).with_document_id(document.document_id.clone()))
			.await?;

		let connection = HandshakeSupervisor::new(self.config.handshake_timeout())
			.upgrade(&session, &document.document_id, connector, self.navigator.as_ref())
			.await;

		if connection.is_live() {
			if let Err(err) = tracker.advance(LaunchPhase::Ready).await {
				warn!(target = "binder.launch", error = %err, "live connection established but the ready phase was not recorded");
			}
		}

		Ok(Launch {
			session,
			document,
			connection,
			shutdown,
		})
	}

	async fn provision(&self, binder_url: &str) -> Result<SessionHandle> {
		let client = ProvisionClient::new(self.http.clone()).with_log_repeated_messages(self.config.log_repeated_messages);
		client
			.request_session_within(&build_stream_url(binder_url), self.config.provision_timeout())
			.await
	}
}
