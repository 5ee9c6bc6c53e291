//! Launch orchestration for live notebook sessions on Binder.
//!
//! A static notebook page has no compute behind it. [`Launcher::bootstrap`]
//! acquires a fresh Binder session, gets the notebook loaded into the Pluto
//! server running there, and upgrades the page to a live connection:
//!
//! 1. [`provision`] watches the build service's event stream until the session is ready
//! 2. [`materialize`] uploads or opens the notebook through the session's REST API
//! 3. [`handshake`] connects to the session, or navigates there when that takes too long
//!
//! Progress is published through [`phase::PhaseTracker`] into a caller-supplied
//! [`StateSink`].

pub mod config;
pub mod error;
pub mod fake;
pub mod handshake;
pub mod inline;
pub mod launcher;
pub mod materialize;
pub mod params;
pub mod phase;
pub mod provision;
pub mod session;
pub mod telemetry;

pub use binder_protocol::{LaunchPhase, ProvisionEvent, ProvisionPhase};
pub use config::BootstrapConfig;
pub use error::{Error, Result};
pub use handshake::{HandshakeOutcome, HandshakeSupervisor, LiveConnector, Navigator, WebSocketConnector};
pub use launcher::{FAILURE_NOTICE, Launch, LaunchFailure, Launcher};
pub use materialize::{DocumentMaterializer, DocumentOpenResult, OpenCandidate, OpenFallbackPolicy, OpenOutcome};
pub use params::LaunchParams;
pub use phase::{PhaseTracker, StateSink, StateUpdate};
pub use provision::ProvisionClient;
pub use session::{SessionHandle, ShutdownHook};
