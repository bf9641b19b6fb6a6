//! The voice session state machine.
//!
//! Owns listening/command-capture state, arbitrates every reset trigger
//! through one protocol, renews the recognition session under the
//! platform ceiling without disturbing in-flight captures, and streams
//! command text to the delivery ports.

pub mod controller;
pub mod metrics;
pub mod ports;
pub mod renewal;
pub mod reset;
pub mod shared;

pub use controller::{Collaborators, SessionConfig, SessionController, SessionHandle};
pub use metrics::SessionMetrics;
pub use ports::{AppActivator, Clipboard, PermissionSource, PermissionStatus, SinkError, TextDeliverySink};
pub use renewal::RenewalTimer;
pub use reset::ResetRequest;
pub use shared::SharedState;
