//! Built-in behavior modules.
//!
//! Two modules ship with the crate: a keepalive prober that answers server
//! PINGs and measures round-trip latency, and a CTCP responder for the
//! common client-to-client queries. Both are ordinary [`crate::bot::Bot`]
//! implementations with no privileged access to the core.

mod ctcp;
mod pinger;

pub use ctcp::CtcpResponder;
pub use pinger::{LatencyProbe, Pinger};
