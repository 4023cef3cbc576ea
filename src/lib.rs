//! An asynchronous IRC client core for building bots.
//!
//! The crate connects over TCP or TLS, registers, and fans every inbound
//! message out to an ordered list of behavior modules implementing the
//! [`Bot`] trait. The core handles the plumbing a bot author should not
//! have to think about: line framing and the 512-byte frame clamp,
//! prefix synthesis for server-relayed lines, the ISUPPORT capability
//! registry, keepalive, and CTCP replies.
//!
//! ```no_run
//! use ircbot::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::new("irc.example.net", "mybot");
//!     config.channels.push("#home".to_owned());
//!     let mut client = Client::connect(&config).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod bot;
pub mod bots;
pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod ctcp;
pub mod error;
pub mod isupport;
pub mod message;
pub mod transport;

pub use bot::{Bot, MessageKind};
pub use bots::{CtcpResponder, LatencyProbe, Pinger};
pub use client::Client;
pub use config::{Config, ConfigError};
pub use context::{Context, Origin};
pub use ctcp::{Ctcp, CtcpKind};
pub use error::{CapValueError, MessageParseError, ProtocolError};
pub use isupport::Isupport;
pub use message::Message;
pub use transport::{Connection, Transport};
