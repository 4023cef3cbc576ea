//! Error types for the bot client core.
//!
//! Protocol-level failures live in [`ProtocolError`]; line parsing failures
//! in [`MessageParseError`]; malformed ISUPPORT values in [`CapValueError`].

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an inbound IRC line.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The invalid line.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },

    /// TLS setup or handshake failure.
    #[error("tls error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// The host name could not be used as a TLS server name.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// An operation required an established connection.
    #[error("not connected")]
    NotConnected,
}

/// Errors encountered when parsing an inbound IRC line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty.
    #[error("empty line")]
    EmptyLine,

    /// Line did not carry a prefix.
    ///
    /// The connection layer synthesizes a prefix for server-relayed lines,
    /// so the parser always expects one.
    #[error("missing prefix")]
    MissingPrefix,

    /// No command token after the prefix.
    #[error("missing command")]
    MissingCommand,
}

/// An ISUPPORT value failed to convert to the requested type.
///
/// This is reported per access; typed accessors degrade to an absent value
/// instead of propagating the failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("ISUPPORT value for {key} does not parse as {wanted}: {value:?}")]
pub struct CapValueError {
    /// The ISUPPORT key whose value failed to convert.
    pub key: String,
    /// The raw advertised value.
    pub value: String,
    /// The requested target type.
    pub wanted: &'static str,
}
