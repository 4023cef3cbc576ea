//! CTCP (Client-to-Client Protocol) payload handling.
//!
//! CTCP queries ride inside the trailing parameter of ordinary messages,
//! delimited by `\x01`. The built-in [`crate::bots::CtcpResponder`] uses
//! this module to detect queries and format replies.

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// Known CTCP query types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION, the `/me` emote.
    Action,
    /// VERSION, a client version query.
    Version,
    /// PING, a round-trip probe carrying an opaque token.
    Ping,
    /// TIME, a local time query.
    Time,
    /// CLIENTINFO, a query for the supported CTCP command set.
    Clientinfo,
    /// Any other query, with its name preserved.
    Unknown(String),
}

impl CtcpKind {
    /// Parse a CTCP command name.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            "TIME" => Self::Time,
            "CLIENTINFO" => Self::Clientinfo,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    /// The canonical uppercase name of this command.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Clientinfo => "CLIENTINFO",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed CTCP payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The query type.
    pub kind: CtcpKind,
    /// Optional free-text after the command name.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse a CTCP payload from a message body.
    ///
    /// Returns `None` when the body is not CTCP-delimited. A missing
    /// closing delimiter is tolerated; some clients omit it.
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.strip_prefix(CTCP_DELIM)?;
        let text = text.strip_suffix(CTCP_DELIM).unwrap_or(text);
        if text.is_empty() {
            return None;
        }

        let (command, params) = match text.split_once(' ') {
            Some((cmd, rest)) if !rest.is_empty() => (cmd, Some(rest)),
            Some((cmd, _)) => (cmd, None),
            None => (text, None),
        };

        Some(Self {
            kind: CtcpKind::parse(command),
            params,
        })
    }

    /// Whether a message body looks like a CTCP payload.
    #[inline]
    pub fn is_ctcp(text: &str) -> bool {
        text.starts_with(CTCP_DELIM)
    }

    /// Build a VERSION reply.
    pub fn version_reply(version: &'a str) -> Self {
        Self {
            kind: CtcpKind::Version,
            params: Some(version),
        }
    }

    /// Build a PING reply echoing the query's token.
    pub fn ping_reply(token: Option<&'a str>) -> Self {
        Self {
            kind: CtcpKind::Ping,
            params: token,
        }
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x01{}", self.kind)?;
        if let Some(params) = self.params {
            write!(f, " {params}")?;
        }
        write!(f, "\x01")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_query() {
        let ctcp = Ctcp::parse("\x01VERSION\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Version);
        assert_eq!(ctcp.params, None);
    }

    #[test]
    fn parse_ping_with_token() {
        let ctcp = Ctcp::parse("\x01PING 1234567890\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Ping);
        assert_eq!(ctcp.params, Some("1234567890"));
    }

    #[test]
    fn parse_is_case_insensitive() {
        let ctcp = Ctcp::parse("\x01version\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Version);
    }

    #[test]
    fn parse_tolerates_missing_closing_delim() {
        let ctcp = Ctcp::parse("\x01ACTION waves").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
        assert_eq!(ctcp.params, Some("waves"));
    }

    #[test]
    fn parse_rejects_plain_text() {
        assert!(Ctcp::parse("hello world").is_none());
        assert!(Ctcp::parse("").is_none());
        assert!(Ctcp::parse("\x01\x01").is_none());
    }

    #[test]
    fn parse_unknown_kind() {
        let ctcp = Ctcp::parse("\x01DCC CHAT chat 1 2\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Unknown("DCC".to_owned()));
        assert_eq!(ctcp.params, Some("CHAT chat 1 2"));
    }

    #[test]
    fn display_version_reply() {
        let reply = Ctcp::version_reply("ircbot 0.1.0");
        assert_eq!(reply.to_string(), "\x01VERSION ircbot 0.1.0\x01");
    }

    #[test]
    fn display_round_trip() {
        let original = "\x01PING 42\x01";
        assert_eq!(Ctcp::parse(original).unwrap().to_string(), original);
    }
}
