//! IRC message parsing and serialization.
//!
//! One inbound line maps to one [`Message`]: a prefix (the origin), a
//! command token, and an ordered parameter list whose final element may be
//! a trailing parameter containing spaces. The parser assumes a prefix is
//! always present; the connection layer synthesizes one for server-relayed
//! lines that omit it (see [`Message::parse_with_origin`]).

use std::fmt;
use std::str::FromStr;

use crate::error::{MessageParseError, ProtocolError};

/// `RPL_WELCOME` (001), the first post-registration numeric.
pub const RPL_WELCOME: u16 = 1;

/// `RPL_ISUPPORT` (005), the server capability advertisement numeric.
pub const RPL_ISUPPORT: u16 = 5;

/// A parsed IRC protocol message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The raw line as received, terminators stripped.
    pub raw: String,
    /// The message origin: a server host or a `nick!user@host` triplet.
    pub prefix: String,
    /// The command token, either a verb or a 3-digit numeric.
    pub command: String,
    /// Positional parameters in wire order; the trailing parameter, if
    /// present, is always the final element.
    pub params: Vec<String>,
}

impl Message {
    /// Parse one raw line into a `Message`.
    ///
    /// Line terminators are tolerated and stripped. The line must begin
    /// with a `:` prefix marker; lines relayed without one go through
    /// [`Message::parse_with_origin`] instead.
    pub fn parse(line: &str) -> Result<Self, MessageParseError> {
        let raw = line.trim_end_matches(['\r', '\n']);
        if raw.is_empty() {
            return Err(MessageParseError::EmptyLine);
        }
        if !raw.starts_with(':') {
            return Err(MessageParseError::MissingPrefix);
        }

        let prefix_end = raw.find(' ').ok_or(MessageParseError::MissingCommand)?;
        let prefix = &raw[1..prefix_end];
        if prefix.is_empty() {
            return Err(MessageParseError::MissingPrefix);
        }

        // The trailing marker is a space immediately followed by ':'.
        // Everything after it is one free-text parameter, untouched.
        let (middle_end, trailing) = match raw.find(" :") {
            Some(idx) if idx >= prefix_end => (idx, Some(&raw[idx + 2..])),
            _ => (raw.len(), None),
        };

        let mut tokens = raw[prefix_end..middle_end]
            .split(' ')
            .filter(|t| !t.is_empty());
        let command = tokens
            .next()
            .ok_or(MessageParseError::MissingCommand)?
            .to_owned();

        let mut params: Vec<String> = tokens.map(str::to_owned).collect();
        if let Some(t) = trailing {
            params.push(t.to_owned());
        }

        Ok(Message {
            raw: raw.to_owned(),
            prefix: prefix.to_owned(),
            command,
            params,
        })
    }

    /// Parse a line, synthesizing a prefix from `origin` when absent.
    ///
    /// Servers may omit their own prefix on relayed lines; prepending the
    /// configured origin host lets downstream code assume a prefix always
    /// exists.
    pub fn parse_with_origin(line: &str, origin: &str) -> Result<Self, MessageParseError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.starts_with(':') {
            Self::parse(trimmed)
        } else {
            Self::parse(&format!(":{origin} {trimmed}"))
        }
    }

    /// The trailing parameter, i.e. the last element of the parameter list.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// The numeric reply code, when the command is a 3-digit numeric.
    pub fn response_code(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        Message::parse(s).map_err(|cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{} {}", self.prefix, self.command)?;
        if let Some((last, middles)) = self.params.split_last() {
            for p in middles {
                write!(f, " {p}")?;
            }
            if last.is_empty() || last.starts_with(':') || last.contains(' ') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        Ok(())
    }
}
