//! CTCP query responder.
//!
//! Watches the trailing parameter of every user-originated message for a
//! delimited CTCP payload and answers the common queries (VERSION, PING,
//! TIME, CLIENTINFO) with a NOTICE back to the querying nickname, per the
//! CTCP convention that replies never use PRIVMSG. ACTION emotes and
//! unknown queries are left unanswered.

use chrono::Local;
use tracing::debug;

use crate::bot::{Bot, MessageKind};
use crate::context::Context;
use crate::ctcp::{Ctcp, CtcpKind};

const CLIENTINFO: &str = "ACTION CLIENTINFO PING TIME VERSION";

/// Built-in CTCP responder module.
pub struct CtcpResponder {
    version: String,
}

impl CtcpResponder {
    /// Create a responder advertising the given version string.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for CtcpResponder {
    fn default() -> Self {
        Self::new(concat!(
            env!("CARGO_PKG_NAME"),
            " ",
            env!("CARGO_PKG_VERSION")
        ))
    }
}

impl Bot for CtcpResponder {
    fn name(&self) -> &str {
        "ctcp"
    }

    // Queries can ride in any verb's trailing parameter, so detection
    // runs on every message rather than in a per-category hook.
    fn on_message(&mut self, _kind: MessageKind, ctx: &Context<'_>) -> anyhow::Result<()> {
        let Some(body) = ctx.trailing() else {
            return Ok(());
        };
        let Some(query) = Ctcp::parse(body) else {
            return Ok(());
        };
        let Some(origin) = ctx.origin() else {
            return Ok(());
        };

        let reply = match query.kind {
            CtcpKind::Version => Ctcp::version_reply(&self.version).to_string(),
            CtcpKind::Ping => Ctcp::ping_reply(query.params).to_string(),
            CtcpKind::Time => {
                let now = Local::now().to_rfc2822();
                Ctcp {
                    kind: CtcpKind::Time,
                    params: Some(&now),
                }
                .to_string()
            }
            CtcpKind::Clientinfo => Ctcp {
                kind: CtcpKind::Clientinfo,
                params: Some(CLIENTINFO),
            }
            .to_string(),
            CtcpKind::Action | CtcpKind::Unknown(_) => return Ok(()),
        };

        debug!(from = origin.nick, query = %query.kind, "answering CTCP query");
        ctx.notice(origin.nick, &reply);
        Ok(())
    }
}
