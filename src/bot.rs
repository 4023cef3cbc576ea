//! Behavior module contract and message classification.
//!
//! Every inbound message is classified into a closed [`MessageKind`] set
//! and delivered to each registered [`Bot`] in registration order. A bot
//! implements only the hooks it cares about; every hook defaults to a
//! no-op. Hooks return `anyhow::Result` so module faults can be isolated
//! and reported by the dispatcher without breaking the dispatch pass.

use crate::context::Context;

/// The closed set of verb categories a message dispatches as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Any message whose origin is the server (numerics, PING, PONG, ...).
    ServerReply,
    /// A user-originated PRIVMSG.
    Privmsg,
    /// A user joined a channel.
    Join,
    /// A mode change.
    Mode,
    /// A forced removal from a channel.
    Kick,
    /// A user left a channel.
    Part,
    /// A topic change.
    Topic,
    /// Everything else.
    Other,
}

impl MessageKind {
    /// Classify a message. Server origin takes precedence over the verb.
    pub fn classify(ctx: &Context<'_>) -> Self {
        if ctx.is_server_message() {
            return Self::ServerReply;
        }
        match ctx.command().to_ascii_uppercase().as_str() {
            "PRIVMSG" => Self::Privmsg,
            "JOIN" => Self::Join,
            "MODE" => Self::Mode,
            "KICK" => Self::Kick,
            "PART" => Self::Part,
            "TOPIC" => Self::Topic,
            _ => Self::Other,
        }
    }
}

/// A behavior module receiving dispatched messages.
///
/// Modules talk back to the transport only through the [`Context`]; they
/// never touch the connection or the capability registry directly. The
/// core requires nothing beyond this contract: no teardown hook, no
/// configuration injection.
pub trait Bot: Send {
    /// Human-readable module name, used in fault reports.
    fn name(&self) -> &str;

    /// Whether this module currently receives messages. Disabled modules
    /// are skipped during dispatch.
    fn enabled(&self) -> bool {
        true
    }

    /// Whether to automatically rejoin a channel after a forced removal
    /// naming this connection's own nickname. See the default
    /// [`Bot::on_kick`].
    fn auto_rejoin(&self) -> bool {
        false
    }

    /// Single entry point for an inbound message. The default routes to
    /// the per-category hooks; override only to intercept every message
    /// regardless of category.
    fn on_message(&mut self, kind: MessageKind, ctx: &Context<'_>) -> anyhow::Result<()> {
        match kind {
            MessageKind::ServerReply => self.on_server_reply(ctx),
            MessageKind::Privmsg => self.on_privmsg(ctx),
            MessageKind::Join => self.on_join(ctx),
            MessageKind::Mode => self.on_mode(ctx),
            MessageKind::Kick => self.on_kick(ctx),
            MessageKind::Part => self.on_part(ctx),
            MessageKind::Topic => self.on_topic(ctx),
            MessageKind::Other => self.on_other(ctx),
        }
    }

    /// A server-originated message arrived. No-op by default.
    fn on_server_reply(&mut self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// A PRIVMSG arrived. No-op by default.
    fn on_privmsg(&mut self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// A JOIN arrived. No-op by default.
    fn on_join(&mut self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// A MODE change arrived. No-op by default.
    fn on_mode(&mut self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// A KICK arrived. The default rejoins the channel when the kick
    /// names our own nickname and [`Bot::auto_rejoin`] opts in; otherwise
    /// it is a no-op.
    fn on_kick(&mut self, ctx: &Context<'_>) -> anyhow::Result<()> {
        if self.auto_rejoin() && ctx.involves_me() {
            if let Some(channel) = ctx.params().first() {
                ctx.join(channel);
            }
        }
        Ok(())
    }

    /// A PART arrived. No-op by default.
    fn on_part(&mut self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// A TOPIC change arrived. No-op by default.
    fn on_topic(&mut self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Any other user-originated verb arrived. No-op by default.
    fn on_other(&mut self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isupport::Isupport;
    use crate::message::Message;
    use crate::transport::test_connection;

    fn classify_line(line: &str) -> MessageKind {
        let (conn, _rx) = test_connection();
        let info = Isupport::new();
        let msg = Message::parse(line).unwrap();
        let ctx = Context::new(&msg, &conn, &info, "mybot", '!');
        MessageKind::classify(&ctx)
    }

    #[tokio::test]
    async fn classification_is_origin_first() {
        // Server origin wins even for verbs in the category set.
        assert_eq!(
            classify_line(":irc.example.net MODE mybot +i"),
            MessageKind::ServerReply
        );
        assert_eq!(
            classify_line(":irc.example.net 005 mybot NETWORK=X :are supported"),
            MessageKind::ServerReply
        );
    }

    #[tokio::test]
    async fn classification_by_verb() {
        assert_eq!(
            classify_line(":a!u@h PRIVMSG #c :hi"),
            MessageKind::Privmsg
        );
        assert_eq!(classify_line(":a!u@h JOIN #c"), MessageKind::Join);
        assert_eq!(classify_line(":a!u@h MODE #c +o b"), MessageKind::Mode);
        assert_eq!(classify_line(":a!u@h KICK #c b :r"), MessageKind::Kick);
        assert_eq!(classify_line(":a!u@h PART #c"), MessageKind::Part);
        assert_eq!(classify_line(":a!u@h TOPIC #c :t"), MessageKind::Topic);
        assert_eq!(classify_line(":a!u@h INVITE mybot #c"), MessageKind::Other);
        // Verb matching is case-insensitive.
        assert_eq!(classify_line(":a!u@h privmsg #c :hi"), MessageKind::Privmsg);
    }
}
