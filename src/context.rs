//! Per-message dispatch context.
//!
//! A [`Context`] is constructed fresh for every inbound message and
//! discarded after dispatch completes. It is the only surface behavior
//! modules use to inspect the message, consult the capability registry,
//! and emit outbound commands; modules never touch the transport or the
//! registry directly.

use crate::isupport::Isupport;
use crate::message::Message;
use crate::transport::Connection;

/// The `nick!user@host` triplet of a user-originated message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Origin<'a> {
    /// The sender's nickname.
    pub nick: &'a str,
    /// The sender's username.
    pub user: &'a str,
    /// The sender's host.
    pub host: &'a str,
}

impl<'a> Origin<'a> {
    fn parse(prefix: &'a str) -> Option<Self> {
        let (nick, rest) = prefix.split_once('!')?;
        let (user, host) = rest.split_once('@')?;
        Some(Self { nick, user, host })
    }
}

/// Everything a behavior module may see and do for one inbound message.
pub struct Context<'a> {
    msg: &'a Message,
    conn: &'a Connection,
    isupport: &'a Isupport,
    own_nick: &'a str,
    is_server: bool,
    involves_me: bool,
    is_command: bool,
    mentioned: bool,
    origin: Option<Origin<'a>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        msg: &'a Message,
        conn: &'a Connection,
        isupport: &'a Isupport,
        own_nick: &'a str,
        command_prefix: char,
    ) -> Self {
        let is_server = !msg.prefix.contains(['!', '@']);
        let involves_me = msg.params.iter().any(|p| p == own_nick);

        let is_privmsg = msg.command.eq_ignore_ascii_case("PRIVMSG");
        let trailing = msg.trailing();
        let is_command = is_privmsg && trailing.is_some_and(|t| t.starts_with(command_prefix));
        let mentioned = is_privmsg
            && trailing.is_some_and(|t| {
                t.to_ascii_lowercase()
                    .contains(&own_nick.to_ascii_lowercase())
            });

        let origin = if is_server {
            None
        } else {
            Origin::parse(&msg.prefix)
        };

        Self {
            msg,
            conn,
            isupport,
            own_nick,
            is_server,
            involves_me,
            is_command,
            mentioned,
            origin,
        }
    }

    /// The parsed message under dispatch.
    pub fn message(&self) -> &Message {
        self.msg
    }

    /// The message origin prefix.
    pub fn prefix(&self) -> &str {
        &self.msg.prefix
    }

    /// The message command token.
    pub fn command(&self) -> &str {
        &self.msg.command
    }

    /// The message parameters in wire order.
    pub fn params(&self) -> &[String] {
        &self.msg.params
    }

    /// The trailing (last) parameter, if any.
    pub fn trailing(&self) -> Option<&str> {
        self.msg.trailing()
    }

    /// The numeric reply code, when this is a server numeric.
    pub fn response_code(&self) -> Option<u16> {
        if self.is_server {
            self.msg.response_code()
        } else {
            None
        }
    }

    /// Whether the origin is the server rather than a user.
    pub fn is_server_message(&self) -> bool {
        self.is_server
    }

    /// Whether any parameter names this connection's own nickname.
    pub fn involves_me(&self) -> bool {
        self.involves_me
    }

    /// Whether a PRIVMSG body starts with the configured command prefix.
    pub fn is_command(&self) -> bool {
        self.is_command
    }

    /// Whether a PRIVMSG body mentions our nickname (case-insensitive).
    pub fn mentioned(&self) -> bool {
        self.mentioned
    }

    /// The sender's identity triplet, for user-originated messages.
    pub fn origin(&self) -> Option<Origin<'a>> {
        self.origin
    }

    /// The nickname this connection identifies as.
    pub fn own_nick(&self) -> &str {
        self.own_nick
    }

    /// The server capability registry.
    pub fn isupport(&self) -> &Isupport {
        self.isupport
    }

    /// Whether the underlying connection is still open.
    pub fn is_active(&self) -> bool {
        self.conn.is_connected()
    }

    /// An owned outbound handle, for built-ins that write outside dispatch.
    pub(crate) fn connection(&self) -> Connection {
        self.conn.clone()
    }

    /// Send a message to a user or channel.
    pub fn privmsg(&self, target: &str, text: &str) {
        self.conn.send(format!("PRIVMSG {target} :{text}"));
    }

    /// Send a notice to a user or channel.
    pub fn notice(&self, target: &str, text: &str) {
        self.conn.send(format!("NOTICE {target} :{text}"));
    }

    /// Join a channel.
    pub fn join(&self, channel: &str) {
        self.conn.send(format!("JOIN {channel}"));
    }

    /// Leave a channel.
    pub fn part(&self, channel: &str) {
        self.conn.send(format!("PART {channel}"));
    }

    /// Request or apply a mode change. `args` carries mode parameters
    /// (nicknames, masks) when the modes need them.
    pub fn mode(&self, target: &str, modes: &str, args: Option<&str>) {
        match args {
            Some(args) => self.conn.send(format!("MODE {target} {modes} {args}")),
            None => self.conn.send(format!("MODE {target} {modes}")),
        }
    }

    /// Request the forced removal of a member, with an optional reason.
    pub fn kick(&self, channel: &str, nick: &str, reason: Option<&str>) {
        match reason {
            Some(reason) if !reason.trim().is_empty() => {
                self.conn.send(format!("KICK {channel} {nick} :{reason}"));
            }
            _ => self.conn.send(format!("KICK {channel} {nick}")),
        }
    }

    /// Set a channel topic.
    pub fn topic(&self, channel: &str, text: &str) {
        self.conn.send(format!("TOPIC {channel} :{text}"));
    }

    /// Request the membership listing of a channel.
    pub fn names(&self, channel: &str) {
        self.conn.send(format!("NAMES {channel}"));
    }

    /// Query visible users matching a mask.
    pub fn who(&self, mask: &str) {
        self.conn.send(format!("WHO {mask}"));
    }

    /// Query detailed information about a nickname.
    pub fn whois(&self, nick: &str) {
        self.conn.send(format!("WHOIS {nick}"));
    }

    /// Query history for a nickname that no longer exists.
    pub fn whowas(&self, nick: &str, count: Option<u32>) {
        match count {
            Some(count) => self.conn.send(format!("WHOWAS {nick} {count}")),
            None => self.conn.send(format!("WHOWAS {nick}")),
        }
    }

    /// Send a raw protocol command. Use at your own risk; the frame clamp
    /// and the no-op-when-disconnected rules still apply.
    pub fn send_raw(&self, line: impl Into<String>) {
        self.conn.send(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_connection;

    fn ctx_fixture<'a>(
        msg: &'a Message,
        conn: &'a Connection,
        isupport: &'a Isupport,
    ) -> Context<'a> {
        Context::new(msg, conn, isupport, "mybot", '!')
    }

    #[tokio::test]
    async fn derived_flags_for_user_privmsg() {
        let (conn, _rx) = test_connection();
        let info = Isupport::new();
        let msg = Message::parse(":alice!alice@example.net PRIVMSG #chan :hey MyBot, hello")
            .unwrap();
        let ctx = ctx_fixture(&msg, &conn, &info);

        assert!(!ctx.is_server_message());
        assert!(!ctx.involves_me());
        assert!(ctx.mentioned());
        assert!(!ctx.is_command());

        let origin = ctx.origin().unwrap();
        assert_eq!(origin.nick, "alice");
        assert_eq!(origin.user, "alice");
        assert_eq!(origin.host, "example.net");
    }

    #[tokio::test]
    async fn command_prefix_detection() {
        let (conn, _rx) = test_connection();
        let info = Isupport::new();
        let msg = Message::parse(":alice!a@h PRIVMSG mybot :!stats now").unwrap();
        let ctx = ctx_fixture(&msg, &conn, &info);

        assert!(ctx.is_command());
        assert!(ctx.involves_me());
    }

    #[tokio::test]
    async fn server_message_has_no_origin_triplet() {
        let (conn, _rx) = test_connection();
        let info = Isupport::new();
        let msg = Message::parse(":irc.example.net 001 mybot :Welcome").unwrap();
        let ctx = ctx_fixture(&msg, &conn, &info);

        assert!(ctx.is_server_message());
        assert_eq!(ctx.origin(), None);
        assert_eq!(ctx.response_code(), Some(1));
        assert!(ctx.involves_me());
    }

    #[tokio::test]
    async fn outbound_operations_format_commands() {
        let (conn, mut rx) = test_connection();
        let info = Isupport::new();
        let msg = Message::parse(":srv PING :x").unwrap();
        let ctx = ctx_fixture(&msg, &conn, &info);

        ctx.privmsg("#chan", "hello there");
        ctx.join("#chan");
        ctx.mode("#chan", "+o", Some("alice"));
        ctx.kick("#chan", "bob", None);
        ctx.kick("#chan", "bob", Some("flooding"));
        ctx.topic("#chan", "new topic");
        ctx.whowas("carol", Some(5));

        let mut lines = Vec::new();
        for _ in 0..7 {
            lines.push(rx.recv().await.unwrap());
        }
        assert_eq!(
            lines,
            vec![
                "PRIVMSG #chan :hello there",
                "JOIN #chan",
                "MODE #chan +o alice",
                "KICK #chan bob",
                "KICK #chan bob :flooding",
                "TOPIC #chan :new topic",
                "WHOWAS carol 5",
            ]
        );
    }
}
