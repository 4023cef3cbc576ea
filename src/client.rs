//! Connection lifecycle and message dispatch.
//!
//! [`Client`] owns the registration handshake, the single-consumer read
//! loop, the server capability registry, and the ordered set of behavior
//! modules. Dispatch is serialized by construction: one message is fully
//! delivered to every module before the next line is read, so modules
//! never observe messages out of order or concurrently.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, error, info, warn};

use crate::bot::{Bot, MessageKind};
use crate::bots::{CtcpResponder, LatencyProbe, Pinger};
use crate::config::Config;
use crate::context::Context;
use crate::error::ProtocolError;
use crate::isupport::Isupport;
use crate::message::{Message, RPL_ISUPPORT, RPL_WELCOME};
use crate::transport::{Connection, Reader, Transport};

/// A registered, dispatching IRC client connection.
pub struct Client {
    conn: Connection,
    reader: Option<Reader>,
    isupport: Isupport,
    bots: Vec<Box<dyn Bot>>,
    nick: String,
    server_name: String,
    channels: Vec<String>,
    command_prefix: char,
    probe: LatencyProbe,
}

impl Client {
    /// Connect, register, and install the built-in modules.
    ///
    /// The registration commands (NICK, then USER) are queued immediately;
    /// the connection is usable once the server's welcome arrives, which
    /// [`Client::run`] observes.
    pub async fn connect(config: &Config) -> Result<Self, ProtocolError> {
        info!(
            host = %config.host,
            port = config.port,
            tls = config.tls,
            "connecting"
        );
        let transport = Transport::connect(&config.host, config.port, config.tls).await?;
        let (conn, reader) = transport.start();

        conn.send(format!("NICK {}", config.nickname));
        conn.send(format!(
            "USER {} * 8 :{}",
            config.username(),
            config.realname()
        ));

        let pinger = Pinger::new(Duration::from_secs(config.ping_interval_secs));
        let probe = pinger.probe();

        let mut client = Self {
            conn,
            reader: Some(reader),
            isupport: Isupport::new(),
            bots: Vec::new(),
            nick: config.nickname.clone(),
            server_name: config.host.clone(),
            channels: config.channels.clone(),
            command_prefix: config.command_prefix,
            probe,
        };
        client.register(pinger);
        client.register(CtcpResponder::default());
        Ok(client)
    }

    /// Append a behavior module. Modules receive messages in registration
    /// order; built-ins registered by [`Client::connect`] come first.
    pub fn register<B: Bot + 'static>(&mut self, bot: B) {
        self.bots.push(Box::new(bot));
    }

    /// The nickname currently held on the server.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// The server capability registry, as advertised so far.
    pub fn isupport(&self) -> &Isupport {
        &self.isupport
    }

    /// An owned outbound handle, usable from other tasks.
    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }

    /// The latest keepalive round-trip measurement, if any.
    pub fn latency(&self) -> Option<Duration> {
        self.probe.latency()
    }

    /// Send a farewell and close the connection.
    pub fn quit(&self, reason: &str) {
        self.conn.quit(reason);
    }

    /// Drive the read loop until the server closes the stream or the
    /// connection is shut down. Invalid UTF-8 is decoded lossily by the
    /// codec; lines that fail to parse are logged and skipped; I/O errors
    /// end the loop.
    pub async fn run(&mut self) -> Result<(), ProtocolError> {
        let Some(mut reader) = self.reader.take() else {
            return Err(ProtocolError::NotConnected);
        };
        while let Some(item) = reader.next().await {
            match item {
                Ok(line) => self.handle_line(&line),
                Err(e) => {
                    self.conn.shutdown();
                    return Err(e);
                }
            }
            if !self.conn.is_connected() {
                break;
            }
        }
        info!("server closed the stream");
        self.conn.shutdown();
        Ok(())
    }

    /// Parse one wire line and dispatch it. Lines without a prefix are
    /// attributed to the server we connected to.
    fn handle_line(&mut self, line: &str) {
        let msg = match Message::parse_with_origin(line, &self.server_name) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(line, error = %e, "skipping unparseable line");
                return;
            }
        };

        // Numerics are honored only with a server origin; a user prefix
        // must not populate the capability registry or fake the welcome.
        let from_server = !msg.prefix.contains(['!', '@']);
        if from_server {
            match msg.response_code() {
                Some(RPL_WELCOME) => {
                    // The welcome's target is the nickname the server accepted.
                    if let Some(accepted) = msg.params.first() {
                        self.nick = accepted.clone();
                    }
                    info!(nick = %self.nick, "registered");
                    for channel in &self.channels {
                        self.conn.send(format!("JOIN {channel}"));
                    }
                }
                Some(RPL_ISUPPORT) => {
                    self.isupport.append_from_params(&msg.params);
                    debug!(keys = self.isupport.keys().count(), "capability registry updated");
                }
                _ => {}
            }
        }

        // A forced or self-initiated nickname change targeting us.
        if msg.command.eq_ignore_ascii_case("NICK") {
            let ours = msg
                .prefix
                .split('!')
                .next()
                .is_some_and(|n| n.eq_ignore_ascii_case(&self.nick));
            if ours {
                if let Some(new_nick) = msg.trailing() {
                    info!(old = %self.nick, new = new_nick, "nickname changed");
                    self.nick = new_nick.to_owned();
                }
            }
        }

        self.dispatch(&msg);
    }

    /// Deliver one message to every enabled module, in order. A module
    /// that returns an error or panics is reported and skipped; dispatch
    /// continues with the remaining modules.
    fn dispatch(&mut self, msg: &Message) {
        let ctx = Context::new(
            msg,
            &self.conn,
            &self.isupport,
            &self.nick,
            self.command_prefix,
        );
        let kind = MessageKind::classify(&ctx);

        for bot in &mut self.bots {
            if !bot.enabled() {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| bot.on_message(kind, &ctx)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(module = bot.name(), error = %e, "module hook failed");
                }
                Err(_) => {
                    error!(module = bot.name(), "module hook panicked");
                }
            }
        }
    }
}
