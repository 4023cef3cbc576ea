//! Keepalive prober.
//!
//! Answers server PINGs so the connection is never dropped for idling,
//! and periodically sends its own PING carrying a wall-clock token so the
//! PONG that comes back yields a round-trip latency estimate. The probe
//! state is shared through a cloneable [`LatencyProbe`] handle so callers
//! outside dispatch (the client, a status command) can read the latest
//! measurement.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::bot::Bot;
use crate::context::Context;
use crate::message::RPL_WELCOME;
use crate::transport::Connection;

#[derive(Debug, Default)]
struct ProbeState {
    /// Token and send time of the probe awaiting its PONG, if any.
    outstanding: Option<(String, DateTime<Utc>)>,
    latency: Option<Duration>,
}

/// Shared handle to the prober's latency measurement.
#[derive(Clone, Debug, Default)]
pub struct LatencyProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl LatencyProbe {
    /// The most recent measured round-trip latency, if a probe has
    /// completed.
    pub fn latency(&self) -> Option<Duration> {
        self.state.lock().ok().and_then(|s| s.latency)
    }

    fn mark_sent(&self, token: String, at: DateTime<Utc>) {
        if let Ok(mut state) = self.state.lock() {
            state.outstanding = Some((token, at));
        }
    }

    fn complete(&self, token: &str, at: DateTime<Utc>) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let Some((expected, sent_at)) = state.outstanding.take() else {
            return;
        };
        if expected != token {
            // Not our probe; put it back and wait for the matching PONG.
            state.outstanding = Some((expected, sent_at));
            return;
        }
        if let Ok(rtt) = (at - sent_at).to_std() {
            debug!(rtt_ms = rtt.as_millis() as u64, "latency probe completed");
            state.latency = Some(rtt);
        }
    }
}

/// Built-in keepalive module.
pub struct Pinger {
    probe: LatencyProbe,
    interval: Duration,
    timer_started: bool,
}

impl Pinger {
    /// Create a prober that sends its own PING at the given interval once
    /// registration completes.
    pub fn new(interval: Duration) -> Self {
        Self {
            probe: LatencyProbe::default(),
            interval,
            timer_started: false,
        }
    }

    /// A handle to the shared latency measurement.
    pub fn probe(&self) -> LatencyProbe {
        self.probe.clone()
    }

    fn start_timer(&mut self, conn: Connection) {
        if self.timer_started {
            return;
        }
        self.timer_started = true;
        let probe = self.probe.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if !conn.is_connected() {
                    break;
                }
                let now = Utc::now();
                let token = now.timestamp_millis().to_string();
                probe.mark_sent(token.clone(), now);
                conn.send(format!("PING :{token}"));
            }
            debug!("keepalive timer stopped");
        });
    }
}

impl Default for Pinger {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl Bot for Pinger {
    fn name(&self) -> &str {
        "pinger"
    }

    fn on_server_reply(&mut self, ctx: &Context<'_>) -> anyhow::Result<()> {
        if ctx.command().eq_ignore_ascii_case("PING") {
            match ctx.trailing() {
                Some(token) => ctx.send_raw(format!("PONG :{token}")),
                None => ctx.send_raw("PONG"),
            }
        } else if ctx.command().eq_ignore_ascii_case("PONG") {
            if let Some(token) = ctx.trailing() {
                self.probe.complete(token, Utc::now());
            }
        } else if ctx.response_code() == Some(RPL_WELCOME) {
            self.start_timer(ctx.connection());
        }
        Ok(())
    }
}
