/// Subscriber liveness
///
/// Subscribers are receive-only, so the only frames a passive viewer sends are
/// pong replies. Outbound hub traffic says nothing about the client; liveness
/// is judged purely on what the client sends back. Checks run on a fixed
/// ticker that keeps firing no matter how busy the hub feed is.
use std::time::Duration;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

use crate::config::WebSocketConfig;

/// How often the connection loop evaluates liveness
const CHECK_EVERY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Client silence before the server pings
    pub ping_after: Duration,
    /// Client silence before the connection is dropped, once a ping went unanswered
    pub idle_timeout: Duration,
    /// Grace period for the pong
    pub pong_timeout: Duration,
    pub check_every: Duration,
}

impl HeartbeatConfig {
    pub fn from_config(config: &WebSocketConfig) -> Self {
        let idle_timeout = Duration::from_secs(config.idle_timeout_secs.max(1));
        Self {
            // Never let idleness be reached without a ping in flight
            ping_after: Duration::from_secs(config.heartbeat_secs.max(1)).min(idle_timeout),
            idle_timeout,
            pong_timeout: Duration::from_secs(config.pong_timeout_secs.max(1)),
            check_every: CHECK_EVERY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Ping outstanding past the pong grace period
    PongTimeout,
    /// Silent past the idle timeout despite being pinged
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    Wait,
    SendPing,
    Disconnect(DisconnectReason),
}

/// Per-subscriber heartbeat state
#[derive(Debug)]
pub struct SubscriberHeartbeat {
    config: HeartbeatConfig,
    last_heard: Instant,
    ping_sent: Option<Instant>,
    pings: u64,
}

impl SubscriberHeartbeat {
    pub fn new(config: HeartbeatConfig, now: Instant) -> Self {
        Self {
            config,
            last_heard: now,
            ping_sent: None,
            pings: 0,
        }
    }

    /// Ticker for the connection loop; created once, outside the select loop
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval(self.config.check_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Any client frame, pongs included
    pub fn heard(&mut self, now: Instant) {
        self.last_heard = now;
        self.ping_sent = None;
    }

    /// Decide what the connection should do at `now`
    ///
    /// Returning `SendPing` marks the ping as in flight.
    pub fn poll(&mut self, now: Instant) -> HeartbeatAction {
        let silent = now.saturating_duration_since(self.last_heard);

        match self.ping_sent {
            Some(sent) if now.saturating_duration_since(sent) >= self.config.pong_timeout => {
                HeartbeatAction::Disconnect(DisconnectReason::PongTimeout)
            }
            Some(_) if silent >= self.config.idle_timeout => {
                HeartbeatAction::Disconnect(DisconnectReason::Idle)
            }
            Some(_) => HeartbeatAction::Wait,
            None if silent >= self.config.ping_after => {
                self.ping_sent = Some(now);
                self.pings += 1;
                HeartbeatAction::SendPing
            }
            None => HeartbeatAction::Wait,
        }
    }

    pub fn silent_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_heard)
    }

    pub fn pings_sent(&self) -> u64 {
        self.pings
    }
}
