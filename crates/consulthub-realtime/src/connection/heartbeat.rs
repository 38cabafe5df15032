//! Ping/pong keepalive bookkeeping for one socket.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use consulthub_core::config::RealtimeConfig;

/// Tracks outstanding pings for a socket task.
///
/// The socket loop calls [`on_tick`](Self::on_tick) on every ticker tick and
/// [`record_pong`](Self::record_pong) whenever a Pong frame arrives.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    interval: Duration,
    timeout: Duration,
    /// When the oldest unanswered ping went out.
    awaiting_since: Option<Instant>,
}

/// What the socket loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    SendPing,
    TimedOut,
}

impl Heartbeat {
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
            awaiting_since: None,
        }
    }

    /// Ticker whose first tick is one interval from now.
    pub fn ticker(&self) -> Interval {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    pub fn on_tick(&mut self) -> HeartbeatAction {
        match self.awaiting_since {
            Some(since) if since.elapsed() >= self.timeout => HeartbeatAction::TimedOut,
            Some(_) => HeartbeatAction::SendPing,
            None => {
                self.awaiting_since = Some(Instant::now());
                HeartbeatAction::SendPing
            }
        }
    }

    pub fn record_pong(&mut self) {
        self.awaiting_since = None;
    }

    /// Instant at which the outstanding ping expires, if one is outstanding.
    pub fn deadline(&self) -> Option<Instant> {
        self.awaiting_since.map(|since| since + self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat() -> Heartbeat {
        let config = RealtimeConfig {
            ping_interval_seconds: 25,
            ping_timeout_seconds: 20,
            ..RealtimeConfig::default()
        };
        Heartbeat::new(&config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_ping_times_out() {
        let mut hb = heartbeat();
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        let deadline = hb.deadline().unwrap();

        time::advance(Duration::from_secs(19)).await;
        assert!(Instant::now() < deadline);
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);

        time::advance(Duration::from_secs(1)).await;
        assert_eq!(hb.on_tick(), HeartbeatAction::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_resets() {
        let mut hb = heartbeat();
        hb.on_tick();
        time::advance(Duration::from_secs(10)).await;
        hb.record_pong();
        assert!(hb.deadline().is_none());

        time::advance(Duration::from_secs(30)).await;
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
    }
}
