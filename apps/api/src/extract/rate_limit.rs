// Per-host cooldown tracking for outbound profile fetches. Remote rate
// limits apply to this service's egress as a whole, so cooldowns are keyed
// by host, never by tenant.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::warn;

/// How long a host stays on cooldown after a 403/429 when the response gives
/// no better hint.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
pub struct HostCooldowns {
    until: DashMap<String, Instant>,
}

impl HostCooldowns {
    pub fn new() -> Self {
        Self { until: DashMap::new() }
    }

    /// Whether calls to `host` should be held back right now.
    pub fn is_limited(&self, host: &str) -> bool {
        match self.until.get(host) {
            Some(deadline) => Instant::now() < *deadline,
            None => false,
        }
    }

    /// Records an observed rate-limit response for `host`.
    pub fn record_limited(&self, host: &str, cooldown: Duration) {
        warn!(host, cooldown_secs = cooldown.as_secs(), "host rate limited; backing off");
        self.until.insert(host.to_string(), Instant::now() + cooldown);
    }

    /// Clears a host after a successful call so a stale cooldown cannot
    /// outlive the remote's window.
    pub fn record_success(&self, host: &str) {
        self.until.remove(host);
    }
}
