//! Per-source admission control: a fixed-window rate limiter with temporary
//! bans.
//!
//! Both maps live behind one mutex because three tasks touch them: the
//! receive loop, the periodic amnesty loop, and (lazily) ban expiry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Admission configuration, mirroring the gatekeeper CLI surface.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Queries allowed per source within one window
    pub threshold: u32,
    /// Fixed window length
    pub window: Duration,
    /// How long an offender stays banned
    pub ban_duration: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            threshold: 100,
            window: Duration::from_secs(5),
            ban_duration: Duration::from_secs(300),
        }
    }
}

/// Verdict for one inbound datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Debug, Default)]
struct AdmissionState {
    history: HashMap<IpAddr, RateLimitEntry>,
    banned: HashMap<IpAddr, Instant>,
}

/// Sliding-window admission control with an IP ban list.
#[derive(Debug)]
pub struct AdmissionControl {
    config: AdmissionConfig,
    state: Mutex<AdmissionState>,
}

impl AdmissionControl {
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            state: Mutex::new(AdmissionState::default()),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Admit or deny one query from `source`.
    pub fn admit(&self, source: IpAddr) -> Decision {
        self.admit_at(source, Instant::now())
    }

    /// The admission algorithm against an explicit clock.
    ///
    /// Fixed-window semantics: the counter resets once a full window has
    /// elapsed since the window start, so bursts straddling a boundary can
    /// admit up to `threshold` extra queries. That is the defined behavior,
    /// not an accident to correct.
    pub fn admit_at(&self, source: IpAddr, now: Instant) -> Decision {
        let mut state = self.state.lock();

        // Expired bans are cleaned up lazily, on the next query.
        if let Some(&unban_at) = state.banned.get(&source) {
            if now < unban_at {
                debug!(%source, "denied: banned");
                return Decision::Deny;
            }
            state.banned.remove(&source);
            info!(%source, "ban expired");
        }

        let entry = state.history.entry(source).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });
        entry.count += 1;
        let elapsed = now.duration_since(entry.window_start);

        if entry.count > self.config.threshold && elapsed < self.config.window {
            info!(%source, count = entry.count, "banning for excessive queries");
            state.banned.insert(source, now + self.config.ban_duration);
            state.history.remove(&source);
            return Decision::Deny;
        }

        if elapsed >= self.config.window {
            state.history.insert(
                source,
                RateLimitEntry {
                    count: 1,
                    window_start: now,
                },
            );
        }

        Decision::Allow
    }

    /// Global amnesty: forget all rate-limit history. Bans are unaffected.
    pub fn reset_history(&self) {
        let mut state = self.state.lock();
        let cleared = state.history.len();
        state.history.clear();
        debug!(cleared, "rate-limit history reset");
    }

    /// (tracked sources, active bans), for logging.
    pub fn counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.history.len(), state.banned.len())
    }
}
