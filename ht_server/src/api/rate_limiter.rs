//! Per-connection rate limiting for inbound frames.
//!
//! Each connection carries a burst limiter and a sustained limiter. A frame
//! must pass both to reach the table; a refused frame earns an error reply.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Sliding-window limiter over request timestamps
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use ht_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 10 requests per second
    /// let limiter = RateLimiter::new(10, Duration::from_secs(1));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// 10 messages per second
    pub fn burst() -> Self {
        Self::new(10, Duration::from_secs(1))
    }

    /// 100 messages per minute
    pub fn sustained() -> Self {
        Self::new(100, Duration::from_secs(60))
    }

    /// Record a request if there is room for it.
    ///
    /// Returns `true` if the request is allowed, `false` if rate limit exceeded.
    pub fn check(&mut self) -> bool {
        self.evict(Instant::now());
        if self.timestamps.len() >= self.max_requests {
            return false;
        }
        self.timestamps.push_back(Instant::now());
        true
    }

    /// Requests still allowed in the current window
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }

    fn evict(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Which limiter refused a frame
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Limited {
    Burst,
    Sustained,
}

impl Limited {
    /// Label used for metrics
    pub fn label(self) -> &'static str {
        match self {
            Self::Burst => "burst",
            Self::Sustained => "sustained",
        }
    }

    /// Error text sent back to the client
    pub fn message(self) -> &'static str {
        match self {
            Self::Burst => "Rate limit exceeded. Please slow down.",
            Self::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Both limiters for one connection
#[derive(Debug)]
pub struct ConnectionLimits {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            burst: RateLimiter::burst(),
            sustained: RateLimiter::sustained(),
        }
    }
}

impl ConnectionLimits {
    /// Admit one frame, or report the first limiter that refused it.
    pub fn admit(&mut self) -> Result<(), Limited> {
        if !self.burst.check() {
            return Err(Limited::Burst);
        }
        if !self.sustained.check() {
            return Err(Limited::Sustained);
        }
        Ok(())
    }
}
