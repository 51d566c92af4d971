//! Broker configuration

use std::time::Duration;

/// Broker configuration options
///
/// Every client connected under a broker inherits the same delivery policy.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// How long a single delivery attempt may wait for a client to receive.
    /// Also the streaming loop's liveness-check interval.
    pub timeout: Duration,

    /// Consecutive delivery failures tolerated before a client is evicted
    /// during a broadcast
    pub tolerance: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            tolerance: 3,
        }
    }
}

impl BrokerConfig {
    /// Create a config with the given delivery timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Set the delivery timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the failure tolerance
    pub fn tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }
}
