/// Configuration for settlement polling behavior.
///
/// Controls how often the payment API is asked whether a payment has paid
/// out on the destination chain.
///
/// # Examples
///
/// ```rust
/// use rozo_bridge::PollingConfig;
///
/// // Use defaults (60 attempts, 5 second intervals)
/// let config = PollingConfig::default();
///
/// // Customize polling behavior
/// let config = PollingConfig::default()
///     .with_max_attempts(20)
///     .with_poll_interval_secs(10);
///
/// // Slow payouts such as Ethereum mainnet
/// let config = PollingConfig::slow_payout();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Maximum number of polling attempts before giving up.
    pub max_attempts: u32,
    /// Seconds to wait between polling attempts.
    pub poll_interval_secs: u64,
}

impl Default for PollingConfig {
    /// - `max_attempts`: 60
    /// - `poll_interval_secs`: 5
    ///
    /// Five minutes in total, enough for the usual sub-minute payouts.
    fn default() -> Self {
        Self {
            max_attempts: 60,
            poll_interval_secs: 5,
        }
    }
}

impl PollingConfig {
    /// - `max_attempts`: 60
    /// - `poll_interval_secs`: 30
    ///
    /// Thirty minutes in total, for destinations that wait on finality.
    pub fn slow_payout() -> Self {
        Self {
            max_attempts: 60,
            poll_interval_secs: 30,
        }
    }

    /// Sets the maximum number of polling attempts.
    ///
    /// ```rust
    /// use rozo_bridge::PollingConfig;
    ///
    /// let config = PollingConfig::default().with_max_attempts(120);
    /// assert_eq!(config.max_attempts, 120);
    /// ```
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the interval between polling attempts in seconds.
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// `max_attempts * poll_interval_secs`
    pub fn total_timeout_secs(&self) -> u64 {
        self.max_attempts as u64 * self.poll_interval_secs
    }
}
