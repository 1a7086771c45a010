//! Runtime configuration.

use std::time::Duration;

/// Configuration for the workflows.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Maximum results requested per keyword search.
    pub search_limit: usize,
    /// Pause after each channel metadata lookup during discovery.
    pub channel_lookup_delay: Duration,
    /// Pause between keywords during discovery.
    pub keyword_delay: Duration,
    /// Pause after each join attempt.
    pub join_delay: Duration,
    /// How many recent messages the commenter looks at.
    pub comment_lookback: usize,
    /// Comments flag assumed when the platform reports none.
    pub comments_default_when_unknown: bool,
    /// Upper bound for any single remote call. `None` waits forever.
    pub call_timeout: Option<Duration>,
    /// Comment interval used when a request does not give one.
    pub default_comment_interval: Duration,
    /// Smallest comment interval accepted.
    pub min_comment_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            search_limit: 50,
            channel_lookup_delay: Duration::from_millis(100),
            keyword_delay: Duration::from_millis(500),
            join_delay: Duration::from_secs(2),
            comment_lookback: 5,
            comments_default_when_unknown: true,
            call_timeout: None,
            default_comment_interval: Duration::from_secs(60),
            min_comment_interval: Duration::from_secs(1),
        }
    }
}

impl RuntimeConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-keyword search limit.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Sets the pause after each channel metadata lookup.
    pub fn with_channel_lookup_delay(mut self, delay: Duration) -> Self {
        self.channel_lookup_delay = delay;
        self
    }

    /// Sets the pause between keywords.
    pub fn with_keyword_delay(mut self, delay: Duration) -> Self {
        self.keyword_delay = delay;
        self
    }

    /// Sets the pause after each join attempt.
    pub fn with_join_delay(mut self, delay: Duration) -> Self {
        self.join_delay = delay;
        self
    }

    /// Sets how many recent messages the commenter inspects.
    pub fn with_comment_lookback(mut self, lookback: usize) -> Self {
        self.comment_lookback = lookback;
        self
    }

    /// Sets the comments flag assumed when the platform reports none.
    pub fn with_comments_default(mut self, enabled: bool) -> Self {
        self.comments_default_when_unknown = enabled;
        self
    }

    /// Bounds every remote call.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the default comment interval.
    pub fn with_default_comment_interval(mut self, interval: Duration) -> Self {
        self.default_comment_interval = interval;
        self
    }

    /// Sets the smallest accepted comment interval.
    pub fn with_min_comment_interval(mut self, interval: Duration) -> Self {
        self.min_comment_interval = interval;
        self
    }
}
