use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Severity passed to the caller-supplied [`LogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// The one piece of logging the shim's contract actually depends on: the
/// caller gets to see (and route) the handful of named events the core
/// raises, such as the "impossible expected fingerprint" notice.
///
/// This is distinct from the crate's own internal `tracing` instrumentation,
/// which fires regardless of whether a `LogSink` is installed.
pub type LogSink = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// The five enumerated configuration knobs, plus validation.
#[derive(Clone)]
pub struct Config {
    /// Bytes per block. Must be `> 0`.
    pub block_size: u32,
    /// Maximum number of blocks tracked at once. Must be `>= 1`.
    pub cache_size: usize,
    /// How long a WRITTEN entry's fingerprint remains trusted. Must be `>=
    /// min_write_delay`.
    pub cache_time: Duration,
    /// Minimum delay between completion of one write and the start of the
    /// next write to the same block.
    pub min_write_delay: Duration,
    /// Caller-supplied log sink; see [`LogSink`].
    pub log: LogSink,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("block_size", &self.block_size)
            .field("cache_size", &self.cache_size)
            .field("cache_time", &self.cache_time)
            .field("min_write_delay", &self.min_write_delay)
            .field("log", &"<log sink>")
            .finish()
    }
}

impl Config {
    /// A `Config` with the default log sink, which forwards to `tracing`.
    pub fn new(
        block_size: u32,
        cache_size: usize,
        cache_time: Duration,
        min_write_delay: Duration,
    ) -> Self {
        Self {
            block_size,
            cache_size,
            cache_time,
            min_write_delay,
            log: default_log_sink(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.block_size == 0 {
            return Err("block_size must be greater than zero");
        }
        if self.cache_size == 0 {
            return Err("cache_size must be at least 1");
        }
        if self.cache_time < self.min_write_delay {
            return Err("cache_time must be >= min_write_delay");
        }
        Ok(())
    }
}

fn default_log_sink() -> LogSink {
    Arc::new(|level, message| match level {
        LogLevel::Error => tracing::error!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
        LogLevel::Debug => tracing::debug!("{message}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_block_size() {
        let config = Config::new(0, 4, Duration::from_millis(200), Duration::from_millis(100));
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_cache_time_shorter_than_min_write_delay() {
        let config = Config::new(4096, 4, Duration::from_millis(50), Duration::from_millis(100));
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_sane_config() {
        let config = Config::new(4096, 4, Duration::from_millis(200), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }
}
