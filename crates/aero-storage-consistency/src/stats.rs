/// Cumulative counters, plus the current index size, as of the moment
/// [`crate::ConsistencyShim::stats`] was called.
///
/// Counters never decrease; they wrap only on 64-bit overflow, which is not
/// reachable in practical lifetimes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Reads served from an in-flight write's buffer or a zero-fingerprint
    /// WRITTEN entry, without touching the backend.
    pub cache_data_hits: u64,
    /// Cumulative milliseconds writers have spent blocked on cache capacity.
    pub cache_full_delay_millis: u64,
    /// Cumulative milliseconds writers have spent blocked on `min_write_delay`.
    pub repeated_write_delay_millis: u64,
    /// Allocation failures (record or zero-block scratch buffer).
    pub out_of_memory_errors: u64,
    /// Number of blocks currently tracked (WRITING + WRITTEN).
    pub current_cache_size: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StatsInner {
    pub cache_data_hits: u64,
    pub cache_full_delay_millis: u64,
    pub repeated_write_delay_millis: u64,
    pub out_of_memory_errors: u64,
}
