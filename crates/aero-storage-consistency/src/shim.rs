use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::backend::BlockBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, LogLevel};
use crate::error::ShimError;
use crate::expiry::ExpiryList;
use crate::fingerprint::{compute_fingerprint, Fingerprint, ZERO_FINGERPRINT};
use crate::record::BlockRecord;
use crate::stats::{Stats, StatsInner};

#[derive(Default)]
struct CoreState {
    table: HashMap<u64, BlockRecord>,
    expiry: ExpiryList,
    zero_block: Option<Bytes>,
    stats: StatsInner,
}

/// The post-write consistency shim: wraps an inner
/// [`BlockBackend`] and masks its eventual-consistency hazards by serializing
/// writes to the same block and caching each recently-written block's
/// fingerprint so reads can be verified against the backend.
///
/// `C` is the injected millisecond clock (`SystemClock` by default); tests
/// construct a shim over a [`crate::clock::FakeClock`] via [`Self::with_clock`]
/// to drive the timing rules deterministically.
pub struct ConsistencyShim<B: BlockBackend, C: Clock = SystemClock> {
    inner: B,
    config: Config,
    clock: Arc<C>,
    state: Mutex<CoreState>,
    capacity_cond: Condvar,
}

impl<B: BlockBackend> ConsistencyShim<B, SystemClock> {
    pub fn new(inner: B, config: Config) -> Result<Self, ShimError<B::Error>> {
        Self::with_clock(inner, config, Arc::new(SystemClock))
    }
}

impl<B: BlockBackend, C: Clock> ConsistencyShim<B, C> {
    pub fn with_clock(inner: B, config: Config, clock: Arc<C>) -> Result<Self, ShimError<B::Error>> {
        config.validate().map_err(ShimError::InvalidConfig)?;
        Ok(Self {
            inner,
            config,
            clock,
            state: Mutex::new(CoreState::default()),
            capacity_cond: Condvar::new(),
        })
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// A read-only snapshot of the cumulative counters plus the
    /// current index size.
    pub fn stats(&self) -> Stats {
        let guard = self.state.lock().unwrap();
        Stats {
            cache_data_hits: guard.stats.cache_data_hits,
            cache_full_delay_millis: guard.stats.cache_full_delay_millis,
            repeated_write_delay_millis: guard.stats.repeated_write_delay_millis,
            out_of_memory_errors: guard.stats.out_of_memory_errors,
            current_cache_size: guard.table.len(),
        }
    }

    pub fn detect_sizes(&self) -> Result<(u64, u32), ShimError<B::Error>> {
        self.inner.detect_sizes().map_err(ShimError::Backend)
    }

    /// Drains the index and tears down the inner store. The shim instance
    /// must not be used afterwards.
    pub fn destroy(&self) {
        let mut guard = self.state.lock().unwrap();
        guard.table.clear();
        guard.expiry = ExpiryList::default();
        drop(guard);
        self.inner.destroy();
    }

    /// Reads `block_size` bytes of the current content for `block_num`.
    pub fn read_block(
        &self,
        block_num: u64,
        dest: &mut [u8],
        expect_fingerprint: Option<Fingerprint>,
    ) -> Result<(), ShimError<B::Error>> {
        let mut guard = self.state.lock().unwrap();
        self.check_invariants(&guard);

        let now = self.clock.now_millis();
        self.scrub_expired(&mut guard, now);

        let forward_fingerprint = match guard.table.get(&block_num) {
            Some(BlockRecord::Writing { src }) => {
                match src {
                    Some(bytes) => dest.copy_from_slice(bytes),
                    None => dest.fill(0),
                }
                guard.stats.cache_data_hits += 1;
                drop(guard);
                return Ok(());
            }
            Some(BlockRecord::Written { fingerprint, .. }) if *fingerprint == ZERO_FINGERPRINT => {
                dest.fill(0);
                guard.stats.cache_data_hits += 1;
                drop(guard);
                return Ok(());
            }
            Some(BlockRecord::Written { fingerprint, .. }) => {
                let cached = *fingerprint;
                if let Some(expected) = expect_fingerprint {
                    if expected != cached {
                        self.log_impossible_fingerprint(block_num);
                    }
                }
                Some(cached)
            }
            None => expect_fingerprint,
        };
        drop(guard);

        self.inner
            .read_block(block_num, dest, forward_fingerprint)
            .map_err(ShimError::Backend)
    }

    /// Writes a block, canonicalizing all-zero payloads to the zero representation.
    pub fn write_block(
        &self,
        block_num: u64,
        src: Option<&[u8]>,
        fingerprint: Option<Fingerprint>,
    ) -> Result<(), ShimError<B::Error>> {
        let zero_scratch = self.ensure_zero_block()?;

        let is_zero = src.map_or(true, |s| s == &zero_scratch[..]);
        let (src, fingerprint) = if is_zero {
            (None, ZERO_FINGERPRINT)
        } else {
            let bytes = src.expect("non-zero write always carries a source buffer");
            (src, fingerprint.unwrap_or_else(|| compute_fingerprint(bytes)))
        };
        let mut pending_src: Option<Bytes> = src.map(Bytes::copy_from_slice);

        let mut guard = self.state.lock().unwrap();
        loop {
            self.check_invariants(&guard);
            let now = self.clock.now_millis();
            self.scrub_expired(&mut guard, now);

            enum Disposition {
                Clean,
                Writing,
                Written { timestamp_millis: u64 },
            }
            let disposition = match guard.table.get(&block_num) {
                None => Disposition::Clean,
                Some(BlockRecord::Writing { .. }) => Disposition::Writing,
                Some(BlockRecord::Written { timestamp_millis, .. }) => Disposition::Written {
                    timestamp_millis: *timestamp_millis,
                },
            };

            match disposition {
                Disposition::Clean => {
                    if guard.table.len() >= self.config.cache_size {
                        let wake_time_millis = guard
                            .expiry
                            .head()
                            .map(|(ts, _)| ts + self.config.cache_time.as_millis() as u64);
                        let (new_guard, slept) = self.sleep_until(guard, wake_time_millis);
                        guard = new_guard;
                        guard.stats.cache_full_delay_millis += slept;
                        continue;
                    }

                    guard.table.insert(
                        block_num,
                        BlockRecord::Writing {
                            src: pending_src.take(),
                        },
                    );
                    break;
                }
                Disposition::Writing => {
                    // Another writer is in flight. Conservatively sleep out both its
                    // remaining time and the mandatory inter-write delay in one shot
                    // (the WRITING branch).
                    let deadline = now + self.config.min_write_delay.as_millis() as u64;
                    let (new_guard, slept) = self.sleep_until(guard, Some(deadline));
                    guard = new_guard;
                    guard.stats.repeated_write_delay_millis += slept;
                    continue;
                }
                Disposition::Written { timestamp_millis } => {
                    let ready_at = timestamp_millis + self.config.min_write_delay.as_millis() as u64;
                    if now < ready_at {
                        let (new_guard, slept) = self.sleep_until(guard, Some(ready_at));
                        guard = new_guard;
                        guard.stats.repeated_write_delay_millis += slept;
                        continue;
                    }

                    guard.expiry.remove(timestamp_millis, block_num);
                    guard.table.insert(
                        block_num,
                        BlockRecord::Writing {
                            src: pending_src.take(),
                        },
                    );
                    break;
                }
            }
        }
        drop(guard);

        let result = self.inner.write_block(block_num, src, fingerprint);

        let mut guard = self.state.lock().unwrap();
        self.check_invariants(&guard);
        match result {
            Err(err) => {
                guard.table.remove(&block_num);
                self.capacity_cond.notify_one();
                drop(guard);
                Err(ShimError::Backend(err))
            }
            Ok(()) => {
                let completed_at = self.clock.now_millis();
                guard.table.insert(
                    block_num,
                    BlockRecord::Written {
                        timestamp_millis: completed_at,
                        fingerprint,
                    },
                );
                guard.expiry.insert(completed_at, block_num);
                self.check_invariants(&guard);
                Ok(())
            }
        }
    }

    fn log_impossible_fingerprint(&self, block_num: u64) {
        let message = format!(
            "read_block({block_num}): caller-supplied expected fingerprint disagrees with the \
             cached value; using the cached value, which is authoritative"
        );
        (self.config.log)(LogLevel::Warn, &message);
        tracing::warn!(block_num, "impossible expected fingerprint; using cached value");
    }

    /// Lazily allocate and memoize the all-zeros scratch buffer used to
    /// detect all-zero writes.
    fn ensure_zero_block(&self) -> Result<Bytes, ShimError<B::Error>> {
        let mut guard = self.state.lock().unwrap();
        if let Some(existing) = &guard.zero_block {
            return Ok(existing.clone());
        }

        let mut buf = Vec::new();
        if buf.try_reserve_exact(self.config.block_size as usize).is_err() {
            guard.stats.out_of_memory_errors += 1;
            return Err(ShimError::OutOfMemory);
        }
        buf.resize(self.config.block_size as usize, 0);

        let bytes = Bytes::from(buf);
        guard.zero_block = Some(bytes.clone());
        Ok(bytes)
    }

    /// Pop expired WRITTEN records off the head of the expiry list.
    fn scrub_expired(&self, guard: &mut CoreState, now: u64) {
        let cache_time_millis = self.config.cache_time.as_millis() as u64;
        let mut removed = 0u32;
        while let Some((timestamp, block_num)) = guard.expiry.head() {
            if now < timestamp + cache_time_millis {
                break;
            }
            guard.expiry.pop_head();
            guard.table.remove(&block_num);
            removed += 1;
        }
        match removed {
            0 => {}
            1 => self.capacity_cond.notify_one(),
            _ => self.capacity_cond.notify_all(),
        }
    }

    /// Release the mutex, suspend until the condition is signaled or
    /// `wake_time_millis` (clock-domain, not wall-clock) is reached, then
    /// reacquire the mutex and report elapsed *real* milliseconds slept.
    ///
    /// `wake_time_millis = None` means an unbounded wait (only valid when some
    /// other writer is guaranteed to eventually signal `capacity_cond`; see
    /// the open question recorded in DESIGN.md).
    fn sleep_until<'a>(
        &'a self,
        guard: MutexGuard<'a, CoreState>,
        wake_time_millis: Option<u64>,
    ) -> (MutexGuard<'a, CoreState>, u64) {
        let started = Instant::now();
        let new_guard = match wake_time_millis {
            None => self.capacity_cond.wait(guard).unwrap(),
            Some(deadline) => {
                let now = self.clock.now_millis();
                let timeout = Duration::from_millis(deadline.saturating_sub(now));
                self.capacity_cond.wait_timeout(guard, timeout).unwrap().0
            }
        };
        (new_guard, started.elapsed().as_millis() as u64)
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self, guard: &CoreState) {
        let mut written = 0usize;
        let mut writing = 0usize;
        for (&block_num, record) in guard.table.iter() {
            match record {
                BlockRecord::Writing { .. } => writing += 1,
                BlockRecord::Written { timestamp_millis, .. } => {
                    written += 1;
                    debug_assert!(
                        guard.expiry.contains(*timestamp_millis, block_num),
                        "WRITTEN record {block_num} missing from the expiry list"
                    );
                }
            }
        }
        debug_assert_eq!(
            written,
            guard.expiry.len(),
            "expiry list must hold exactly the WRITTEN records"
        );
        debug_assert_eq!(written + writing, guard.table.len());
        debug_assert!(guard.table.len() <= self.config.cache_size);
    }

    #[cfg(not(debug_assertions))]
    fn check_invariants(&self, _guard: &CoreState) {}
}
