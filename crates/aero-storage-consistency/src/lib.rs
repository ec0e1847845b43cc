//! A post-write consistency shim for block stores whose write visibility is
//! only eventually consistent.
//!
//! Wraps a [`BlockBackend`] and masks two hazards of such a backend: reads
//! issued too soon after a write observing stale data, and a rapid second
//! write of the same block racing the first. It does this by imposing a
//! minimum inter-write delay per block and caching each recently-written
//! block's fingerprint so later reads can be verified against whatever the
//! backend returns.
//!
//! This is not a data cache: it does not serve read payloads from memory
//! except transiently while a write is in flight. It is not a write
//! coalescer, not a backend retry controller, and not a durability layer;
//! its state is purely in-memory and lost on teardown.

mod backend;
mod clock;
mod config;
mod error;
mod expiry;
mod fingerprint;
mod record;
mod shim;
mod stats;

pub mod testing;

pub use backend::BlockBackend;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, LogLevel, LogSink};
pub use error::ShimError;
pub use fingerprint::{compute_fingerprint, Fingerprint, ZERO_FINGERPRINT};
pub use shim::ConsistencyShim;
pub use stats::Stats;
