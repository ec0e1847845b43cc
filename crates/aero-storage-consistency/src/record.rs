use bytes::Bytes;

use crate::fingerprint::Fingerprint;

/// A tracked block.
///
/// The state (WRITING vs WRITTEN) and its associated data are carried
/// together in one enum rather than a separate state tag plus a
/// sentinel-valued timestamp field, so a WRITTEN record completing at
/// timestamp `0` can never be confused with WRITING.
#[derive(Debug, Clone)]
pub(crate) enum BlockRecord {
    Writing { src: Option<Bytes> },
    Written {
        timestamp_millis: u64,
        fingerprint: Fingerprint,
    },
}
