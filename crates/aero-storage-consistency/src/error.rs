use thiserror::Error;

/// Errors that can originate in the shim itself, wrapping whatever error type
/// the backing store (`B::Error`) uses.
///
/// Backend errors, including fingerprint mismatches raised by the inner
/// store's own read-verification, are forwarded unchanged; this type never
/// inspects or retries them.
#[derive(Debug, Error)]
pub enum ShimError<E: std::error::Error + 'static> {
    /// A record or the zero-block scratch buffer could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// `block_size == 0`, or `cache_time < min_write_delay`, at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Forwarded from the inner store.
    #[error(transparent)]
    Backend(#[from] E),
}
