use crate::fingerprint::Fingerprint;

/// The downward interface the shim consumes from the eventually-consistent
/// backing store.
///
/// Implementations must treat a `None` `src` in [`BlockBackend::write_block`]
/// as an all-zeros payload (typically mapped to deletion of the underlying
/// object), and must verify an incoming `expect_fingerprint` against
/// retrieved data in [`BlockBackend::read_block`], returning a distinguishable
/// mismatch error when it disagrees.
///
/// Called concurrently from multiple threads; implementations are expected to
/// handle their own internal synchronization the way a real HTTP-to-object-store
/// client would (the shim serializes writes to a given block, but never calls
/// into the backend while holding its own lock).
pub trait BlockBackend: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn read_block(
        &self,
        block_num: u64,
        dest: &mut [u8],
        expect_fingerprint: Option<Fingerprint>,
    ) -> Result<(), Self::Error>;

    fn write_block(
        &self,
        block_num: u64,
        src: Option<&[u8]>,
        fingerprint: Fingerprint,
    ) -> Result<(), Self::Error>;

    fn detect_sizes(&self) -> Result<(u64, u32), Self::Error>;

    fn destroy(&self);
}
