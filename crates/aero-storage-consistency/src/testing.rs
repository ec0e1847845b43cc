//! An in-memory [`BlockBackend`] double for exercising the shim without a
//! real object-store transport, the way `aero-storage`'s `MemBackend` stands
//! in for a real disk image in `VirtualDisk` tests.
//!
//! Exported (not `#[cfg(test)]`-gated) so both this crate's own tests and
//! downstream integration tests can use it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::backend::BlockBackend;
use crate::fingerprint::{compute_fingerprint, Fingerprint, ZERO_FINGERPRINT};

#[derive(Debug, Error)]
pub enum MemBackendError {
    #[error("simulated write failure for block {0}")]
    SimulatedWriteFailure(u64),
    #[error("fingerprint mismatch for block {block_num}")]
    FingerprintMismatch { block_num: u64 },
}

struct Slot {
    data: Vec<u8>,
    fingerprint: Fingerprint,
}

struct State {
    blocks: HashMap<u64, Slot>,
    fail_next_write: HashSet<u64>,
}

/// A backend that stores blocks in memory, verifies fingerprints on read the
/// way a real backend is required to, and lets tests schedule a single
/// write failure for a given block.
pub struct MemBackend {
    block_size: u32,
    file_size: u64,
    state: Mutex<State>,
    write_calls: AtomicU64,
}

impl MemBackend {
    pub fn new(block_size: u32, file_size: u64) -> Self {
        Self {
            block_size,
            file_size,
            state: Mutex::new(State {
                blocks: HashMap::new(),
                fail_next_write: HashSet::new(),
            }),
            write_calls: AtomicU64::new(0),
        }
    }

    /// The next `write_block` for `block_num` fails once, then clears.
    pub fn fail_next_write(&self, block_num: u64) {
        self.state.lock().unwrap().fail_next_write.insert(block_num);
    }

    pub fn write_call_count(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn stored_block(&self, block_num: u64) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .blocks
            .get(&block_num)
            .map(|slot| slot.data.clone())
    }
}

impl BlockBackend for MemBackend {
    type Error = MemBackendError;

    fn read_block(
        &self,
        block_num: u64,
        dest: &mut [u8],
        expect_fingerprint: Option<Fingerprint>,
    ) -> Result<(), Self::Error> {
        let state = self.state.lock().unwrap();
        match state.blocks.get(&block_num) {
            Some(slot) => {
                if let Some(expected) = expect_fingerprint {
                    if expected != slot.fingerprint {
                        return Err(MemBackendError::FingerprintMismatch { block_num });
                    }
                }
                dest.copy_from_slice(&slot.data);
            }
            None => dest.fill(0),
        }
        Ok(())
    }

    fn write_block(
        &self,
        block_num: u64,
        src: Option<&[u8]>,
        fingerprint: Fingerprint,
    ) -> Result<(), Self::Error> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        if state.fail_next_write.remove(&block_num) {
            return Err(MemBackendError::SimulatedWriteFailure(block_num));
        }

        let data = match src {
            Some(bytes) => bytes.to_vec(),
            None => vec![0u8; self.block_size as usize],
        };
        debug_assert_eq!(
            if fingerprint == ZERO_FINGERPRINT {
                ZERO_FINGERPRINT
            } else {
                compute_fingerprint(&data)
            },
            fingerprint
        );
        state.blocks.insert(block_num, Slot { data, fingerprint });
        Ok(())
    }

    fn detect_sizes(&self) -> Result<(u64, u32), Self::Error> {
        Ok((self.file_size, self.block_size))
    }

    fn destroy(&self) {}
}
