//! Fixed-Capacity Byte Ring Implementation

use crate::error::RingError;
use crate::source::{ByteSource, IngestReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default ring capacity (bytes), matching the firmware receive buffer
pub const DEFAULT_CAPACITY: usize = 32;

/// What `push` does when the ring already holds `capacity` unread bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// No full check: the write index advances unconditionally and the
    /// oldest unread byte is overwritten. `available()` is derived from the
    /// indices alone, so it undercounts once the ring has wrapped.
    #[default]
    Overwrite,
    /// Reject the incoming byte and report `BufferOverflow`
    DropNewest,
    /// Evict the oldest unread byte, store the incoming one, and report
    /// `BufferOverflow`
    DropOldest,
}

/// Single-threaded circular byte queue fed by the serial receiver
#[derive(Debug)]
pub struct ByteRing {
    /// Pre-allocated storage, zeroed at creation
    storage: Box<[u8]>,
    /// Capacity of the ring
    capacity: usize,
    /// Next byte to read
    read_index: usize,
    /// Next slot to write
    write_index: usize,
    /// Unread byte count, tracked for the hardened policies
    len: usize,
    /// Behavior on a full ring
    policy: OverflowPolicy,
    /// Total bytes stored (for statistics)
    total_written: usize,
    /// Total overflow events
    overflow_count: usize,
}

impl ByteRing {
    /// Create a ring with the reference `Overwrite` policy
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, OverflowPolicy::Overwrite)
    }

    /// Create a ring with an explicit overflow policy
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_policy(capacity: usize, policy: OverflowPolicy) -> Self {
        assert!(capacity > 0, "Ring capacity must be > 0");
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            capacity,
            read_index: 0,
            write_index: 0,
            len: 0,
            policy,
            total_written: 0,
            overflow_count: 0,
        }
    }

    /// Create a ring with default capacity (32 bytes)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Append one byte, applying the overflow policy if the ring is full
    pub fn push(&mut self, byte: u8) -> Result<(), RingError> {
        match self.policy {
            OverflowPolicy::Overwrite => {
                if self.len == self.capacity {
                    // Unread data is being clobbered; nothing is reported.
                    self.overflow_count += 1;
                } else {
                    self.len += 1;
                }
                self.store(byte);
                Ok(())
            }
            OverflowPolicy::DropNewest => {
                if self.len == self.capacity {
                    self.overflow_count += 1;
                    return Err(RingError::BufferOverflow {
                        capacity: self.capacity,
                    });
                }
                self.len += 1;
                self.store(byte);
                Ok(())
            }
            OverflowPolicy::DropOldest => {
                if self.len == self.capacity {
                    self.read_index = (self.read_index + 1) % self.capacity;
                    self.overflow_count += 1;
                    self.store(byte);
                    return Err(RingError::BufferOverflow {
                        capacity: self.capacity,
                    });
                }
                self.len += 1;
                self.store(byte);
                Ok(())
            }
        }
    }

    fn store(&mut self, byte: u8) {
        self.storage[self.write_index] = byte;
        self.write_index = (self.write_index + 1) % self.capacity;
        self.total_written += 1;
    }

    /// Number of unread bytes
    ///
    /// Under `Overwrite` this is `(write - read + C) mod C`, which reads 0
    /// when exactly `capacity` bytes are unread and drifts after overflow.
    pub fn available(&self) -> usize {
        match self.policy {
            OverflowPolicy::Overwrite => {
                (self.write_index + self.capacity - self.read_index) % self.capacity
            }
            OverflowPolicy::DropNewest | OverflowPolicy::DropOldest => self.len,
        }
    }

    /// Copy `dest.len()` bytes out in FIFO order and advance the read index
    ///
    /// Fails without touching the ring if fewer bytes are available.
    pub fn pop_into(&mut self, dest: &mut [u8]) -> Result<(), RingError> {
        let available = self.available();
        if dest.len() > available {
            return Err(RingError::Underflow {
                requested: dest.len(),
                available,
            });
        }

        for slot in dest.iter_mut() {
            *slot = self.storage[self.read_index];
            self.read_index = (self.read_index + 1) % self.capacity;
        }
        self.len -= dest.len().min(self.len);
        Ok(())
    }

    /// Pop a single byte
    pub fn pop(&mut self) -> Option<u8> {
        let mut byte = [0u8];
        self.pop_into(&mut byte).ok().map(|_| byte[0])
    }

    /// Drain a byte source into the ring
    ///
    /// Every byte the source yields is pushed; overflow is logged and
    /// counted but never stops ingestion.
    pub fn ingest<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> IngestReport {
        let mut report = IngestReport::default();
        while let Some(byte) = source.read_byte() {
            report.received += 1;
            if let Err(e) = self.push(byte) {
                report.overflowed += 1;
                warn!("Dropped byte {:02X}: {}", byte, e);
            }
        }
        if report.received > 0 {
            debug!(
                "Ingested {} bytes ({} unread)",
                report.received,
                self.available()
            );
        }
        report
    }

    /// Check if ring is empty
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Check if ring holds `capacity` unread bytes
    ///
    /// Always false under `Overwrite`, whose index arithmetic cannot
    /// represent a full ring.
    pub fn is_full(&self) -> bool {
        self.available() == self.capacity
    }

    /// Get the ring capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the overflow policy
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.available() as f64 / self.capacity as f64
    }

    /// Get total bytes stored (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Get the number of overflow events so far
    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    /// Discard all unread bytes
    pub fn clear(&mut self) {
        self.read_index = self.write_index;
        self.len = 0;
    }
}

impl Default for ByteRing {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
