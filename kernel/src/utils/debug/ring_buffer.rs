/*
 * Ring Buffer for Logging
 *
 * Fixed-size circular byte buffer backing the kernel log.
 *
 * Design:
 * - Capacity fixed at compile time, no heap allocations
 * - Overwrite on overflow (loses the oldest bytes)
 * - Not synchronized itself; the owner wraps it in a lock
 */

/// Circular byte buffer holding the newest `N` bytes written
pub struct RingBuffer<const N: usize> {
    /// Circular buffer storage
    buffer: [u8; N],

    /// Read position (oldest byte)
    tail: usize,

    /// Number of bytes stored
    len: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Create a new empty ring buffer
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            tail: 0,
            len: 0,
        }
    }

    /// Append bytes, overwriting the oldest data when full
    ///
    /// Returns the number of bytes written. Input longer than the
    /// capacity keeps only its last `N` bytes.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if N == 0 {
            return 0;
        }

        let data = if data.len() > N {
            &data[data.len() - N..]
        } else {
            data
        };

        for &byte in data {
            let head = (self.tail + self.len) % N;
            self.buffer[head] = byte;
            if self.len == N {
                // Full: the oldest byte was just overwritten.
                self.tail = (self.tail + 1) % N;
            } else {
                self.len += 1;
            }
        }

        data.len()
    }

    /// Drain up to `dest.len()` of the oldest bytes into `dest`
    ///
    /// Returns the number of bytes read.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let to_read = self.len.min(dest.len());

        for (i, slot) in dest.iter_mut().take(to_read).enumerate() {
            *slot = self.buffer[(self.tail + i) % N];
        }

        if to_read > 0 {
            self.tail = (self.tail + to_read) % N;
            self.len -= to_read;
        }
        to_read
    }

    /// Check if the ring buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of bytes currently in the buffer
    pub fn len(&self) -> usize {
        self.len
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
