//! Frame buffer chains.

use super::{BufferPool, DataBuffer};
use crate::internal::constants::{MAC_ADDR_LEN, MAX_FRAME_SEGMENTS};

/// One frame as an ordered chain of [`DataBuffer`]s, with a byte cursor.
///
/// The chain owns its buffers. Dropping a non-empty chain leaks them from the
/// pool, so chains must be emptied with [`release`](Self::release) or by
/// moving the buffers elsewhere.
pub struct FrameBuffer {
    segments: [Option<DataBuffer>; MAX_FRAME_SEGMENTS],
    count: usize,
    position: usize,
}

impl FrameBuffer {
    /// An empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: [const { None }; MAX_FRAME_SEGMENTS],
            count: 0,
            position: 0,
        }
    }

    /// Build a single-buffer chain holding a copy of `data`.
    pub fn from_slice<P: BufferPool>(pool: &'static P, data: &[u8]) -> Option<Self> {
        let mut buffer = pool.allocate(data.len())?;
        buffer.as_mut_slice().copy_from_slice(data);
        let mut frame = Self::new();
        frame.segments[0] = Some(buffer);
        frame.count = 1;
        Some(frame)
    }

    /// Total number of data bytes across all segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments().map(DataBuffer::len).sum()
    }

    /// True if the chain holds no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buffers in the chain.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.count
    }

    /// True if no more buffers can be attached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count == MAX_FRAME_SEGMENTS
    }

    /// Iterate over the buffers in order.
    pub fn segments(&self) -> impl Iterator<Item = &DataBuffer> {
        self.segments[..self.count].iter().flatten()
    }

    fn segments_mut(&mut self) -> impl Iterator<Item = &mut DataBuffer> {
        self.segments[..self.count].iter_mut().flatten()
    }

    /// Append a buffer. Hands it back if the chain is full.
    pub fn attach_back(&mut self, buffer: DataBuffer) -> Result<(), DataBuffer> {
        if self.is_full() {
            return Err(buffer);
        }
        self.segments[self.count] = Some(buffer);
        self.count += 1;
        Ok(())
    }

    /// Prepend a buffer. Hands it back if the chain is full.
    pub fn attach_front(&mut self, buffer: DataBuffer) -> Result<(), DataBuffer> {
        if self.is_full() {
            return Err(buffer);
        }
        self.segments[..=self.count].rotate_right(1);
        self.segments[0] = Some(buffer);
        self.count += 1;
        self.position += self.segments[0].as_ref().map_or(0, DataBuffer::len);
        Ok(())
    }

    /// Remove and return the first buffer.
    pub fn detach_front(&mut self) -> Option<DataBuffer> {
        if self.count == 0 {
            return None;
        }
        let buffer = self.segments[0].take();
        self.segments[..self.count].rotate_left(1);
        self.count -= 1;
        let removed = buffer.as_ref().map_or(0, DataBuffer::len);
        self.position = self.position.saturating_sub(removed);
        buffer
    }

    /// Make room for `len` bytes at the front of the frame.
    ///
    /// Grows the first buffer into its headroom when it can, otherwise
    /// allocates a new front buffer from `pool`. On success the cursor is
    /// moved to offset 0; on failure nothing changes.
    pub fn insert_front<P: BufferPool>(&mut self, pool: &'static P, len: usize) -> bool {
        if len == 0 {
            self.position = 0;
            return true;
        }
        let grown = self.segments[0]
            .as_mut()
            .is_some_and(|front| front.prepend(len));
        if !grown {
            if self.is_full() {
                return false;
            }
            let Some(buffer) = pool.allocate(len) else {
                return false;
            };
            if let Err(buffer) = self.attach_front(buffer) {
                pool.release(buffer);
                return false;
            }
        }
        self.position = 0;
        true
    }

    /// Remove `len` bytes from the front of the frame, releasing buffers that
    /// become empty. Reverses [`insert_front`](Self::insert_front).
    pub fn remove_front<P: BufferPool>(&mut self, pool: &'static P, mut len: usize) {
        while len > 0 {
            let Some(front) = self.segments[0].as_mut() else {
                break;
            };
            len -= front.strip_front(len);
            if front.is_empty() {
                if let Some(empty) = self.detach_front() {
                    pool.release(empty);
                }
            }
        }
        self.position = 0;
    }

    /// Return every buffer to `pool`, leaving the chain empty.
    pub fn release<P: BufferPool>(&mut self, pool: &'static P) {
        while let Some(buffer) = self.detach_front() {
            pool.release(buffer);
        }
        self.position = 0;
    }

    /// Current cursor offset from the start of the frame.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes between the cursor and the end of the frame.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position)
    }

    /// Move the cursor. Fails (cursor unchanged) past the end of the frame.
    pub fn seek(&mut self, position: usize) -> bool {
        if position > self.len() {
            return false;
        }
        self.position = position;
        true
    }

    /// Copy bytes from the cursor into `out`, advancing the cursor.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let copied = self.copy_out(self.position, out);
        self.position += copied;
        copied
    }

    /// Overwrite bytes at the cursor with `data`, advancing the cursor.
    /// The frame never grows; returns how many bytes fit.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let mut offset = self.position;
        let mut written = 0;
        for segment in self.segments_mut() {
            let bytes = segment.as_mut_slice();
            if offset >= bytes.len() {
                offset -= bytes.len();
                continue;
            }
            let take = (bytes.len() - offset).min(data.len() - written);
            bytes[offset..offset + take].copy_from_slice(&data[written..written + take]);
            written += take;
            offset = 0;
            if written == data.len() {
                break;
            }
        }
        self.position += written;
        written
    }

    /// Copy the whole frame (ignoring the cursor) into `out`.
    pub fn copy_to(&self, out: &mut [u8]) -> usize {
        self.copy_out(0, out)
    }

    fn copy_out(&self, mut offset: usize, out: &mut [u8]) -> usize {
        let mut copied = 0;
        for segment in self.segments() {
            let bytes = segment.as_slice();
            if offset >= bytes.len() {
                offset -= bytes.len();
                continue;
            }
            let take = (bytes.len() - offset).min(out.len() - copied);
            out[copied..copied + take].copy_from_slice(&bytes[offset..offset + take]);
            copied += take;
            offset = 0;
            if copied == out.len() {
                break;
            }
        }
        copied
    }

    /// Read a MAC address at the cursor.
    pub fn read_mac(&mut self) -> Option<[u8; MAC_ADDR_LEN]> {
        let mut addr = [0u8; MAC_ADDR_LEN];
        (self.remaining() >= MAC_ADDR_LEN && self.read(&mut addr) == MAC_ADDR_LEN).then_some(addr)
    }

    /// Read a big-endian `u16` at the cursor.
    pub fn read_u16_be(&mut self) -> Option<u16> {
        let mut bytes = [0u8; 2];
        (self.remaining() >= 2 && self.read(&mut bytes) == 2).then(|| u16::from_be_bytes(bytes))
    }

    /// Write a MAC address at the cursor.
    pub fn write_mac(&mut self, addr: &[u8; MAC_ADDR_LEN]) -> bool {
        self.remaining() >= MAC_ADDR_LEN && self.write(addr) == MAC_ADDR_LEN
    }

    /// Write a big-endian `u16` at the cursor.
    pub fn write_u16_be(&mut self, value: u16) -> bool {
        self.remaining() >= 2 && self.write(&value.to_be_bytes()) == 2
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("len", &self.len())
            .field("segments", &self.count)
            .field("position", &self.position)
            .finish()
    }
}
