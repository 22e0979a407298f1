//! Frame buffers and the buffer pool seam.
//!
//! - [`DataBuffer`]: one exclusively owned region handed out by a pool
//! - [`FrameBuffer`]: an ordered chain of data buffers holding one frame
//! - [`BufferPool`]: the allocator the driver draws RX buffers from and
//!   returns every buffer to
//! - [`StaticPool`]: a two-class, fixed-capacity pool usable from both the
//!   interrupt and the poll context
//!
//! Buffers are never freed implicitly. Whoever holds a buffer when it is
//! no longer needed must hand it back with [`BufferPool::release`] (or
//! [`FrameBuffer::release`] for a whole chain).

mod chain;
mod pool;

pub use chain::FrameBuffer;
pub use pool::{BufferPool, StaticPool};

use core::ptr::NonNull;

/// An exclusively owned byte region borrowed from a [`BufferPool`].
///
/// Valid data lives at `[head, head + len)` inside the region. Space before
/// `head` is headroom that [`prepend`](Self::prepend) can grow into, which is
/// how link-layer headers are added without copying the payload.
pub struct DataBuffer {
    ptr: NonNull<u8>,
    capacity: u16,
    head: u16,
    len: u16,
    tag: u16,
}

// SAFETY: a DataBuffer is the only handle to its region until it is released.
unsafe impl Send for DataBuffer {}

impl DataBuffer {
    /// Wrap a pool region.
    ///
    /// The `len` bytes of valid data are placed at the end of the region, so
    /// the remainder is headroom. `tag` is opaque to everyone but the pool.
    ///
    /// # Safety
    /// `ptr` must point to `capacity` bytes that stay valid, and that nobody
    /// else reads or writes, until the buffer is handed back to its pool.
    #[must_use]
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, capacity: usize, len: usize, tag: u16) -> Self {
        let capacity = capacity.min(u16::MAX as usize);
        let len = len.min(capacity);
        Self {
            ptr,
            capacity: capacity as u16,
            head: (capacity - len) as u16,
            len: len as u16,
            tag,
        }
    }

    /// Pool bookkeeping tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Start of the whole region, regardless of headroom.
    #[inline]
    #[must_use]
    pub fn region_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Number of valid bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True if the buffer holds no data.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the whole region.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Free bytes in front of the data.
    #[inline]
    #[must_use]
    pub fn headroom(&self) -> usize {
        self.head as usize
    }

    /// The valid bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: head + len never exceeds capacity, and the region is ours
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr().add(self.head as usize), self.len()) }
    }

    /// The valid bytes, mutably.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: head + len never exceeds capacity, and the region is ours
        unsafe {
            core::slice::from_raw_parts_mut(self.ptr.as_ptr().add(self.head as usize), self.len())
        }
    }

    /// Bus address of the first valid byte, as programmed into a descriptor.
    #[inline]
    #[must_use]
    pub fn dma_address(&self) -> u32 {
        (self.ptr.as_ptr() as usize + self.head as usize) as u32
    }

    /// Grow the data `n` bytes into the headroom. Fails if headroom is short.
    pub fn prepend(&mut self, n: usize) -> bool {
        if n > self.headroom() {
            return false;
        }
        self.head -= n as u16;
        self.len += n as u16;
        true
    }

    /// Drop up to `n` bytes from the front, returning how many were dropped.
    pub fn strip_front(&mut self, n: usize) -> usize {
        let n = n.min(self.len());
        self.head += n as u16;
        self.len -= n as u16;
        n
    }

    /// Shorten the data to `len` bytes. Longer values are ignored.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.len = len as u16;
        }
    }

    /// Make the data span the whole region (headroom becomes zero).
    pub fn fill_region(&mut self) {
        self.head = 0;
        self.len = self.capacity;
    }
}

impl core::fmt::Debug for DataBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataBuffer")
            .field("len", &self.len)
            .field("headroom", &self.head)
            .field("capacity", &self.capacity)
            .field("tag", &self.tag)
            .finish()
    }
}
