//! Fixed size-class buffer pool.

use core::cell::UnsafeCell;
use core::ptr::NonNull;

use super::DataBuffer;
use crate::sync::CriticalSectionCell;

/// Allocator the driver takes RX buffers from and returns buffers to.
///
/// Both methods are called from the poll context and from the interrupt
/// context, so implementations must be interrupt-safe and must never block.
/// The pool has to outlive every buffer it hands out, hence `&'static self`.
pub trait BufferPool: Sync {
    /// Hand out a buffer holding `len` bytes of (uninitialized) data, with
    /// any spare capacity in front as headroom. `None` when exhausted.
    fn allocate(&'static self, len: usize) -> Option<DataBuffer>;

    /// Take a buffer back.
    fn release(&'static self, buffer: DataBuffer);
}

#[repr(C, align(4))]
struct Block<const SIZE: usize>([u8; SIZE]);

const CLASS_LARGE: u16 = 1 << 15;

struct FreeMasks {
    small: u64,
    large: u64,
}

const fn full_mask(count: usize) -> u64 {
    if count == 64 { u64::MAX } else { (1u64 << count) - 1 }
}

/// A pool of `SMALL_COUNT` buffers of `SMALL` bytes and `LARGE_COUNT`
/// buffers of `LARGE` bytes, backed by in-place storage.
///
/// Requests go to the smallest class that fits and spill into the large
/// class when the small one is exhausted. Each class holds at most 64
/// buffers. Blocks are word aligned for the DMA engine.
///
/// ```ignore
/// static POOL: StaticPool<256, 16, 1536, 16> = StaticPool::new();
/// ```
pub struct StaticPool<
    const SMALL: usize,
    const SMALL_COUNT: usize,
    const LARGE: usize,
    const LARGE_COUNT: usize,
> {
    small: UnsafeCell<[Block<SMALL>; SMALL_COUNT]>,
    large: UnsafeCell<[Block<LARGE>; LARGE_COUNT]>,
    free: CriticalSectionCell<FreeMasks>,
}

// SAFETY: block storage is only reached through DataBuffers, and the free
// masks hand each block to at most one DataBuffer at a time.
unsafe impl<const S: usize, const SC: usize, const L: usize, const LC: usize> Sync
    for StaticPool<S, SC, L, LC>
{
}

impl<const SMALL: usize, const SMALL_COUNT: usize, const LARGE: usize, const LARGE_COUNT: usize>
    StaticPool<SMALL, SMALL_COUNT, LARGE, LARGE_COUNT>
{
    /// Create an empty pool (const, suitable for static initialization).
    #[must_use]
    pub const fn new() -> Self {
        assert!(SMALL_COUNT <= 64 && LARGE_COUNT <= 64, "at most 64 buffers per class");
        assert!(SMALL <= LARGE, "small class must not exceed large class");
        assert!(LARGE <= u16::MAX as usize, "buffer size must fit in 16 bits");
        Self {
            small: UnsafeCell::new([const { Block([0; SMALL]) }; SMALL_COUNT]),
            large: UnsafeCell::new([const { Block([0; LARGE]) }; LARGE_COUNT]),
            free: CriticalSectionCell::new(FreeMasks {
                small: full_mask(SMALL_COUNT),
                large: full_mask(LARGE_COUNT),
            }),
        }
    }

    /// Free buffers per class as `(small, large)`.
    pub fn available(&self) -> (usize, usize) {
        self.free
            .with(|m| (m.small.count_ones() as usize, m.large.count_ones() as usize))
    }

    /// Total number of buffers in the pool.
    pub const fn capacity(&self) -> usize {
        SMALL_COUNT + LARGE_COUNT
    }

    fn take_slot(&self, len: usize) -> Option<(u16, bool)> {
        self.free.with(|m| {
            if len <= SMALL && m.small != 0 {
                let index = m.small.trailing_zeros();
                m.small &= !(1 << index);
                return Some((index as u16, false));
            }
            if len <= LARGE && m.large != 0 {
                let index = m.large.trailing_zeros();
                m.large &= !(1 << index);
                return Some((index as u16, true));
            }
            None
        })
    }

    fn block_ptr(&self, index: usize, large: bool) -> Option<NonNull<u8>> {
        let ptr = if large {
            self.large.get().cast::<u8>().wrapping_add(index * LARGE)
        } else {
            self.small.get().cast::<u8>().wrapping_add(index * SMALL)
        };
        NonNull::new(ptr)
    }
}

impl<const SMALL: usize, const SMALL_COUNT: usize, const LARGE: usize, const LARGE_COUNT: usize>
    Default for StaticPool<SMALL, SMALL_COUNT, LARGE, LARGE_COUNT>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const SMALL: usize, const SMALL_COUNT: usize, const LARGE: usize, const LARGE_COUNT: usize>
    BufferPool for StaticPool<SMALL, SMALL_COUNT, LARGE, LARGE_COUNT>
{
    fn allocate(&'static self, len: usize) -> Option<DataBuffer> {
        let (index, large) = self.take_slot(len)?;
        let ptr = self.block_ptr(index as usize, large)?;
        let (capacity, tag) = if large {
            (LARGE, index | CLASS_LARGE)
        } else {
            (SMALL, index)
        };
        // SAFETY: the block was just removed from the free mask, so this
        // DataBuffer is its only handle, and the pool is 'static.
        Some(unsafe { DataBuffer::from_raw_parts(ptr, capacity, len, tag) })
    }

    fn release(&'static self, buffer: DataBuffer) {
        let tag = buffer.tag();
        let large = tag & CLASS_LARGE != 0;
        let index = u32::from(tag & !CLASS_LARGE);
        debug_assert_eq!(
            self.block_ptr(index as usize, large),
            Some(buffer.region_ptr()),
            "buffer released to the wrong pool"
        );
        self.free.with(|m| {
            let mask = if large { &mut m.large } else { &mut m.small };
            debug_assert_eq!(*mask & (1 << index), 0, "double release");
            *mask |= 1 << index;
        });
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::boxed::Box;
    use std::vec::Vec;

    use super::*;

    type TestPool = StaticPool<64, 4, 512, 2>;

    fn pool() -> &'static TestPool {
        Box::leak(Box::new(TestPool::new()))
    }

    #[test]
    fn new_pool_is_full() {
        let pool = pool();
        assert_eq!(pool.available(), (4, 2));
        assert_eq!(pool.capacity(), 6);
    }

    #[test]
    fn small_request_uses_small_class() {
        let pool = pool();
        let buf = pool.allocate(46).unwrap();
        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.len(), 46);
        assert_eq!(buf.headroom(), 18);
        assert_eq!(pool.available(), (3, 2));
        pool.release(buf);
        assert_eq!(pool.available(), (4, 2));
    }

    #[test]
    fn large_request_uses_large_class() {
        let pool = pool();
        let buf = pool.allocate(300).unwrap();
        assert_eq!(buf.capacity(), 512);
        assert_eq!(pool.available(), (4, 1));
        pool.release(buf);
    }

    #[test]
    fn small_class_spills_into_large() {
        let pool = pool();
        let held: Vec<_> = (0..4).map(|_| pool.allocate(10).unwrap()).collect();
        let spilled = pool.allocate(10).unwrap();
        assert_eq!(spilled.capacity(), 512);
        pool.release(spilled);
        for buf in held {
            pool.release(buf);
        }
        assert_eq!(pool.available(), (4, 2));
    }

    #[test]
    fn exhaustion_and_oversize_return_none() {
        let pool = pool();
        assert!(pool.allocate(513).is_none());
        let a = pool.allocate(512).unwrap();
        let b = pool.allocate(512).unwrap();
        assert!(pool.allocate(512).is_none());
        pool.release(a);
        pool.release(b);
    }

    #[test]
    fn distinct_buffers_do_not_alias() {
        let pool = pool();
        let mut a = pool.allocate(64).unwrap();
        let mut b = pool.allocate(64).unwrap();
        a.as_mut_slice().fill(0xAA);
        b.as_mut_slice().fill(0x55);
        assert!(a.as_slice().iter().all(|&x| x == 0xAA));
        assert_ne!(a.dma_address(), b.dma_address());
        assert_eq!(a.dma_address() % 4, 0);
        pool.release(a);
        pool.release(b);
    }
}
