//! TX and RX DMA descriptor structures.
//!
//! Descriptors use the normal (4-word) layout in ring mode: word 2 and word 3
//! each hold a buffer address, and the last descriptor carries the
//! end-of-ring flag so the DMA wraps back to the list base.

pub mod bits;
pub mod rx;
pub mod tx;

pub use rx::RxDescriptor;
pub use tx::TxDescriptor;

/// Volatile cell wrapper for descriptor fields
///
/// Ensures all accesses are volatile so the compiler never caches or
/// reorders descriptor words the DMA engine also reads and writes.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// SAFETY: every access is a single volatile read or write of a word-sized
// value, which is atomic on Cortex-M.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Create a new volatile cell with the given initial value
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            value: core::cell::UnsafeCell::new(value),
        }
    }

    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        // SAFETY: the pointer comes from our own UnsafeCell
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        // SAFETY: the pointer comes from our own UnsafeCell
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Update the value using a function (read-modify-write)
    #[inline(always)]
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let old = self.get();
        self.set(f(old));
    }
}

/// Operations the ring needs from either descriptor kind.
pub(crate) trait Descriptor {
    /// A zeroed descriptor
    const EMPTY: Self;

    /// True while the DMA engine owns the descriptor
    fn is_owned(&self) -> bool;

    /// Clear status, sizes and buffer addresses, keeping or setting the
    /// end-of-ring flag as requested.
    fn reset(&self, end_of_ring: bool);
}
