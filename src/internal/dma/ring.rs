//! Descriptor rings paired with software ownership slots.
//!
//! Every hardware descriptor has a [`Slot`] next to it. The slot's tag says
//! who may touch the descriptor and its buffers:
//!
//! - `Free`: the driver owns it and nobody is working on it
//! - `Claimed`: one context is mutating it; the other must skip it
//! - `Hardware`: the DMA engine owns it (OWN set, or just cleared and not
//!   yet reclaimed)
//!
//! Moving out of `Free` or `Hardware` is a compare-exchange, so the poll and
//! interrupt contexts never work on the same slot at once.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use super::descriptor::Descriptor;
use crate::buffer::{BufferPool, DataBuffer};

/// Ownership tag of a descriptor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum SlotState {
    Free = 0,
    Claimed = 1,
    Hardware = 2,
}

impl SlotState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Free,
            1 => Self::Claimed,
            _ => Self::Hardware,
        }
    }
}

/// Software half of a descriptor.
pub(crate) struct Slot {
    state: AtomicU8,
    seq: AtomicU32,
    buffers: UnsafeCell<[Option<DataBuffer>; 2]>,
}

// SAFETY: `buffers` is only reached through a SlotClaim, and a claim can only
// be taken by winning the compare-exchange on `state`.
unsafe impl Sync for Slot {}

impl Slot {
    const fn new() -> Self {
        Self {
            state: AtomicU8::new(SlotState::Free as u8),
            seq: AtomicU32::new(0),
            buffers: UnsafeCell::new([None, None]),
        }
    }

    pub(crate) fn state(&self) -> SlotState {
        SlotState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Sequence number of the frame this slot carries, 0 if none.
    pub(crate) fn seq(&self) -> u32 {
        self.seq.load(Ordering::Relaxed)
    }

    /// Move the slot from `from` to `Claimed`. Fails if the tag is anything else.
    pub(crate) fn claim(&self, from: SlotState) -> Option<SlotClaim<'_>> {
        self.state
            .compare_exchange(
                from as u8,
                SlotState::Claimed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| SlotClaim {
                slot: self,
                release_as: SlotState::Free,
            })
    }
}

/// Exclusive access to one slot. Publishes the slot as `Free` when dropped,
/// or as `Hardware` after [`hand_to_hardware`](Self::hand_to_hardware).
pub(crate) struct SlotClaim<'a> {
    slot: &'a Slot,
    release_as: SlotState,
}

impl SlotClaim<'_> {
    pub(crate) fn buffers(&mut self) -> &mut [Option<DataBuffer>; 2] {
        // SAFETY: holding the claim is exclusive access to the buffers
        unsafe { &mut *self.slot.buffers.get() }
    }

    pub(crate) fn set_seq(&mut self, seq: u32) {
        self.slot.seq.store(seq, Ordering::Relaxed);
    }

    /// Return every attached buffer to `pool`.
    pub(crate) fn release_buffers<P: BufferPool>(&mut self, pool: &'static P) {
        for buffer in self.buffers().iter_mut().filter_map(Option::take) {
            pool.release(buffer);
        }
    }

    /// Publish the slot as hardware-owned when the claim ends.
    pub(crate) fn hand_to_hardware(mut self) {
        self.release_as = SlotState::Hardware;
    }
}

impl Drop for SlotClaim<'_> {
    fn drop(&mut self) {
        self.slot.state.store(self.release_as as u8, Ordering::Release);
    }
}

/// Fixed array of descriptors with their slots.
pub(crate) struct DescriptorRing<D, const N: usize> {
    descriptors: [D; N],
    slots: [Slot; N],
}

impl<D: Descriptor, const N: usize> DescriptorRing<D, N> {
    /// All descriptors zeroed, all slots `Free`.
    pub(crate) const fn new() -> Self {
        Self {
            descriptors: [const { D::EMPTY }; N],
            slots: [const { Slot::new() }; N],
        }
    }

    #[cfg(test)]
    pub(crate) const fn len(&self) -> usize {
        N
    }

    #[inline(always)]
    pub(crate) fn descriptor(&self, index: usize) -> &D {
        &self.descriptors[index % N]
    }

    #[inline(always)]
    pub(crate) fn slot(&self, index: usize) -> &Slot {
        &self.slots[index % N]
    }

    #[inline(always)]
    pub(crate) const fn next_index(index: usize) -> usize {
        (index + 1) % N
    }

    #[inline(always)]
    pub(crate) const fn is_last(index: usize) -> bool {
        index + 1 == N
    }

    /// Bus address of the first descriptor, for the list address registers.
    pub(crate) fn base_addr(&self) -> u32 {
        self.descriptors.as_ptr() as usize as u32
    }

    /// Release the buffers of every slot and reset every descriptor.
    ///
    /// Slots another context holds are skipped and reported back as `false`.
    pub(crate) fn reset_all<P: BufferPool>(&self, pool: &'static P) -> bool {
        let mut complete = true;
        for index in 0..N {
            let slot = &self.slots[index];
            let claim = slot
                .claim(SlotState::Free)
                .or_else(|| slot.claim(SlotState::Hardware));
            let Some(mut claim) = claim else {
                complete = false;
                continue;
            };
            claim.release_buffers(pool);
            claim.set_seq(0);
            self.descriptors[index].reset(Self::is_last(index));
        }
        complete
    }
}
