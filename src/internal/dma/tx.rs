//! Transmit path: ring enqueue and completion reclaim.

use core::sync::atomic::{Ordering, fence};

use super::descriptor::{Descriptor, TxDescriptor};
use super::ring::{DescriptorRing, SlotClaim, SlotState};
use crate::buffer::{BufferPool, FrameBuffer};
use crate::driver::error::DmaError;
use crate::internal::constants::{MAX_BUFFER_SIZE, MAX_FRAME_SEGMENTS};

/// Most descriptors one frame can span (two buffers each).
pub(crate) const MAX_DESCRIPTORS_PER_FRAME: usize = MAX_FRAME_SEGMENTS.div_ceil(2);

/// Poll-side writer into the TX ring.
pub(crate) struct TxSubmitter {
    cursor: usize,
}

impl TxSubmitter {
    pub(crate) const fn new() -> Self {
        Self { cursor: 0 }
    }

    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Move every buffer of `frame` into consecutive `Free` slots.
    ///
    /// Either the whole frame is handed to the DMA and `frame` is left empty,
    /// or nothing changes and `frame` is untouched.
    pub(crate) fn enqueue<const N: usize>(
        &mut self,
        ring: &DescriptorRing<TxDescriptor, N>,
        frame: &mut FrameBuffer,
        seq: u32,
        checksum_offload: bool,
    ) -> Result<(), DmaError> {
        if frame.segments().any(|buffer| buffer.len() > MAX_BUFFER_SIZE) {
            return Err(DmaError::BufferTooLarge);
        }
        let needed = frame.segment_count().div_ceil(2);
        if needed == 0 || needed > N {
            return Err(DmaError::QueueFull);
        }

        // dropping the array on any early return hands the slots back as Free
        let mut claims: [Option<SlotClaim<'_>>; MAX_DESCRIPTORS_PER_FRAME] =
            [const { None }; MAX_DESCRIPTORS_PER_FRAME];
        for (k, claim) in claims.iter_mut().take(needed).enumerate() {
            let index = (self.cursor + k) % N;
            *claim = Some(
                ring.slot(index)
                    .claim(SlotState::Free)
                    .ok_or(DmaError::QueueFull)?,
            );
        }

        for (k, claim) in claims.iter_mut().take(needed).flatten().enumerate() {
            let index = (self.cursor + k) % N;
            let first = frame.detach_front();
            let second = frame.detach_front();
            let buffer1 = first.as_ref().map_or((0, 0), |b| (b.dma_address(), b.len()));
            let buffer2 = second.as_ref().map(|b| (b.dma_address(), b.len()));
            let descriptor = ring.descriptor(index);
            descriptor.reset(DescriptorRing::<TxDescriptor, N>::is_last(index));
            descriptor.prepare(buffer1, buffer2, k == 0, k + 1 == needed, checksum_offload);
            *claim.buffers() = [first, second];
            claim.set_seq(seq);
        }

        // hand over back to front so the DMA never starts on a partial frame
        for k in (0..needed).rev() {
            let index = (self.cursor + k) % N;
            if let Some(claim) = claims[k].take() {
                fence(Ordering::Release);
                ring.descriptor(index).set_owned();
                claim.hand_to_hardware();
            }
        }
        self.cursor = (self.cursor + needed) % N;
        Ok(())
    }
}

/// Interrupt-side completion walker over the TX ring.
pub(crate) struct TxReclaimer {
    cursor: usize,
    frame_error: bool,
}

impl TxReclaimer {
    pub(crate) const fn new() -> Self {
        Self {
            cursor: 0,
            frame_error: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
        self.frame_error = false;
    }

    /// Reclaim finished descriptors in ring order.
    ///
    /// `on_complete(seq, success)` runs once per frame, at its last segment.
    /// Stops at the first slot that is not hardware-tagged or is still owned.
    pub(crate) fn reclaim<P: BufferPool, const N: usize>(
        &mut self,
        ring: &DescriptorRing<TxDescriptor, N>,
        pool: &'static P,
        mut on_complete: impl FnMut(u32, bool),
    ) {
        for _ in 0..N {
            let index = self.cursor;
            let slot = ring.slot(index);
            let descriptor = ring.descriptor(index);
            if slot.state() != SlotState::Hardware || descriptor.is_owned() {
                break;
            }
            let Some(mut claim) = slot.claim(SlotState::Hardware) else {
                break;
            };
            fence(Ordering::Acquire);

            if descriptor.is_first_segment() {
                self.frame_error = false;
            }
            self.frame_error |= descriptor.has_error();
            if descriptor.is_last_segment() {
                on_complete(slot.seq(), !self.frame_error);
                self.frame_error = false;
            }

            claim.release_buffers(pool);
            claim.set_seq(0);
            descriptor.reset(DescriptorRing::<TxDescriptor, N>::is_last(index));
            drop(claim);
            self.cursor = DescriptorRing::<TxDescriptor, N>::next_index(index);
        }
    }
}

/// True if no slot carries `seq`.
pub(crate) fn is_idle<const N: usize>(ring: &DescriptorRing<TxDescriptor, N>, seq: u32) -> bool {
    (0..N).all(|index| ring.slot(index).seq() != seq)
}
