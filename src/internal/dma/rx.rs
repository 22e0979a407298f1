//! Receive path: descriptor reclaim, frame reassembly and refill.

use core::sync::atomic::{Ordering, fence};

use super::descriptor::{Descriptor, RxDescriptor, rx::RxStatus};
use super::ring::{DescriptorRing, SlotClaim, SlotState};
use crate::buffer::{BufferPool, DataBuffer, FrameBuffer};
use crate::driver::config::RxBufferSizes;
use crate::driver::error::{DmaError, Error, IoError};
use crate::internal::constants::MAX_BUFFER_SIZE;

/// What one reclaimed descriptor produced.
#[derive(Debug)]
pub(crate) enum RxEvent {
    /// Segment absorbed (or dropped), no frame finished yet
    Pending,
    /// A complete, error-free frame
    Frame(FrameBuffer),
    /// A frame was thrown away; reported once per frame
    Discarded(Error),
}

enum Assembly {
    Idle,
    Accumulating { frame: FrameBuffer, size: usize },
    Discarding,
}

/// Merges the segments of multi-descriptor frames into one chain.
pub(crate) struct Reassembler {
    state: Assembly,
}

impl Reassembler {
    pub(crate) const fn new() -> Self {
        Self {
            state: Assembly::Idle,
        }
    }

    /// Drop any partial frame without reporting it.
    pub(crate) fn reset<P: BufferPool>(&mut self, pool: &'static P) {
        if let Assembly::Accumulating { frame, .. } = &mut self.state {
            frame.release(pool);
        }
        self.state = Assembly::Idle;
    }

    /// True while a frame is partially assembled.
    #[cfg(test)]
    pub(crate) fn is_accumulating(&self) -> bool {
        matches!(self.state, Assembly::Accumulating { .. })
    }

    /// Feed the two buffers of one reclaimed descriptor.
    pub(crate) fn push<P: BufferPool>(
        &mut self,
        pool: &'static P,
        status: RxStatus,
        buffers: [Option<DataBuffer>; 2],
    ) -> RxEvent {
        if status.first {
            self.reset(pool);
            self.state = Assembly::Accumulating {
                frame: FrameBuffer::new(),
                size: 0,
            };
        }

        let Assembly::Accumulating { frame, size } = &mut self.state else {
            release_all(pool, buffers);
            if status.last {
                self.state = Assembly::Idle;
            }
            return RxEvent::Pending;
        };

        if status.error {
            return self.discard(pool, buffers, status.last, IoError::FrameError.into());
        }

        let [mut first, mut second] = buffers;
        if status.last {
            let len1 = first.as_ref().map_or(0, DataBuffer::len);
            let cap2 = second.as_ref().map_or(0, DataBuffer::len);
            let (len1, len2) = if *size + len1 >= status.frame_len {
                match status.frame_len.checked_sub(*size) {
                    Some(len1) => (len1, 0),
                    None => {
                        return self.discard(pool, [first, second], true, IoError::FrameError.into());
                    }
                }
            } else {
                let len2 = status.frame_len - *size - len1;
                if len2 > cap2 {
                    return self.discard(pool, [first, second], true, IoError::FrameError.into());
                }
                (len1, len2)
            };
            if let Some(buffer) = first.as_mut() {
                buffer.truncate(len1);
            }
            if let Some(buffer) = second.as_mut() {
                buffer.truncate(len2);
            }
        }

        let mut pending = [first, second];
        for index in 0..pending.len() {
            let Some(buffer) = pending[index].take() else {
                continue;
            };
            if buffer.is_empty() {
                pool.release(buffer);
                continue;
            }
            *size += buffer.len();
            if let Err(buffer) = frame.attach_back(buffer) {
                pool.release(buffer);
                let rest = [pending[0].take(), pending[1].take()];
                return self.discard(pool, rest, status.last, DmaError::TooManySegments.into());
            }
        }

        if !status.last {
            return RxEvent::Pending;
        }
        match core::mem::replace(&mut self.state, Assembly::Idle) {
            Assembly::Accumulating { frame, .. } => RxEvent::Frame(frame),
            _ => RxEvent::Pending,
        }
    }

    fn discard<P: BufferPool>(
        &mut self,
        pool: &'static P,
        buffers: [Option<DataBuffer>; 2],
        last: bool,
        reason: Error,
    ) -> RxEvent {
        release_all(pool, buffers);
        self.reset(pool);
        if !last {
            self.state = Assembly::Discarding;
        }
        RxEvent::Discarded(reason)
    }
}

fn release_all<P: BufferPool>(pool: &'static P, buffers: [Option<DataBuffer>; 2]) {
    for buffer in buffers.into_iter().flatten() {
        pool.release(buffer);
    }
}

/// Attach two fresh buffers to a claimed RX slot and hand it to the DMA.
///
/// On failure nothing stays attached and the claim ends as `Free`.
pub(crate) fn provision<P: BufferPool>(
    mut claim: SlotClaim<'_>,
    descriptor: &RxDescriptor,
    end_of_ring: bool,
    pool: &'static P,
    sizes: RxBufferSizes,
) -> Result<(), DmaError> {
    if sizes.first > MAX_BUFFER_SIZE || sizes.second > MAX_BUFFER_SIZE {
        return Err(DmaError::BufferTooLarge);
    }
    let first = pool.allocate(sizes.first).ok_or(DmaError::OutOfMemory)?;
    let Some(second) = pool.allocate(sizes.second) else {
        pool.release(first);
        return Err(DmaError::OutOfMemory);
    };

    descriptor.reset(end_of_ring);
    descriptor.provision(
        (first.dma_address(), first.len()),
        (second.dma_address(), second.len()),
    );
    *claim.buffers() = [Some(first), Some(second)];
    fence(Ordering::Release);
    descriptor.set_owned();
    claim.hand_to_hardware();
    Ok(())
}

/// Provision every `Free` slot of the ring.
pub(crate) fn provision_ring<P: BufferPool, const N: usize>(
    ring: &DescriptorRing<RxDescriptor, N>,
    pool: &'static P,
    sizes: RxBufferSizes,
) -> Result<(), DmaError> {
    for index in 0..N {
        if let Some(claim) = ring.slot(index).claim(SlotState::Free) {
            let end = DescriptorRing::<RxDescriptor, N>::is_last(index);
            provision(claim, ring.descriptor(index), end, pool, sizes)?;
        }
    }
    Ok(())
}

/// Interrupt-side walker over the RX ring.
pub(crate) struct RxReclaimer {
    cursor: usize,
    assembly: Reassembler,
}

impl RxReclaimer {
    pub(crate) const fn new() -> Self {
        Self {
            cursor: 0,
            assembly: Reassembler::new(),
        }
    }

    /// Back to the ring start, dropping any partial frame.
    pub(crate) fn reset<P: BufferPool>(&mut self, pool: &'static P) {
        self.cursor = 0;
        self.assembly.reset(pool);
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reclaim completed descriptors in ring order, refilling each one.
    ///
    /// Stops at the first descriptor the DMA still owns or the poll context
    /// holds. A `Free` slot at the cursor (an earlier refill failed) is
    /// provisioned again before anything else. Returns the refill error that
    /// stopped the walk, if any.
    pub(crate) fn reclaim<P: BufferPool, const N: usize>(
        &mut self,
        ring: &DescriptorRing<RxDescriptor, N>,
        pool: &'static P,
        sizes: RxBufferSizes,
        mut on_event: impl FnMut(RxEvent),
    ) -> Option<DmaError> {
        let mut refill_error = None;
        for _ in 0..N {
            let index = self.cursor;
            let slot = ring.slot(index);
            let descriptor = ring.descriptor(index);
            let end = DescriptorRing::<RxDescriptor, N>::is_last(index);

            if slot.state() == SlotState::Free {
                let Some(claim) = slot.claim(SlotState::Free) else {
                    break;
                };
                if let Err(error) = provision(claim, descriptor, end, pool, sizes) {
                    refill_error = Some(error);
                    break;
                }
                self.cursor = DescriptorRing::<RxDescriptor, N>::next_index(index);
                continue;
            }
            if descriptor.is_owned() {
                break;
            }
            let Some(mut claim) = slot.claim(SlotState::Hardware) else {
                break;
            };
            fence(Ordering::Acquire);

            let status = descriptor.status();
            let buffers = [claim.buffers()[0].take(), claim.buffers()[1].take()];
            on_event(self.assembly.push(pool, status, buffers));

            // a failed refill keeps the cursor here so the next pass retries it
            if let Err(error) = provision(claim, descriptor, end, pool, sizes) {
                refill_error = Some(error);
                break;
            }
            self.cursor = DescriptorRing::<RxDescriptor, N>::next_index(index);
        }
        refill_error
    }
}
