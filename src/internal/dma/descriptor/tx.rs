//! TX DMA descriptor for frame transmission.

use super::bits::{tdes0, tdes1};
use super::{Descriptor, VolatileCell};

/// TX DMA descriptor (16 bytes, two buffers, ring mode).
#[repr(C, align(4))]
pub struct TxDescriptor {
    /// TDES0: Status and control bits
    tdes0: VolatileCell<u32>,
    /// TDES1: Buffer sizes
    tdes1: VolatileCell<u32>,
    /// TDES2: Buffer 1 address
    buffer1_addr: VolatileCell<u32>,
    /// TDES3: Buffer 2 address
    buffer2_addr: VolatileCell<u32>,
}

impl TxDescriptor {
    /// Create a new zeroed TX descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tdes0: VolatileCell::new(0),
            tdes1: VolatileCell::new(0),
            buffer1_addr: VolatileCell::new(0),
            buffer2_addr: VolatileCell::new(0),
        }
    }

    /// Give ownership to DMA for transmission.
    #[inline(always)]
    pub fn set_owned(&self) {
        self.tdes0.update(|v| v | tdes0::OWN);
    }

    /// Fill in buffers and segment flags, leaving OWN clear.
    ///
    /// `buffer2` is `(address, length)` of the optional second buffer.
    pub fn prepare(
        &self,
        buffer1: (u32, usize),
        buffer2: Option<(u32, usize)>,
        first: bool,
        last: bool,
        checksum_offload: bool,
    ) {
        let mut flags = self.tdes0.get() & tdes0::TX_END_OF_RING;
        if first {
            flags |= tdes0::FIRST_SEGMENT;
        }
        if last {
            flags |= tdes0::LAST_SEGMENT | tdes0::INTERRUPT_ON_COMPLETE;
        }
        if checksum_offload {
            flags |= tdes0::CHECKSUM_FULL;
        }

        let (addr2, len2) = buffer2.unwrap_or((0, 0));
        self.buffer1_addr.set(buffer1.0);
        self.buffer2_addr.set(addr2);
        self.tdes1.set(
            ((buffer1.1 as u32) & tdes1::BUFFER1_SIZE_MASK)
                | (((len2 as u32) << tdes1::BUFFER2_SIZE_SHIFT) & tdes1::BUFFER2_SIZE_MASK),
        );
        self.tdes0.set(flags);
    }

    /// Check if this descriptor starts a frame.
    #[inline(always)]
    #[must_use]
    pub fn is_first_segment(&self) -> bool {
        (self.tdes0.get() & tdes0::FIRST_SEGMENT) != 0
    }

    /// Check if this descriptor ends a frame.
    #[inline(always)]
    #[must_use]
    pub fn is_last_segment(&self) -> bool {
        (self.tdes0.get() & tdes0::LAST_SEGMENT) != 0
    }

    /// Check if transmission had errors.
    #[inline(always)]
    #[must_use]
    pub fn has_error(&self) -> bool {
        (self.tdes0.get() & tdes0::ERR_SUMMARY) != 0
    }

    /// Total bytes described by both buffer size fields.
    #[cfg(test)]
    #[must_use]
    pub fn total_len(&self) -> usize {
        let sizes = self.tdes1.get();
        ((sizes & tdes1::BUFFER1_SIZE_MASK)
            + ((sizes & tdes1::BUFFER2_SIZE_MASK) >> tdes1::BUFFER2_SIZE_SHIFT)) as usize
    }

    /// Get raw TDES0 value for debugging.
    #[cfg(test)]
    #[inline(always)]
    #[must_use]
    pub fn raw_status(&self) -> u32 {
        self.tdes0.get()
    }

    /// Stand in for the DMA engine finishing this descriptor.
    #[cfg(test)]
    pub fn simulate_transmit(&self, error: bool) {
        self.tdes0.update(|v| {
            let v = v & !tdes0::OWN;
            if error {
                v | tdes0::ERR_SUMMARY | tdes0::LATE_COLLISION
            } else {
                v
            }
        });
    }
}

impl Descriptor for TxDescriptor {
    const EMPTY: Self = Self::new();

    #[inline(always)]
    fn is_owned(&self) -> bool {
        (self.tdes0.get() & tdes0::OWN) != 0
    }

    fn reset(&self, end_of_ring: bool) {
        self.tdes0
            .set(if end_of_ring { tdes0::TX_END_OF_RING } else { 0 });
        self.tdes1.set(0);
        self.buffer1_addr.set(0);
        self.buffer2_addr.set(0);
    }
}

impl Default for TxDescriptor {
    fn default() -> Self {
        Self::new()
    }
}
