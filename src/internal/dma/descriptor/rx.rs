//! RX DMA descriptor for frame reception.

use super::bits::{rdes0, rdes1};
use super::{Descriptor, VolatileCell};

/// Status of a completed receive descriptor, decoded from RDES0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxStatus {
    /// First descriptor of a frame
    pub first: bool,
    /// Last descriptor of a frame
    pub last: bool,
    /// Error summary set
    pub error: bool,
    /// Total frame length (valid on the last descriptor only)
    pub frame_len: usize,
}

impl RxStatus {
    /// Decode a raw RDES0 value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            first: raw & rdes0::FIRST_DESC != 0,
            last: raw & rdes0::LAST_DESC != 0,
            error: raw & rdes0::ERR_SUMMARY != 0,
            frame_len: ((raw & rdes0::FRAME_LEN_MASK) >> rdes0::FRAME_LEN_SHIFT) as usize,
        }
    }
}

/// RX DMA descriptor (16 bytes, two buffers, ring mode).
#[repr(C, align(4))]
pub struct RxDescriptor {
    /// RDES0: Status
    rdes0: VolatileCell<u32>,
    /// RDES1: Control and buffer sizes
    rdes1: VolatileCell<u32>,
    /// RDES2: Buffer 1 address
    buffer1_addr: VolatileCell<u32>,
    /// RDES3: Buffer 2 address
    buffer2_addr: VolatileCell<u32>,
}

impl RxDescriptor {
    /// Create a new zeroed RX descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rdes0: VolatileCell::new(0),
            rdes1: VolatileCell::new(0),
            buffer1_addr: VolatileCell::new(0),
            buffer2_addr: VolatileCell::new(0),
        }
    }

    /// Attach two empty buffers, leaving OWN clear.
    pub fn provision(&self, buffer1: (u32, usize), buffer2: (u32, usize)) {
        let end_of_ring = self.rdes1.get() & rdes1::RX_END_OF_RING;
        self.buffer1_addr.set(buffer1.0);
        self.buffer2_addr.set(buffer2.0);
        self.rdes1.set(
            end_of_ring
                | ((buffer1.1 as u32) & rdes1::BUFFER1_SIZE_MASK)
                | (((buffer2.1 as u32) << rdes1::BUFFER2_SIZE_SHIFT) & rdes1::BUFFER2_SIZE_MASK),
        );
        self.rdes0.set(0);
    }

    /// Give ownership to DMA for reception.
    #[inline(always)]
    pub fn set_owned(&self) {
        self.rdes0.set(rdes0::OWN);
    }

    /// Decode the status written back by the DMA.
    #[inline]
    #[must_use]
    pub fn status(&self) -> RxStatus {
        RxStatus::from_raw(self.rdes0.get())
    }

    /// Capacity of buffer 1 as programmed.
    #[cfg(test)]
    #[inline]
    #[must_use]
    pub fn buffer1_size(&self) -> usize {
        (self.rdes1.get() & rdes1::BUFFER1_SIZE_MASK) as usize
    }

    /// Capacity of buffer 2 as programmed.
    #[cfg(test)]
    #[inline]
    #[must_use]
    pub fn buffer2_size(&self) -> usize {
        ((self.rdes1.get() & rdes1::BUFFER2_SIZE_MASK) >> rdes1::BUFFER2_SIZE_SHIFT) as usize
    }

    /// Check the end-of-ring flag.
    #[cfg(test)]
    #[must_use]
    pub fn is_end_of_ring(&self) -> bool {
        self.rdes1.get() & rdes1::RX_END_OF_RING != 0
    }

    /// Stand in for the DMA engine writing back a received descriptor.
    #[cfg(test)]
    pub fn simulate_receive(&self, first: bool, last: bool, frame_len: usize, error: bool) {
        let mut status = ((frame_len as u32) << rdes0::FRAME_LEN_SHIFT) & rdes0::FRAME_LEN_MASK;
        if first {
            status |= rdes0::FIRST_DESC;
        }
        if last {
            status |= rdes0::LAST_DESC;
        }
        if error {
            status |= rdes0::ERR_SUMMARY | rdes0::CRC_ERR;
        }
        self.rdes0.set(status);
    }
}

impl Descriptor for RxDescriptor {
    const EMPTY: Self = Self::new();

    #[inline(always)]
    fn is_owned(&self) -> bool {
        (self.rdes0.get() & rdes0::OWN) != 0
    }

    fn reset(&self, end_of_ring: bool) {
        self.rdes0.set(0);
        self.rdes1
            .set(if end_of_ring { rdes1::RX_END_OF_RING } else { 0 });
        self.buffer1_addr.set(0);
        self.buffer2_addr.set(0);
    }
}

impl Default for RxDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rx_status_decodes_flags_and_length() {
        let raw = rdes0::FIRST_DESC | rdes0::LAST_DESC | (1514 << rdes0::FRAME_LEN_SHIFT);
        let status = RxStatus::from_raw(raw);
        assert!(status.first);
        assert!(status.last);
        assert!(!status.error);
        assert_eq!(status.frame_len, 1514);
    }

    #[test]
    fn rx_descriptor_provision_keeps_end_of_ring() {
        let desc = RxDescriptor::new();
        desc.reset(true);
        desc.provision((0x2000_0000, 256), (0x2000_1000, 1536));

        assert!(desc.is_end_of_ring());
        assert_eq!(desc.buffer1_size(), 256);
        assert_eq!(desc.buffer2_size(), 1536);
        assert!(!desc.is_owned());
    }

    #[test]
    fn rx_descriptor_owned_until_received() {
        let desc = RxDescriptor::new();
        desc.provision((0x2000_0000, 256), (0x2000_1000, 1536));
        desc.set_owned();
        assert!(desc.is_owned());

        desc.simulate_receive(true, true, 60, false);
        assert!(!desc.is_owned());
        let status = desc.status();
        assert!(status.first && status.last);
        assert_eq!(status.frame_len, 60);
    }

    #[test]
    fn rx_descriptor_error_summary() {
        let desc = RxDescriptor::new();
        desc.simulate_receive(true, false, 0, true);
        assert!(desc.status().error);
    }
}
