//! DMA descriptor bit definitions (normal descriptor format).

/// TDES0: transmit status and control
pub mod tdes0 {
    /// Owned by DMA
    pub const OWN: u32 = 1 << 31;
    /// Interrupt on completion
    pub const INTERRUPT_ON_COMPLETE: u32 = 1 << 30;
    /// Last segment of the frame
    pub const LAST_SEGMENT: u32 = 1 << 29;
    /// First segment of the frame
    pub const FIRST_SEGMENT: u32 = 1 << 28;
    /// Checksum insertion control shift
    pub const CHECKSUM_INSERT_SHIFT: u32 = 22;
    /// Checksum insertion control mask
    pub const CHECKSUM_INSERT_MASK: u32 = 0x3 << 22;
    /// Insert IP header and full TCP/UDP/ICMP checksums
    pub const CHECKSUM_FULL: u32 = 0x3 << 22;
    /// Transmit end of ring
    pub const TX_END_OF_RING: u32 = 1 << 21;
    /// Error summary
    pub const ERR_SUMMARY: u32 = 1 << 15;
    /// Jabber timeout
    pub const JABBER_TIMEOUT: u32 = 1 << 14;
    /// Frame flushed
    pub const FRAME_FLUSHED: u32 = 1 << 13;
    /// Loss of carrier
    pub const LOSS_OF_CARRIER: u32 = 1 << 11;
    /// No carrier
    pub const NO_CARRIER: u32 = 1 << 10;
    /// Late collision
    pub const LATE_COLLISION: u32 = 1 << 9;
    /// Excessive collision
    pub const EXCESSIVE_COLLISION: u32 = 1 << 8;
    /// Underflow error
    pub const UNDERFLOW_ERR: u32 = 1 << 1;
}

/// TDES1: transmit buffer sizes
pub mod tdes1 {
    /// Buffer 1 size mask
    pub const BUFFER1_SIZE_MASK: u32 = 0x1FFF;
    /// Buffer 2 size shift
    pub const BUFFER2_SIZE_SHIFT: u32 = 16;
    /// Buffer 2 size mask
    pub const BUFFER2_SIZE_MASK: u32 = 0x1FFF << 16;
}

/// RDES0: receive status
pub mod rdes0 {
    /// Owned by DMA
    pub const OWN: u32 = 1 << 31;
    /// Frame length shift
    pub const FRAME_LEN_SHIFT: u32 = 16;
    /// Frame length mask
    pub const FRAME_LEN_MASK: u32 = 0x3FFF << 16;
    /// Error summary
    pub const ERR_SUMMARY: u32 = 1 << 15;
    /// Descriptor error
    pub const DESC_ERR: u32 = 1 << 14;
    /// Length error
    pub const LENGTH_ERR: u32 = 1 << 12;
    /// Overflow error
    pub const OVERFLOW_ERR: u32 = 1 << 11;
    /// First descriptor of the frame
    pub const FIRST_DESC: u32 = 1 << 9;
    /// Last descriptor of the frame
    pub const LAST_DESC: u32 = 1 << 8;
    /// Late collision
    pub const LATE_COLLISION: u32 = 1 << 6;
    /// Receive watchdog timeout
    pub const WATCHDOG_TIMEOUT: u32 = 1 << 4;
    /// Receive error
    pub const RX_ERR: u32 = 1 << 3;
    /// Dribble bit error
    pub const DRIBBLE_ERR: u32 = 1 << 2;
    /// CRC error
    pub const CRC_ERR: u32 = 1 << 1;
}

/// RDES1: receive control and buffer sizes
pub mod rdes1 {
    /// Buffer 1 size mask
    pub const BUFFER1_SIZE_MASK: u32 = 0x1FFF;
    /// Receive end of ring
    pub const RX_END_OF_RING: u32 = 1 << 15;
    /// Buffer 2 size shift
    pub const BUFFER2_SIZE_SHIFT: u32 = 16;
    /// Buffer 2 size mask
    pub const BUFFER2_SIZE_MASK: u32 = 0x1FFF << 16;
}
