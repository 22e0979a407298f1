//! Centralized Constants
//!
//! This module provides a single source of truth for the magic numbers and
//! configuration constants used throughout the driver.
//!
//! # Organization
//!
//! - **Frame/Buffer sizes**: Ethernet header and descriptor size limits
//! - **Timing**: Bounded busy-wait caps and polling intervals
//! - **Clock thresholds**: HCLK boundaries for the MDC divider
//! - **Defaults**: Default addresses and RX buffer size classes
//!
//! Hardware register bit definitions remain in `register/dma.rs`,
//! `register/mac.rs` and `dma/descriptor/bits.rs`.

// =============================================================================
// Frame and Buffer Sizes
// =============================================================================

/// Ethernet header size (dst MAC + src MAC + protocol id)
pub const ETH_HEADER_SIZE: usize = 14;

/// MAC address length in bytes
pub const MAC_ADDR_LEN: usize = 6;

/// Number of MAC address filter slots (MACA0..MACA3)
pub const MAX_MAC_ADDRESSES: usize = 4;

/// Maximum number of data buffers in one frame chain
pub const MAX_FRAME_SEGMENTS: usize = 8;

/// Largest buffer a descriptor size field can describe (13 bits, word multiple)
pub const MAX_BUFFER_SIZE: usize = 0x1FFC;

/// Standard Ethernet MTU
pub const MTU: usize = 1500;

/// Minimum Ethernet frame size (excluding CRC)
pub const MIN_FRAME_SIZE: usize = 60;

// =============================================================================
// Receive Buffer Size Classes
// =============================================================================

/// Default size of the first (small) buffer attached to each RX descriptor
pub const DEFAULT_RX_FIRST_BUFFER: usize = 256;

/// Default size of the second (large) buffer attached to each RX descriptor
pub const DEFAULT_RX_SECOND_BUFFER: usize = 1536;

// =============================================================================
// Timing Constants
// =============================================================================

/// Default MAC/DMA soft reset timeout in milliseconds
pub const SOFT_RESET_TIMEOUT_MS: u32 = 100;

/// Reset poll interval in microseconds
pub const RESET_POLL_INTERVAL_US: u32 = 100;

/// Maximum iterations waiting for an MII/MDIO transaction
pub const MII_BUSY_TIMEOUT: u32 = 100_000;

/// Maximum iterations waiting for the TX FIFO flush to finish
pub const FLUSH_TIMEOUT: u32 = 10_000;

/// Maximum iterations waiting for a previous pause frame to go out
pub const PAUSE_BUSY_TIMEOUT: u32 = 100_000;

/// Maximum polls of BMCR waiting for the PHY soft reset to self-clear
pub const PHY_RESET_MAX_ATTEMPTS: u32 = 1_000;

/// Delay between PHY reset polls in microseconds
pub const PHY_RESET_POLL_INTERVAL_US: u32 = 100;

// =============================================================================
// Clock Thresholds
// =============================================================================

/// HCLK at or above which MDC uses HCLK/102
pub const HCLK_DIV102_MIN_HZ: u32 = 150_000_000;

/// HCLK at or above which MDC uses HCLK/62
pub const HCLK_DIV62_MIN_HZ: u32 = 100_000_000;

/// HCLK at or above which MDC uses HCLK/42
pub const HCLK_DIV42_MIN_HZ: u32 = 60_000_000;

/// HCLK at or above which MDC uses HCLK/26
pub const HCLK_DIV26_MIN_HZ: u32 = 35_000_000;

// =============================================================================
// Defaults
// =============================================================================

/// Default MAC address (locally administered)
pub const DEFAULT_MAC_ADDR: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];

/// Default PHY address on the MDIO bus
pub const DEFAULT_PHY_ADDRESS: u8 = 1;

/// Highest valid PHY address on the MDIO bus
pub const MAX_PHY_ADDRESS: u8 = 31;

/// Link speed reported for 100 Mbps, in kbps
pub const LINK_SPEED_100M_KBPS: u32 = 100_000;

/// Link speed reported for 10 Mbps, in kbps
pub const LINK_SPEED_10M_KBPS: u32 = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_matches_address_layout() {
        assert_eq!(ETH_HEADER_SIZE, 2 * MAC_ADDR_LEN + 2);
    }

    #[test]
    fn rx_defaults_fit_descriptor_size_field() {
        assert!(DEFAULT_RX_FIRST_BUFFER <= MAX_BUFFER_SIZE);
        assert!(DEFAULT_RX_SECOND_BUFFER <= MAX_BUFFER_SIZE);
        assert_eq!(DEFAULT_RX_FIRST_BUFFER % 4, 0);
        assert_eq!(DEFAULT_RX_SECOND_BUFFER % 4, 0);
    }

    #[test]
    fn clock_thresholds_are_descending() {
        assert!(HCLK_DIV102_MIN_HZ > HCLK_DIV62_MIN_HZ);
        assert!(HCLK_DIV62_MIN_HZ > HCLK_DIV42_MIN_HZ);
        assert!(HCLK_DIV42_MIN_HZ > HCLK_DIV26_MIN_HZ);
    }
}
