//! Configuration types for the STM32 ETH driver

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_MAC_ADDR, DEFAULT_PHY_ADDRESS, DEFAULT_RX_FIRST_BUFFER, DEFAULT_RX_SECOND_BUFFER,
    LINK_SPEED_10M_KBPS, LINK_SPEED_100M_KBPS, MAX_BUFFER_SIZE, MAX_PHY_ADDRESS,
    SOFT_RESET_TIMEOUT_MS,
};

/// Ethernet link speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// 10 Mbps
    Mbps10,
    /// 100 Mbps
    #[default]
    Mbps100,
}

impl Speed {
    /// Link rate in kbit/s
    pub const fn kbps(self) -> u32 {
        match self {
            Self::Mbps10 => LINK_SPEED_10M_KBPS,
            Self::Mbps100 => LINK_SPEED_100M_KBPS,
        }
    }
}

/// Ethernet duplex mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Duplex {
    /// Half duplex
    Half,
    /// Full duplex
    #[default]
    Full,
}

/// MAC-to-PHY interface, selected through SYSCFG_PMC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediaInterface {
    /// Media Independent Interface
    Mii,
    /// Reduced Media Independent Interface
    #[default]
    Rmii,
}

/// Sizes of the two buffers attached to every RX descriptor.
///
/// Short frames land entirely in the first buffer; longer ones spill into
/// the second, so the pool's small class absorbs most of the traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxBufferSizes {
    /// Buffer 1 size in bytes
    pub first: usize,
    /// Buffer 2 size in bytes
    pub second: usize,
}

impl RxBufferSizes {
    /// Default split (256 + 1536 bytes)
    pub const fn new() -> Self {
        Self {
            first: DEFAULT_RX_FIRST_BUFFER,
            second: DEFAULT_RX_SECOND_BUFFER,
        }
    }

    const fn is_valid_size(size: usize) -> bool {
        size != 0 && size % 4 == 0 && size <= MAX_BUFFER_SIZE
    }
}

impl Default for RxBufferSizes {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver configuration.
///
/// ```ignore
/// let config = EthConfig::new()
///     .with_mac_address([0x02, 0x00, 0x00, 0x12, 0x34, 0x56])
///     .with_phy_address(0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EthConfig {
    /// Station address, programmed into address slot 0
    pub mac_address: [u8; 6],
    /// PHY address on the management bus (0-31)
    pub phy_address: u8,
    /// MII or RMII
    pub media_interface: MediaInterface,
    /// Request autonegotiation
    pub autonegotiation: bool,
    /// Requested (or forced) speed
    pub speed: Speed,
    /// Requested (or forced) duplex
    pub duplex: Duplex,
    /// RX descriptor buffer sizes
    pub rx_buffer_sizes: RxBufferSizes,
    /// Hardware IP/TCP/UDP checksum insertion and checking
    pub checksum_offload: bool,
    /// MAC/DMA software reset timeout
    pub reset_timeout_ms: u32,
}

impl Default for EthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EthConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mac_address: DEFAULT_MAC_ADDR,
            phy_address: DEFAULT_PHY_ADDRESS,
            media_interface: MediaInterface::Rmii,
            autonegotiation: true,
            speed: Speed::Mbps100,
            duplex: Duplex::Full,
            rx_buffer_sizes: RxBufferSizes::new(),
            checksum_offload: true,
            reset_timeout_ms: SOFT_RESET_TIMEOUT_MS,
        }
    }

    /// Set the station address
    #[must_use]
    pub const fn with_mac_address(mut self, addr: [u8; 6]) -> Self {
        self.mac_address = addr;
        self
    }

    /// Set the PHY address
    #[must_use]
    pub const fn with_phy_address(mut self, addr: u8) -> Self {
        self.phy_address = addr;
        self
    }

    /// Set the MAC-to-PHY interface
    #[must_use]
    pub const fn with_media_interface(mut self, interface: MediaInterface) -> Self {
        self.media_interface = interface;
        self
    }

    /// Enable or disable autonegotiation
    #[must_use]
    pub const fn with_autonegotiation(mut self, enabled: bool) -> Self {
        self.autonegotiation = enabled;
        self
    }

    /// Set the requested speed
    #[must_use]
    pub const fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Set the requested duplex
    #[must_use]
    pub const fn with_duplex(mut self, duplex: Duplex) -> Self {
        self.duplex = duplex;
        self
    }

    /// Set the RX buffer sizes
    #[must_use]
    pub const fn with_rx_buffer_sizes(mut self, first: usize, second: usize) -> Self {
        self.rx_buffer_sizes = RxBufferSizes { first, second };
        self
    }

    /// Enable or disable checksum offload
    #[must_use]
    pub const fn with_checksum_offload(mut self, enabled: bool) -> Self {
        self.checksum_offload = enabled;
        self
    }

    /// Set the software reset timeout
    #[must_use]
    pub const fn with_reset_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.reset_timeout_ms = timeout_ms;
        self
    }

    /// Check the configuration for values the hardware cannot take.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.phy_address > MAX_PHY_ADDRESS {
            return Err(ConfigError::InvalidPhyAddress);
        }
        if !RxBufferSizes::is_valid_size(self.rx_buffer_sizes.first)
            || !RxBufferSizes::is_valid_size(self.rx_buffer_sizes.second)
        {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

/// Hardware/driver state code, readable through
/// [`Parameter::HwState`](crate::Parameter::HwState).
///
/// Interrupt-context failures are reported only through this code and the
/// statistics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DriverState {
    /// Last operation succeeded
    Ok = 0,
    /// `init` has not run
    #[default]
    NotInitialized = 1,
    /// MAC/DMA reset failed
    MacError = 2,
    /// PHY reset or management access failed
    PhyError = 3,
    /// DMA fatal bus error or unusable buffer
    DriverError = 4,
    /// Transmit attempted without link
    NotConnected = 5,
    /// Buffer pool exhausted
    OutOfMemory = 6,
    /// Transmit ring full
    TxQueueFull = 7,
}

impl DriverState {
    /// Decode a stored state code
    pub const fn from_u8(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            2 => Self::MacError,
            3 => Self::PhyError,
            4 => Self::DriverError,
            5 => Self::NotConnected,
            6 => Self::OutOfMemory,
            7 => Self::TxQueueFull,
            _ => Self::NotInitialized,
        }
    }
}
