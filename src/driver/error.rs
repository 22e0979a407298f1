//! Error types for the STM32 Ethernet MAC driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Initialization and configuration failures
//! - [`DmaError`]: Descriptor ring and buffer pool conditions
//! - [`IoError`]: Link, PHY and frame-level failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods. Errors raised in interrupt context are never
//! returned to a caller; they only show up in the driver state code and the
//! statistics counters.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and initialization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Operation requires `init()` to have completed
    NotInitialized,
    /// Driver already initialized
    AlreadyInitialized,
    /// Invalid configuration parameter
    InvalidConfig,
    /// Invalid PHY address (must be 0-31)
    InvalidPhyAddress,
    /// MAC address slot index out of range
    InvalidAddressIndex,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::NotInitialized => "not initialized",
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::InvalidPhyAddress => "invalid PHY address",
            ConfigError::InvalidAddressIndex => "invalid MAC address slot",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Descriptor ring and buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Not enough free transmit descriptors (or software queue full)
    QueueFull,
    /// Buffer pool exhausted
    OutOfMemory,
    /// Buffer longer than a descriptor size field can describe
    BufferTooLarge,
    /// Frame needs more buffers than a chain can hold
    TooManySegments,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::QueueFull => "queue full",
            DmaError::OutOfMemory => "out of buffer memory",
            DmaError::BufferTooLarge => "buffer too large for descriptor",
            DmaError::TooManySegments => "too many frame segments",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Link, PHY and frame errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Link is down; transmit rejected without touching the ring
    LinkDown,
    /// A bounded hardware busy-wait ran out of iterations
    Timeout,
    /// PHY communication error (MDIO timeout or failure)
    PhyError,
    /// Uncategorized hardware condition (fatal bus error)
    HardwareFault,
    /// Received frame had an error-flagged segment (CRC, overflow, ...)
    FrameError,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::LinkDown => "link down",
            IoError::Timeout => "operation timed out",
            IoError::PhyError => "PHY communication error",
            IoError::HardwareFault => "hardware fault",
            IoError::FrameError => "receive frame error",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match mac.transmit(dst, 0x0800, &mut frame) {
///     Err(Error::Io(IoError::LinkDown)) => { /* wait for link */ }
///     Err(Error::Dma(DmaError::QueueFull)) => { /* retry later */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
