//! Core driver for the STM32F4 Ethernet MAC.
//!
//! The driver is split into two halves that share the descriptor rings:
//!
//! - [`mac`]: [`EthernetMac`], the poll half. Initialization, link tracking,
//!   transmit, runtime settings and delivery to the [`Dispatcher`].
//! - [`interrupt`]: [`InterruptContext`], the interrupt half. Acknowledges
//!   DMA status, reclaims finished descriptors and refills the RX ring.
//!
//! Both come out of [`EthResources::split`], which owns the rings and the
//! queues between the two contexts.
//!
//! Supporting modules:
//!
//! - [`config`]: configuration and the driver state code
//! - [`error`]: error types and result aliases
//! - [`interface`]: the [`NetInterface`] and [`Dispatcher`] traits
//! - [`link`]: link settings and the link state machine
//! - [`stats`]: frame counters
//!
//! ```ignore
//! use ph_stm32_mac::driver::{EthConfig, MediaInterface};
//!
//! let config = EthConfig::new()
//!     .with_mac_address([0x02, 0x00, 0x00, 0x12, 0x34, 0x56])
//!     .with_media_interface(MediaInterface::Rmii);
//! ```

pub mod config;
pub mod error;
pub mod interface;
pub mod interrupt;
pub mod link;
pub mod mac;
mod resources;
pub mod stats;

pub use config::{DriverState, Duplex, EthConfig, MediaInterface, RxBufferSizes, Speed};
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result};
pub use interface::{Completion, Dispatcher, NetInterface, Parameter, TransferId};
pub use interrupt::{InterruptContext, InterruptStatus};
pub use link::{LinkConfig, LinkState};
pub use mac::EthernetMac;
pub use resources::EthResources;
pub use stats::{Statistics, StatisticsSnapshot};
