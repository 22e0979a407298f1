//! Internal implementation details.
//!
//! - [`register`]: memory-mapped MAC, DMA and SYSCFG register definitions
//! - [`constants`]: sizes, timeouts and defaults
//! - [`phy_regs`]: IEEE 802.3 PHY register definitions
//! - [`dma`]: descriptor rings and the RX/TX data paths
//! - [`fmt`]: logging macros
//!
//! Nothing here is part of the public API except what `lib.rs` re-exports.

pub(crate) mod constants;
pub(crate) mod dma;
pub(crate) mod fmt;
pub(crate) mod phy_regs;
pub(crate) mod register;
