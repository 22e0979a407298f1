//! Hardware abstraction layer.
//!
//! - [`mdio`]: MII management bus and the on-chip [`Smi`] master
//! - [`reset`]: MAC/DMA software reset
//! - [`platform`]: the board-supplied [`Platform`] (clocks, pins, HCLK)
//!
//! Everything that waits takes an `embedded_hal::delay::DelayNs` or is a
//! bounded spin; nothing here blocks forever.

pub mod mdio;
pub mod platform;
pub mod reset;

pub use mdio::{MdcClockDivider, MdioBus, Smi};
pub use platform::Platform;
pub use reset::ResetController;
