//! STM32F4 Ethernet MAC driver core
//!
//! A `no_std`, `no_alloc` driver for the Synopsys DesignWare MAC found in
//! STM32F4 parts: descriptor-ring DMA, a generic IEEE 802.3 PHY, and a
//! split between the interrupt handler and a cooperative poll loop.
//!
//! # Architecture
//!
//! 1. **Driver** ([`driver`]): [`EthernetMac`] (poll half) and
//!    [`InterruptContext`] (interrupt half), created together by
//!    [`EthResources::split`]
//! 2. **PHY** ([`phy`]): any clause-22 PHY through [`GenericPhy`]
//! 3. **HAL** ([`hal`]): MDIO, software reset and the board [`Platform`]
//! 4. **Buffers** ([`buffer`]): pooled DMA buffers chained into [`FrameBuffer`]s
//! 5. **Sync** ([`sync`]): queues and cells shared between the two halves
//!
//! The interrupt half never calls application code. Received frames and
//! transmit completions travel over lock-free queues and are delivered to
//! the [`Dispatcher`] from [`EthernetMac::poll`].
//!
//! # Features
//!
//! - `defmt`: defmt logging and `Format` impls
//! - `log`: logging through the `log` facade
//! - `async`: `EthernetMac::wait_for_interrupt`, a future that resolves
//!   after each interrupt
//!
//! # Example
//!
//! ```ignore
//! use ph_stm32_mac::{EthConfig, EthResources, InterruptContext, NetInterface, Stm32Eth};
//! use ph_stm32_mac::buffer::StaticPool;
//! use ph_stm32_mac::sync::InterruptSlot;
//!
//! type Pool = StaticPool<256, 16, 1536, 16>;
//! static POOL: Pool = StaticPool::new();
//! static IRQ: InterruptSlot<InterruptContext<'static, Stm32Eth, Pool, 8, 8>> =
//!     InterruptSlot::new();
//!
//! let resources = /* &'static mut EthResources<8, 8> */;
//! let regs = unsafe { Stm32Eth::steal() };
//! let (mut mac, irq) = resources.split(regs, board, &POOL, EthConfig::new())?;
//! IRQ.install(irq);
//! mac.register_dispatcher(stack);
//! mac.init(&mut delay)?;
//!
//! loop {
//!     mac.poll()?;
//! }
//!
//! #[interrupt]
//! fn ETH() {
//!     IRQ.with(|irq| irq.on_interrupt());
//! }
//! ```
//!
//! # Memory Requirements
//!
//! The rings in [`EthResources`] and the buffers in the pool are read by the
//! DMA engine and must live in SRAM1/SRAM2, not CCM.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in clippy.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod buffer;
pub mod driver;
pub mod hal;
pub mod phy;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use buffer::{BufferPool, DataBuffer, FrameBuffer, StaticPool};
pub use driver::config::{DriverState, Duplex, EthConfig, MediaInterface, RxBufferSizes, Speed};
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result,
};
pub use driver::interface::{Completion, Dispatcher, NetInterface, Parameter, TransferId};
pub use driver::interrupt::{InterruptContext, InterruptStatus};
pub use driver::link::{LinkConfig, LinkState};
pub use driver::mac::EthernetMac;
pub use driver::stats::StatisticsSnapshot;
pub use driver::EthResources;
pub use hal::Platform;
pub use internal::register::{Reg, RegisterBlock, Stm32Eth};
pub use phy::{GenericPhy, LinkStatus, PhyCapabilities};

/// Low-level register access for advanced use.
///
/// # Safety
///
/// Writing these registers behind the driver's back breaks its invariants.
/// Use only with the data path stopped.
pub mod unsafe_registers {
    pub use crate::internal::register::{Reg, RegisterBlock, Stm32Eth};
}

/// Shared driver constants.
pub mod constants {
    pub use crate::internal::constants::{
        // MAC address
        DEFAULT_MAC_ADDR,
        // PHY
        DEFAULT_PHY_ADDRESS,
        // Buffer sizes
        DEFAULT_RX_FIRST_BUFFER,
        DEFAULT_RX_SECOND_BUFFER,
        // Frame sizes
        ETH_HEADER_SIZE,
        // Link speed
        LINK_SPEED_10M_KBPS,
        LINK_SPEED_100M_KBPS,
        MAC_ADDR_LEN,
        MAX_BUFFER_SIZE,
        MAX_FRAME_SEGMENTS,
        MAX_MAC_ADDRESSES,
        MAX_PHY_ADDRESS,
        MIN_FRAME_SIZE,
        MTU,
        // Timing
        SOFT_RESET_TIMEOUT_MS,
    };
}
