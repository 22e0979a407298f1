//! Host-side doubles for the register block, PHY, delay and board.
//!
//! Declared `#[cfg(test)]` in `lib.rs`.

#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::boxed::Box;
use std::collections::HashMap;
use std::vec;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::buffer::{BufferPool, FrameBuffer, StaticPool};
use crate::driver::config::{EthConfig, MediaInterface};
use crate::driver::interface::{Dispatcher, TransferId};
use crate::driver::{EthResources, EthernetMac, InterruptContext};
use crate::internal::constants::DEFAULT_PHY_ADDRESS;
use crate::internal::phy_regs::standard::{ability, bmcr, bmsr, phy_reg};
use crate::internal::register::dma::{DMABMR_SR, DMAOMR_FTF};
use crate::internal::register::mac::{
    MACFCR_FCBBPA, MACMIIAR_ADDR_MASK, MACMIIAR_MB, MACMIIAR_MR_SHIFT, MACMIIAR_MW,
    MACMIIAR_PA_SHIFT,
};
use crate::internal::register::{Reg, RegisterBlock};

// =============================================================================
// Buffer pool
// =============================================================================

/// 32 small (256 byte) and 32 large (1536 byte) buffers
pub type TestPool = StaticPool<256, 32, 1536, 32>;

/// Fresh pool with a `'static` lifetime, one per test.
pub fn leak_pool() -> &'static TestPool {
    leak_pool_with(TestPool::new())
}

pub fn leak_pool_with<P: BufferPool>(pool: P) -> &'static P {
    Box::leak(Box::new(pool))
}

// =============================================================================
// Mock registers
// =============================================================================

/// BMSR of a PHY that can do every 10/100 mode and negotiate, link down
pub const DEFAULT_BMSR: u16 = bmsr::ANY_100
    | bmsr::T10_FD_CAPABLE
    | bmsr::T10_HD_CAPABLE
    | bmsr::AN_ABILITY;

/// Advertise every 10/100 mode with the 802.3 selector
pub const ALL_ABILITIES: u16 =
    ability::TX_FD | ability::TX_HD | ability::T10_FD | ability::T10_HD | 0x0001;

/// Register file that behaves like the ETH peripheral where the driver
/// depends on it:
///
/// - MACMIIAR with MB set runs the MII transaction against a PHY map and
///   clears MB
/// - DMABMR.SR, DMAOMR.FTF and MACFCR.FCBBPA self-clear
/// - DMASR is write-1-to-clear, DMAMFBOCR clears on read
///
/// Each self-clearing bit has a knob that makes it stick.
#[derive(Debug, Default)]
pub struct MockRegisters {
    values: RefCell<HashMap<Reg, u32>>,
    writes: RefCell<Vec<(Reg, u32)>>,
    phy: RefCell<HashMap<(u8, u8), u16>>,
    mii_stuck: Cell<bool>,
    reset_stuck: Cell<bool>,
    phy_reset_stuck: Cell<bool>,
    flush_stuck: Cell<bool>,
    pause_stuck: Cell<bool>,
}

impl MockRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current register value, without read side effects
    pub fn get(&self, reg: Reg) -> u32 {
        self.values.borrow().get(&reg).copied().unwrap_or(0)
    }

    fn store(&self, reg: Reg, value: u32) {
        self.values.borrow_mut().insert(reg, value);
    }

    pub fn was_written(&self, reg: Reg) -> bool {
        self.writes.borrow().iter().any(|(r, _)| *r == reg)
    }

    pub fn write_count(&self, reg: Reg) -> usize {
        self.writes.borrow().iter().filter(|(r, _)| *r == reg).count()
    }

    /// Last value the driver wrote, before any self-clearing
    pub fn last_written(&self, reg: Reg) -> Option<u32> {
        self.writes
            .borrow()
            .iter()
            .rev()
            .find(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
    }

    pub fn phy_reg(&self, phy: u8, reg: u8) -> u16 {
        if let Some(value) = self.phy.borrow().get(&(phy, reg)) {
            return *value;
        }
        match reg {
            phy_reg::BMSR => DEFAULT_BMSR,
            phy_reg::ANAR | phy_reg::ANLPAR => ALL_ABILITIES,
            _ => 0,
        }
    }

    pub fn set_phy_reg(&self, phy: u8, reg: u8, value: u16) {
        self.phy.borrow_mut().insert((phy, reg), value);
    }

    /// Raise or drop link (and AN complete) on `phy`
    pub fn set_link(&self, phy: u8, up: bool) {
        let bits = bmsr::LINK_STATUS | bmsr::AN_COMPLETE;
        let value = self.phy_reg(phy, phy_reg::BMSR);
        let value = if up { value | bits } else { value & !bits };
        self.set_phy_reg(phy, phy_reg::BMSR, value);
    }

    fn phy_write(&self, phy: u8, reg: u8, value: u16) {
        let value = if reg == phy_reg::BMCR && !self.phy_reset_stuck.get() {
            value & !bmcr::RESET
        } else {
            value
        };
        self.set_phy_reg(phy, reg, value);
    }

    pub fn set_mii_stuck(&self, stuck: bool) {
        self.mii_stuck.set(stuck);
    }

    pub fn set_reset_stuck(&self, stuck: bool) {
        self.reset_stuck.set(stuck);
    }

    pub fn set_phy_reset_stuck(&self, stuck: bool) {
        self.phy_reset_stuck.set(stuck);
    }

    pub fn set_flush_stuck(&self, stuck: bool) {
        self.flush_stuck.set(stuck);
    }

    pub fn set_pause_stuck(&self, stuck: bool) {
        self.pause_stuck.set(stuck);
    }

    /// OR `bits` into DMASR as the DMA engine would
    pub fn raise_status(&self, bits: u32) {
        self.store(Reg::DmaSr, self.get(Reg::DmaSr) | bits);
    }

    pub fn set_missed_frames(&self, raw: u32) {
        self.store(Reg::DmaMfbocr, raw);
    }

    fn self_clearing(&self, value: u32, bit: u32, stuck: &Cell<bool>) -> u32 {
        if stuck.get() { value } else { value & !bit }
    }

    fn mii_transaction(&self, command: u32) -> u32 {
        if self.mii_stuck.get() {
            return command;
        }
        let phy = ((command >> MACMIIAR_PA_SHIFT) & MACMIIAR_ADDR_MASK) as u8;
        let reg = ((command >> MACMIIAR_MR_SHIFT) & MACMIIAR_ADDR_MASK) as u8;
        if command & MACMIIAR_MW != 0 {
            self.phy_write(phy, reg, self.get(Reg::MacMiiDr) as u16);
        } else {
            self.store(Reg::MacMiiDr, u32::from(self.phy_reg(phy, reg)));
        }
        command & !MACMIIAR_MB
    }
}

impl RegisterBlock for MockRegisters {
    fn read(&self, reg: Reg) -> u32 {
        let value = self.get(reg);
        if reg == Reg::DmaMfbocr {
            self.store(reg, 0);
        }
        value
    }

    fn write(&self, reg: Reg, value: u32) {
        self.writes.borrow_mut().push((reg, value));
        let stored = match reg {
            Reg::DmaSr => self.get(reg) & !value,
            Reg::DmaBmr => self.self_clearing(value, DMABMR_SR, &self.reset_stuck),
            Reg::DmaOmr => self.self_clearing(value, DMAOMR_FTF, &self.flush_stuck),
            Reg::MacFcr => self.self_clearing(value, MACFCR_FCBBPA, &self.pause_stuck),
            Reg::MacMiiAr if value & MACMIIAR_MB != 0 => self.mii_transaction(value),
            _ => value,
        };
        self.store(reg, stored);
    }
}

// =============================================================================
// Mock delay
// =============================================================================

/// Records requested delays without waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_us(&self) -> u32 {
        (self.total_ns / 1_000) as u32
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
    }
}

// =============================================================================
// Mock platform
// =============================================================================

#[derive(Debug)]
pub struct MockPlatform {
    pub clocks_enabled: bool,
    pub pins: Option<MediaInterface>,
    pub hclk_hz: u32,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            clocks_enabled: false,
            pins: None,
            hclk_hz: 168_000_000,
        }
    }
}

impl crate::hal::Platform for MockPlatform {
    fn enable_clocks(&mut self) {
        self.clocks_enabled = true;
    }

    fn configure_pins(&mut self, interface: MediaInterface) {
        self.pins = Some(interface);
    }

    fn hclk_hz(&self) -> u32 {
        self.hclk_hz
    }
}

// =============================================================================
// Recording dispatcher
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub source: [u8; 6],
    pub destination: [u8; 6],
    pub protocol: u16,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub received: Vec<ReceivedFrame>,
    pub completed: Vec<(TransferId, bool)>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn rx_complete(
        &mut self,
        source: [u8; 6],
        destination: [u8; 6],
        protocol: u16,
        payload: &mut FrameBuffer,
    ) {
        let mut data = vec![0; payload.remaining()];
        payload.read(&mut data);
        self.received.push(ReceivedFrame {
            source,
            destination,
            protocol,
            payload: data,
        });
    }

    fn tx_complete(&mut self, id: TransferId, success: bool) {
        self.completed.push((id, success));
    }
}

// =============================================================================
// Driver fixtures
// =============================================================================

pub type TestMac<'r, const TX: usize, const RX: usize> =
    EthernetMac<'r, &'r MockRegisters, MockPlatform, TestPool, RecordingDispatcher, TX, RX>;

pub type TestIrq<'r, const TX: usize, const RX: usize> =
    InterruptContext<'r, &'r MockRegisters, TestPool, TX, RX>;

/// Split, initialize, raise the link and poll once, leaving the data path
/// armed at 100 Mbit/s full duplex with a [`RecordingDispatcher`] installed.
pub fn linked_mac<'r, const TX: usize, const RX: usize>(
    resources: &'r mut EthResources<TX, RX>,
    regs: &'r MockRegisters,
    pool: &'static TestPool,
) -> (TestMac<'r, TX, RX>, TestIrq<'r, TX, RX>) {
    let (mut mac, irq) = resources
        .split(regs, MockPlatform::new(), pool, EthConfig::new())
        .unwrap();
    mac.register_dispatcher(RecordingDispatcher::new());
    mac.init(&mut MockDelay::new()).unwrap();
    regs.set_link(DEFAULT_PHY_ADDRESS, true);
    mac.poll().unwrap();
    assert!(mac.is_linked());
    (mac, irq)
}
