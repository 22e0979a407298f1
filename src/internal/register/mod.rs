//! Memory-mapped register access for the STM32 ETH peripheral
//!
//! The driver never touches absolute addresses directly. Every access goes
//! through [`RegisterBlock`], keyed by [`Reg`], so the same driver code runs
//! against [`Stm32Eth`] on target and against a register model in host tests.

pub mod dma;
pub mod mac;

use dma::{
    DMABMR_OFFSET, DMAIER_OFFSET, DMAMFBOCR_OFFSET, DMAOMR_OFFSET, DMARDLAR_OFFSET,
    DMARPDR_OFFSET, DMASR_OFFSET, DMATDLAR_OFFSET, DMATPDR_OFFSET,
};
use mac::{
    MACA_STRIDE, MACA0HR_OFFSET, MACA0LR_OFFSET, MACCR_OFFSET, MACFCR_OFFSET, MACFFR_OFFSET,
    MACMIIAR_OFFSET, MACMIIDR_OFFSET, SYSCFG_PMC_OFFSET,
};

/// ETH peripheral base address (STM32F4/F7)
pub const ETH_BASE: usize = 0x4002_8000;

/// SYSCFG peripheral base address (STM32F4/F7)
pub const SYSCFG_BASE: usize = 0x4001_3800;

/// A register the driver reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reg {
    /// MAC configuration
    MacCr,
    /// MAC frame filter
    MacFfr,
    /// MII address (PHY transaction control)
    MacMiiAr,
    /// MII data
    MacMiiDr,
    /// Flow control
    MacFcr,
    /// MAC address slot `n` high half
    MacAddrHigh(u8),
    /// MAC address slot `n` low half
    MacAddrLow(u8),
    /// DMA bus mode
    DmaBmr,
    /// DMA transmit poll demand
    DmaTpdr,
    /// DMA receive poll demand
    DmaRpdr,
    /// DMA receive descriptor list address
    DmaRdlar,
    /// DMA transmit descriptor list address
    DmaTdlar,
    /// DMA status
    DmaSr,
    /// DMA operation mode
    DmaOmr,
    /// DMA interrupt enable
    DmaIer,
    /// DMA missed frame and buffer overflow counter
    DmaMfbocr,
    /// SYSCFG peripheral mode configuration (MII/RMII select)
    SyscfgPmc,
}

impl Reg {
    /// Absolute address of the register on STM32F4/F7.
    pub const fn address(self) -> usize {
        match self {
            Reg::MacCr => ETH_BASE + MACCR_OFFSET,
            Reg::MacFfr => ETH_BASE + MACFFR_OFFSET,
            Reg::MacMiiAr => ETH_BASE + MACMIIAR_OFFSET,
            Reg::MacMiiDr => ETH_BASE + MACMIIDR_OFFSET,
            Reg::MacFcr => ETH_BASE + MACFCR_OFFSET,
            Reg::MacAddrHigh(n) => ETH_BASE + MACA0HR_OFFSET + n as usize * MACA_STRIDE,
            Reg::MacAddrLow(n) => ETH_BASE + MACA0LR_OFFSET + n as usize * MACA_STRIDE,
            Reg::DmaBmr => ETH_BASE + DMABMR_OFFSET,
            Reg::DmaTpdr => ETH_BASE + DMATPDR_OFFSET,
            Reg::DmaRpdr => ETH_BASE + DMARPDR_OFFSET,
            Reg::DmaRdlar => ETH_BASE + DMARDLAR_OFFSET,
            Reg::DmaTdlar => ETH_BASE + DMATDLAR_OFFSET,
            Reg::DmaSr => ETH_BASE + DMASR_OFFSET,
            Reg::DmaOmr => ETH_BASE + DMAOMR_OFFSET,
            Reg::DmaIer => ETH_BASE + DMAIER_OFFSET,
            Reg::DmaMfbocr => ETH_BASE + DMAMFBOCR_OFFSET,
            Reg::SyscfgPmc => SYSCFG_BASE + SYSCFG_PMC_OFFSET,
        }
    }
}

/// Access to the MAC/DMA control and status registers.
///
/// Methods take `&self`: registers are shared between the poll context and
/// the interrupt context, and each side holds its own handle.
pub trait RegisterBlock {
    /// Read a register
    fn read(&self, reg: Reg) -> u32;

    /// Write a register
    fn write(&self, reg: Reg, value: u32);

    /// Read-modify-write a register
    #[inline]
    fn modify<F>(&self, reg: Reg, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set bits in a register (read-modify-write)
    #[inline]
    fn set_bits(&self, reg: Reg, bits: u32) {
        self.modify(reg, |v| v | bits);
    }

    /// Clear bits in a register (read-modify-write)
    #[inline]
    fn clear_bits(&self, reg: Reg, bits: u32) {
        self.modify(reg, |v| v & !bits);
    }

    /// True if any of `bits` is set
    #[inline]
    fn is_set(&self, reg: Reg, bits: u32) -> bool {
        self.read(reg) & bits != 0
    }
}

impl<T: RegisterBlock + ?Sized> RegisterBlock for &T {
    #[inline]
    fn read(&self, reg: Reg) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&self, reg: Reg, value: u32) {
        (**self).write(reg, value);
    }
}

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/// Volatile MMIO access to the on-chip ETH and SYSCFG registers.
#[derive(Debug, Clone, Copy)]
pub struct Stm32Eth {
    _private: (),
}

impl Stm32Eth {
    /// Create a handle to the ETH peripheral registers.
    ///
    /// # Safety
    /// Only one driver instance may own the peripheral. The caller must also
    /// make sure the ETH and SYSCFG clocks are running before any access.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterBlock for Stm32Eth {
    #[inline(always)]
    fn read(&self, reg: Reg) -> u32 {
        // SAFETY: `Reg::address` only yields aligned ETH/SYSCFG register addresses
        unsafe { read_reg(reg.address()) }
    }

    #[inline(always)]
    fn write(&self, reg: Reg, value: u32) {
        // SAFETY: `Reg::address` only yields aligned ETH/SYSCFG register addresses
        unsafe { write_reg(reg.address(), value) }
    }
}
