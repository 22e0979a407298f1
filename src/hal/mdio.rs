//! MII management (SMI) access to the PHY.
//!
//! The MAC drives MDC/MDIO itself: software writes MACMIIDR (for writes),
//! then MACMIIAR with the PHY address, register number, clock range and the
//! busy bit, and waits for the busy bit to clear.

use crate::driver::error::{ConfigError, IoError, Result};
use crate::internal::constants::{
    HCLK_DIV26_MIN_HZ, HCLK_DIV42_MIN_HZ, HCLK_DIV62_MIN_HZ, HCLK_DIV102_MIN_HZ, MAX_PHY_ADDRESS,
    MII_BUSY_TIMEOUT,
};
use crate::internal::register::mac::{
    MACMIIAR_ADDR_MASK, MACMIIAR_CR_MASK, MACMIIAR_CR_SHIFT, MACMIIAR_MB, MACMIIAR_MR_SHIFT,
    MACMIIAR_MW, MACMIIAR_PA_SHIFT,
};
use crate::internal::register::{Reg, RegisterBlock};

/// Maximum valid register address (5-bit field)
pub const MAX_REG_ADDR: u8 = 31;

/// MDC clock range (MACMIIAR.CR) selected from HCLK.
///
/// MDC must stay at or below 2.5 MHz per IEEE 802.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MdcClockDivider {
    /// HCLK/42 (60-100 MHz)
    Div42 = 0,
    /// HCLK/62 (100-150 MHz)
    Div62 = 1,
    /// HCLK/16 (20-35 MHz)
    Div16 = 2,
    /// HCLK/26 (35-60 MHz)
    Div26 = 3,
    /// HCLK/102 (150-168 MHz)
    #[default]
    Div102 = 4,
}

impl MdcClockDivider {
    /// Pick the divider for an HCLK frequency.
    pub const fn from_hclk_hz(hclk_hz: u32) -> Self {
        if hclk_hz >= HCLK_DIV102_MIN_HZ {
            Self::Div102
        } else if hclk_hz >= HCLK_DIV62_MIN_HZ {
            Self::Div62
        } else if hclk_hz >= HCLK_DIV42_MIN_HZ {
            Self::Div42
        } else if hclk_hz >= HCLK_DIV26_MIN_HZ {
            Self::Div26
        } else {
            Self::Div16
        }
    }

    /// CR field value
    pub const fn to_reg_value(self) -> u32 {
        self as u32
    }
}

/// PHY register access.
///
/// Implemented by [`Smi`] for the on-chip management interface; tests and
/// boards with an external MDIO master can provide their own.
pub trait MdioBus {
    /// Read a PHY register
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16>;

    /// Write a PHY register
    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()>;

    /// Check if a management transaction is in flight
    fn is_busy(&self) -> bool;
}

/// Station management interface of the ETH MAC.
#[derive(Debug, Clone)]
pub struct Smi<R: RegisterBlock> {
    regs: R,
    divider: MdcClockDivider,
}

impl<R: RegisterBlock> Smi<R> {
    /// Wrap the MAC registers, with the slowest safe clock divider.
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            divider: MdcClockDivider::default(),
        }
    }

    /// Current clock divider
    pub fn divider(&self) -> MdcClockDivider {
        self.divider
    }

    /// Program the divider for `hclk_hz` into MACMIIAR.CR.
    ///
    /// Only the CR field is touched, so an idle interface stays idle.
    pub fn configure_for_hclk(&mut self, hclk_hz: u32) {
        self.divider = MdcClockDivider::from_hclk_hz(hclk_hz);
        let cr = self.divider.to_reg_value() << MACMIIAR_CR_SHIFT;
        self.regs
            .modify(Reg::MacMiiAr, |v| (v & !MACMIIAR_CR_MASK & !MACMIIAR_MB) | cr);
    }

    fn wait_not_busy(&self) -> Result<()> {
        for _ in 0..MII_BUSY_TIMEOUT {
            if !self.is_busy() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(IoError::Timeout.into())
    }

    fn command(&self, phy_addr: u8, reg_addr: u8, write: bool) -> u32 {
        let mut value = ((u32::from(phy_addr) & MACMIIAR_ADDR_MASK) << MACMIIAR_PA_SHIFT)
            | ((u32::from(reg_addr) & MACMIIAR_ADDR_MASK) << MACMIIAR_MR_SHIFT)
            | ((self.divider.to_reg_value() << MACMIIAR_CR_SHIFT) & MACMIIAR_CR_MASK)
            | MACMIIAR_MB;
        if write {
            value |= MACMIIAR_MW;
        }
        value
    }

    fn check(phy_addr: u8, reg_addr: u8) -> Result<()> {
        if phy_addr > MAX_PHY_ADDRESS {
            return Err(ConfigError::InvalidPhyAddress.into());
        }
        if reg_addr > MAX_REG_ADDR {
            return Err(ConfigError::InvalidConfig.into());
        }
        Ok(())
    }
}

impl<R: RegisterBlock> MdioBus for Smi<R> {
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16> {
        Self::check(phy_addr, reg_addr)?;
        self.wait_not_busy()?;
        self.regs
            .write(Reg::MacMiiAr, self.command(phy_addr, reg_addr, false));
        self.wait_not_busy()?;
        Ok((self.regs.read(Reg::MacMiiDr) & 0xFFFF) as u16)
    }

    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()> {
        Self::check(phy_addr, reg_addr)?;
        self.wait_not_busy()?;
        self.regs.write(Reg::MacMiiDr, u32::from(value));
        self.regs
            .write(Reg::MacMiiAr, self.command(phy_addr, reg_addr, true));
        self.wait_not_busy()
    }

    fn is_busy(&self) -> bool {
        self.regs.is_set(Reg::MacMiiAr, MACMIIAR_MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRegisters;

    #[test]
    fn divider_thresholds() {
        assert_eq!(MdcClockDivider::from_hclk_hz(168_000_000), MdcClockDivider::Div102);
        assert_eq!(MdcClockDivider::from_hclk_hz(150_000_000), MdcClockDivider::Div102);
        assert_eq!(MdcClockDivider::from_hclk_hz(120_000_000), MdcClockDivider::Div62);
        assert_eq!(MdcClockDivider::from_hclk_hz(100_000_000), MdcClockDivider::Div62);
        assert_eq!(MdcClockDivider::from_hclk_hz(84_000_000), MdcClockDivider::Div42);
        assert_eq!(MdcClockDivider::from_hclk_hz(48_000_000), MdcClockDivider::Div26);
        assert_eq!(MdcClockDivider::from_hclk_hz(25_000_000), MdcClockDivider::Div16);
    }

    #[test]
    fn divider_register_encoding() {
        assert_eq!(MdcClockDivider::Div42.to_reg_value(), 0);
        assert_eq!(MdcClockDivider::Div62.to_reg_value(), 1);
        assert_eq!(MdcClockDivider::Div16.to_reg_value(), 2);
        assert_eq!(MdcClockDivider::Div26.to_reg_value(), 3);
        assert_eq!(MdcClockDivider::Div102.to_reg_value(), 4);
    }

    #[test]
    fn configure_for_hclk_writes_cr_field() {
        let regs = MockRegisters::new();
        let mut smi = Smi::new(&regs);
        smi.configure_for_hclk(168_000_000);
        assert_eq!(regs.get(Reg::MacMiiAr) & MACMIIAR_CR_MASK, 4 << MACMIIAR_CR_SHIFT);
        assert_eq!(smi.divider(), MdcClockDivider::Div102);
    }

    #[test]
    fn read_and_write_reach_phy_register_map() {
        let regs = MockRegisters::new();
        let mut smi = Smi::new(&regs);
        smi.write(1, 4, 0x01E1).unwrap();
        assert_eq!(regs.phy_reg(1, 4), 0x01E1);
        regs.set_phy_reg(1, 2, 0x0007);
        assert_eq!(smi.read(1, 2).unwrap(), 0x0007);
        assert!(!smi.is_busy());
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        let regs = MockRegisters::new();
        let mut smi = Smi::new(&regs);
        assert_eq!(smi.read(32, 0), Err(ConfigError::InvalidPhyAddress.into()));
        assert_eq!(smi.write(1, 32, 0), Err(ConfigError::InvalidConfig.into()));
    }

    #[test]
    fn stuck_busy_bit_times_out() {
        let regs = MockRegisters::new();
        regs.set_mii_stuck(true);
        let mut smi = Smi::new(&regs);
        assert_eq!(smi.read(1, 1), Err(IoError::Timeout.into()));
    }
}
