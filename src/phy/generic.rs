//! IEEE 802.3 Clause 22 PHY access.
//!
//! Only the standard registers are used, so any 10/100 PHY (LAN8742A,
//! DP83848, KSZ8081, ...) works without a chip-specific driver.

use embedded_hal::delay::DelayNs;

use crate::driver::config::{Duplex, Speed};
use crate::driver::error::{IoError, Result};
use crate::driver::link::LinkConfig;
use crate::hal::mdio::MdioBus;
use crate::internal::constants::{PHY_RESET_MAX_ATTEMPTS, PHY_RESET_POLL_INTERVAL_US};
use crate::internal::phy_regs::standard::{ability, bmcr, bmsr, phy_reg};

// =============================================================================
// Link Status
// =============================================================================

/// Negotiated or configured link parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStatus {
    /// Link speed
    pub speed: Speed,
    /// Duplex mode
    pub duplex: Duplex,
}

impl LinkStatus {
    /// Create a new link status
    pub const fn new(speed: Speed, duplex: Duplex) -> Self {
        Self { speed, duplex }
    }

    /// Highest mode both ends advertise.
    ///
    /// Priority follows IEEE 802.3 Annex 28B: 100BASE-TX FD, 100BASE-T4,
    /// 100BASE-TX, 10BASE-T FD, 10BASE-T. `None` if there is no common mode.
    pub const fn resolve(anar: u16, anlpar: u16) -> Option<Self> {
        let common = anar & anlpar;
        if common & ability::TX_FD != 0 {
            Some(Self::new(Speed::Mbps100, Duplex::Full))
        } else if common & (ability::T4 | ability::TX_HD) != 0 {
            Some(Self::new(Speed::Mbps100, Duplex::Half))
        } else if common & ability::T10_FD != 0 {
            Some(Self::new(Speed::Mbps10, Duplex::Full))
        } else if common & ability::T10_HD != 0 {
            Some(Self::new(Speed::Mbps10, Duplex::Half))
        } else {
            None
        }
    }
}

// =============================================================================
// PHY Capabilities
// =============================================================================

/// What the PHY reports it can do, from BMSR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyCapabilities {
    /// 100BASE-T4
    pub speed_100_t4: bool,
    /// 100BASE-TX full duplex
    pub speed_100_fd: bool,
    /// 100BASE-TX half duplex
    pub speed_100_hd: bool,
    /// 100BASE-T2 full duplex
    pub speed_100_t2_fd: bool,
    /// 100BASE-T2 half duplex
    pub speed_100_t2_hd: bool,
    /// 10BASE-T full duplex
    pub speed_10_fd: bool,
    /// 10BASE-T half duplex
    pub speed_10_hd: bool,
    /// Autonegotiation ability
    pub auto_negotiation: bool,
}

impl PhyCapabilities {
    /// Decode the capability bits of BMSR
    pub const fn from_bmsr(status: u16) -> Self {
        Self {
            speed_100_t4: status & bmsr::T4_CAPABLE != 0,
            speed_100_fd: status & bmsr::TX_FD_CAPABLE != 0,
            speed_100_hd: status & bmsr::TX_HD_CAPABLE != 0,
            speed_100_t2_fd: status & bmsr::T2_FD_CAPABLE != 0,
            speed_100_t2_hd: status & bmsr::T2_HD_CAPABLE != 0,
            speed_10_fd: status & bmsr::T10_FD_CAPABLE != 0,
            speed_10_hd: status & bmsr::T10_HD_CAPABLE != 0,
            auto_negotiation: status & bmsr::AN_ABILITY != 0,
        }
    }

    /// Any 100 Mbit mode
    pub const fn supports_100(&self) -> bool {
        self.speed_100_t4
            || self.speed_100_fd
            || self.speed_100_hd
            || self.speed_100_t2_fd
            || self.speed_100_t2_hd
    }

    /// Full duplex available at `speed`
    pub const fn supports_full_duplex(&self, speed: Speed) -> bool {
        match speed {
            Speed::Mbps100 => self.speed_100_fd || self.speed_100_t2_fd,
            Speed::Mbps10 => self.speed_10_fd,
        }
    }

    /// Pull a requested configuration down to what the PHY can do.
    ///
    /// This is advisory: the partner may still settle on something else,
    /// which only shows up once the link is polled.
    pub const fn clamp(&self, mut link: LinkConfig) -> LinkConfig {
        if !self.auto_negotiation {
            link.autonegotiation = false;
        }
        if !self.supports_100() {
            link.speed = Speed::Mbps10;
        }
        if !self.supports_full_duplex(link.speed) {
            link.duplex = Duplex::Half;
        }
        link
    }
}

// =============================================================================
// Generic PHY
// =============================================================================

/// A Clause 22 PHY at a fixed management address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GenericPhy {
    addr: u8,
}

impl GenericPhy {
    /// PHY at `addr` (0-31)
    pub const fn new(addr: u8) -> Self {
        Self { addr }
    }

    /// Management address
    pub const fn address(&self) -> u8 {
        self.addr
    }

    /// Point at a different management address
    pub fn set_address(&mut self, addr: u8) {
        self.addr = addr;
    }

    /// Set BMCR.RESET and wait for the PHY to clear it.
    pub fn soft_reset<M: MdioBus, D: DelayNs>(&self, mdio: &mut M, delay: &mut D) -> Result<()> {
        mdio.write(self.addr, phy_reg::BMCR, bmcr::RESET)?;
        for _ in 0..PHY_RESET_MAX_ATTEMPTS {
            if mdio.read(self.addr, phy_reg::BMCR)? & bmcr::RESET == 0 {
                return Ok(());
            }
            delay.delay_us(PHY_RESET_POLL_INTERVAL_US);
        }
        Err(IoError::Timeout.into())
    }

    /// Raw BMSR
    pub fn status<M: MdioBus>(&self, mdio: &mut M) -> Result<u16> {
        mdio.read(self.addr, phy_reg::BMSR)
    }

    /// Capability bits from BMSR
    pub fn capabilities<M: MdioBus>(&self, mdio: &mut M) -> Result<PhyCapabilities> {
        self.status(mdio).map(PhyCapabilities::from_bmsr)
    }

    /// BMSR link status bit
    pub fn is_link_up<M: MdioBus>(&self, mdio: &mut M) -> Result<bool> {
        Ok(self.status(mdio)? & bmsr::LINK_STATUS != 0)
    }

    /// Write speed, duplex and AN enable to BMCR, clearing everything else.
    pub fn write_parameters<M: MdioBus>(&self, mdio: &mut M, link: &LinkConfig) -> Result<()> {
        let mut control = 0;
        if matches!(link.speed, Speed::Mbps100) {
            control |= bmcr::SPEED_100;
        }
        if matches!(link.duplex, Duplex::Full) {
            control |= bmcr::DUPLEX_FULL;
        }
        if link.autonegotiation {
            control |= bmcr::AN_ENABLE;
        }
        mdio.write(self.addr, phy_reg::BMCR, control)
    }

    /// Set BMCR.AN_RESTART, keeping the other control bits.
    pub fn restart_autonegotiation<M: MdioBus>(&self, mdio: &mut M) -> Result<()> {
        let control = mdio.read(self.addr, phy_reg::BMCR)?;
        mdio.write(self.addr, phy_reg::BMCR, control | bmcr::AN_RESTART)
    }

    /// Negotiated link parameters, or `None` if autonegotiation has not
    /// completed or found no common mode.
    pub fn negotiated<M: MdioBus>(&self, mdio: &mut M) -> Result<Option<LinkStatus>> {
        if self.status(mdio)? & bmsr::AN_COMPLETE == 0 {
            return Ok(None);
        }
        let anar = mdio.read(self.addr, phy_reg::ANAR)?;
        let anlpar = mdio.read(self.addr, phy_reg::ANLPAR)?;
        Ok(LinkStatus::resolve(anar, anlpar))
    }

    /// `(PHYIDR1 << 16) | PHYIDR2`
    pub fn phy_id<M: MdioBus>(&self, mdio: &mut M) -> Result<u32> {
        let high = mdio.read(self.addr, phy_reg::PHYIDR1)?;
        let low = mdio.read(self.addr, phy_reg::PHYIDR2)?;
        Ok((u32::from(high) << 16) | u32::from(low))
    }
}
