//! IEEE 802.3 Clause 22 PHY registers used by the link state machine.
//!
//! | Register | Name | Use |
//! |----------|------|-----|
//! | 0 | BMCR | reset, speed/duplex/AN control |
//! | 1 | BMSR | capabilities, link status, AN complete |
//! | 2, 3 | PHYIDR1/2 | OUI, model, revision |
//! | 4 | ANAR | modes we advertise |
//! | 5 | ANLPAR | modes the link partner advertises |

/// Register addresses.
pub mod phy_reg {
    /// Basic Mode Control Register
    pub const BMCR: u8 = 0;
    /// Basic Mode Status Register
    pub const BMSR: u8 = 1;
    /// PHY Identifier 1
    pub const PHYIDR1: u8 = 2;
    /// PHY Identifier 2
    pub const PHYIDR2: u8 = 3;
    /// Auto-Negotiation Advertisement Register
    pub const ANAR: u8 = 4;
    /// Auto-Negotiation Link Partner Ability Register
    pub const ANLPAR: u8 = 5;
}

/// BMCR (Basic Mode Control Register) bits
pub mod bmcr {
    /// Soft reset, self-clearing
    pub const RESET: u16 = 1 << 15;
    /// Speed select (100 Mbps if set, 10 Mbps if clear)
    pub const SPEED_100: u16 = 1 << 13;
    /// Auto-negotiation enable
    pub const AN_ENABLE: u16 = 1 << 12;
    /// Restart auto-negotiation, self-clearing
    pub const AN_RESTART: u16 = 1 << 9;
    /// Duplex mode (full duplex if set)
    pub const DUPLEX_FULL: u16 = 1 << 8;
}

/// BMSR (Basic Mode Status Register) bits
pub mod bmsr {
    /// 100BASE-T4 capable
    pub const T4_CAPABLE: u16 = 1 << 15;
    /// 100BASE-TX full duplex capable
    pub const TX_FD_CAPABLE: u16 = 1 << 14;
    /// 100BASE-TX half duplex capable
    pub const TX_HD_CAPABLE: u16 = 1 << 13;
    /// 10BASE-T full duplex capable
    pub const T10_FD_CAPABLE: u16 = 1 << 12;
    /// 10BASE-T half duplex capable
    pub const T10_HD_CAPABLE: u16 = 1 << 11;
    /// 100BASE-T2 full duplex capable
    pub const T2_FD_CAPABLE: u16 = 1 << 10;
    /// 100BASE-T2 half duplex capable
    pub const T2_HD_CAPABLE: u16 = 1 << 9;
    /// Auto-negotiation complete
    pub const AN_COMPLETE: u16 = 1 << 5;
    /// Auto-negotiation ability
    pub const AN_ABILITY: u16 = 1 << 3;
    /// Link status (latched low)
    pub const LINK_STATUS: u16 = 1 << 2;

    /// Any 100 Mbit mode
    pub const ANY_100: u16 =
        T4_CAPABLE | TX_FD_CAPABLE | TX_HD_CAPABLE | T2_FD_CAPABLE | T2_HD_CAPABLE;
}

/// Technology ability bits, shared by ANAR and ANLPAR.
pub mod ability {
    /// 100BASE-T4
    pub const T4: u16 = 1 << 9;
    /// 100BASE-TX full duplex
    pub const TX_FD: u16 = 1 << 8;
    /// 100BASE-TX half duplex
    pub const TX_HD: u16 = 1 << 7;
    /// 10BASE-T full duplex
    pub const T10_FD: u16 = 1 << 6;
    /// 10BASE-T half duplex
    pub const T10_HD: u16 = 1 << 5;
    /// Selector field mask
    pub const SELECTOR_MASK: u16 = 0x001F;
}
