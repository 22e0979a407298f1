//! MAC Core Register Definitions
//!
//! Offsets are relative to the ETH block base. The MAC address registers
//! come in HIGH/LOW pairs, eight bytes apart.

// =============================================================================
// Register Offsets
// =============================================================================

/// MAC Configuration Register offset
pub const MACCR_OFFSET: usize = 0x00;
/// MAC Frame Filter Register offset
pub const MACFFR_OFFSET: usize = 0x04;
/// MII Address Register offset
pub const MACMIIAR_OFFSET: usize = 0x10;
/// MII Data Register offset
pub const MACMIIDR_OFFSET: usize = 0x14;
/// Flow Control Register offset
pub const MACFCR_OFFSET: usize = 0x18;
/// MAC Address 0 High Register offset
pub const MACA0HR_OFFSET: usize = 0x40;
/// MAC Address 0 Low Register offset
pub const MACA0LR_OFFSET: usize = 0x44;
/// Stride between consecutive MAC address register pairs
pub const MACA_STRIDE: usize = 0x08;

// =============================================================================
// MAC Configuration Register (MACCR) Bits
// =============================================================================

/// Receiver enable
pub const MACCR_RE: u32 = 1 << 2;
/// Transmitter enable
pub const MACCR_TE: u32 = 1 << 3;
/// Deferral check
pub const MACCR_DC: u32 = 1 << 4;
/// Back-off limit mask
pub const MACCR_BL_MASK: u32 = 0x3 << 5;
/// Automatic pad/CRC stripping
pub const MACCR_APCS: u32 = 1 << 7;
/// Retry disable
pub const MACCR_RD: u32 = 1 << 9;
/// IPv4 checksum offload
pub const MACCR_IPCO: u32 = 1 << 10;
/// Duplex mode (full duplex if set)
pub const MACCR_DM: u32 = 1 << 11;
/// Loopback mode
pub const MACCR_LM: u32 = 1 << 12;
/// Receive own disable
pub const MACCR_ROD: u32 = 1 << 13;
/// Fast Ethernet speed (100 Mbps if set)
pub const MACCR_FES: u32 = 1 << 14;
/// Carrier sense disable
pub const MACCR_CSD: u32 = 1 << 16;
/// Interframe gap mask
pub const MACCR_IFG_MASK: u32 = 0x7 << 17;
/// Interframe gap of 64 bit times
pub const MACCR_IFG_64BIT: u32 = 0x4 << 17;
/// Jabber disable
pub const MACCR_JD: u32 = 1 << 22;
/// Watchdog disable
pub const MACCR_WD: u32 = 1 << 23;

/// Every MACCR field rewritten by the link-up configuration
pub const MACCR_LINK_CONFIG_MASK: u32 = MACCR_WD
    | MACCR_JD
    | MACCR_IFG_MASK
    | MACCR_CSD
    | MACCR_FES
    | MACCR_ROD
    | MACCR_LM
    | MACCR_DM
    | MACCR_IPCO
    | MACCR_RD
    | MACCR_APCS
    | MACCR_BL_MASK
    | MACCR_DC
    | MACCR_TE
    | MACCR_RE;

// =============================================================================
// MII Address Register (MACMIIAR) Bits
// =============================================================================

/// MII busy
pub const MACMIIAR_MB: u32 = 1 << 0;
/// MII write (read if clear)
pub const MACMIIAR_MW: u32 = 1 << 1;
/// Clock range shift
pub const MACMIIAR_CR_SHIFT: u32 = 2;
/// Clock range mask
pub const MACMIIAR_CR_MASK: u32 = 0x7 << 2;
/// MII register shift
pub const MACMIIAR_MR_SHIFT: u32 = 6;
/// PHY address shift
pub const MACMIIAR_PA_SHIFT: u32 = 11;
/// Register/PHY address field width mask (5 bits)
pub const MACMIIAR_ADDR_MASK: u32 = 0x1F;

// =============================================================================
// Flow Control Register (MACFCR) Bits
// =============================================================================

/// Flow control busy / back pressure activate (writing 1 sends a pause frame)
pub const MACFCR_FCBBPA: u32 = 1 << 0;
/// Transmit flow control enable
pub const MACFCR_TFCE: u32 = 1 << 1;
/// Receive flow control enable
pub const MACFCR_RFCE: u32 = 1 << 2;
/// Pause low threshold: pause time minus 28 slot times
pub const MACFCR_PLT_MINUS28: u32 = 0x1 << 4;
/// Pause time shift
pub const MACFCR_PT_SHIFT: u32 = 16;

// =============================================================================
// MAC Address Registers
// =============================================================================

/// Address enable bit in MACA1HR..MACA3HR (MACA0HR always reads as 1)
pub const MACAHR_AE: u32 = 1 << 31;

/// Pack a MAC address into its (high, low) register pair values.
#[inline]
pub const fn mac_address_to_regs(addr: &[u8; 6]) -> (u32, u32) {
    let high = ((addr[5] as u32) << 8) | addr[4] as u32;
    let low = ((addr[3] as u32) << 24)
        | ((addr[2] as u32) << 16)
        | ((addr[1] as u32) << 8)
        | addr[0] as u32;
    (high, low)
}

// =============================================================================
// SYSCFG
// =============================================================================

/// SYSCFG peripheral mode configuration register offset from SYSCFG base
pub const SYSCFG_PMC_OFFSET: usize = 0x04;
/// RMII selected when set, MII when clear
pub const SYSCFG_PMC_MII_RMII_SEL: u32 = 1 << 23;
