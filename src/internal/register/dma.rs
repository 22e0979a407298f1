//! DMA Controller Register Definitions
//!
//! The DMA controller moves frames between the MAC FIFOs and system memory
//! through the descriptor rings. Offsets are relative to the ETH block base.

// =============================================================================
// Register Offsets
// =============================================================================

/// Bus Mode Register offset
pub const DMABMR_OFFSET: usize = 0x1000;
/// TX Poll Demand Register offset
pub const DMATPDR_OFFSET: usize = 0x1004;
/// RX Poll Demand Register offset
pub const DMARPDR_OFFSET: usize = 0x1008;
/// RX Descriptor List Address Register offset
pub const DMARDLAR_OFFSET: usize = 0x100C;
/// TX Descriptor List Address Register offset
pub const DMATDLAR_OFFSET: usize = 0x1010;
/// Status Register offset
pub const DMASR_OFFSET: usize = 0x1014;
/// Operation Mode Register offset
pub const DMAOMR_OFFSET: usize = 0x1018;
/// Interrupt Enable Register offset
pub const DMAIER_OFFSET: usize = 0x101C;
/// Missed Frame and Buffer Overflow Counter Register offset
pub const DMAMFBOCR_OFFSET: usize = 0x1020;

// =============================================================================
// Bus Mode Register (DMABMR) Bits
// =============================================================================

/// Software reset - resets MAC and DMA, cleared by hardware
pub const DMABMR_SR: u32 = 1 << 0;
/// Descriptor skip length shift
pub const DMABMR_DSL_SHIFT: u32 = 2;
/// Descriptor skip length mask
pub const DMABMR_DSL_MASK: u32 = 0x1F << 2;

// =============================================================================
// Status Register (DMASR) Bits
// =============================================================================

/// Transmit status (frame transmitted)
pub const DMASR_TS: u32 = 1 << 0;
/// Transmit process stopped
pub const DMASR_TPSS: u32 = 1 << 1;
/// Transmit buffer unavailable
pub const DMASR_TBUS: u32 = 1 << 2;
/// Transmit jabber timeout
pub const DMASR_TJTS: u32 = 1 << 3;
/// Receive overflow
pub const DMASR_ROS: u32 = 1 << 4;
/// Transmit underflow
pub const DMASR_TUS: u32 = 1 << 5;
/// Receive status (frame received)
pub const DMASR_RS: u32 = 1 << 6;
/// Receive buffer unavailable
pub const DMASR_RBUS: u32 = 1 << 7;
/// Receive process stopped
pub const DMASR_RPSS: u32 = 1 << 8;
/// Receive watchdog timeout
pub const DMASR_RWTS: u32 = 1 << 9;
/// Early transmit
pub const DMASR_ETS: u32 = 1 << 10;
/// Fatal bus error
pub const DMASR_FBES: u32 = 1 << 13;
/// Early receive
pub const DMASR_ERS: u32 = 1 << 14;
/// Abnormal interrupt summary
pub const DMASR_AIS: u32 = 1 << 15;
/// Normal interrupt summary
pub const DMASR_NIS: u32 = 1 << 16;

/// All write-1-to-clear status bits
pub const DMASR_CLEAR_MASK: u32 = 0x0001_E7FF;

// =============================================================================
// Operation Mode Register (DMAOMR) Bits
// =============================================================================

/// Start/stop receive
pub const DMAOMR_SR: u32 = 1 << 1;
/// Start/stop transmission
pub const DMAOMR_ST: u32 = 1 << 13;
/// Flush transmit FIFO (self-clearing)
pub const DMAOMR_FTF: u32 = 1 << 20;
/// Transmit store and forward
pub const DMAOMR_TSF: u32 = 1 << 21;
/// Receive store and forward
pub const DMAOMR_RSF: u32 = 1 << 25;

// =============================================================================
// Interrupt Enable Register (DMAIER) Bits
// =============================================================================

/// Every interrupt source the driver handles
///
/// TIE, TPSIE, TBUIE, TJTIE, ROIE, TUIE, RIE, RBUIE, RPSIE, RWTIE, ETIE,
/// FBEIE, ERIE, AISE and NISE.
pub const DMAIER_ALL: u32 = 0x0001_E7FF;

// =============================================================================
// Missed Frame and Buffer Overflow Counter (DMAMFBOCR)
// =============================================================================

/// Frames missed by the controller (no free descriptor)
pub const DMAMFBOCR_MFC_MASK: u32 = 0xFFFF;
/// Frames missed by the application (FIFO overflow) shift
pub const DMAMFBOCR_MFA_SHIFT: u32 = 17;
/// Frames missed by the application mask (after shift)
pub const DMAMFBOCR_MFA_MASK: u32 = 0x07FF;

/// Split a DMAMFBOCR reading into (application missed, controller missed).
#[inline]
pub const fn missed_frame_counts(raw: u32) -> (u32, u32) {
    (
        (raw >> DMAMFBOCR_MFA_SHIFT) & DMAMFBOCR_MFA_MASK,
        raw & DMAMFBOCR_MFC_MASK,
    )
}
