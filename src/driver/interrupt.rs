//! Interrupt half of the driver.
//!
//! [`InterruptContext`] owns the producing ends of both queues and the
//! reclaim cursors. The ETH vector calls
//! [`on_interrupt`](InterruptContext::on_interrupt), which never blocks and
//! reports failures only through the shared state code and counters.

use super::config::{DriverState, RxBufferSizes};
use super::error::DmaError;
use super::interface::{Completion, TransferId};
use super::resources::SharedState;
use crate::buffer::{BufferPool, FrameBuffer};
use crate::internal::dma::descriptor::{RxDescriptor, TxDescriptor};
use crate::internal::dma::ring::DescriptorRing;
use crate::internal::dma::rx::{RxEvent, RxReclaimer};
use crate::internal::dma::tx::TxReclaimer;
use crate::internal::fmt::{debug, warning};
use crate::internal::register::dma::{
    DMASR_AIS, DMASR_CLEAR_MASK, DMASR_FBES, DMASR_NIS, DMASR_RBUS, DMASR_ROS, DMASR_RPSS,
    DMASR_RS, DMASR_TBUS, DMASR_TPSS, DMASR_TS, DMASR_TUS, missed_frame_counts,
};
use crate::internal::register::{Reg, RegisterBlock};
use crate::sync::Producer;

// =============================================================================
// Interrupt Status
// =============================================================================

/// Flags decoded from DMASR.
///
/// ```ignore
/// let status = irq.on_interrupt();
/// if status.has_error() {
///     // overflow, underflow or bus error
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// TX complete - frame transmitted
    pub tx_complete: bool,
    /// TX process stopped
    pub tx_stopped: bool,
    /// TX buffer unavailable - DMA found a descriptor it does not own
    pub tx_buf_unavailable: bool,
    /// TX underflow
    pub tx_underflow: bool,
    /// RX complete - frame received
    pub rx_complete: bool,
    /// RX process stopped
    pub rx_stopped: bool,
    /// RX buffer unavailable - no descriptor ready
    pub rx_buf_unavailable: bool,
    /// RX FIFO overflow
    pub rx_overflow: bool,
    /// Fatal bus error - the DMA stopped
    pub fatal_bus_error: bool,
    /// Normal interrupt summary
    pub normal_summary: bool,
    /// Abnormal interrupt summary
    pub abnormal_summary: bool,
}

impl InterruptStatus {
    /// Decode a raw DMASR value
    #[inline]
    pub const fn from_raw(status: u32) -> Self {
        Self {
            tx_complete: (status & DMASR_TS) != 0,
            tx_stopped: (status & DMASR_TPSS) != 0,
            tx_buf_unavailable: (status & DMASR_TBUS) != 0,
            tx_underflow: (status & DMASR_TUS) != 0,
            rx_complete: (status & DMASR_RS) != 0,
            rx_stopped: (status & DMASR_RPSS) != 0,
            rx_buf_unavailable: (status & DMASR_RBUS) != 0,
            rx_overflow: (status & DMASR_ROS) != 0,
            fatal_bus_error: (status & DMASR_FBES) != 0,
            normal_summary: (status & DMASR_NIS) != 0,
            abnormal_summary: (status & DMASR_AIS) != 0,
        }
    }

    /// Encode back into DMASR bits (write-1-to-clear)
    pub const fn to_raw(&self) -> u32 {
        let flags = [
            (self.tx_complete, DMASR_TS),
            (self.tx_stopped, DMASR_TPSS),
            (self.tx_buf_unavailable, DMASR_TBUS),
            (self.tx_underflow, DMASR_TUS),
            (self.rx_complete, DMASR_RS),
            (self.rx_stopped, DMASR_RPSS),
            (self.rx_buf_unavailable, DMASR_RBUS),
            (self.rx_overflow, DMASR_ROS),
            (self.fatal_bus_error, DMASR_FBES),
            (self.normal_summary, DMASR_NIS),
            (self.abnormal_summary, DMASR_AIS),
        ];
        let mut raw = 0;
        let mut i = 0;
        while i < flags.len() {
            if flags[i].0 {
                raw |= flags[i].1;
            }
            i += 1;
        }
        raw
    }

    /// Any event flag set, ignoring the summary bits
    #[inline]
    pub const fn any(&self) -> bool {
        self.tx_complete
            || self.tx_stopped
            || self.tx_buf_unavailable
            || self.tx_underflow
            || self.rx_complete
            || self.rx_stopped
            || self.rx_buf_unavailable
            || self.rx_overflow
            || self.fatal_bus_error
    }

    /// Underflow, overflow or fatal bus error
    #[inline]
    pub const fn has_error(&self) -> bool {
        self.tx_underflow || self.rx_overflow || self.fatal_bus_error
    }
}

// =============================================================================
// Interrupt Context
// =============================================================================

/// Interrupt half produced by [`EthResources::split`](crate::EthResources::split).
pub struct InterruptContext<'a, R, B: 'static, const TX: usize, const RX: usize> {
    regs: R,
    pool: &'static B,
    tx_ring: &'a DescriptorRing<TxDescriptor, TX>,
    rx_ring: &'a DescriptorRing<RxDescriptor, RX>,
    rx_frames: Producer<'a, FrameBuffer, RX>,
    completions: Producer<'a, Completion, TX>,
    shared: &'a SharedState,
    tx: TxReclaimer,
    rx: RxReclaimer,
    rx_sizes: RxBufferSizes,
    generation: u32,
}

impl<'a, R, B, const TX: usize, const RX: usize> InterruptContext<'a, R, B, TX, RX>
where
    R: RegisterBlock,
    B: BufferPool,
{
    pub(crate) fn new(
        regs: R,
        pool: &'static B,
        tx_ring: &'a DescriptorRing<TxDescriptor, TX>,
        rx_ring: &'a DescriptorRing<RxDescriptor, RX>,
        rx_frames: Producer<'a, FrameBuffer, RX>,
        completions: Producer<'a, Completion, TX>,
        shared: &'a SharedState,
        rx_sizes: RxBufferSizes,
    ) -> Self {
        Self {
            regs,
            pool,
            tx_ring,
            rx_ring,
            rx_frames,
            completions,
            shared,
            tx: TxReclaimer::new(),
            rx: RxReclaimer::new(),
            rx_sizes,
            generation: 0,
        }
    }

    /// Service the ETH interrupt.
    ///
    /// Acknowledges DMASR, folds the missed-frame counters into the
    /// statistics, then reclaims finished TX descriptors (queueing one
    /// completion per frame) and received RX descriptors (queueing whole
    /// frames and refilling each descriptor). Returns the decoded status.
    pub fn on_interrupt(&mut self) -> InterruptStatus {
        let raw = self.regs.read(Reg::DmaSr);
        self.regs.write(Reg::DmaSr, raw & DMASR_CLEAR_MASK);
        self.shared.record_status(raw);
        let status = InterruptStatus::from_raw(raw);

        let (app_missed, mac_missed) = missed_frame_counts(self.regs.read(Reg::DmaMfbocr));
        self.shared.stats.add_app_missed(app_missed);
        self.shared.stats.add_mac_missed(mac_missed);

        if status.fatal_bus_error {
            warning!("DMA fatal bus error, DMASR={}", raw);
            self.shared.set_state(DriverState::DriverError);
        }

        let generation = self.shared.generation();
        if generation != 0 {
            if generation != self.generation {
                self.generation = generation;
                self.tx.reset();
                self.rx.reset(self.pool);
            }
            self.reclaim_tx();
            self.reclaim_rx();
        }

        #[cfg(feature = "async")]
        self.shared.signal.signal();
        status
    }

    fn reclaim_tx(&mut self) {
        let shared = self.shared;
        let completions = &mut self.completions;
        self.tx.reclaim(self.tx_ring, self.pool, |seq, success| {
            if success {
                shared.stats.frame_sent();
            } else {
                shared.stats.send_error();
            }
            let Some(id) = TransferId::new(seq) else {
                return;
            };
            // full when more frames complete between two polls than the ring holds
            if completions.enqueue(Completion { id, success }).is_err() {
                debug!("tx completion dropped, queue full");
                shared.stats.app_missed();
                shared.set_state(DriverState::TxQueueFull);
            }
        });
    }

    fn reclaim_rx(&mut self) {
        let pool = self.pool;
        let stats = &self.shared.stats;
        let frames = &mut self.rx_frames;
        let refill = self
            .rx
            .reclaim(self.rx_ring, pool, self.rx_sizes, |event| match event {
                RxEvent::Pending => {}
                RxEvent::Frame(frame) => match frames.enqueue(frame) {
                    Ok(()) => stats.frame_received(),
                    Err(mut frame) => {
                        frame.release(pool);
                        stats.app_missed();
                    }
                },
                RxEvent::Discarded(reason) => {
                    debug!("rx frame discarded: {}", reason);
                    stats.receive_error();
                }
            });

        match refill {
            Some(DmaError::OutOfMemory) => {
                warning!("rx refill: buffer pool exhausted");
                self.shared.set_state(DriverState::OutOfMemory);
            }
            Some(error) => {
                warning!("rx refill failed: {}", error);
                self.shared.set_state(DriverState::DriverError);
            }
            None => {}
        }
    }
}
