//! Storage for both driver halves and the split that hands them out.

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use super::config::{DriverState, EthConfig};
use super::error::{ConfigError, ConfigResult};
use super::interface::{Completion, Dispatcher};
use super::interrupt::{InterruptContext, InterruptStatus};
use super::mac::EthernetMac;
use super::stats::Statistics;
use crate::buffer::{BufferPool, FrameBuffer};
use crate::hal::Platform;
use crate::internal::dma::descriptor::{RxDescriptor, TxDescriptor};
use crate::internal::dma::ring::DescriptorRing;
use crate::internal::register::RegisterBlock;
use crate::sync::SpscQueue;
#[cfg(feature = "async")]
use crate::sync::InterruptSignal;

/// State both halves read and write, all of it atomic.
pub(crate) struct SharedState {
    pub(crate) stats: Statistics,
    state: AtomicU8,
    generation: AtomicU32,
    last_status: AtomicU32,
    #[cfg(feature = "async")]
    pub(crate) signal: InterruptSignal,
}

impl SharedState {
    const fn new() -> Self {
        Self {
            stats: Statistics::new(),
            state: AtomicU8::new(DriverState::NotInitialized as u8),
            generation: AtomicU32::new(0),
            last_status: AtomicU32::new(0),
            #[cfg(feature = "async")]
            signal: InterruptSignal::new(),
        }
    }

    pub(crate) fn set_state(&self, state: DriverState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    pub(crate) fn state(&self) -> DriverState {
        DriverState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Pass `result` through, latching `state` if it is an error.
    pub(crate) fn record_failure<T, E>(
        &self,
        state: DriverState,
        result: Result<T, E>,
    ) -> Result<T, E> {
        if result.is_err() {
            self.set_state(state);
        }
        result
    }

    /// Arm generation; 0 until the data path has been armed once.
    pub(crate) fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn bump_generation(&self) {
        let next = self.generation().wrapping_add(1).max(1);
        self.generation.store(next, Ordering::Release);
    }

    pub(crate) fn record_status(&self, raw: u32) {
        self.last_status.store(raw, Ordering::Relaxed);
    }

    pub(crate) fn last_status(&self) -> InterruptStatus {
        InterruptStatus::from_raw(self.last_status.load(Ordering::Relaxed))
    }
}

/// Descriptor rings, cross-context queues and counters for one controller.
///
/// `TX` and `RX` are the ring lengths; each queue holds as many entries as
/// its ring. The rings are read by the DMA engine, so this must live in
/// DMA-reachable RAM (on STM32F4, not CCM) for as long as the halves exist,
/// which in practice means a `static`.
///
/// ```ignore
/// static POOL: StaticPool<256, 16, 1536, 16> = StaticPool::new();
/// static IRQ: InterruptSlot<InterruptContext<'static, Stm32Eth, Pool, 8, 8>> =
///     InterruptSlot::new();
///
/// let resources: &'static mut EthResources<8, 8> = /* static storage */;
/// let (mut mac, irq) = resources.split(regs, board, &POOL, EthConfig::new())?;
/// IRQ.install(irq);
/// mac.init(&mut delay)?;
/// loop {
///     mac.poll()?;
/// }
/// ```
pub struct EthResources<const TX: usize, const RX: usize> {
    tx_ring: DescriptorRing<TxDescriptor, TX>,
    rx_ring: DescriptorRing<RxDescriptor, RX>,
    rx_frames: SpscQueue<FrameBuffer, RX>,
    completions: SpscQueue<Completion, TX>,
    shared: SharedState,
}

impl<const TX: usize, const RX: usize> EthResources<TX, RX> {
    /// Empty rings and queues
    pub const fn new() -> Self {
        Self {
            tx_ring: DescriptorRing::new(),
            rx_ring: DescriptorRing::new(),
            rx_frames: SpscQueue::new(),
            completions: SpscQueue::new(),
            shared: SharedState::new(),
        }
    }

    /// Hand out the poll half and the interrupt half.
    ///
    /// Buffers left over from an earlier split are returned to `pool`, and
    /// all counters start from zero. Fails if the configuration does not
    /// validate or either ring is empty.
    #[allow(clippy::type_complexity)]
    pub fn split<R, P, B, D>(
        &mut self,
        regs: R,
        platform: P,
        pool: &'static B,
        config: EthConfig,
    ) -> ConfigResult<(
        EthernetMac<'_, R, P, B, D, TX, RX>,
        InterruptContext<'_, R, B, TX, RX>,
    )>
    where
        R: RegisterBlock + Clone,
        P: Platform,
        B: BufferPool,
        D: Dispatcher,
    {
        config.validate()?;
        if TX == 0 || RX == 0 {
            return Err(ConfigError::InvalidConfig);
        }

        while let Some(mut frame) = self.rx_frames.dequeue() {
            frame.release(pool);
        }
        while self.completions.dequeue().is_some() {}
        // `&mut self` rules out a live claim from either half
        let tx_clean = self.tx_ring.reset_all(pool);
        let rx_clean = self.rx_ring.reset_all(pool);
        debug_assert!(tx_clean && rx_clean, "slot claimed across split");
        self.shared = SharedState::new();

        let (rx_producer, rx_consumer) = self.rx_frames.split();
        let (tx_producer, tx_consumer) = self.completions.split();

        let irq = InterruptContext::new(
            regs.clone(),
            pool,
            &self.tx_ring,
            &self.rx_ring,
            rx_producer,
            tx_producer,
            &self.shared,
            config.rx_buffer_sizes,
        );
        let mac = EthernetMac::new(
            regs,
            platform,
            pool,
            config,
            &self.tx_ring,
            &self.rx_ring,
            rx_consumer,
            tx_consumer,
            &self.shared,
        );
        Ok((mac, irq))
    }
}

impl<const TX: usize, const RX: usize> Default for EthResources<TX, RX> {
    fn default() -> Self {
        Self::new()
    }
}
