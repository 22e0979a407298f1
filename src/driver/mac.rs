//! Poll half of the driver.
//!
//! [`EthernetMac`] owns the PHY, the link state machine, the TX submit
//! cursor and the consuming ends of both queues. Every method runs in the
//! cooperative poll context; nothing here is called from the interrupt.

use embedded_hal::delay::DelayNs;

use super::config::{Duplex, DriverState, EthConfig, MediaInterface, Speed};
use super::error::{ConfigError, DmaError, IoError, Result};
use super::interface::{Completion, Dispatcher, NetInterface, Parameter, TransferId};
use super::interrupt::InterruptStatus;
use super::link::{LinkConfig, LinkState, LinkTransition};
use super::resources::SharedState;
use super::stats::StatisticsSnapshot;
use crate::buffer::{BufferPool, FrameBuffer};
use crate::hal::{MdioBus, Platform, ResetController, Smi};
use crate::internal::constants::{
    ETH_HEADER_SIZE, FLUSH_TIMEOUT, MAX_MAC_ADDRESSES, MAX_PHY_ADDRESS, PAUSE_BUSY_TIMEOUT,
};
use crate::internal::dma::descriptor::{RxDescriptor, TxDescriptor};
use crate::internal::dma::ring::DescriptorRing;
use crate::internal::dma::rx::provision_ring;
use crate::internal::dma::tx::{TxSubmitter, is_idle};
use crate::internal::fmt::{debug, info, warning};
use crate::internal::register::dma::{
    DMABMR_DSL_MASK, DMAIER_ALL, DMAOMR_FTF, DMAOMR_RSF, DMAOMR_SR, DMAOMR_ST, DMAOMR_TSF,
};
use crate::internal::register::mac::{
    MACAHR_AE, MACCR_DM, MACCR_FES, MACCR_IFG_64BIT, MACCR_IPCO, MACCR_LINK_CONFIG_MASK,
    MACCR_RE, MACCR_TE, MACFCR_FCBBPA, MACFCR_PLT_MINUS28, MACFCR_PT_SHIFT, MACFCR_RFCE,
    MACFCR_TFCE, SYSCFG_PMC_MII_RMII_SEL, mac_address_to_regs,
};
use crate::internal::register::{Reg, RegisterBlock};
use crate::phy::GenericPhy;
use crate::sync::Consumer;
#[cfg(feature = "async")]
use crate::sync::InterruptFuture;

/// Poll half produced by [`EthResources::split`](crate::EthResources::split).
///
/// `D` is the application's [`Dispatcher`]; frames and completions are
/// delivered to it from [`poll`](Self::poll).
pub struct EthernetMac<'a, R, P, B, D, const TX: usize, const RX: usize>
where
    R: RegisterBlock,
    B: 'static,
{
    regs: R,
    smi: Smi<R>,
    platform: P,
    pool: &'static B,
    config: EthConfig,
    link: LinkConfig,
    link_state: LinkState,
    phy: GenericPhy,
    tx_ring: &'a DescriptorRing<TxDescriptor, TX>,
    rx_ring: &'a DescriptorRing<RxDescriptor, RX>,
    rx_frames: Consumer<'a, FrameBuffer, RX>,
    completions: Consumer<'a, Completion, TX>,
    shared: &'a SharedState,
    submitter: TxSubmitter,
    next_id: TransferId,
    addresses: [Option<[u8; 6]>; MAX_MAC_ADDRESSES],
    dispatcher: Option<D>,
}

impl<'a, R, P, B, D, const TX: usize, const RX: usize> EthernetMac<'a, R, P, B, D, TX, RX>
where
    R: RegisterBlock + Clone,
    P: Platform,
    B: BufferPool,
    D: Dispatcher,
{
    pub(crate) fn new(
        regs: R,
        platform: P,
        pool: &'static B,
        config: EthConfig,
        tx_ring: &'a DescriptorRing<TxDescriptor, TX>,
        rx_ring: &'a DescriptorRing<RxDescriptor, RX>,
        rx_frames: Consumer<'a, FrameBuffer, RX>,
        completions: Consumer<'a, Completion, TX>,
        shared: &'a SharedState,
    ) -> Self {
        let mut addresses = [None; MAX_MAC_ADDRESSES];
        addresses[0] = Some(config.mac_address);
        Self {
            smi: Smi::new(regs.clone()),
            regs,
            platform,
            pool,
            link: LinkConfig::from_config(&config),
            link_state: LinkState::NotInitialized,
            phy: GenericPhy::new(config.phy_address),
            config,
            tx_ring,
            rx_ring,
            rx_frames,
            completions,
            shared,
            submitter: TxSubmitter::new(),
            next_id: TransferId::FIRST,
            addresses,
            dispatcher: None,
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Bring up clocks, pins, MAC and PHY.
    ///
    /// Leaves the link state at `Initialized`; the data path is only armed
    /// once [`poll`](Self::poll) sees the link come up.
    ///
    /// # Errors
    ///
    /// - `ConfigError::AlreadyInitialized` on a second call
    /// - `IoError::Timeout` if the MAC/DMA reset never completes (state
    ///   `MacError`) or the PHY stops answering (state `PhyError`)
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<()> {
        if self.link_state.is_initialized() {
            return Err(ConfigError::AlreadyInitialized.into());
        }
        info!("eth init: PHY at address {}", self.phy.address());

        self.platform.enable_clocks();
        self.platform.configure_pins(self.link.media_interface);
        self.select_media_interface();

        let reset =
            ResetController::with_timeout(&self.regs, &mut *delay, self.config.reset_timeout_ms)
                .soft_reset();
        if let Err(error) = reset {
            warning!("eth init: MAC/DMA reset did not complete");
            self.shared.set_state(DriverState::MacError);
            return Err(error);
        }

        self.smi.configure_for_hclk(self.platform.hclk_hz());
        self.program_address(0, self.config.mac_address);

        let phy_reset = self.phy.soft_reset(&mut self.smi, delay);
        self.shared.record_failure(DriverState::PhyError, phy_reset)?;

        self.shared.set_state(DriverState::Ok);
        self.link_state = LinkState::Initialized;
        debug!("eth init: MAC and PHY reset");

        self.clamp_to_phy()?;
        self.write_phy_parameters()
    }

    /// Write BMCR from the current link settings and restart negotiation.
    fn write_phy_parameters(&mut self) -> Result<()> {
        let written = self.phy.write_parameters(&mut self.smi, &self.link);
        self.shared.record_failure(DriverState::PhyError, written)?;
        if self.link.autonegotiation {
            let restarted = self.phy.restart_autonegotiation(&mut self.smi);
            self.shared.record_failure(DriverState::PhyError, restarted)?;
        }
        Ok(())
    }

    /// Pull the requested link settings down to what the PHY reports.
    /// No-op before `init`.
    fn clamp_to_phy(&mut self) -> Result<()> {
        if !self.link_state.is_initialized() {
            return Ok(());
        }
        let capabilities = self.phy.capabilities(&mut self.smi);
        let capabilities = self
            .shared
            .record_failure(DriverState::PhyError, capabilities)?;
        let clamped = capabilities.clamp(self.link);
        if clamped != self.link {
            debug!(
                "link settings clamped: {} kbps, full duplex {}, autoneg {}",
                clamped.speed.kbps(),
                matches!(clamped.duplex, Duplex::Full),
                clamped.autonegotiation
            );
        }
        self.link = clamped;
        Ok(())
    }

    fn select_media_interface(&self) {
        let rmii = matches!(self.link.media_interface, MediaInterface::Rmii);
        self.regs.modify(Reg::SyscfgPmc, |v| {
            if rmii {
                v | SYSCFG_PMC_MII_RMII_SEL
            } else {
                v & !SYSCFG_PMC_MII_RMII_SEL
            }
        });
    }

    // =========================================================================
    // Link tracking
    // =========================================================================

    /// Sample the PHY link bit, react to transitions and, while linked,
    /// deliver queued frames and completions to the dispatcher.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NotInitialized` before `init`
    /// - the PHY access error (state `PhyError`)
    /// - an arming failure on link up; the link is then reported down and
    ///   the next poll tries again
    pub fn poll(&mut self) -> Result<()> {
        if !self.link_state.is_initialized() {
            return Err(ConfigError::NotInitialized.into());
        }
        let link_up = self.phy.is_link_up(&mut self.smi);
        let link_up = self.shared.record_failure(DriverState::PhyError, link_up)?;

        let (next, transition) = self.link_state.on_link_status(link_up);
        self.link_state = next;
        match transition {
            LinkTransition::Up => self.on_link_up()?,
            // in-flight buffers stay attached until the next arm
            LinkTransition::Down => info!("link down"),
            LinkTransition::None => {}
        }

        if self.link_state.is_linked() {
            self.dispatch();
            self.regs.write(Reg::DmaTpdr, 1);
            self.regs.write(Reg::DmaRpdr, 1);
        }
        Ok(())
    }

    fn on_link_up(&mut self) -> Result<()> {
        let result = self.bring_up();
        if result.is_err() {
            self.link_state = LinkState::Unlinked;
        }
        result
    }

    fn bring_up(&mut self) -> Result<()> {
        if self.link.autonegotiation {
            let negotiated = self.phy.negotiated(&mut self.smi);
            if let Some(status) = self
                .shared
                .record_failure(DriverState::PhyError, negotiated)?
            {
                self.link.speed = status.speed;
                self.link.duplex = status.duplex;
            }
        }
        self.arm()?;
        self.configure_mac();
        info!(
            "link up: {} kbps, full duplex {}",
            self.link.speed.kbps(),
            matches!(self.link.duplex, Duplex::Full)
        );
        Ok(())
    }

    /// Stop the DMA, recycle both rings and restart with fresh RX buffers.
    fn arm(&mut self) -> Result<()> {
        self.regs.write(Reg::DmaIer, 0);
        self.regs.clear_bits(Reg::DmaOmr, DMAOMR_ST | DMAOMR_SR);
        if let Err(error) = self.flush_tx_fifo() {
            warning!("arm: TX FIFO flush timed out");
            self.shared.set_state(DriverState::DriverError);
            return Err(error);
        }

        // interrupts are masked, so nothing holds a slot claim here
        let tx_clean = self.tx_ring.reset_all(self.pool);
        let rx_clean = self.rx_ring.reset_all(self.pool);
        debug_assert!(tx_clean && rx_clean, "slot claimed while arming");
        self.submitter.reset();
        if let Err(error) = provision_ring(self.rx_ring, self.pool, self.config.rx_buffer_sizes) {
            warning!("arm: RX provisioning failed: {}", error);
            self.shared.set_state(match error {
                DmaError::OutOfMemory => DriverState::OutOfMemory,
                _ => DriverState::DriverError,
            });
            return Err(error.into());
        }
        self.shared.bump_generation();

        self.regs.modify(Reg::DmaBmr, |v| v & !DMABMR_DSL_MASK);
        self.regs.write(Reg::DmaTdlar, self.tx_ring.base_addr());
        self.regs.write(Reg::DmaRdlar, self.rx_ring.base_addr());
        let mut omr = DMAOMR_ST | DMAOMR_SR;
        if self.config.checksum_offload {
            // checksum insertion needs whole frames in the FIFO
            omr |= DMAOMR_TSF | DMAOMR_RSF;
        }
        self.regs.write(Reg::DmaIer, DMAIER_ALL);
        self.regs.set_bits(Reg::DmaOmr, omr);
        Ok(())
    }

    fn flush_tx_fifo(&self) -> Result<()> {
        self.regs.set_bits(Reg::DmaOmr, DMAOMR_FTF);
        for _ in 0..FLUSH_TIMEOUT {
            if !self.regs.is_set(Reg::DmaOmr, DMAOMR_FTF) {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(IoError::Timeout.into())
    }

    fn configure_mac(&self) {
        let mut value = MACCR_IFG_64BIT | MACCR_TE | MACCR_RE;
        if matches!(self.link.speed, Speed::Mbps100) {
            value |= MACCR_FES;
        }
        if matches!(self.link.duplex, Duplex::Full) {
            value |= MACCR_DM;
        }
        if self.config.checksum_offload {
            value |= MACCR_IPCO;
        }
        self.regs
            .modify(Reg::MacCr, |v| (v & !MACCR_LINK_CONFIG_MASK) | value);
    }

    fn dispatch(&mut self) {
        let stats = &self.shared.stats;
        while let Some(mut frame) = self.rx_frames.dequeue() {
            frame.seek(0);
            let header = (frame.read_mac(), frame.read_mac(), frame.read_u16_be());
            match (header, self.dispatcher.as_mut()) {
                ((Some(destination), Some(source), Some(protocol)), Some(dispatcher)) => {
                    dispatcher.rx_complete(source, destination, protocol, &mut frame);
                }
                ((Some(_), Some(_), Some(_)), None) => stats.app_missed(),
                _ => stats.receive_error(),
            }
            frame.release(self.pool);
        }

        while let Some(completion) = self.completions.dequeue() {
            if let Some(dispatcher) = self.dispatcher.as_mut() {
                dispatcher.tx_complete(completion.id, completion.success);
            }
        }
    }

    // =========================================================================
    // Transmit
    // =========================================================================

    /// Prepend the link-layer header and hand `frame` to the DMA.
    ///
    /// On success `frame` is left empty and the returned id shows up in a
    /// later `tx_complete`.
    ///
    /// # Errors
    ///
    /// - `IoError::LinkDown`: nothing touched, state `NotConnected`
    /// - `DmaError::OutOfMemory`: no room for the header, nothing touched
    /// - `DmaError::QueueFull`: not enough free descriptors; the chain is
    ///   released and the send error counter bumped
    /// - `DmaError::BufferTooLarge`: a segment does not fit a descriptor;
    ///   handled like `QueueFull`
    pub fn transmit(
        &mut self,
        destination: [u8; 6],
        protocol: u16,
        frame: &mut FrameBuffer,
    ) -> Result<TransferId> {
        if !self.link_state.is_linked() {
            self.shared.set_state(DriverState::NotConnected);
            return Err(IoError::LinkDown.into());
        }
        if !frame.insert_front(self.pool, ETH_HEADER_SIZE) {
            self.shared.set_state(DriverState::OutOfMemory);
            return Err(DmaError::OutOfMemory.into());
        }
        let source = self.addresses[0].unwrap_or(self.config.mac_address);
        frame.seek(0);
        frame.write_mac(&destination);
        frame.write_mac(&source);
        frame.write_u16_be(protocol);

        let id = self.next_id;
        self.next_id = id.next();
        let queued =
            self.submitter
                .enqueue(self.tx_ring, frame, id.get(), self.config.checksum_offload);
        self.regs.write(Reg::DmaTpdr, 1);

        match queued {
            Ok(()) => {
                self.shared.set_state(DriverState::Ok);
                Ok(id)
            }
            Err(error) => {
                frame.remove_front(self.pool, ETH_HEADER_SIZE);
                frame.release(self.pool);
                self.shared.stats.send_error();
                self.shared.set_state(match error {
                    DmaError::QueueFull => DriverState::TxQueueFull,
                    _ => DriverState::DriverError,
                });
                Err(error.into())
            }
        }
    }

    /// True when no TX descriptor carries `id`
    pub fn is_complete(&self, id: TransferId) -> bool {
        is_idle(self.tx_ring, id.get())
    }

    /// Send a pause frame asking the partner to hold off for `time` slot
    /// times (512 bit times each).
    ///
    /// # Errors
    ///
    /// `IoError::Timeout` if the previous pause frame never went out.
    pub fn pause(&mut self, time: u16) -> Result<()> {
        let mut idle = false;
        for _ in 0..PAUSE_BUSY_TIMEOUT {
            if !self.regs.is_set(Reg::MacFcr, MACFCR_FCBBPA) {
                idle = true;
                break;
            }
            core::hint::spin_loop();
        }
        if !idle {
            return Err(IoError::Timeout.into());
        }
        self.regs.write(
            Reg::MacFcr,
            MACFCR_PLT_MINUS28
                | MACFCR_RFCE
                | MACFCR_TFCE
                | MACFCR_FCBBPA
                | (u32::from(time) << MACFCR_PT_SHIFT),
        );
        Ok(())
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Program address filter slot `index`. Slot 0 is also the source
    /// address of transmitted frames.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidAddressIndex` for `index >= 4`.
    pub fn set_mac_address(&mut self, index: usize, address: [u8; 6]) -> Result<()> {
        if index >= MAX_MAC_ADDRESSES {
            return Err(ConfigError::InvalidAddressIndex.into());
        }
        self.program_address(index, address);
        if index == 0 {
            self.config.mac_address = address;
        }
        Ok(())
    }

    fn program_address(&mut self, index: usize, address: [u8; 6]) {
        let (mut high, low) = mac_address_to_regs(&address);
        if index != 0 {
            high |= MACAHR_AE;
        }
        // the hardware latches the pair on the low-half write
        self.regs.write(Reg::MacAddrHigh(index as u8), high);
        self.regs.write(Reg::MacAddrLow(index as u8), low);
        self.addresses[index] = Some(address);
    }

    /// Address in slot `index`, if one has been set
    pub fn mac_address(&self, index: usize) -> Option<[u8; 6]> {
        self.addresses.get(index).copied().flatten()
    }

    /// Number of address filter slots
    pub const fn max_addresses(&self) -> usize {
        MAX_MAC_ADDRESSES
    }

    // =========================================================================
    // Runtime settings
    // =========================================================================

    /// Request a link speed. Clamped to the PHY's abilities once initialized;
    /// takes effect at the next negotiation.
    pub fn set_speed(&mut self, speed: Speed) -> Result<()> {
        self.link.speed = speed;
        self.clamp_to_phy()
    }

    /// Request a duplex mode, clamped like [`set_speed`](Self::set_speed)
    pub fn set_duplex(&mut self, duplex: Duplex) -> Result<()> {
        self.link.duplex = duplex;
        self.clamp_to_phy()
    }

    /// Enable or disable autonegotiation, clamped like
    /// [`set_speed`](Self::set_speed)
    pub fn set_autonegotiation(&mut self, enabled: bool) -> Result<()> {
        self.link.autonegotiation = enabled;
        self.clamp_to_phy()
    }

    /// Talk to the PHY at a different management address.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidPhyAddress` above 31.
    pub fn set_phy_address(&mut self, address: u8) -> Result<()> {
        if address > MAX_PHY_ADDRESS {
            return Err(ConfigError::InvalidPhyAddress.into());
        }
        self.phy.set_address(address);
        self.config.phy_address = address;
        Ok(())
    }

    /// Switch between MII and RMII (SYSCFG_PMC)
    pub fn set_media_interface(&mut self, interface: MediaInterface) {
        self.link.media_interface = interface;
        self.config.media_interface = interface;
        self.select_media_interface();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current (requested or negotiated) speed
    pub fn speed(&self) -> Speed {
        self.link.speed
    }

    /// Current (requested or negotiated) duplex
    pub fn duplex(&self) -> Duplex {
        self.link.duplex
    }

    /// Autonegotiation enabled
    pub fn autonegotiation(&self) -> bool {
        self.link.autonegotiation
    }

    /// MII or RMII
    pub fn media_interface(&self) -> MediaInterface {
        self.link.media_interface
    }

    /// Current link settings
    pub fn link_config(&self) -> LinkConfig {
        self.link
    }

    /// Where the link state machine stands
    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    /// True once `init` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.link_state.is_initialized()
    }

    /// True while linked and armed
    pub fn is_linked(&self) -> bool {
        self.link_state.is_linked()
    }

    /// The configuration the driver was split with, plus runtime changes
    pub fn config(&self) -> &EthConfig {
        &self.config
    }

    /// The PHY handle
    pub fn phy(&self) -> &GenericPhy {
        &self.phy
    }

    /// The board support collaborator
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Management bus, for vendor-specific PHY registers
    pub fn mdio(&mut self) -> &mut impl MdioBus {
        &mut self.smi
    }

    /// Latest driver state code
    pub fn state(&self) -> DriverState {
        self.shared.state()
    }

    /// Copy of every counter
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.shared.stats.snapshot()
    }

    /// DMASR as seen by the most recent interrupt
    pub fn last_interrupt_status(&self) -> InterruptStatus {
        self.shared.last_status()
    }

    /// Read a counter or status value
    pub fn parameter(&self, parameter: Parameter) -> u32 {
        let stats = self.statistics();
        match parameter {
            Parameter::FramesSent => stats.frames_sent,
            Parameter::FramesReceived => stats.frames_received,
            Parameter::AppMissed => stats.app_missed,
            Parameter::MacMissed => stats.mac_missed,
            Parameter::SendErrors => stats.send_errors,
            Parameter::ReceiveErrors => stats.receive_errors,
            Parameter::Linked => u32::from(self.is_linked()),
            Parameter::LinkSpeedKbps => self.link.speed.kbps(),
            Parameter::HwState => self.state() as u32,
            Parameter::SupportsHwChecksum => u32::from(self.config.checksum_offload),
        }
    }

    // =========================================================================
    // Dispatcher
    // =========================================================================

    /// Install the callback target, returning the previous one
    pub fn register_dispatcher(&mut self, dispatcher: D) -> Option<D> {
        self.dispatcher.replace(dispatcher)
    }

    /// The installed dispatcher
    pub fn dispatcher(&self) -> Option<&D> {
        self.dispatcher.as_ref()
    }

    /// The installed dispatcher, mutably
    pub fn dispatcher_mut(&mut self) -> Option<&mut D> {
        self.dispatcher.as_mut()
    }

    /// Remove the dispatcher; frames are then counted as app-missed
    pub fn take_dispatcher(&mut self) -> Option<D> {
        self.dispatcher.take()
    }

    /// Resolves once an interrupt has run since the previous wait.
    ///
    /// ```ignore
    /// loop {
    ///     mac.wait_for_interrupt().await;
    ///     mac.poll()?;
    /// }
    /// ```
    #[cfg(feature = "async")]
    pub fn wait_for_interrupt(&self) -> InterruptFuture<'a> {
        self.shared.signal.wait()
    }

    #[cfg(test)]
    pub(crate) fn tx_ring(&self) -> &'a DescriptorRing<TxDescriptor, TX> {
        self.tx_ring
    }

    #[cfg(test)]
    pub(crate) fn rx_ring(&self) -> &'a DescriptorRing<RxDescriptor, RX> {
        self.rx_ring
    }

    #[cfg(test)]
    pub(crate) fn pending_rx_frames(&self) -> usize {
        self.rx_frames.len()
    }
}

impl<R, P, B, D, const TX: usize, const RX: usize> NetInterface
    for EthernetMac<'_, R, P, B, D, TX, RX>
where
    R: RegisterBlock + Clone,
    P: Platform,
    B: BufferPool,
    D: Dispatcher,
{
    type Dispatcher = D;

    fn transmit(
        &mut self,
        destination: [u8; 6],
        protocol: u16,
        frame: &mut FrameBuffer,
    ) -> Result<TransferId> {
        Self::transmit(self, destination, protocol, frame)
    }

    fn is_complete(&self, id: TransferId) -> bool {
        Self::is_complete(self, id)
    }

    fn register_dispatcher(&mut self, dispatcher: D) {
        Self::register_dispatcher(self, dispatcher);
    }

    fn poll(&mut self) -> Result<()> {
        Self::poll(self)
    }

    fn parameter(&self, parameter: Parameter) -> u32 {
        Self::parameter(self, parameter)
    }

    fn set_mac_address(&mut self, index: usize, address: [u8; 6]) -> Result<()> {
        Self::set_mac_address(self, index, address)
    }

    fn mac_address(&self, index: usize) -> Option<[u8; 6]> {
        Self::mac_address(self, index)
    }

    fn max_addresses(&self) -> usize {
        Self::max_addresses(self)
    }

    fn is_linked(&self) -> bool {
        Self::is_linked(self)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::EthResources;
    use crate::internal::constants::DEFAULT_MAC_ADDR;
    use crate::internal::dma::descriptor::Descriptor;
    use crate::internal::dma::ring::SlotState;
    use crate::internal::phy_regs::standard::{ability, bmcr, bmsr, phy_reg};
    use crate::internal::register::dma::{DMASR_NIS, DMASR_RS, DMASR_TS};
    use crate::internal::register::mac::{MACMIIAR_CR_MASK, MACMIIAR_CR_SHIFT};
    use crate::testing::{
        MockDelay, MockPlatform, MockRegisters, TestIrq, TestMac, TestPool, leak_pool, linked_mac,
    };

    const PEER: [u8; 6] = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60];

    fn split_mac<'r, const TX: usize, const RX: usize>(
        resources: &'r mut EthResources<TX, RX>,
        regs: &'r MockRegisters,
        pool: &'static TestPool,
    ) -> (TestMac<'r, TX, RX>, TestIrq<'r, TX, RX>) {
        resources
            .split(regs, MockPlatform::new(), pool, EthConfig::new())
            .unwrap()
    }

    /// Write `bytes` into the first buffer of RX slot `index`, then let the
    /// simulated DMA report them as one complete frame.
    fn deliver<const RX: usize>(
        ring: &DescriptorRing<RxDescriptor, RX>,
        index: usize,
        bytes: &[u8],
    ) {
        let mut claim = ring.slot(index).claim(SlotState::Hardware).unwrap();
        if let Some(buffer) = claim.buffers()[0].as_mut() {
            buffer.as_mut_slice()[..bytes.len()].copy_from_slice(bytes);
        }
        claim.hand_to_hardware();
        ring.descriptor(index)
            .simulate_receive(true, true, bytes.len(), false);
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    #[test]
    fn init_brings_up_clocks_mac_and_phy() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());
        mac.init(&mut MockDelay::new()).unwrap();

        assert!(mac.platform().clocks_enabled);
        assert_eq!(mac.platform().pins, Some(MediaInterface::Rmii));
        assert_ne!(regs.get(Reg::SyscfgPmc) & SYSCFG_PMC_MII_RMII_SEL, 0);
        assert!(regs.was_written(Reg::DmaBmr));
        assert_eq!(
            regs.get(Reg::MacMiiAr) & MACMIIAR_CR_MASK,
            4 << MACMIIAR_CR_SHIFT,
            "HCLK/102 at 168 MHz"
        );

        let (high, low) = mac_address_to_regs(&DEFAULT_MAC_ADDR);
        assert_eq!(regs.get(Reg::MacAddrHigh(0)), high);
        assert_eq!(regs.get(Reg::MacAddrLow(0)), low);
        assert_eq!(
            regs.phy_reg(1, phy_reg::BMCR),
            bmcr::SPEED_100 | bmcr::DUPLEX_FULL | bmcr::AN_ENABLE | bmcr::AN_RESTART
        );

        assert_eq!(mac.state(), DriverState::Ok);
        assert_eq!(mac.link_state(), LinkState::Initialized);
        assert!(!mac.is_linked());
        assert_eq!(
            mac.init(&mut MockDelay::new()),
            Err(ConfigError::AlreadyInitialized.into())
        );
    }

    #[test]
    fn stuck_mac_reset_reports_mac_error() {
        let regs = MockRegisters::new();
        regs.set_reset_stuck(true);
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());

        assert_eq!(
            mac.init(&mut MockDelay::new()),
            Err(IoError::Timeout.into())
        );
        assert_eq!(mac.state(), DriverState::MacError);
        assert!(!mac.is_initialized());
    }

    #[test]
    fn stuck_phy_reset_reports_phy_error() {
        let regs = MockRegisters::new();
        regs.set_phy_reset_stuck(true);
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());

        assert_eq!(
            mac.init(&mut MockDelay::new()),
            Err(IoError::Timeout.into())
        );
        assert_eq!(mac.state(), DriverState::PhyError);
    }

    #[test]
    fn init_clamps_request_to_phy_abilities() {
        let regs = MockRegisters::new();
        regs.set_phy_reg(1, phy_reg::BMSR, bmsr::T10_FD_CAPABLE | bmsr::T10_HD_CAPABLE);
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());
        mac.init(&mut MockDelay::new()).unwrap();

        assert_eq!(mac.speed(), Speed::Mbps10);
        assert_eq!(mac.duplex(), Duplex::Full);
        assert!(!mac.autonegotiation());
        assert_eq!(regs.phy_reg(1, phy_reg::BMCR), bmcr::DUPLEX_FULL);

        mac.set_speed(Speed::Mbps100).unwrap();
        assert_eq!(mac.speed(), Speed::Mbps10, "still clamped after init");
    }

    #[test]
    fn poll_requires_init() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());
        assert_eq!(mac.poll(), Err(ConfigError::NotInitialized.into()));
    }

    // =========================================================================
    // Link tracking
    // =========================================================================

    #[test]
    fn link_up_arms_dma_and_configures_mac() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mac, _irq) = linked_mac(&mut resources, &regs, leak_pool());

        assert_eq!(regs.get(Reg::DmaTdlar), mac.tx_ring().base_addr());
        assert_eq!(regs.get(Reg::DmaRdlar), mac.rx_ring().base_addr());
        assert_eq!(regs.get(Reg::DmaIer), DMAIER_ALL);
        let omr = regs.get(Reg::DmaOmr);
        assert_eq!(omr & (DMAOMR_ST | DMAOMR_SR), DMAOMR_ST | DMAOMR_SR);
        assert_eq!(omr & (DMAOMR_TSF | DMAOMR_RSF), DMAOMR_TSF | DMAOMR_RSF);
        assert_eq!(omr & DMAOMR_FTF, 0);
        assert_eq!(
            regs.get(Reg::MacCr),
            MACCR_IFG_64BIT | MACCR_FES | MACCR_DM | MACCR_IPCO | MACCR_TE | MACCR_RE
        );
        assert!((0..4).all(|i| mac.rx_ring().descriptor(i).is_owned()));
        assert_eq!(regs.write_count(Reg::DmaRpdr), 1);

        assert_eq!(mac.parameter(Parameter::Linked), 1);
        assert_eq!(mac.parameter(Parameter::LinkSpeedKbps), 100_000);
        assert_eq!(mac.parameter(Parameter::HwState), DriverState::Ok as u32);
        assert_eq!(mac.parameter(Parameter::SupportsHwChecksum), 1);
    }

    #[test]
    fn negotiated_mode_overrides_request() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());
        mac.init(&mut MockDelay::new()).unwrap();

        regs.set_phy_reg(1, phy_reg::ANLPAR, ability::T10_HD | 0x0001);
        regs.set_link(1, true);
        mac.poll().unwrap();

        assert_eq!(mac.speed(), Speed::Mbps10);
        assert_eq!(mac.duplex(), Duplex::Half);
        assert_eq!(regs.get(Reg::MacCr) & (MACCR_FES | MACCR_DM), 0);
        assert_eq!(mac.parameter(Parameter::LinkSpeedKbps), 10_000);
    }

    #[test]
    fn link_down_blocks_transmit_without_touching_frame() {
        let regs = MockRegisters::new();
        let pool = leak_pool();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = linked_mac(&mut resources, &regs, pool);

        regs.set_link(1, false);
        mac.poll().unwrap();
        assert_eq!(mac.link_state(), LinkState::Unlinked);
        let demands = regs.write_count(Reg::DmaTpdr);

        let mut frame = FrameBuffer::from_slice(pool, &[1, 2, 3]).unwrap();
        assert_eq!(
            mac.transmit(PEER, 0x0800, &mut frame),
            Err(IoError::LinkDown.into())
        );
        assert_eq!(frame.len(), 3);
        assert_eq!(mac.state(), DriverState::NotConnected);

        let ring = mac.tx_ring();
        for index in 0..4 {
            assert!(!ring.descriptor(index).is_owned());
            assert_eq!(ring.slot(index).state(), SlotState::Free);
            assert_eq!(ring.slot(index).seq(), 0);
        }
        assert_eq!(regs.write_count(Reg::DmaTpdr), demands, "no poll demand");
        frame.release(pool);
    }

    #[test]
    fn relink_rearms_and_recycles_in_flight_buffers() {
        let regs = MockRegisters::new();
        let pool = leak_pool();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = linked_mac(&mut resources, &regs, pool);
        let armed = pool.available();

        let mut frame = FrameBuffer::from_slice(pool, &[0; 46]).unwrap();
        mac.transmit(PEER, 0x0800, &mut frame).unwrap();
        assert_ne!(pool.available(), armed);

        regs.set_link(1, false);
        mac.poll().unwrap();
        regs.set_link(1, true);
        mac.poll().unwrap();

        assert!(mac.is_linked());
        assert_eq!(regs.write_count(Reg::DmaTdlar), 2);
        assert_eq!(pool.available(), armed);
        assert!(!mac.tx_ring().descriptor(0).is_owned());
    }

    #[test]
    fn arm_failure_reports_link_down_and_retries() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());
        mac.init(&mut MockDelay::new()).unwrap();

        regs.set_flush_stuck(true);
        regs.set_link(1, true);
        assert_eq!(mac.poll(), Err(IoError::Timeout.into()));
        assert_eq!(mac.link_state(), LinkState::Unlinked);
        assert_eq!(mac.state(), DriverState::DriverError);

        regs.set_flush_stuck(false);
        mac.poll().unwrap();
        assert!(mac.is_linked());
    }

    // =========================================================================
    // Transmit
    // =========================================================================

    #[test]
    fn transmit_prepends_header_and_hands_frame_to_dma() {
        let regs = MockRegisters::new();
        let pool = leak_pool();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = linked_mac(&mut resources, &regs, pool);
        let demands = regs.write_count(Reg::DmaTpdr);

        let mut frame = FrameBuffer::from_slice(pool, &[0xAA; 46]).unwrap();
        let id = mac.transmit(PEER, 0x0800, &mut frame).unwrap();
        assert_eq!(id, TransferId::FIRST);
        assert!(frame.is_empty());
        assert_eq!(regs.write_count(Reg::DmaTpdr), demands + 1);

        let ring = mac.tx_ring();
        assert!(ring.descriptor(0).is_owned());
        assert_eq!(ring.descriptor(0).total_len(), 60);
        assert!(!mac.is_complete(id));

        let mut claim = ring.slot(0).claim(SlotState::Hardware).unwrap();
        let mut header = [0u8; 14];
        if let Some(buffer) = claim.buffers()[0].as_ref() {
            header.copy_from_slice(&buffer.as_slice()[..14]);
        }
        claim.hand_to_hardware();
        assert_eq!(header[..6], PEER);
        assert_eq!(header[6..12], DEFAULT_MAC_ADDR);
        assert_eq!(header[12..], [0x08, 0x00]);

        let mut next = FrameBuffer::from_slice(pool, &[0; 10]).unwrap();
        assert_eq!(mac.transmit(PEER, 0x0806, &mut next).unwrap().get(), 2);
    }

    #[test]
    fn completion_reaches_dispatcher_on_poll() {
        let regs = MockRegisters::new();
        let pool = leak_pool();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, mut irq) = linked_mac(&mut resources, &regs, pool);

        let mut good = FrameBuffer::from_slice(pool, &[0; 46]).unwrap();
        let mut bad = FrameBuffer::from_slice(pool, &[0; 46]).unwrap();
        let first = mac.transmit(PEER, 0x0800, &mut good).unwrap();
        let second = mac.transmit(PEER, 0x0800, &mut bad).unwrap();

        mac.tx_ring().descriptor(0).simulate_transmit(false);
        mac.tx_ring().descriptor(1).simulate_transmit(true);
        regs.raise_status(DMASR_TS | DMASR_NIS);
        irq.on_interrupt();
        assert!(mac.is_complete(first));
        assert!(mac.is_complete(second));
        assert!(mac.dispatcher().unwrap().completed.is_empty(), "poll delivers");

        mac.poll().unwrap();
        assert_eq!(
            mac.dispatcher().unwrap().completed,
            [(first, true), (second, false)]
        );
        assert_eq!(mac.parameter(Parameter::FramesSent), 1);
        assert_eq!(mac.parameter(Parameter::SendErrors), 1);
    }

    #[test]
    fn full_ring_rejects_and_releases_frame() {
        let regs = MockRegisters::new();
        let pool = leak_pool();
        let mut resources: EthResources<2, 2> = EthResources::new();
        let (mut mac, _irq) = linked_mac(&mut resources, &regs, pool);

        for _ in 0..2 {
            let mut frame = FrameBuffer::from_slice(pool, &[0; 20]).unwrap();
            mac.transmit(PEER, 0x0800, &mut frame).unwrap();
        }
        let before = pool.available();
        let demands = regs.write_count(Reg::DmaTpdr);

        let mut frame = FrameBuffer::from_slice(pool, &[0; 20]).unwrap();
        assert_eq!(
            mac.transmit(PEER, 0x0800, &mut frame),
            Err(DmaError::QueueFull.into())
        );
        assert!(frame.is_empty());
        assert_eq!(pool.available(), before, "rejected chain went back to the pool");
        assert_eq!(regs.write_count(Reg::DmaTpdr), demands + 1);
        assert_eq!(mac.state(), DriverState::TxQueueFull);
        assert_eq!(mac.statistics().send_errors, 1);
    }

    #[test]
    fn pause_sends_flow_control_frame() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());

        mac.pause(0x0100).unwrap();
        assert_eq!(
            regs.last_written(Reg::MacFcr),
            Some(
                MACFCR_PLT_MINUS28
                    | MACFCR_RFCE
                    | MACFCR_TFCE
                    | MACFCR_FCBBPA
                    | (0x0100 << MACFCR_PT_SHIFT)
            )
        );

        regs.set_pause_stuck(true);
        mac.pause(1).unwrap();
        assert_eq!(mac.pause(1), Err(IoError::Timeout.into()), "previous pause pending");
    }

    // =========================================================================
    // Receive
    // =========================================================================

    #[test]
    fn received_frame_is_dispatched_with_parsed_header() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, mut irq) = linked_mac(&mut resources, &regs, leak_pool());

        let mut bytes = [0u8; 20];
        bytes[..6].copy_from_slice(&DEFAULT_MAC_ADDR);
        bytes[6..12].copy_from_slice(&PEER);
        bytes[12..14].copy_from_slice(&[0x88, 0xB5]);
        bytes[14..].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        deliver(mac.rx_ring(), 0, &bytes);
        regs.raise_status(DMASR_RS | DMASR_NIS);
        irq.on_interrupt();
        mac.poll().unwrap();

        let received = &mac.dispatcher().unwrap().received;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].source, PEER);
        assert_eq!(received[0].destination, DEFAULT_MAC_ADDR);
        assert_eq!(received[0].protocol, 0x88B5);
        assert_eq!(received[0].payload, [1, 2, 3, 4, 5, 6]);
        assert_eq!(mac.pending_rx_frames(), 0);
    }

    #[test]
    fn runt_frame_counts_as_receive_error() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, mut irq) = linked_mac(&mut resources, &regs, leak_pool());

        deliver(mac.rx_ring(), 0, &[0xFF; 10]);
        irq.on_interrupt();
        mac.poll().unwrap();

        assert!(mac.dispatcher().unwrap().received.is_empty());
        assert_eq!(mac.statistics().receive_errors, 1);
    }

    #[test]
    fn frames_without_dispatcher_are_app_missed() {
        let regs = MockRegisters::new();
        let pool = leak_pool();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, mut irq) = linked_mac(&mut resources, &regs, pool);
        assert!(mac.take_dispatcher().is_some());

        deliver(mac.rx_ring(), 0, &[0x5A; 60]);
        irq.on_interrupt();
        let before = pool.available();
        mac.poll().unwrap();

        assert_eq!(mac.statistics().app_missed, 1);
        assert_ne!(pool.available(), before, "frame released after poll");
    }

    // =========================================================================
    // Addresses and settings
    // =========================================================================

    #[test]
    fn address_slots_are_programmed_and_bounded() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());

        mac.set_mac_address(2, PEER).unwrap();
        let (high, low) = mac_address_to_regs(&PEER);
        assert_eq!(regs.get(Reg::MacAddrHigh(2)), high | MACAHR_AE);
        assert_eq!(regs.get(Reg::MacAddrLow(2)), low);
        assert_eq!(mac.mac_address(2), Some(PEER));
        assert_eq!(mac.mac_address(1), None);
        assert_eq!(mac.mac_address(9), None);
        assert_eq!(
            mac.set_mac_address(4, PEER),
            Err(ConfigError::InvalidAddressIndex.into())
        );
        assert_eq!(mac.max_addresses(), 4);

        mac.set_mac_address(0, PEER).unwrap();
        assert_eq!(regs.get(Reg::MacAddrHigh(0)), high);
        assert_eq!(mac.config().mac_address, PEER);
    }

    #[test]
    fn runtime_settings() {
        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mut mac, _irq) = split_mac(&mut resources, &regs, leak_pool());
        mac.init(&mut MockDelay::new()).unwrap();

        mac.set_speed(Speed::Mbps10).unwrap();
        mac.set_duplex(Duplex::Half).unwrap();
        mac.set_autonegotiation(false).unwrap();
        assert_eq!(mac.speed(), Speed::Mbps10);
        assert_eq!(mac.duplex(), Duplex::Half);
        assert!(!mac.autonegotiation());

        assert_eq!(
            mac.set_phy_address(32),
            Err(ConfigError::InvalidPhyAddress.into())
        );
        mac.set_phy_address(5).unwrap();
        assert_eq!(mac.phy().address(), 5);

        mac.set_media_interface(MediaInterface::Mii);
        assert_eq!(regs.get(Reg::SyscfgPmc) & SYSCFG_PMC_MII_RMII_SEL, 0);
        assert_eq!(mac.media_interface(), MediaInterface::Mii);
    }

    #[test]
    fn net_interface_delegates() {
        fn linked<N: NetInterface>(iface: &N) -> bool {
            iface.is_linked()
        }

        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mac, _irq) = linked_mac(&mut resources, &regs, leak_pool());
        assert!(linked(&mac));
        assert_eq!(NetInterface::max_addresses(&mac), MAX_MAC_ADDRESSES);
    }

    #[cfg(feature = "async")]
    #[test]
    fn interrupt_wakes_waiting_task() {
        use core::future::Future;
        use core::pin::pin;
        use core::task::{Context, Poll, Waker};

        let regs = MockRegisters::new();
        let mut resources: EthResources<4, 4> = EthResources::new();
        let (mac, mut irq) = linked_mac(&mut resources, &regs, leak_pool());
        let mut cx = Context::from_waker(Waker::noop());

        let mut wait = pin!(mac.wait_for_interrupt());
        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
        irq.on_interrupt();
        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(()));
    }
}
