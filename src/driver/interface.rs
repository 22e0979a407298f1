//! Upward-facing driver surface: the capability trait a network stack binds
//! to, and the callback target the driver delivers frames and completions to.

use core::num::NonZeroU32;

use crate::buffer::FrameBuffer;
use crate::driver::error::Result;

// =============================================================================
// Transfer Id
// =============================================================================

/// Sequence number of an accepted transmit.
///
/// Ids increase by one per accepted frame and wrap around, skipping zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferId(NonZeroU32);

impl TransferId {
    /// The first id handed out
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Wrap a raw sequence number; `None` for 0.
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Raw sequence number, never 0
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// The id after this one
    #[must_use]
    pub const fn next(self) -> Self {
        match NonZeroU32::new(self.0.get().wrapping_add(1)) {
            Some(id) => Self(id),
            None => Self::FIRST,
        }
    }
}

// =============================================================================
// Completion Record
// =============================================================================

/// Outcome of one transmitted frame, queued from interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    /// Id returned by `transmit`
    pub id: TransferId,
    /// False if any descriptor of the frame reported an error
    pub success: bool,
}

// =============================================================================
// Parameters
// =============================================================================

/// Values readable through [`NetInterface::parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parameter {
    /// Frames transmitted without error
    FramesSent,
    /// Frames received and queued for the application
    FramesReceived,
    /// Received frames dropped for lack of queue space or dispatcher
    AppMissed,
    /// Frames the DMA dropped for lack of descriptors or FIFO space
    MacMissed,
    /// Transmit errors, including frames the ring could not take
    SendErrors,
    /// Receive errors (one per bad frame)
    ReceiveErrors,
    /// 1 when the link is up
    Linked,
    /// 100000 or 10000
    LinkSpeedKbps,
    /// Current [`DriverState`](crate::DriverState) code
    HwState,
    /// 1 when checksum offload is on
    SupportsHwChecksum,
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Application callbacks, invoked from [`NetInterface::poll`] only.
pub trait Dispatcher {
    /// A frame arrived. `payload` is positioned just after the link-layer
    /// header; anything left in it is released when the call returns.
    fn rx_complete(
        &mut self,
        source: [u8; 6],
        destination: [u8; 6],
        protocol: u16,
        payload: &mut FrameBuffer,
    );

    /// A transmit finished.
    fn tx_complete(&mut self, id: TransferId, success: bool);
}

impl<T: Dispatcher + ?Sized> Dispatcher for &mut T {
    fn rx_complete(
        &mut self,
        source: [u8; 6],
        destination: [u8; 6],
        protocol: u16,
        payload: &mut FrameBuffer,
    ) {
        T::rx_complete(self, source, destination, protocol, payload);
    }

    fn tx_complete(&mut self, id: TransferId, success: bool) {
        T::tx_complete(self, id, success);
    }
}

// =============================================================================
// Network Interface
// =============================================================================

/// What a network stack needs from a link-layer driver.
pub trait NetInterface {
    /// Callback target type
    type Dispatcher: Dispatcher;

    /// Prepend the link-layer header and queue `frame` for transmission.
    ///
    /// On success `frame` is left empty. On a rejection before the ring is
    /// touched (link down, no room for the header) `frame` is left as it was.
    fn transmit(
        &mut self,
        destination: [u8; 6],
        protocol: u16,
        frame: &mut FrameBuffer,
    ) -> Result<TransferId>;

    /// True when no descriptor carries `id`.
    ///
    /// Cannot tell "already completed" from "never submitted".
    fn is_complete(&self, id: TransferId) -> bool;

    /// Install the callback target, replacing any previous one
    fn register_dispatcher(&mut self, dispatcher: Self::Dispatcher);

    /// Track the link and deliver queued frames and completions
    fn poll(&mut self) -> Result<()>;

    /// Read a counter or status value
    fn parameter(&self, parameter: Parameter) -> u32;

    /// Program address filter slot `index`
    fn set_mac_address(&mut self, index: usize, address: [u8; 6]) -> Result<()>;

    /// Address in slot `index`, if programmed
    fn mac_address(&self, index: usize) -> Option<[u8; 6]>;

    /// Number of address filter slots
    fn max_addresses(&self) -> usize;

    /// True while the link is up and the data path armed
    fn is_linked(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_id_rejects_zero() {
        assert!(TransferId::new(0).is_none());
        assert_eq!(TransferId::new(5).map(TransferId::get), Some(5));
        assert_eq!(TransferId::FIRST.get(), 1);
    }

    #[test]
    fn transfer_id_wraps_past_zero() {
        let last = TransferId::new(u32::MAX).unwrap();
        assert_eq!(last.next(), TransferId::FIRST);
        assert_eq!(TransferId::FIRST.next().get(), 2);
    }

    #[test]
    fn completion_is_plain_data() {
        let a = Completion {
            id: TransferId::FIRST,
            success: true,
        };
        let b = a;
        assert_eq!(a, b);
    }
}
