//! Board-specific collaborators the driver calls during initialization.

use crate::driver::config::MediaInterface;

/// Clock and pin setup for the ETH peripheral.
///
/// The driver owns the MAC and DMA registers but not RCC or GPIO; the board
/// support code provides those through this trait.
///
/// ```ignore
/// struct Board;
///
/// impl Platform for Board {
///     fn enable_clocks(&mut self) {
///         // RCC_AHB1ENR: ETHMACEN, ETHMACTXEN, ETHMACRXEN; RCC_APB2ENR: SYSCFGEN
///     }
///     fn configure_pins(&mut self, interface: MediaInterface) {
///         // PA1, PA2, PA7, PB11, PB12, PB13, PC1, PC4, PC5 as AF11 for RMII
///     }
///     fn hclk_hz(&self) -> u32 {
///         168_000_000
///     }
/// }
/// ```
pub trait Platform {
    /// Enable the MAC, MAC TX, MAC RX and SYSCFG clocks.
    fn enable_clocks(&mut self);

    /// Route the MII or RMII signals to their pins.
    fn configure_pins(&mut self, interface: MediaInterface);

    /// AHB clock frequency, used to pick the MDC divider.
    fn hclk_hz(&self) -> u32;
}

impl<T: Platform + ?Sized> Platform for &mut T {
    fn enable_clocks(&mut self) {
        T::enable_clocks(self);
    }

    fn configure_pins(&mut self, interface: MediaInterface) {
        T::configure_pins(self, interface);
    }

    fn hclk_hz(&self) -> u32 {
        T::hclk_hz(self)
    }
}
