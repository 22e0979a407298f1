//! Link parameters and the link state machine.
//!
//! ```text
//! NotInitialized --init--> Initialized --link up--> Linked
//!                                          ^           |
//!                                          |       link down
//!                                       link up        v
//!                                          +------- Unlinked
//! ```
//!
//! Only the poll context moves the state. The data path is armed on the
//! transition into `Linked`, never at initialization.

use super::config::{Duplex, EthConfig, MediaInterface, Speed};

/// Speed/duplex/autonegotiation settings, as requested and later as
/// negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Link speed
    pub speed: Speed,
    /// Duplex mode
    pub duplex: Duplex,
    /// Autonegotiation enabled
    pub autonegotiation: bool,
    /// MII or RMII
    pub media_interface: MediaInterface,
}

impl LinkConfig {
    /// Take the link fields out of a driver configuration
    pub const fn from_config(config: &EthConfig) -> Self {
        Self {
            speed: config.speed,
            duplex: config.duplex,
            autonegotiation: config.autonegotiation,
            media_interface: config.media_interface,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::from_config(&EthConfig::new())
    }
}

/// Where the link state machine stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// `init` has not completed
    #[default]
    NotInitialized,
    /// Initialized, link never came up
    Initialized,
    /// Link up, data path armed
    Linked,
    /// Link went down after having been up
    Unlinked,
}

/// What a link status sample changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkTransition {
    None,
    Up,
    Down,
}

impl LinkState {
    /// True only in `Linked`
    pub const fn is_linked(self) -> bool {
        matches!(self, Self::Linked)
    }

    /// True once `init` has completed
    pub const fn is_initialized(self) -> bool {
        !matches!(self, Self::NotInitialized)
    }

    /// Feed one BMSR link-status sample into the state machine.
    pub(crate) const fn on_link_status(self, link_up: bool) -> (Self, LinkTransition) {
        match (self, link_up) {
            (Self::Initialized | Self::Unlinked, true) => (Self::Linked, LinkTransition::Up),
            (Self::Linked, false) => (Self::Unlinked, LinkTransition::Down),
            (state, _) => (state, LinkTransition::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_comes_up_from_initialized_and_unlinked() {
        assert_eq!(
            LinkState::Initialized.on_link_status(true),
            (LinkState::Linked, LinkTransition::Up)
        );
        assert_eq!(
            LinkState::Unlinked.on_link_status(true),
            (LinkState::Linked, LinkTransition::Up)
        );
    }

    #[test]
    fn link_goes_down_only_from_linked() {
        assert_eq!(
            LinkState::Linked.on_link_status(false),
            (LinkState::Unlinked, LinkTransition::Down)
        );
        assert_eq!(
            LinkState::Initialized.on_link_status(false),
            (LinkState::Initialized, LinkTransition::None)
        );
        assert_eq!(
            LinkState::Linked.on_link_status(true),
            (LinkState::Linked, LinkTransition::None)
        );
    }

    #[test]
    fn uninitialized_ignores_link_samples() {
        assert_eq!(
            LinkState::NotInitialized.on_link_status(true),
            (LinkState::NotInitialized, LinkTransition::None)
        );
        assert!(!LinkState::NotInitialized.is_initialized());
        assert!(LinkState::Unlinked.is_initialized());
        assert!(!LinkState::Unlinked.is_linked());
    }

    #[test]
    fn link_config_follows_driver_config() {
        let config = EthConfig::new()
            .with_speed(Speed::Mbps10)
            .with_autonegotiation(false)
            .with_media_interface(MediaInterface::Mii);
        let link = LinkConfig::from_config(&config);
        assert_eq!(link.speed, Speed::Mbps10);
        assert_eq!(link.duplex, Duplex::Full);
        assert!(!link.autonegotiation);
        assert_eq!(link.media_interface, MediaInterface::Mii);
    }
}
