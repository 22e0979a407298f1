//! PHY register definitions.
//!
//! These are reached over the MII management interface, not memory mapped;
//! see [`register`](super::register) for the MAC side.

pub mod standard;
