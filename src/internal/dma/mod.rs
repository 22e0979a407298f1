//! DMA descriptor rings and the two data paths that walk them.
//!
//! - [`ring`]: descriptors paired with software ownership slots
//! - [`rx`]: reclaim, reassembly and refill of receive descriptors
//! - [`tx`]: enqueue and completion reclaim of transmit descriptors

pub(crate) mod descriptor;
pub(crate) mod ring;
pub(crate) mod rx;
pub(crate) mod tx;
