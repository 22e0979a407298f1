//! Synchronization between the interrupt and poll contexts.
//!
//! - [`CriticalSectionCell`]: ISR-safe interior mutability
//! - [`InterruptSlot`]: explicit registration of the interrupt-side driver half
//! - [`SpscQueue`]: lock-free handoff of frames and completions, split into
//!   [`Producer`] and [`Consumer`]
//! - [`InterruptSignal`] (feature `async`): wakes a task after each interrupt

mod primitives;
pub mod queue;

pub use primitives::{CriticalSectionCell, InterruptSlot};
pub use queue::{Consumer, Producer, SpscQueue};

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{InterruptFuture, InterruptSignal};
#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
