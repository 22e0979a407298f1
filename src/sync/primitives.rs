//! Interrupt-safe cells shared by the poll and interrupt contexts.

use core::cell::RefCell;
#[cfg(feature = "async")]
use core::task::Waker;
use critical_section::Mutex;

/// Cell providing interior mutability behind a critical section.
///
/// Combines `critical_section::Mutex` with `RefCell`, so the same value can be
/// reached from poll code and from an interrupt handler.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access. Interrupts are masked meanwhile.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Like [`with`](Self::with), but returns `None` instead of panicking
    /// when the value is already borrowed further up the stack.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut value))
        })
    }
}

// SAFETY: every access goes through a critical section.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}

/// Interrupt-safe storage for one task waker.
///
/// Poll-side futures register, the interrupt handler wakes.
#[cfg(feature = "async")]
pub struct AtomicWaker {
    waker: CriticalSectionCell<Option<Waker>>,
}

#[cfg(feature = "async")]
impl AtomicWaker {
    /// Create an empty waker slot.
    pub const fn new() -> Self {
        Self {
            waker: CriticalSectionCell::new(None),
        }
    }

    /// Store `waker`, replacing any previous one that would wake a different task.
    pub fn register(&self, waker: &Waker) {
        self.waker.with(|slot| match slot {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        });
    }

    /// Wake and forget the registered waker, if any.
    #[inline]
    pub fn wake(&self) {
        if let Some(waker) = self.waker.with(Option::take) {
            waker.wake();
        }
    }

    /// True while a waker is registered.
    pub fn is_registered(&self) -> bool {
        self.waker.with(|slot| slot.is_some())
    }
}

#[cfg(feature = "async")]
impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit registration point for whatever the interrupt vector must reach.
///
/// The application installs its [`InterruptContext`](crate::InterruptContext)
/// once, and the vector borrows it on every entry:
///
/// ```ignore
/// static ETH_IRQ: InterruptSlot<Irq> = InterruptSlot::new();
///
/// #[interrupt]
/// fn ETH() {
///     ETH_IRQ.with(|irq| irq.on_interrupt());
/// }
/// ```
pub struct InterruptSlot<T> {
    cell: CriticalSectionCell<Option<T>>,
}

impl<T> InterruptSlot<T> {
    /// An empty slot.
    pub const fn new() -> Self {
        Self {
            cell: CriticalSectionCell::new(None),
        }
    }

    /// Install `value`, returning whatever was installed before.
    pub fn install(&self, value: T) -> Option<T> {
        self.cell.with(|slot| slot.replace(value))
    }

    /// Run `f` on the installed value. `None` if nothing is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.cell.with(|slot| slot.as_mut().map(f))
    }

    /// Remove the installed value.
    pub fn take(&self) -> Option<T> {
        self.cell.with(Option::take)
    }

    /// True if a value is installed.
    pub fn is_installed(&self) -> bool {
        self.cell.with(|slot| slot.is_some())
    }
}

impl<T> Default for InterruptSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn critical_section_cell_with_mutates() {
        let cell = CriticalSectionCell::new(0u32);
        cell.with(|v| *v += 10);
        assert_eq!(cell.with(|v| *v), 10);
    }

    #[test]
    fn critical_section_cell_try_with_detects_reentry() {
        let cell = CriticalSectionCell::new(1u32);
        let nested = cell.with(|_| cell.try_with(|v| *v));
        assert_eq!(nested, None);
        assert_eq!(cell.try_with(|v| *v), Some(1));
    }

    #[test]
    fn critical_section_cell_static_usage() {
        static CELL: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
        CELL.with(|v| *v = 100);
        assert_eq!(CELL.with(|v| *v), 100);
    }

    #[test]
    fn interrupt_slot_install_with_take() {
        let slot: InterruptSlot<u32> = InterruptSlot::new();
        assert!(!slot.is_installed());
        assert_eq!(slot.with(|v| *v), None);

        assert_eq!(slot.install(5), None);
        assert_eq!(slot.with(|v| {
            *v += 1;
            *v
        }), Some(6));
        assert_eq!(slot.install(9), Some(6));
        assert_eq!(slot.take(), Some(9));
        assert!(!slot.is_installed());
    }

    #[cfg(feature = "async")]
    mod waker {
        extern crate std;

        use super::super::AtomicWaker;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::task::{Wake, Waker};

        struct WakeCounter(AtomicUsize);

        impl Wake for WakeCounter {
            fn wake(self: Arc<Self>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn counting_waker() -> (Arc<WakeCounter>, Waker) {
            let counter = Arc::new(WakeCounter(AtomicUsize::new(0)));
            (counter.clone(), Waker::from(counter))
        }

        #[test]
        fn wake_calls_and_clears_registered_waker() {
            let slot = AtomicWaker::new();
            let (counter, waker) = counting_waker();
            slot.register(&waker);
            assert!(slot.is_registered());

            slot.wake();
            slot.wake();
            assert_eq!(counter.0.load(Ordering::SeqCst), 1);
            assert!(!slot.is_registered());
        }

        #[test]
        fn register_replaces_previous_waker() {
            let slot = AtomicWaker::default();
            let (first, waker1) = counting_waker();
            let (second, waker2) = counting_waker();
            slot.register(&waker1);
            slot.register(&waker2);
            slot.wake();
            assert_eq!(first.0.load(Ordering::SeqCst), 0);
            assert_eq!(second.0.load(Ordering::SeqCst), 1);
        }
    }
}
