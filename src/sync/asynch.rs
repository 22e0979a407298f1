//! Interrupt-to-task signalling for async executors.

use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::{Context, Poll};

use super::primitives::AtomicWaker;

/// Flag raised by the interrupt handler and awaited by the poll task.
pub struct InterruptSignal {
    pending: AtomicBool,
    waker: AtomicWaker,
}

impl InterruptSignal {
    /// A lowered signal with no waiter.
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            waker: AtomicWaker::new(),
        }
    }

    /// Raise the signal and wake the waiting task. Interrupt context.
    pub fn signal(&self) {
        self.pending.store(true, Ordering::Release);
        self.waker.wake();
    }

    /// Wait until the signal has been raised since the last wait returned.
    pub fn wait(&self) -> InterruptFuture<'_> {
        InterruptFuture { signal: self }
    }

    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl Default for InterruptSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`InterruptSignal::wait`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct InterruptFuture<'a> {
    signal: &'a InterruptSignal,
}

impl Future for InterruptFuture<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.signal.take() {
            return Poll::Ready(());
        }
        self.signal.waker.register(cx.waker());
        // an interrupt may have landed between the check and the register
        if self.signal.take() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
