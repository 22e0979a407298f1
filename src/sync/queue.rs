//! Bounded single-producer/single-consumer queue.
//!
//! Moves completed receive chains and transmit completions from the interrupt
//! context to the poll context without locking. The queue is split once into
//! a [`Producer`] and a [`Consumer`], and each half is owned by one context.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity SPSC queue holding up to `N` items.
///
/// Head and tail run over `0..2N` so a full queue is distinguishable from an
/// empty one without wasting a slot.
pub struct SpscQueue<T, const N: usize> {
    head: AtomicUsize,
    tail: AtomicUsize,
    slots: [UnsafeCell<MaybeUninit<T>>; N],
}

// SAFETY: the producer only writes slots in [tail, head + N) and the consumer
// only reads slots in [head, tail); the Release/Acquire pairs on the indices
// order the slot accesses.
unsafe impl<T: Send, const N: usize> Sync for SpscQueue<T, N> {}

impl<T, const N: usize> SpscQueue<T, N> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        assert!(N > 0, "queue capacity must be non-zero");
        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            slots: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
        }
    }

    /// Maximum number of queued items.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail + 2 * N - head) % (2 * N)
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into the two role halves.
    pub fn split(&mut self) -> (Producer<'_, T, N>, Consumer<'_, T, N>) {
        let queue: &Self = self;
        (Producer { queue }, Consumer { queue })
    }

    /// Push through exclusive access.
    pub fn enqueue(&mut self, item: T) -> Result<(), T> {
        self.push(item)
    }

    /// Pop through exclusive access.
    pub fn dequeue(&mut self) -> Option<T> {
        self.pop()
    }

    const fn advance(index: usize) -> usize {
        if index + 1 == 2 * N { 0 } else { index + 1 }
    }

    fn push(&self, item: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if (tail + 2 * N - head) % (2 * N) == N {
            return Err(item);
        }
        // SAFETY: the slot is outside [head, tail), so the consumer is not
        // touching it, and this is the only producer.
        unsafe { (*self.slots[tail % N].get()).write(item) };
        self.tail.store(Self::advance(tail), Ordering::Release);
        Ok(())
    }

    fn pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        // SAFETY: the slot is inside [head, tail), so the producer initialized
        // it and will not touch it until head moves past.
        let item = unsafe { (*self.slots[head % N].get()).assume_init_read() };
        self.head.store(Self::advance(head), Ordering::Release);
        Some(item)
    }
}

impl<T, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for SpscQueue<T, N> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

/// Producing half of an [`SpscQueue`].
pub struct Producer<'a, T, const N: usize> {
    queue: &'a SpscQueue<T, N>,
}

impl<T, const N: usize> Producer<'_, T, N> {
    /// Push `item`, or hand it back if the queue is full. Never blocks.
    pub fn enqueue(&mut self, item: T) -> Result<(), T> {
        self.queue.push(item)
    }

    /// True if no more items fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.len() == N
    }
}

/// Consuming half of an [`SpscQueue`].
pub struct Consumer<'a, T, const N: usize> {
    queue: &'a SpscQueue<T, N>,
}

impl<T, const N: usize> Consumer<'_, T, N> {
    /// Pop the oldest item.
    pub fn dequeue(&mut self) -> Option<T> {
        self.queue.pop()
    }

    /// Items waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
