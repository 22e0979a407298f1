//! Frame counters shared by the interrupt and poll contexts.
//!
//! Counters only ever grow (modulo wrap) and use relaxed atomics, so a
//! snapshot is eventually consistent rather than a single instant.

use core::sync::atomic::{AtomicU32, Ordering};

/// Live counters
#[derive(Debug, Default)]
pub struct Statistics {
    frames_sent: AtomicU32,
    frames_received: AtomicU32,
    send_errors: AtomicU32,
    receive_errors: AtomicU32,
    app_missed: AtomicU32,
    mac_missed: AtomicU32,
}

/// Point-in-time copy of [`Statistics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatisticsSnapshot {
    /// Frames transmitted without error
    pub frames_sent: u32,
    /// Frames received and queued
    pub frames_received: u32,
    /// Failed or rejected transmits
    pub send_errors: u32,
    /// Bad received frames
    pub receive_errors: u32,
    /// Received frames the application never saw
    pub app_missed: u32,
    /// Frames dropped by the DMA
    pub mac_missed: u32,
}

impl Statistics {
    /// All counters at zero
    pub const fn new() -> Self {
        Self {
            frames_sent: AtomicU32::new(0),
            frames_received: AtomicU32::new(0),
            send_errors: AtomicU32::new(0),
            receive_errors: AtomicU32::new(0),
            app_missed: AtomicU32::new(0),
            mac_missed: AtomicU32::new(0),
        }
    }

    fn bump(counter: &AtomicU32, by: u32) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub(crate) fn frame_sent(&self) {
        Self::bump(&self.frames_sent, 1);
    }

    pub(crate) fn frame_received(&self) {
        Self::bump(&self.frames_received, 1);
    }

    pub(crate) fn send_error(&self) {
        Self::bump(&self.send_errors, 1);
    }

    pub(crate) fn receive_error(&self) {
        Self::bump(&self.receive_errors, 1);
    }

    pub(crate) fn app_missed(&self) {
        Self::bump(&self.app_missed, 1);
    }

    pub(crate) fn add_app_missed(&self, count: u32) {
        if count != 0 {
            Self::bump(&self.app_missed, count);
        }
    }

    pub(crate) fn add_mac_missed(&self, count: u32) {
        if count != 0 {
            Self::bump(&self.mac_missed, count);
        }
    }

    /// Copy every counter
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            app_missed: self.app_missed.load(Ordering::Relaxed),
            mac_missed: self.mac_missed.load(Ordering::Relaxed),
        }
    }
}
