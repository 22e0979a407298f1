//! MAC/DMA software reset.

use embedded_hal::delay::DelayNs;

use crate::driver::error::{IoError, Result};
use crate::internal::constants::{RESET_POLL_INTERVAL_US, SOFT_RESET_TIMEOUT_MS};
use crate::internal::register::dma::DMABMR_SR;
use crate::internal::register::{Reg, RegisterBlock};

/// Drives DMABMR.SR, which resets every MAC and DMA register.
///
/// The reset only completes while the PHY supplies the reference clock, so a
/// missing or unpowered PHY shows up here as a timeout.
#[derive(Debug)]
pub struct ResetController<R, D> {
    regs: R,
    delay: D,
    timeout_ms: u32,
}

impl<R: RegisterBlock, D: DelayNs> ResetController<R, D> {
    /// Create a reset controller with the default timeout
    pub fn new(regs: R, delay: D) -> Self {
        Self::with_timeout(regs, delay, SOFT_RESET_TIMEOUT_MS)
    }

    /// Create a reset controller with a custom timeout
    pub fn with_timeout(regs: R, delay: D, timeout_ms: u32) -> Self {
        Self {
            regs,
            delay,
            timeout_ms,
        }
    }

    /// Set SR and poll until the hardware clears it.
    pub fn soft_reset(&mut self) -> Result<()> {
        self.regs.set_bits(Reg::DmaBmr, DMABMR_SR);

        let max_iterations = (self.timeout_ms.saturating_mul(1000) / RESET_POLL_INTERVAL_US).max(1);
        for _ in 0..max_iterations {
            if !self.is_reset_in_progress() {
                return Ok(());
            }
            self.delay.delay_us(RESET_POLL_INTERVAL_US);
        }
        if self.is_reset_in_progress() {
            return Err(IoError::Timeout.into());
        }
        Ok(())
    }

    /// True while SR is still set
    pub fn is_reset_in_progress(&self) -> bool {
        self.regs.is_set(Reg::DmaBmr, DMABMR_SR)
    }

    /// Get the current timeout setting
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDelay, MockRegisters};

    #[test]
    fn soft_reset_completes_when_bit_clears() {
        let regs = MockRegisters::new();
        let mut delay = MockDelay::new();
        let mut reset = ResetController::new(&regs, &mut delay);
        assert!(reset.soft_reset().is_ok());
        assert!(!reset.is_reset_in_progress());
        assert!(regs.was_written(Reg::DmaBmr));
    }

    #[test]
    fn stuck_reset_times_out_after_bounded_polls() {
        let regs = MockRegisters::new();
        regs.set_reset_stuck(true);
        let mut delay = MockDelay::new();
        let mut reset = ResetController::with_timeout(&regs, &mut delay, 1);
        assert_eq!(reset.soft_reset(), Err(IoError::Timeout.into()));
        assert_eq!(reset.timeout_ms(), 1);
        drop(reset);
        assert_eq!(delay.total_us(), 1000);
    }
}
