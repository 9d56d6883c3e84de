//! Delays between successive pops.
//!
//! When the reconciler pops several pages for one address change it pauses
//! between pops so that each page's exit animation can play. The pause is
//! cosmetic; [`NoDelay`] turns it off (tests, headless hosts).

use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;

/// Produces the pause awaited between two pops.
pub trait Pacer: Send + Sync {
    /// Future that completes when the next pop may run.
    fn pause(&self) -> BoxFuture<'static, ()>;
}

/// No pause at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn pause(&self) -> BoxFuture<'static, ()> {
        futures::future::ready(()).boxed()
    }
}

/// A fixed pause driven by [`futures_timer`], independent of any runtime.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    /// Pause used when nothing else is configured.
    pub const DEFAULT: Self = Self(Duration::from_millis(30));
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Pacer for FixedDelay {
    fn pause(&self) -> BoxFuture<'static, ()> {
        if self.0.is_zero() {
            return futures::future::ready(()).boxed();
        }
        futures_timer::Delay::new(self.0).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_no_delay_is_immediate() {
        pollster::block_on(NoDelay.pause());
    }

    #[test]
    fn test_fixed_delay_waits() {
        let started = Instant::now();
        pollster::block_on(FixedDelay(Duration::from_millis(5)).pause());
        assert!(started.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_zero_fixed_delay() {
        pollster::block_on(FixedDelay(Duration::ZERO).pause());
    }
}
