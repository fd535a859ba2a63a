//! Collaborator implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test doubles for the vehicle, the audio backend, and the clock
//! - `sim`: [`TrackSim`], a kinematic vehicle for integration tests and the demo
//! - [`StdClock`]: wall-clock time source (requires `std` feature)

pub mod mock;
pub mod sim;

pub use mock::*;
pub use sim::TrackSim;

#[cfg(feature = "std")]
pub use std_clock::StdClock;

#[cfg(feature = "std")]
mod std_clock {
    use std::time::Instant;

    use crate::traits::Clock;

    /// Monotonic clock backed by [`Instant`].
    ///
    /// Time is measured from construction.
    ///
    /// ```rust
    /// use rs_metro::hal::StdClock;
    /// use rs_metro::traits::Clock;
    ///
    /// let clock = StdClock::new();
    /// assert!(clock.now_ms() < 1000);
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct StdClock {
        start: Instant,
    }

    impl StdClock {
        /// Creates a clock reading 0 now.
        #[inline]
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for StdClock {
        #[inline]
        fn now_ms(&self) -> u64 {
            self.start.elapsed().as_millis() as u64
        }
    }
}
