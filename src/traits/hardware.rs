//! Vehicle abstraction traits for telemetry, motion commands, and timing.
//!
//! This module defines the interface between the decision core and the
//! vehicle it drives. The physics integrator, door animation, and status
//! display all live behind [`Vehicle`]; the controllers only read samples and
//! issue commands.
//!
//! # Key Types
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Telemetry`] | Speed/acceleration sample for one tick |
//! | [`DoorStatus`] | Platform door state as reported by the UI side |
//! | [`Vehicle`] | Telemetry source and command sink |
//! | [`Clock`] | Monotonic time source for dwell timers |
//!
//! # Implementation
//!
//! For testing, use the mock implementations from [`crate::hal::mock`], or
//! the kinematic [`TrackSim`](crate::hal::TrackSim) when a test needs the
//! vehicle to actually move.
//!
//! # Example
//!
//! ```rust
//! use rs_metro::traits::Vehicle;
//! use rs_metro::hal::MockVehicle;
//!
//! let mut vehicle = MockVehicle::new();
//! vehicle.set_acceleration(5.0).unwrap();
//! vehicle.open_doors().unwrap();
//!
//! assert_eq!(vehicle.commanded_acceleration, Some(5.0));
//! assert!(vehicle.doors().open);
//! ```

/// One telemetry sample, produced once per tick by the physics side.
///
/// Both controllers read the same sample and never mutate it.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Telemetry {
    /// Current speed in km/h (never negative).
    pub speed: f32,
    /// Current acceleration in km/h per tick, roughly `[-5, 5]`.
    pub acceleration: f32,
}

impl Telemetry {
    /// Creates a sample, clamping negative speeds to zero.
    pub fn new(speed: f32, acceleration: f32) -> Self {
        Self {
            speed: speed.max(0.0),
            acceleration,
        }
    }

    /// Returns true when the vehicle is not moving.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.speed <= 0.0
    }
}

/// Platform door state.
///
/// `open` can read `false` transiently while the closing animation is still
/// running, so a close is only confirmed once `animating` is also false.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorStatus {
    /// Doors report open.
    pub open: bool,
    /// An open or close animation is in progress.
    pub animating: bool,
}

impl DoorStatus {
    /// Doors are closed and no animation is running.
    #[inline]
    pub fn is_fully_closed(&self) -> bool {
        !self.open && !self.animating
    }
}

/// Vehicle collaborator: telemetry source and command sink.
///
/// Implement this for whatever owns the simulated train. Every command
/// returns a `Result` so hardware-backed or remote implementations can
/// report failures; the controllers propagate them unchanged.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_metro::traits::{DoorStatus, Telemetry, Vehicle};
///
/// struct MyTrain { /* simulator handles */ }
///
/// impl Vehicle for MyTrain {
///     type Error = ();
///
///     fn telemetry(&self) -> Telemetry { Telemetry::new(self.speed, self.accel) }
///     fn distance_to_station(&self) -> Option<f32> { self.next_platform_m }
///     fn doors(&self) -> DoorStatus { self.doors }
///     fn override_engaged(&self) -> bool { self.emergency_brake }
///     fn set_acceleration(&mut self, a: f32) -> Result<(), ()> { self.accel = a; Ok(()) }
///     // ...
/// }
/// ```
pub trait Vehicle {
    /// Error type for vehicle commands.
    type Error;

    /// Current speed/acceleration sample.
    fn telemetry(&self) -> Telemetry;

    /// Distance in meters to the stopping point of the next platform.
    ///
    /// Negative once the stopping point has been passed. `None` when no
    /// station is detected ahead.
    fn distance_to_station(&self) -> Option<f32>;

    /// Platform door state.
    fn doors(&self) -> DoorStatus;

    /// Returns true while an external override (emergency brake, forced
    /// manual hold) is holding the vehicle.
    fn override_engaged(&self) -> bool;

    /// Command an acceleration in km/h per tick (negative brakes).
    fn set_acceleration(&mut self, acceleration: f32) -> Result<(), Self::Error>;

    /// Command the platform doors open.
    fn open_doors(&mut self) -> Result<(), Self::Error>;

    /// Command the platform doors closed.
    fn close_doors(&mut self) -> Result<(), Self::Error>;

    /// Immediate maximum deceleration, engaging the vehicle's override.
    fn emergency_stop(&mut self) -> Result<(), Self::Error>;

    /// Switch the vehicle back to manual operation.
    fn disable_automatic(&mut self) -> Result<(), Self::Error>;

    /// Publish a human-readable status line.
    fn publish_status(&mut self, status: &str) -> Result<(), Self::Error>;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for dwell timing. On desktop,
/// [`StdClock`](crate::hal::StdClock) wraps `std::time::Instant`; tests use
/// [`MockClock`](crate::hal::MockClock) to advance time deterministically.
///
/// # Example
///
/// ```rust
/// use rs_metro::traits::Clock;
/// use rs_metro::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
