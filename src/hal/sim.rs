//! Kinematic track simulator.
//!
//! [`TrackSim`] is a small stand-in for the physics and UI collaborators: it
//! integrates the commanded acceleration into speed and position, places
//! platforms at a fixed spacing, and animates the doors over a fixed time.
//! Integration tests and the `metro_sim` binary drive both controllers with
//! it.
//!
//! # Physics Model
//!
//! - Speed changes by `acceleration * accel_gain` km/h every second, never
//!   below zero
//! - Position integrates speed (semi-implicit, new speed first)
//! - With the default gain, `-5` stops the vehicle from 80 km/h in 250 m
//!
//! # Example
//!
//! ```rust
//! use rs_metro::config::SimConfig;
//! use rs_metro::hal::TrackSim;
//! use rs_metro::traits::Vehicle;
//!
//! let mut sim = TrackSim::new(SimConfig::default());
//! assert_eq!(sim.distance_to_station(), Some(900.0));
//!
//! sim.set_acceleration(5.0).unwrap();
//! for _ in 0..50 {
//!     sim.step(20);
//! }
//! assert!(sim.telemetry().speed > 3.0);
//! ```

use alloc::string::String;
use core::convert::Infallible;

use tracing::debug;

use crate::config::SimConfig;
use crate::traits::{Clock, DoorStatus, Telemetry, Vehicle};

/// Acceleration applied by an emergency stop.
pub const EMERGENCY_ACCELERATION: f32 = -5.0;

/// How far past a mark the vehicle must run before the next one is targeted.
const PASSED_MARGIN_M: f32 = 50.0;

/// Simulated vehicle on a straight line with evenly spaced platforms.
#[derive(Debug)]
pub struct TrackSim {
    config: SimConfig,
    now_ms: u64,
    position_m: f32,
    speed: f32,
    acceleration: f32,
    station: u32,
    last_station: Option<u32>,
    doors: DoorStatus,
    door_remaining_ms: u64,
    override_engaged: bool,
    automatic: bool,
    status: String,
}

impl TrackSim {
    /// Vehicle at rest at position 0, doors closed, automatic mode allowed.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            now_ms: 0,
            position_m: 0.0,
            speed: 0.0,
            acceleration: 0.0,
            station: 0,
            last_station: None,
            doors: DoorStatus::default(),
            door_remaining_ms: 0,
            override_engaged: false,
            automatic: true,
            status: String::new(),
        }
    }

    /// End the line after station `index` (zero-based); nothing is detected
    /// ahead once it has been served.
    pub fn with_last_station(mut self, index: u32) -> Self {
        self.last_station = Some(index);
        self
    }

    /// Start moving at `speed` km/h.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    /// Advance the simulation by `dt_ms`.
    pub fn step(&mut self, dt_ms: u64) {
        let dt_s = dt_ms as f32 / 1000.0;
        self.now_ms += dt_ms;

        self.speed = (self.speed + self.acceleration * self.config.accel_gain * dt_s).max(0.0);
        self.position_m += self.speed / 3.6 * dt_s;

        if self.doors.animating {
            self.door_remaining_ms = self.door_remaining_ms.saturating_sub(dt_ms);
            if self.door_remaining_ms == 0 {
                self.doors.animating = false;
            }
        }

        if let Some(distance) = self.distance_to_station() {
            if distance < -PASSED_MARGIN_M {
                debug!(station = self.station, distance, "ran past station");
                self.station += 1;
            }
        }
    }

    /// Position along the line (m).
    pub fn position_m(&self) -> f32 {
        self.position_m
    }

    /// Index of the station currently targeted.
    pub fn station(&self) -> u32 {
        self.station
    }

    /// Position of the stopping mark of station `index` (m).
    pub fn station_position_m(&self, index: u32) -> f32 {
        self.config.first_station_m + index as f32 * self.config.station_spacing_m
    }

    /// Whether automatic mode is still allowed.
    pub fn automatic_enabled(&self) -> bool {
        self.automatic
    }

    /// Release the override engaged by an emergency stop.
    pub fn release_override(&mut self) {
        self.override_engaged = false;
    }

    /// Last published status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    fn start_door_animation(&mut self) {
        self.doors.animating = self.config.door_animation_ms > 0;
        self.door_remaining_ms = self.config.door_animation_ms;
    }
}

impl Vehicle for TrackSim {
    type Error = Infallible;

    fn telemetry(&self) -> Telemetry {
        Telemetry::new(self.speed, self.acceleration)
    }

    fn distance_to_station(&self) -> Option<f32> {
        if self.last_station.is_some_and(|last| self.station > last) {
            return None;
        }
        Some(self.station_position_m(self.station) - self.position_m)
    }

    fn doors(&self) -> DoorStatus {
        self.doors
    }

    fn override_engaged(&self) -> bool {
        self.override_engaged
    }

    fn set_acceleration(&mut self, acceleration: f32) -> Result<(), Infallible> {
        self.acceleration = acceleration;
        Ok(())
    }

    fn open_doors(&mut self) -> Result<(), Infallible> {
        debug!(station = self.station, "doors opening");
        self.doors.open = true;
        self.start_door_animation();
        // Served: target the next platform
        self.station += 1;
        Ok(())
    }

    fn close_doors(&mut self) -> Result<(), Infallible> {
        debug!("doors closing");
        self.doors.open = false;
        self.start_door_animation();
        Ok(())
    }

    fn emergency_stop(&mut self) -> Result<(), Infallible> {
        self.acceleration = EMERGENCY_ACCELERATION;
        self.override_engaged = true;
        Ok(())
    }

    fn disable_automatic(&mut self) -> Result<(), Infallible> {
        self.automatic = false;
        Ok(())
    }

    fn publish_status(&mut self, status: &str) -> Result<(), Infallible> {
        self.status.clear();
        self.status.push_str(status);
        Ok(())
    }
}

impl Clock for TrackSim {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
