//! Automatic train operation.
//!
//! This module provides [`MotionController`], the state machine that drives a
//! vehicle from one platform to a precise stop at the next, runs the dwell
//! sequence, and departs again.
//!
//! # Overview
//!
//! The controller:
//! - Accelerates toward a target speed that shrinks as the station nears
//! - Starts braking, always at maximum deceleration, at exactly the distance
//!   given by the [`BrakingLaw`]
//! - Accepts the stop only inside the [`StopWindow`]; a miss hands control
//!   back to the driver
//! - Opens, holds, and closes the doors on fixed timers driven by the
//!   caller's clock
//!
//! # Example
//!
//! ```rust
//! use rs_metro::{JourneyState, MotionController};
//! use rs_metro::hal::MockVehicle;
//!
//! // Vehicle at rest with doors closed: activation starts a journey
//! let vehicle = MockVehicle::new().with_distance(900.0);
//! let mut autopilot = MotionController::new(vehicle);
//! autopilot.activate(0).unwrap();
//!
//! assert_eq!(autopilot.state(), JourneyState::Accelerating);
//! assert_eq!(autopilot.vehicle().commanded_acceleration, Some(5.0));
//!
//! // Main loop - call update() every tick with the clock reading
//! for tick in 1..10 {
//!     autopilot.update(tick * 20).unwrap();
//! }
//! ```
//!
//! # Deactivation
//!
//! Turning automatic operation off never leaves the vehicle coasting:
//!
//! ```rust
//! use rs_metro::{JourneyEvent, JourneyState, MotionController};
//! use rs_metro::hal::MockVehicle;
//!
//! let mut autopilot = MotionController::new(MockVehicle::new().moving(60.0));
//! autopilot.activate(0).unwrap();
//! let event = autopilot.deactivate().unwrap();
//!
//! assert_eq!(event, Some(JourneyEvent::EmergencyStop { speed: 60.0 }));
//! assert!(!autopilot.is_active());
//! assert_eq!(autopilot.state(), JourneyState::Idle);
//! assert_eq!(autopilot.vehicle().emergency_stops, 1);
//! ```
//!
//! [`BrakingLaw`]: crate::profile::BrakingLaw
//! [`StopWindow`]: crate::profile::StopWindow

use tracing::{debug, error, info, warn};

use crate::config::AutopilotConfig;
use crate::traits::Vehicle;

/// Sub-phase of [`JourneyState::StationStop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopPhase {
    /// Waiting for the vehicle to report it is really at rest.
    Verifying,
    /// At rest; the door-open delay is running.
    Dwelling,
}

/// Sub-phase of [`JourneyState::DoorsClosing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ClosePhase {
    /// Close commanded, doors have not reported closed yet.
    AwaitingConfirmation,
    /// Doors reported closed at least once; waiting for the animation.
    Confirmed,
}

/// Phase of the automatic journey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JourneyState {
    /// Not driving.
    #[default]
    Idle,
    /// Maximum acceleration toward the target speed.
    Accelerating,
    /// Holding the target speed.
    Cruising,
    /// Maximum deceleration toward the platform.
    Braking,
    /// Stopped inside the platform window.
    StationStop(StopPhase),
    /// Doors open, passengers boarding.
    DoorsOpen,
    /// Close commanded, waiting for the doors to finish.
    DoorsClosing(ClosePhase),
    /// Doors closed, waiting to depart.
    WaitingDeparture,
    /// Stopped outside the platform window; hand-off to manual pending.
    StationMissed,
}

impl JourneyState {
    /// Returns the state as a snake_case string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            JourneyState::Idle => "idle",
            JourneyState::Accelerating => "accelerating",
            JourneyState::Cruising => "cruising",
            JourneyState::Braking => "braking",
            JourneyState::StationStop(StopPhase::Verifying) => "station_stop",
            JourneyState::StationStop(StopPhase::Dwelling) => "station_dwell",
            JourneyState::DoorsOpen => "doors_open",
            JourneyState::DoorsClosing(_) => "doors_closing",
            JourneyState::WaitingDeparture => "waiting_departure",
            JourneyState::StationMissed => "station_missed",
        }
    }
}

/// Status lines published to the vehicle's display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusMessage {
    /// Accelerating.
    Accelerating,
    /// Cruising.
    Cruising,
    /// Braking for the station.
    Braking,
    /// Stopped at the platform.
    AtStation,
    /// Doors open.
    DoorsOpen,
    /// Doors closing.
    DoorsClosing,
    /// Waiting to depart.
    PreparingDeparture,
    /// Stopped without a station target.
    EmergencyStop,
    /// Stopped outside the platform window.
    StationMissed,
    /// Control handed back to the driver.
    ManualControl,
    /// Automatic operation switched off.
    Disengaged,
}

impl StatusMessage {
    /// Text shown to the operator.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StatusMessage::Accelerating => "AUTO: Accelerating",
            StatusMessage::Cruising => "AUTO: Cruising",
            StatusMessage::Braking => "AUTO: Braking",
            StatusMessage::AtStation => "AUTO: At station",
            StatusMessage::DoorsOpen => "AUTO: Doors open",
            StatusMessage::DoorsClosing => "AUTO: Doors closing",
            StatusMessage::PreparingDeparture => "AUTO: Preparing departure",
            StatusMessage::EmergencyStop => "AUTO: Emergency stop",
            StatusMessage::StationMissed => "AUTO: STATION MISSED",
            StatusMessage::ManualControl => "AUTO OFF - MANUAL",
            StatusMessage::Disengaged => "AUTO OFF - EMERGENCY STOP",
        }
    }
}

/// Notable occurrences reported by [`MotionController::update`] and
/// [`MotionController::deactivate`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JourneyEvent {
    /// A journey started (maximum acceleration issued).
    Departed,
    /// Maximum braking started.
    BrakingStarted {
        /// Distance to the stopping mark (m).
        distance: f32,
        /// Speed when braking began (km/h).
        speed: f32,
    },
    /// Stopped inside the platform window.
    Arrived {
        /// Distance to the stopping mark (m).
        distance: f32,
    },
    /// Stopped outside the platform window. Automatic operation ends after
    /// the hand-off delay.
    StationMissed {
        /// Distance to the stopping mark (m).
        distance: f32,
    },
    /// Doors commanded open.
    DoorsOpening,
    /// Doors commanded closed.
    DoorsClosing,
    /// Stopped with no station ahead; the vehicle is held by its override.
    EmergencyHalt,
    /// Automatic operation ended after a missed stop.
    ManualHandoff,
    /// Disengaged with an emergency stop.
    EmergencyStop {
        /// Speed when the stop was issued (km/h).
        speed: f32,
    },
}

/// Automatic train operation state machine.
///
/// Coordinates telemetry, the speed profile, and door timing. Reads the
/// vehicle through [`Vehicle`] and issues at most one acceleration command
/// and one door command per tick.
///
/// # Type Parameter
///
/// - `V`: The vehicle implementation ([`Vehicle`] trait)
///
/// # Timing
///
/// The controller never sleeps. Every method that needs time takes the
/// current clock reading (`now_ms`), usually from a [`Clock`].
///
/// [`Clock`]: crate::traits::Clock
pub struct MotionController<V: Vehicle> {
    vehicle: V,
    config: AutopilotConfig,
    active: bool,
    state: JourneyState,
    phase_started_ms: u64,
}

impl<V: Vehicle> MotionController<V> {
    /// Create a controller with the default configuration
    pub fn new(vehicle: V) -> Self {
        Self::with_config(vehicle, AutopilotConfig::default())
    }

    /// Create a controller with a custom configuration
    pub fn with_config(vehicle: V, config: AutopilotConfig) -> Self {
        Self {
            vehicle,
            config,
            active: false,
            state: JourneyState::Idle,
            phase_started_ms: 0,
        }
    }

    /// Engage automatic operation.
    ///
    /// Picks the starting phase from the current telemetry: resume the dwell
    /// if stopped with doors open, start a journey if stopped with doors
    /// closed, brake immediately if already inside the braking envelope,
    /// otherwise accelerate or cruise.
    pub fn activate(&mut self, now_ms: u64) -> Result<(), V::Error> {
        if self.active {
            return Ok(());
        }
        self.active = true;
        self.state = JourneyState::Idle;
        info!("automatic operation engaged");

        let telemetry = self.vehicle.telemetry();
        let speed = telemetry.speed;
        if telemetry.is_stopped() {
            if self.vehicle.doors().open {
                self.enter(JourneyState::DoorsOpen, now_ms, StatusMessage::DoorsOpen)?;
            } else {
                self.start_journey(now_ms)?;
            }
            return Ok(());
        }

        let distance = self.vehicle.distance_to_station();
        match distance {
            Some(d) if self.config.braking.must_brake(d, speed) => {
                self.begin_braking(now_ms, d, speed)?;
            }
            _ => self.continue_journey(now_ms, distance, speed)?,
        }
        Ok(())
    }

    /// Disengage automatic operation.
    ///
    /// Always issues an emergency stop, whatever the current phase, and
    /// reports it as [`JourneyEvent::EmergencyStop`] with the speed at which
    /// it was issued. Returns `None` when already inactive.
    pub fn deactivate(&mut self) -> Result<Option<JourneyEvent>, V::Error> {
        if !self.active {
            return Ok(None);
        }
        let speed = self.vehicle.telemetry().speed;
        info!(from = self.state.as_str(), speed, "automatic operation disengaged");
        self.active = false;
        self.state = JourneyState::Idle;
        self.phase_started_ms = 0;
        self.vehicle.emergency_stop()?;
        self.vehicle
            .publish_status(StatusMessage::Disengaged.as_str())?;
        Ok(Some(JourneyEvent::EmergencyStop { speed }))
    }

    /// Run one tick - call once per simulation step.
    pub fn update(&mut self, now_ms: u64) -> Result<Option<JourneyEvent>, V::Error> {
        if !self.active {
            return Ok(None);
        }

        let distance = self.vehicle.distance_to_station();
        let speed = self.vehicle.telemetry().speed;

        match self.state {
            JourneyState::Idle => self.on_idle(now_ms, speed),
            JourneyState::Accelerating => self.on_accelerating(now_ms, distance, speed),
            JourneyState::Cruising => self.on_cruising(now_ms, distance, speed),
            JourneyState::Braking => self.on_braking(now_ms, distance, speed),
            JourneyState::StationStop(phase) => self.on_station_stop(now_ms, phase, speed),
            JourneyState::DoorsOpen => self.on_doors_open(now_ms),
            JourneyState::DoorsClosing(phase) => self.on_doors_closing(now_ms, phase),
            JourneyState::WaitingDeparture => self.on_waiting_departure(now_ms),
            JourneyState::StationMissed => self.on_station_missed(now_ms),
        }
    }

    /// Distance needed to stop from `speed` at maximum deceleration.
    pub fn braking_distance(&self, speed: f32) -> f32 {
        self.config.braking.braking_distance(speed)
    }

    /// Target speed for the given distance to the station.
    pub fn target_speed(&self, distance: Option<f32>) -> f32 {
        self.config.profile.target_speed(distance)
    }

    /// Whether automatic operation is engaged.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current journey phase.
    pub fn state(&self) -> JourneyState {
        self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    /// Borrow the vehicle.
    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    /// Mutably borrow the vehicle (e.g. to step a simulator).
    pub fn vehicle_mut(&mut self) -> &mut V {
        &mut self.vehicle
    }

    /// State snapshot for UI/logging.
    pub fn snapshot(&self, now_ms: u64) -> AutopilotState {
        AutopilotState {
            active: self.active,
            state: self.state,
            phase_elapsed_ms: self.elapsed(now_ms),
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.phase_started_ms)
    }

    fn enter(
        &mut self,
        state: JourneyState,
        now_ms: u64,
        status: StatusMessage,
    ) -> Result<(), V::Error> {
        info!(from = self.state.as_str(), to = state.as_str(), "journey phase");
        self.state = state;
        self.phase_started_ms = now_ms;
        self.vehicle.publish_status(status.as_str())
    }

    fn start_journey(&mut self, now_ms: u64) -> Result<JourneyEvent, V::Error> {
        self.vehicle.set_acceleration(self.config.max_acceleration)?;
        self.enter(
            JourneyState::Accelerating,
            now_ms,
            StatusMessage::Accelerating,
        )?;
        Ok(JourneyEvent::Departed)
    }

    fn continue_journey(
        &mut self,
        now_ms: u64,
        distance: Option<f32>,
        speed: f32,
    ) -> Result<(), V::Error> {
        let target = self.target_speed(distance);
        if speed >= target {
            self.vehicle.set_acceleration(0.0)?;
            self.enter(JourneyState::Cruising, now_ms, StatusMessage::Cruising)
        } else {
            self.vehicle.set_acceleration(self.config.max_acceleration)?;
            self.enter(
                JourneyState::Accelerating,
                now_ms,
                StatusMessage::Accelerating,
            )
        }
    }

    fn begin_braking(
        &mut self,
        now_ms: u64,
        distance: f32,
        speed: f32,
    ) -> Result<JourneyEvent, V::Error> {
        info!(distance, speed, "braking for station");
        self.vehicle
            .set_acceleration(-self.config.max_deceleration)?;
        self.enter(JourneyState::Braking, now_ms, StatusMessage::Braking)?;
        Ok(JourneyEvent::BrakingStarted { distance, speed })
    }

    /// Envelope test shared by accelerating and cruising.
    fn braking_due(&self, distance: Option<f32>, speed: f32) -> Option<f32> {
        let d = distance?;
        let envelope = self.braking_distance(speed);
        debug!(speed, distance = d, envelope, "braking envelope");
        (d <= envelope).then_some(d)
    }

    // ------------------------------------------------------------------------
    // Per-state handlers
    // ------------------------------------------------------------------------

    fn on_idle(&mut self, now_ms: u64, speed: f32) -> Result<Option<JourneyEvent>, V::Error> {
        if speed <= 0.0 && !self.vehicle.doors().open && !self.vehicle.override_engaged() {
            return self.start_journey(now_ms).map(Some);
        }
        Ok(None)
    }

    fn on_accelerating(
        &mut self,
        now_ms: u64,
        distance: Option<f32>,
        speed: f32,
    ) -> Result<Option<JourneyEvent>, V::Error> {
        let target = self.target_speed(distance);

        if let Some(d) = self.braking_due(distance, speed) {
            return self.begin_braking(now_ms, d, speed).map(Some);
        }

        if speed >= target {
            self.vehicle.set_acceleration(0.0)?;
            self.enter(JourneyState::Cruising, now_ms, StatusMessage::Cruising)?;
        }
        Ok(None)
    }

    fn on_cruising(
        &mut self,
        now_ms: u64,
        distance: Option<f32>,
        speed: f32,
    ) -> Result<Option<JourneyEvent>, V::Error> {
        let target = self.target_speed(distance);

        if let Some(d) = self.braking_due(distance, speed) {
            return self.begin_braking(now_ms, d, speed).map(Some);
        }

        let margin = self.config.cruise_margin;
        if speed > target + margin {
            self.vehicle
                .set_acceleration(-self.config.cruise_correction)?;
        } else if speed < target - margin {
            self.vehicle.set_acceleration(self.config.max_acceleration)?;
            self.enter(
                JourneyState::Accelerating,
                now_ms,
                StatusMessage::Accelerating,
            )?;
        } else {
            self.vehicle.set_acceleration(0.0)?;
        }
        Ok(None)
    }

    fn on_braking(
        &mut self,
        now_ms: u64,
        distance: Option<f32>,
        speed: f32,
    ) -> Result<Option<JourneyEvent>, V::Error> {
        let Some(distance) = distance else {
            // No station ahead: stop and stay stopped
            if speed <= 0.0 {
                warn!("braking with no station ahead, holding vehicle");
                self.vehicle.emergency_stop()?;
                self.enter(JourneyState::Idle, now_ms, StatusMessage::EmergencyStop)?;
                return Ok(Some(JourneyEvent::EmergencyHalt));
            }
            self.vehicle
                .set_acceleration(-self.config.max_deceleration)?;
            return Ok(None);
        };

        if speed > 0.0 {
            self.vehicle
                .set_acceleration(-self.config.max_deceleration)?;
            return Ok(None);
        }

        let window = self.config.stop_window;
        if window.contains(distance) {
            info!(
                distance,
                target = window.perfect_stop_m,
                "stopped at platform"
            );
            self.vehicle.set_acceleration(0.0)?;
            self.enter(
                JourneyState::StationStop(StopPhase::Verifying),
                now_ms,
                StatusMessage::AtStation,
            )?;
            Ok(Some(JourneyEvent::Arrived { distance }))
        } else {
            error!(
                distance,
                min = window.min_acceptable(),
                max = window.max_acceptable(),
                "station missed"
            );
            self.vehicle.emergency_stop()?;
            self.enter(
                JourneyState::StationMissed,
                now_ms,
                StatusMessage::StationMissed,
            )?;
            Ok(Some(JourneyEvent::StationMissed { distance }))
        }
    }

    fn on_station_stop(
        &mut self,
        now_ms: u64,
        phase: StopPhase,
        speed: f32,
    ) -> Result<Option<JourneyEvent>, V::Error> {
        let moving = speed > self.config.at_rest_speed;

        match phase {
            StopPhase::Verifying => {
                if moving {
                    debug!(speed, "not at rest yet");
                    self.vehicle
                        .set_acceleration(-self.config.max_deceleration)?;
                } else {
                    self.state = JourneyState::StationStop(StopPhase::Dwelling);
                    self.phase_started_ms = now_ms;
                }
                Ok(None)
            }
            StopPhase::Dwelling => {
                if moving {
                    warn!(speed, "movement detected during station stop");
                    self.vehicle
                        .set_acceleration(-self.config.max_deceleration)?;
                    return Ok(None);
                }
                if self.elapsed(now_ms) < self.config.door_open_delay_ms {
                    return Ok(None);
                }
                if !self.vehicle.doors().open {
                    self.vehicle.open_doors()?;
                }
                self.enter(JourneyState::DoorsOpen, now_ms, StatusMessage::DoorsOpen)?;
                Ok(Some(JourneyEvent::DoorsOpening))
            }
        }
    }

    fn on_doors_open(&mut self, now_ms: u64) -> Result<Option<JourneyEvent>, V::Error> {
        if self.elapsed(now_ms) < self.config.door_open_time_ms {
            return Ok(None);
        }
        self.vehicle.close_doors()?;
        self.enter(
            JourneyState::DoorsClosing(ClosePhase::AwaitingConfirmation),
            now_ms,
            StatusMessage::DoorsClosing,
        )?;
        Ok(Some(JourneyEvent::DoorsClosing))
    }

    fn on_doors_closing(
        &mut self,
        now_ms: u64,
        phase: ClosePhase,
    ) -> Result<Option<JourneyEvent>, V::Error> {
        let doors = self.vehicle.doors();

        let phase = match phase {
            ClosePhase::AwaitingConfirmation if !doors.open => {
                debug!("doors reported closed");
                ClosePhase::Confirmed
            }
            other => other,
        };
        self.state = JourneyState::DoorsClosing(phase);

        if phase == ClosePhase::Confirmed && doors.is_fully_closed() {
            self.enter(
                JourneyState::WaitingDeparture,
                now_ms,
                StatusMessage::PreparingDeparture,
            )?;
        }
        Ok(None)
    }

    fn on_waiting_departure(&mut self, now_ms: u64) -> Result<Option<JourneyEvent>, V::Error> {
        if self.elapsed(now_ms) < self.config.door_close_delay_ms {
            return Ok(None);
        }
        self.start_journey(now_ms).map(Some)
    }

    fn on_station_missed(&mut self, now_ms: u64) -> Result<Option<JourneyEvent>, V::Error> {
        if self.elapsed(now_ms) < self.config.handoff_delay_ms {
            return Ok(None);
        }
        info!("handing control back to the driver");
        self.active = false;
        self.state = JourneyState::Idle;
        self.phase_started_ms = now_ms;
        self.vehicle.disable_automatic()?;
        self.vehicle
            .publish_status(StatusMessage::ManualControl.as_str())?;
        Ok(Some(JourneyEvent::ManualHandoff))
    }
}

/// Automatic operation snapshot for UI/logging.
///
/// # Example
///
/// ```rust
/// use rs_metro::{JourneyState, MotionController};
/// use rs_metro::hal::MockVehicle;
///
/// let autopilot = MotionController::new(MockVehicle::new());
/// let state = autopilot.snapshot(0);
/// assert!(!state.active);
/// assert_eq!(state.state, JourneyState::Idle);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutopilotState {
    /// Whether automatic operation is engaged.
    pub active: bool,
    /// Current phase.
    pub state: JourneyState,
    /// Time spent in the current phase (milliseconds).
    pub phase_elapsed_ms: u64,
}

impl Default for AutopilotState {
    fn default() -> Self {
        Self {
            active: false,
            state: JourneyState::Idle,
            phase_elapsed_ms: 0,
        }
    }
}
