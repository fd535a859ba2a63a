//! Mock implementations for testing without a simulator or audio device.
//!
//! This module provides test doubles for the collaborator traits, so both
//! controllers can be driven tick by tick from unit tests.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockVehicle`] | [`Vehicle`] | Settable telemetry, records commands |
//! | [`MockAudio`] | [`AudioOutput`] | Tracks playing cues, positions, rates |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! The vehicle mock does not integrate motion: tests set `speed` and
//! `distance` directly. Use [`TrackSim`](crate::hal::TrackSim) when the
//! vehicle has to move on its own.
//!
//! # Example
//!
//! ```rust
//! use rs_metro::{JourneyState, MotionController};
//! use rs_metro::hal::MockVehicle;
//!
//! let vehicle = MockVehicle::new().moving(30.0).with_distance(10.0);
//! let mut autopilot = MotionController::new(vehicle);
//! autopilot.activate(0).unwrap();
//!
//! // Inside the braking envelope already
//! assert_eq!(autopilot.state(), JourneyState::Braking);
//!
//! // Pretend the vehicle stopped on the mark
//! autopilot.vehicle_mut().speed = 0.0;
//! autopilot.vehicle_mut().distance = Some(0.5);
//! autopilot.update(20).unwrap();
//! assert_eq!(autopilot.vehicle().last_status(), Some("AUTO: At station"));
//! ```
//!
//! [`Vehicle`]: crate::traits::Vehicle
//! [`AudioOutput`]: crate::traits::AudioOutput
//! [`Clock`]: crate::traits::Clock

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::catalog::{AudioAsset, CueSet, ASSET_COUNT};
use crate::traits::{AudioEvent, AudioOutput, Clock, DoorStatus, Telemetry, Vehicle};

// ============================================================================
// Vehicle Mock
// ============================================================================

/// Door command issued to a [`MockVehicle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorCommand {
    /// `open_doors` was called.
    Open,
    /// `close_doors` was called.
    Close,
}

/// Mock vehicle for testing.
///
/// Telemetry comes from the public fields; every command is recorded.
/// Doors move instantly: `open_doors` sets `doors.open`, `close_doors`
/// clears it. Set `doors.animating` by hand to exercise the closing guard.
///
/// # Example
///
/// ```rust
/// use rs_metro::hal::MockVehicle;
/// use rs_metro::traits::Vehicle;
///
/// let mut vehicle = MockVehicle::new();
/// vehicle.emergency_stop().unwrap();
///
/// assert_eq!(vehicle.emergency_stops, 1);
/// assert!(vehicle.override_engaged());
/// ```
#[derive(Debug, Default)]
pub struct MockVehicle {
    /// Reported speed (km/h).
    pub speed: f32,
    /// Reported acceleration; follows the last acceleration command.
    pub acceleration: f32,
    /// Reported distance to the next stopping mark.
    pub distance: Option<f32>,
    /// Reported door state.
    pub doors: DoorStatus,
    /// Reported override state; set by `emergency_stop`.
    pub override_engaged: bool,
    /// Set once `disable_automatic` has been called.
    pub automatic_disabled: bool,
    /// Last commanded acceleration, `None` before any command.
    pub commanded_acceleration: Option<f32>,
    /// Number of acceleration commands.
    pub acceleration_commands: usize,
    /// Door commands in order.
    pub door_commands: Vec<DoorCommand>,
    /// Number of emergency stops.
    pub emergency_stops: usize,
    /// Published status lines in order.
    pub statuses: Vec<String>,
}

impl MockVehicle {
    /// Creates a vehicle at rest, doors closed, no station detected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reported speed.
    pub fn moving(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the reported distance to the next stopping mark.
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Last published status line.
    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }
}

impl Vehicle for MockVehicle {
    type Error = ();

    fn telemetry(&self) -> Telemetry {
        Telemetry::new(self.speed, self.acceleration)
    }

    fn distance_to_station(&self) -> Option<f32> {
        self.distance
    }

    fn doors(&self) -> DoorStatus {
        self.doors
    }

    fn override_engaged(&self) -> bool {
        self.override_engaged
    }

    fn set_acceleration(&mut self, acceleration: f32) -> Result<(), ()> {
        self.commanded_acceleration = Some(acceleration);
        self.acceleration = acceleration;
        self.acceleration_commands += 1;
        Ok(())
    }

    fn open_doors(&mut self) -> Result<(), ()> {
        self.doors.open = true;
        self.door_commands.push(DoorCommand::Open);
        Ok(())
    }

    fn close_doors(&mut self) -> Result<(), ()> {
        self.doors.open = false;
        self.door_commands.push(DoorCommand::Close);
        Ok(())
    }

    fn emergency_stop(&mut self) -> Result<(), ()> {
        self.emergency_stops += 1;
        self.override_engaged = true;
        Ok(())
    }

    fn disable_automatic(&mut self) -> Result<(), ()> {
        self.automatic_disabled = true;
        Ok(())
    }

    fn publish_status(&mut self, status: &str) -> Result<(), ()> {
        self.statuses.push(status.to_string());
        Ok(())
    }
}

// ============================================================================
// Audio Mock
// ============================================================================

/// Command issued to a [`MockAudio`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioCommand {
    /// `play`
    Play(AudioAsset),
    /// `stop`
    Stop(AudioAsset),
    /// `seek` with the requested position
    Seek(AudioAsset, f32),
    /// `set_rate` with the requested rate
    SetRate(AudioAsset, f32),
}

/// Mock audio backend for testing.
///
/// Tracks what is playing plus the position and rate of every asset, and
/// logs every command. Assets in `reject` fail to play.
///
/// # Example
///
/// ```rust
/// use rs_metro::AudioAsset;
/// use rs_metro::hal::MockAudio;
/// use rs_metro::traits::AudioOutput;
///
/// let mut audio = MockAudio::new();
/// audio.seek(AudioAsset::Braking, 10.5).unwrap();
/// audio.play(AudioAsset::Braking).unwrap();
/// assert!(audio.is_playing(AudioAsset::Braking));
/// assert_eq!(audio.position(AudioAsset::Braking), 10.5);
///
/// // Stop resets position and rate
/// audio.stop(AudioAsset::Braking).unwrap();
/// assert_eq!(audio.position(AudioAsset::Braking), 0.0);
///
/// audio.reject.insert(AudioAsset::Engine);
/// assert!(audio.play(AudioAsset::Engine).is_err());
/// ```
#[derive(Debug)]
pub struct MockAudio {
    /// Assets currently playing.
    pub playing: CueSet,
    /// Playback position per asset (seconds).
    pub positions: [f32; ASSET_COUNT],
    /// Playback rate per asset.
    pub rates: [f32; ASSET_COUNT],
    /// Every command, in order.
    pub log: Vec<AudioCommand>,
    /// Assets whose `play` fails.
    pub reject: CueSet,
}

impl MockAudio {
    /// Creates an idle backend.
    pub fn new() -> Self {
        Self {
            playing: CueSet::new(),
            positions: [0.0; ASSET_COUNT],
            rates: [1.0; ASSET_COUNT],
            log: Vec::new(),
            reject: CueSet::new(),
        }
    }

    /// Whether `asset` is playing.
    pub fn is_playing(&self, asset: AudioAsset) -> bool {
        self.playing.contains(asset)
    }

    /// Current position of `asset`.
    pub fn position(&self, asset: AudioAsset) -> f32 {
        self.positions[asset.index()]
    }

    /// Current rate of `asset`.
    pub fn rate(&self, asset: AudioAsset) -> f32 {
        self.rates[asset.index()]
    }

    /// Number of successful `play` commands for `asset`.
    pub fn play_count(&self, asset: AudioAsset) -> usize {
        self.log
            .iter()
            .filter(|cmd| **cmd == AudioCommand::Play(asset))
            .count()
    }

    /// Simulates `asset` reaching its end; returns the event to deliver.
    pub fn finish(&mut self, asset: AudioAsset) -> AudioEvent {
        self.playing.remove(asset);
        self.positions[asset.index()] = 0.0;
        AudioEvent::Finished(asset)
    }
}

impl Default for MockAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for MockAudio {
    type Error = ();

    fn play(&mut self, asset: AudioAsset) -> Result<(), ()> {
        if self.reject.contains(asset) {
            return Err(());
        }
        self.playing.insert(asset);
        self.log.push(AudioCommand::Play(asset));
        Ok(())
    }

    fn stop(&mut self, asset: AudioAsset) -> Result<(), ()> {
        self.playing.remove(asset);
        self.positions[asset.index()] = 0.0;
        self.rates[asset.index()] = 1.0;
        self.log.push(AudioCommand::Stop(asset));
        Ok(())
    }

    fn seek(&mut self, asset: AudioAsset, position_s: f32) -> Result<(), ()> {
        self.positions[asset.index()] = position_s;
        self.log.push(AudioCommand::Seek(asset, position_s));
        Ok(())
    }

    fn set_rate(&mut self, asset: AudioAsset, rate: f32) -> Result<(), ()> {
        self.rates[asset.index()] = rate;
        self.log.push(AudioCommand::SetRate(asset, rate));
        Ok(())
    }
}

// ============================================================================
// Clock Mock
// ============================================================================

/// Mock clock for deterministic time-based testing.
///
/// Allows precise control of time for testing dwell timers.
///
/// # Example
///
/// ```rust
/// use rs_metro::hal::MockClock;
/// use rs_metro::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_records_commands() {
        let mut vehicle = MockVehicle::new().moving(12.0).with_distance(40.0);
        assert_eq!(vehicle.telemetry().speed, 12.0);
        assert_eq!(vehicle.distance_to_station(), Some(40.0));

        vehicle.set_acceleration(-5.0).unwrap();
        vehicle.open_doors().unwrap();
        vehicle.close_doors().unwrap();
        vehicle.publish_status("AUTO: Braking").unwrap();

        assert_eq!(vehicle.commanded_acceleration, Some(-5.0));
        assert_eq!(vehicle.telemetry().acceleration, -5.0);
        assert_eq!(vehicle.acceleration_commands, 1);
        assert_eq!(
            vehicle.door_commands,
            [DoorCommand::Open, DoorCommand::Close]
        );
        assert!(!vehicle.doors().open);
        assert_eq!(vehicle.last_status(), Some("AUTO: Braking"));
    }

    #[test]
    fn audio_rejects_listed_assets() {
        let mut audio = MockAudio::new();
        audio.reject.insert(AudioAsset::StartChime);
        assert_eq!(audio.play(AudioAsset::StartChime), Err(()));
        assert!(!audio.is_playing(AudioAsset::StartChime));
        assert_eq!(audio.play_count(AudioAsset::StartChime), 0);
    }

    #[test]
    fn audio_stop_resets_rate() {
        let mut audio = MockAudio::new();
        audio.set_rate(AudioAsset::Engine, 0.4).unwrap();
        audio.play(AudioAsset::Engine).unwrap();
        audio.stop(AudioAsset::Engine).unwrap();
        assert_eq!(audio.rate(AudioAsset::Engine), 1.0);
        assert!(!audio.is_playing(AudioAsset::Engine));
    }

    #[test]
    fn audio_finish_returns_event() {
        let mut audio = MockAudio::new();
        audio.play(AudioAsset::StartChime).unwrap();
        let event = audio.finish(AudioAsset::StartChime);
        assert_eq!(event, AudioEvent::Finished(AudioAsset::StartChime));
        assert!(!audio.is_playing(AudioAsset::StartChime));
    }

    #[test]
    fn clock_advances() {
        let mut clock = MockClock::new();
        clock.advance(20);
        clock.advance(30);
        assert_eq!(clock.now_ms(), 50);
    }
}
