//! Sound feedback for the vehicle's mechanical state.
//!
//! [`SoundFeedbackController`] picks exactly one cue for each telemetry sample
//! and keeps it phase-aligned with the motion: the engine run-up is seeked to
//! the current speed, and the braking run-down is seeked so that it ends
//! acoustically near the moment the vehicle stops.
//!
//! Each tick is classified once into a [`TickClass`]; the order of the checks
//! in [`TickClass::classify`] is the priority order of the rules.
//!
//! # Example
//!
//! ```rust
//! use rs_metro::{AudioAsset, SoundFeedbackController, SoundState};
//! use rs_metro::hal::MockAudio;
//!
//! let mut sound = SoundFeedbackController::new(MockAudio::new());
//!
//! // Pulling away plays the start chime
//! sound.update(2.0, 5.0);
//! assert_eq!(sound.state(), SoundState::Starting);
//! assert!(sound.audio().is_playing(AudioAsset::StartChime));
//!
//! // Coasting at 30 km/h loops the matching band
//! sound.update(30.0, 0.0);
//! assert_eq!(sound.state(), SoundState::ConstantSpeed);
//! assert!(sound.audio().is_playing(AudioAsset::Band30));
//! ```

use heapless::Deque;
use tracing::{debug, info, warn};

use crate::catalog::{AudioAsset, CueSet};
use crate::config::SoundConfig;
use crate::traits::{AudioEvent, AudioOutput};

/// Capacity of the pending playback event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 8;

/// Audio state machine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SoundState {
    /// At rest (stop chime, then silence).
    #[default]
    Stopped,
    /// Start chime playing.
    Starting,
    /// Engine run-up.
    Accelerating,
    /// Braking run-down.
    Braking,
    /// Braking run-down entered by dropping out of the max-speed band.
    BrakingFromMax,
    /// Max-speed drone.
    MaxSpeed,
    /// A speed band drone.
    ConstantSpeed,
    /// Coasting outside every band.
    Inertia,
    /// Compressed braking run-down after a missed stop.
    EmergencyBraking,
}

impl SoundState {
    /// Returns the state as a snake_case string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SoundState::Stopped => "stopped",
            SoundState::Starting => "starting",
            SoundState::Accelerating => "accelerating",
            SoundState::Braking => "braking",
            SoundState::BrakingFromMax => "braking_from_max",
            SoundState::MaxSpeed => "max_speed",
            SoundState::ConstantSpeed => "constant_speed",
            SoundState::Inertia => "inertia",
            SoundState::EmergencyBraking => "emergency_braking",
        }
    }
}

/// Speed interval with its own constant-speed drone.
///
/// | Band | Interval (km/h) | Cue |
/// |---|---|---|
/// | `Band15` | `[7, 26]` | [`AudioAsset::Band15`] |
/// | `Band30` | `(26, 32]` | [`AudioAsset::Band30`] |
/// | `Band35` | `(32, 35]` | [`AudioAsset::Band35`] |
/// | `Band40` | `(35, 41]` | [`AudioAsset::Band40`] |
/// | `Band50` | `(41, 61]` | [`AudioAsset::Band50`] |
/// | `Band60` | `(61, 80)` | [`AudioAsset::Band60`] |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpeedBand {
    /// Around 15 km/h.
    Band15,
    /// Around 30 km/h.
    Band30,
    /// Around 35 km/h.
    Band35,
    /// Around 40 km/h.
    Band40,
    /// Around 50 km/h.
    Band50,
    /// Around 60 km/h and up to the max-speed band.
    Band60,
}

impl SpeedBand {
    /// Band containing `speed`, if any.
    ///
    /// ```rust
    /// use rs_metro::SpeedBand;
    ///
    /// assert_eq!(SpeedBand::for_speed(7.0), Some(SpeedBand::Band15));
    /// assert_eq!(SpeedBand::for_speed(26.5), Some(SpeedBand::Band30));
    /// assert_eq!(SpeedBand::for_speed(75.0), Some(SpeedBand::Band60));
    /// assert_eq!(SpeedBand::for_speed(5.0), None);
    /// assert_eq!(SpeedBand::for_speed(80.0), None);
    /// ```
    pub fn for_speed(speed: f32) -> Option<Self> {
        if speed < 7.0 {
            None
        } else if speed <= 26.0 {
            Some(SpeedBand::Band15)
        } else if speed <= 32.0 {
            Some(SpeedBand::Band30)
        } else if speed <= 35.0 {
            Some(SpeedBand::Band35)
        } else if speed <= 41.0 {
            Some(SpeedBand::Band40)
        } else if speed <= 61.0 {
            Some(SpeedBand::Band50)
        } else if speed < 80.0 {
            Some(SpeedBand::Band60)
        } else {
            None
        }
    }

    /// Drone played for this band.
    pub const fn asset(&self) -> AudioAsset {
        match self {
            SpeedBand::Band15 => AudioAsset::Band15,
            SpeedBand::Band30 => AudioAsset::Band30,
            SpeedBand::Band35 => AudioAsset::Band35,
            SpeedBand::Band40 => AudioAsset::Band40,
            SpeedBand::Band50 => AudioAsset::Band50,
            SpeedBand::Band60 => AudioAsset::Band60,
        }
    }
}

/// Last tick's sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PreviousSample {
    /// Speed (km/h).
    pub speed: f32,
    /// Acceleration.
    pub acceleration: f32,
    /// Whether the sample was in the max-speed band.
    pub at_max: bool,
}

/// What a tick calls for, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickClass {
    /// Vehicle at rest.
    Stopped,
    /// Dropped out of the max-speed band since the last tick.
    LeavingMaxSpeed,
    /// In the max-speed band.
    AtMaxSpeed,
    /// Pulled away from rest.
    StartingMotion,
    /// Sample changed, no meaningful traction.
    Coasting,
    /// Sample changed under traction or braking.
    Traction,
    /// Nothing worth acting on.
    Unchanged,
}

impl TickClass {
    /// Classify a sample against the previous one.
    pub fn classify(
        previous: &PreviousSample,
        speed: f32,
        acceleration: f32,
        config: &SoundConfig,
    ) -> Self {
        if speed <= 0.0 {
            return TickClass::Stopped;
        }
        if previous.at_max && speed < config.max_speed {
            return TickClass::LeavingMaxSpeed;
        }
        if speed >= config.max_speed {
            return TickClass::AtMaxSpeed;
        }
        if previous.speed <= 0.0 && speed > config.start_speed {
            return TickClass::StartingMotion;
        }

        let changed = (speed - previous.speed).abs() > config.speed_change_threshold
            || (acceleration - previous.acceleration).abs() > config.accel_change_threshold;
        if !changed {
            TickClass::Unchanged
        } else if acceleration.abs() < config.neutral_threshold {
            TickClass::Coasting
        } else {
            TickClass::Traction
        }
    }
}

/// Sound controller snapshot for UI/logging.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundSnapshot {
    /// Current phase.
    pub state: SoundState,
    /// Band drone currently looping.
    pub active_band: Option<SpeedBand>,
    /// Cues started and not yet stopped or finished.
    pub active_cues: CueSet,
}

/// Audio state machine driven by speed and acceleration samples.
///
/// Audio failures never escalate: they are logged and the controller keeps
/// its intended state.
pub struct SoundFeedbackController<A: AudioOutput> {
    audio: A,
    config: SoundConfig,
    state: SoundState,
    active_band: Option<SpeedBand>,
    cues: CueSet,
    previous: PreviousSample,
    events: Deque<AudioEvent, EVENT_QUEUE_CAPACITY>,
}

impl<A: AudioOutput> SoundFeedbackController<A> {
    /// Create a controller with the default configuration
    pub fn new(audio: A) -> Self {
        Self::with_config(audio, SoundConfig::default())
    }

    /// Create a controller with a custom configuration
    pub fn with_config(audio: A, config: SoundConfig) -> Self {
        Self {
            audio,
            config,
            state: SoundState::Stopped,
            active_band: None,
            cues: CueSet::new(),
            previous: PreviousSample::default(),
            events: Deque::new(),
        }
    }

    /// Queue a playback event; handled at the start of the next [`update`].
    ///
    /// [`update`]: Self::update
    pub fn notify(&mut self, event: AudioEvent) {
        if self.events.is_full() {
            let dropped = self.events.pop_front();
            warn!(?dropped, "audio event queue full, dropping oldest");
        }
        // Cannot fail after making room
        let _ = self.events.push_back(event);
    }

    /// Process one telemetry sample.
    pub fn update(&mut self, speed: f32, acceleration: f32) -> TickClass {
        self.drain_events(speed);

        let class = TickClass::classify(&self.previous, speed, acceleration, &self.config);
        if class != TickClass::Unchanged {
            debug!(speed, acceleration, ?class, "sound tick");
        }

        match class {
            TickClass::Stopped => self.stop_sequence(),
            TickClass::LeavingMaxSpeed => self.leave_max_speed(speed),
            TickClass::AtMaxSpeed => self.hold_max_speed(),
            TickClass::StartingMotion => self.start_sequence(),
            TickClass::Coasting => self.coast(speed),
            TickClass::Traction => self.traction(speed, acceleration),
            TickClass::Unchanged => {}
        }

        self.previous = PreviousSample {
            speed,
            acceleration,
            at_max: speed >= self.config.max_speed,
        };
        class
    }

    /// Compressed braking run-down that ends when the vehicle should stop.
    ///
    /// At or below standstill this is the stop sequence.
    pub fn emergency_braking(&mut self, speed: f32) {
        if speed <= 0.0 {
            self.stop_sequence();
            return;
        }

        let duration = self.config.catalog.duration(AudioAsset::Braking);
        let stop_time =
            speed / self.config.emergency_deceleration * self.config.emergency_tick_s;
        let start = (duration - stop_time).max(0.0);
        let rate = ((duration - start) / stop_time).clamp(
            self.config.emergency_min_rate,
            self.config.emergency_max_rate,
        );
        debug!(speed, stop_time, start, rate, "emergency braking cue");

        self.stop_all();
        self.seek(AudioAsset::Braking, start);
        self.set_rate(AudioAsset::Braking, rate);
        self.play(AudioAsset::Braking);
        self.previous.at_max = false;
        self.transition(SoundState::EmergencyBraking);
    }

    /// Current phase.
    pub fn state(&self) -> SoundState {
        self.state
    }

    /// Band drone currently looping.
    pub fn active_band(&self) -> Option<SpeedBand> {
        self.active_band
    }

    /// Cues started and not yet stopped or finished.
    pub fn active_cues(&self) -> CueSet {
        self.cues
    }

    /// Configuration in use.
    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    /// Borrow the audio backend.
    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Mutably borrow the audio backend.
    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// State snapshot for UI/logging.
    pub fn snapshot(&self) -> SoundSnapshot {
        SoundSnapshot {
            state: self.state,
            active_band: self.active_band,
            active_cues: self.cues,
        }
    }

    // ------------------------------------------------------------------------
    // Positions
    // ------------------------------------------------------------------------

    fn engine_position(&self, speed: f32) -> f32 {
        let duration = self.config.catalog.duration(AudioAsset::Engine);
        (speed / self.config.max_speed * duration)
            .min(duration - self.config.seek_end_margin_s)
            .max(0.0)
    }

    fn braking_position(&self, speed: f32) -> f32 {
        let duration = self.config.catalog.duration(AudioAsset::Braking);
        let upper = (duration - self.config.seek_end_margin_s).max(0.0);
        ((1.0 - speed / self.config.max_speed) * duration).clamp(0.0, upper)
    }

    // ------------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------------

    fn stop_sequence(&mut self) {
        if self.state == SoundState::Stopped {
            return;
        }
        self.stop_all();
        self.play(AudioAsset::StopChime);
        self.transition(SoundState::Stopped);
    }

    fn leave_max_speed(&mut self, speed: f32) {
        let position = self.braking_position(speed);
        debug!(speed, position, "braking from max speed");

        self.stop_all();
        self.seek(AudioAsset::Braking, position);
        self.set_rate(AudioAsset::Braking, 1.0);
        self.play(AudioAsset::Braking);
        self.transition(SoundState::BrakingFromMax);
    }

    fn hold_max_speed(&mut self) {
        let sole = self.cues.len() == 1 && self.cues.contains(AudioAsset::MaxSpeed);
        if !sole {
            self.stop_all();
            self.play(AudioAsset::MaxSpeed);
        }
        self.transition(SoundState::MaxSpeed);
    }

    fn start_sequence(&mut self) {
        self.stop_all();
        if !self.play(AudioAsset::StartChime) {
            // Keep the sequence moving: the engine follows on the next tick
            self.notify(AudioEvent::Finished(AudioAsset::StartChime));
        }
        self.transition(SoundState::Starting);
    }

    fn start_engine(&mut self, speed: f32) {
        let position = self.engine_position(speed);
        debug!(speed, position, "engine after start chime");

        self.stop_all();
        self.seek(AudioAsset::Engine, position);
        self.play(AudioAsset::Engine);
        self.transition(SoundState::Accelerating);
    }

    fn coast(&mut self, speed: f32) {
        match SpeedBand::for_speed(speed) {
            Some(band) => {
                if self.state == SoundState::ConstantSpeed && self.active_band == Some(band) {
                    return;
                }
                self.stop_all();
                if self.play(band.asset()) {
                    self.active_band = Some(band);
                }
                self.transition(SoundState::ConstantSpeed);
            }
            None => {
                if self.state == SoundState::Inertia {
                    return;
                }
                self.stop_all();
                self.play(AudioAsset::Inertia);
                self.transition(SoundState::Inertia);
            }
        }
    }

    fn traction(&mut self, speed: f32, acceleration: f32) {
        if let Some(band) = self.active_band.take() {
            self.stop(band.asset());
        }
        let rate = self.config.traction_rate(acceleration);
        let threshold = self.config.traction_threshold;

        if acceleration > threshold {
            match self.state {
                SoundState::Starting | SoundState::BrakingFromMax => {}
                SoundState::Accelerating if self.cues.contains(AudioAsset::Engine) => {
                    self.set_rate(AudioAsset::Engine, rate);
                }
                _ => {
                    let position = self.engine_position(speed);
                    debug!(speed, position, rate, "engine cue");
                    self.stop_all();
                    self.seek(AudioAsset::Engine, position);
                    self.set_rate(AudioAsset::Engine, rate);
                    self.play(AudioAsset::Engine);
                    self.transition(SoundState::Accelerating);
                }
            }
        } else if acceleration < -threshold {
            match self.state {
                SoundState::Braking | SoundState::BrakingFromMax => {
                    self.set_rate(AudioAsset::Braking, rate);
                }
                SoundState::EmergencyBraking => {}
                _ => {
                    let position = self.braking_position(speed);
                    debug!(speed, position, rate, "braking cue");
                    self.stop_all();
                    self.seek(AudioAsset::Braking, position);
                    self.set_rate(AudioAsset::Braking, rate);
                    self.play(AudioAsset::Braking);
                    self.transition(SoundState::Braking);
                }
            }
        } else {
            debug!(speed, acceleration, "traction at threshold, band cut only");
        }
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn drain_events(&mut self, speed: f32) {
        while let Some(event) = self.events.pop_front() {
            match event {
                AudioEvent::Finished(asset) => {
                    self.cues.remove(asset);
                    if asset == AudioAsset::StartChime && self.state == SoundState::Starting {
                        self.start_engine(speed);
                    }
                }
            }
        }
    }

    fn transition(&mut self, state: SoundState) {
        if self.state != state {
            info!(from = self.state.as_str(), to = state.as_str(), "sound state");
        }
        self.state = state;
    }

    fn play(&mut self, asset: AudioAsset) -> bool {
        match self.audio.play(asset) {
            Ok(()) => {
                self.cues.insert(asset);
                true
            }
            Err(err) => {
                warn!(asset = asset.as_str(), ?err, "play rejected");
                false
            }
        }
    }

    fn stop(&mut self, asset: AudioAsset) {
        self.cues.remove(asset);
        if let Err(err) = self.audio.stop(asset) {
            warn!(asset = asset.as_str(), ?err, "stop rejected");
        }
    }

    fn stop_all(&mut self) {
        let cues = self.cues;
        for asset in cues.iter() {
            self.stop(asset);
        }
        self.active_band = None;
    }

    fn seek(&mut self, asset: AudioAsset, position_s: f32) {
        if let Err(err) = self.audio.seek(asset, position_s) {
            warn!(asset = asset.as_str(), ?err, "seek rejected");
        }
    }

    fn set_rate(&mut self, asset: AudioAsset, rate: f32) {
        if let Err(err) = self.audio.set_rate(asset, rate) {
            warn!(asset = asset.as_str(), ?err, "rate rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockAudio;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn moving() -> SoundFeedbackController<MockAudio> {
        // Past the start chime, coasting at 20 km/h
        let mut sound = SoundFeedbackController::new(MockAudio::new());
        sound.update(2.0, 5.0);
        let finished = sound.audio_mut().finish(AudioAsset::StartChime);
        sound.notify(finished);
        sound.update(20.0, 0.0);
        assert_eq!(sound.state(), SoundState::ConstantSpeed);
        sound
    }

    fn assert_exclusive(sound: &SoundFeedbackController<MockAudio>) {
        assert!(
            sound.active_cues().non_ambient_len() <= 1,
            "cues {:?}",
            sound.active_cues()
        );
        assert!(sound.audio().playing.non_ambient_len() <= 1);
    }

    // =========================================================================
    // Bands and classification
    // =========================================================================

    #[test]
    fn band_boundaries() {
        assert_eq!(SpeedBand::for_speed(6.9), None);
        assert_eq!(SpeedBand::for_speed(26.0), Some(SpeedBand::Band15));
        assert_eq!(SpeedBand::for_speed(32.0), Some(SpeedBand::Band30));
        assert_eq!(SpeedBand::for_speed(32.5), Some(SpeedBand::Band35));
        assert_eq!(SpeedBand::for_speed(35.0), Some(SpeedBand::Band35));
        assert_eq!(SpeedBand::for_speed(41.0), Some(SpeedBand::Band40));
        assert_eq!(SpeedBand::for_speed(61.0), Some(SpeedBand::Band50));
        assert_eq!(SpeedBand::for_speed(61.5), Some(SpeedBand::Band60));
        assert_eq!(SpeedBand::for_speed(79.9), Some(SpeedBand::Band60));
    }

    #[test]
    fn classify_priority() {
        let config = SoundConfig::default();
        let at_max = PreviousSample {
            speed: 80.5,
            acceleration: 0.0,
            at_max: true,
        };
        assert_eq!(TickClass::classify(&at_max, 0.0, 0.0, &config), TickClass::Stopped);
        assert_eq!(
            TickClass::classify(&at_max, 79.0, -5.0, &config),
            TickClass::LeavingMaxSpeed
        );
        assert_eq!(TickClass::classify(&at_max, 80.0, 0.0, &config), TickClass::AtMaxSpeed);

        let rest = PreviousSample::default();
        assert_eq!(
            TickClass::classify(&rest, 1.5, 5.0, &config),
            TickClass::StartingMotion
        );
        assert_eq!(TickClass::classify(&rest, 0.8, 5.0, &config), TickClass::Traction);

        let cruising = PreviousSample {
            speed: 40.0,
            acceleration: 0.0,
            at_max: false,
        };
        assert_eq!(
            TickClass::classify(&cruising, 40.2, 0.05, &config),
            TickClass::Unchanged
        );
        assert_eq!(TickClass::classify(&cruising, 41.0, 0.1, &config), TickClass::Coasting);
        assert_eq!(TickClass::classify(&cruising, 40.0, -3.0, &config), TickClass::Traction);
    }

    // =========================================================================
    // Start and stop
    // =========================================================================

    #[test]
    fn start_chime_then_engine() {
        let mut sound = SoundFeedbackController::new(MockAudio::new());
        assert_eq!(sound.update(2.0, 5.0), TickClass::StartingMotion);
        assert_eq!(sound.state(), SoundState::Starting);

        // Positive traction keeps the chime
        sound.update(3.0, 4.0);
        assert_eq!(sound.state(), SoundState::Starting);
        assert!(sound.audio().is_playing(AudioAsset::StartChime));

        let finished = sound.audio_mut().finish(AudioAsset::StartChime);
        sound.notify(finished);
        sound.update(8.0, 4.0);

        assert_eq!(sound.state(), SoundState::Accelerating);
        assert!(sound.audio().is_playing(AudioAsset::Engine));
        // 8 / 80 * 18.15
        assert!(approx(sound.audio().position(AudioAsset::Engine), 1.815));
    }

    #[test]
    fn rejected_start_chime_still_reaches_engine() {
        let mut audio = MockAudio::new();
        audio.reject.insert(AudioAsset::StartChime);
        let mut sound = SoundFeedbackController::new(audio);

        sound.update(2.0, 5.0);
        assert_eq!(sound.state(), SoundState::Starting);
        assert!(sound.active_cues().is_empty());

        sound.update(2.2, 5.0);
        assert_eq!(sound.state(), SoundState::Accelerating);
        assert!(sound.audio().is_playing(AudioAsset::Engine));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut sound = moving();
        sound.update(0.0, 0.0);
        assert_eq!(sound.state(), SoundState::Stopped);
        assert_eq!(sound.audio().play_count(AudioAsset::StopChime), 1);

        for _ in 0..10 {
            sound.update(0.0, 0.0);
        }
        assert_eq!(sound.audio().play_count(AudioAsset::StopChime), 1);
    }

    #[test]
    fn silent_at_rest_on_startup() {
        let mut sound = SoundFeedbackController::new(MockAudio::new());
        sound.update(0.0, 0.0);
        assert!(sound.audio().log.is_empty());
    }

    // =========================================================================
    // Max speed
    // =========================================================================

    #[test]
    fn max_speed_hysteresis() {
        let mut sound = moving();
        sound.update(79.9, 0.0);
        assert_eq!(sound.state(), SoundState::ConstantSpeed);
        assert_eq!(sound.active_band(), Some(SpeedBand::Band60));

        sound.update(80.1, 0.0);
        assert_eq!(sound.state(), SoundState::MaxSpeed);
        assert!(sound.audio().is_playing(AudioAsset::MaxSpeed));
        assert!(!sound.audio().is_playing(AudioAsset::Band60));

        sound.update(79.9, 0.0);
        assert_eq!(sound.state(), SoundState::BrakingFromMax);
        assert!(!sound.audio().is_playing(AudioAsset::MaxSpeed));
        assert!(sound.audio().is_playing(AudioAsset::Braking));
        // (1 - 79.9 / 80) * 21
        assert!(approx(sound.audio().position(AudioAsset::Braking), 0.02625));
        assert_eq!(sound.audio().rate(AudioAsset::Braking), 1.0);
        assert_exclusive(&sound);
    }

    #[test]
    fn max_speed_loop_not_restarted() {
        let mut sound = moving();
        sound.update(80.0, 0.0);
        sound.update(81.0, 0.5);
        sound.update(80.5, 0.0);
        assert_eq!(sound.audio().play_count(AudioAsset::MaxSpeed), 1);
    }

    #[test]
    fn braking_from_max_keeps_cue_under_traction() {
        let mut sound = moving();
        sound.update(80.5, 0.0);
        sound.update(78.0, -5.0);
        assert_eq!(sound.state(), SoundState::BrakingFromMax);

        sound.update(77.0, 2.0);
        assert_eq!(sound.state(), SoundState::BrakingFromMax);
        assert_eq!(sound.audio().play_count(AudioAsset::Engine), 0);

        sound.update(75.0, -2.5);
        assert_eq!(sound.audio().rate(AudioAsset::Braking), 0.5);
    }

    // =========================================================================
    // Traction and coasting
    // =========================================================================

    #[test]
    fn braking_cue_seek_and_rate() {
        let mut sound = moving();
        sound.update(40.0, -2.5);
        assert_eq!(sound.state(), SoundState::Braking);
        // (1 - 40 / 80) * 21
        assert!(approx(sound.audio().position(AudioAsset::Braking), 10.5));
        assert_eq!(sound.audio().rate(AudioAsset::Braking), 0.5);
        assert!(!sound.audio().is_playing(AudioAsset::Band15));

        // Never restarted, only re-rated
        sound.update(35.0, -5.0);
        assert_eq!(sound.audio().play_count(AudioAsset::Braking), 1);
        assert_eq!(sound.audio().rate(AudioAsset::Braking), 1.0);
    }

    #[test]
    fn engine_seek_clamped_below_end() {
        let mut sound = moving();
        sound.update(79.99, 5.0);
        let position = sound.audio().position(AudioAsset::Engine);
        assert!(position <= 18.14 + 1e-4);
        assert!(position > 18.0);
    }

    #[test]
    fn engine_restarts_after_it_finishes() {
        let mut sound = moving();
        sound.update(30.0, 5.0);
        assert_eq!(sound.state(), SoundState::Accelerating);

        let finished = sound.audio_mut().finish(AudioAsset::Engine);
        sound.notify(finished);
        sound.update(31.0, 5.0);
        assert_eq!(sound.audio().play_count(AudioAsset::Engine), 2);
        assert!(sound.audio().is_playing(AudioAsset::Engine));
    }

    #[test]
    fn coasting_outside_bands_plays_inertia() {
        let mut sound = moving();
        sound.update(5.0, 0.0);
        assert_eq!(sound.state(), SoundState::Inertia);
        assert_eq!(sound.active_band(), None);
        assert!(sound.audio().is_playing(AudioAsset::Inertia));
        assert!(!sound.audio().is_playing(AudioAsset::Band15));

        sound.update(4.0, 0.0);
        assert_eq!(sound.audio().play_count(AudioAsset::Inertia), 1);
    }

    #[test]
    fn band_switch_stops_previous_band() {
        let mut sound = moving();
        sound.update(30.0, 0.0);
        assert_eq!(sound.active_band(), Some(SpeedBand::Band30));
        assert!(!sound.audio().is_playing(AudioAsset::Band15));
        assert!(sound.audio().is_playing(AudioAsset::Band30));
        assert_exclusive(&sound);
    }

    #[test]
    fn traction_threshold_is_exclusive() {
        for accel in [0.2, -0.2] {
            let mut sound = moving();
            assert_eq!(sound.update(20.0, accel), TickClass::Traction);

            // Band cut, nothing started in its place
            assert!(!sound.audio().is_playing(AudioAsset::Band15));
            assert_eq!(sound.active_band(), None);
            assert!(sound.active_cues().is_empty());
            assert_eq!(sound.audio().play_count(AudioAsset::Engine), 1);
            assert_eq!(sound.audio().play_count(AudioAsset::Braking), 0);
            assert_eq!(sound.state(), SoundState::ConstantSpeed);
        }

        // Just past the threshold the cues start
        let mut sound = moving();
        sound.update(20.0, 0.21);
        assert_eq!(sound.state(), SoundState::Accelerating);
        let mut sound = moving();
        sound.update(20.0, -0.21);
        assert_eq!(sound.state(), SoundState::Braking);
    }

    // =========================================================================
    // Emergency braking
    // =========================================================================

    #[test]
    fn emergency_braking_compresses_run_down() {
        let mut sound = moving();
        sound.emergency_braking(70.0);
        assert_eq!(sound.state(), SoundState::EmergencyBraking);
        // t = 70 / 7 * 0.05 = 0.5 s
        assert!(approx(sound.audio().position(AudioAsset::Braking), 20.5));
        assert!(approx(sound.audio().rate(AudioAsset::Braking), 1.0));

        // Not restarted or re-rated by braking ticks
        sound.update(60.0, -5.0);
        assert_eq!(sound.audio().play_count(AudioAsset::Braking), 1);
        assert!(approx(sound.audio().rate(AudioAsset::Braking), 1.0));
    }

    #[test]
    fn emergency_braking_at_rest_is_stop_sequence() {
        let mut sound = moving();
        sound.emergency_braking(0.0);
        assert_eq!(sound.state(), SoundState::Stopped);
        assert!(sound.audio().is_playing(AudioAsset::StopChime));
    }

    #[test]
    fn emergency_braking_clears_max_speed_edge() {
        let mut sound = moving();
        sound.update(80.5, 0.0);
        sound.emergency_braking(80.5);
        let class = sound.update(79.0, -5.0);
        assert_ne!(class, TickClass::LeavingMaxSpeed);
        assert_eq!(sound.state(), SoundState::EmergencyBraking);
    }

    // =========================================================================
    // Events and exclusivity
    // =========================================================================

    #[test]
    fn event_queue_drops_oldest() {
        let mut sound = SoundFeedbackController::new(MockAudio::new());
        for _ in 0..EVENT_QUEUE_CAPACITY + 3 {
            sound.notify(AudioEvent::Finished(AudioAsset::Engine));
        }
        sound.update(0.0, 0.0);
        assert_eq!(sound.state(), SoundState::Stopped);
    }

    #[test]
    fn exclusivity_over_a_sample_sweep() {
        let mut sound = SoundFeedbackController::new(MockAudio::new());
        let mut speed: f32 = 0.0;
        // Deterministic pseudo-random accelerations
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let accel = (seed % 11) as f32 - 5.0;
            speed = (speed + accel * 0.4).clamp(0.0, 90.0);
            if seed % 97 == 0 {
                sound.emergency_braking(speed);
            }
            if seed % 13 == 0 {
                let finished = sound.audio_mut().finish(AudioAsset::StartChime);
                sound.notify(finished);
            }
            sound.update(speed, accel);
            assert_exclusive(&sound);
        }
    }

    #[test]
    fn snapshot_reports_band_and_cues() {
        let sound = moving();
        let snap = sound.snapshot();
        assert_eq!(snap.state, SoundState::ConstantSpeed);
        assert_eq!(snap.active_band, Some(SpeedBand::Band15));
        assert!(snap.active_cues.contains(AudioAsset::Band15));
        assert_eq!(snap.active_cues.len(), 1);
    }
}
