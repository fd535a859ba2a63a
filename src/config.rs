//! Shared configuration for the motion controller, the sound controller, and
//! the track simulator.
//!
//! Every struct has a `Default` that reproduces the tuned constants of the
//! simulator, plus `with_*` builder methods for the values worth tweaking.
//!
//! # Example
//!
//! ```rust
//! use rs_metro::config::{AutopilotConfig, Config, SoundConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_autopilot(AutopilotConfig::default().with_door_open_time_ms(8000))
//!     .with_sound(SoundConfig::default().with_max_speed(70.0));
//! assert_eq!(config.autopilot.door_open_time_ms, 8000);
//! ```

use crate::catalog::AssetCatalog;
use crate::error::{ConfigError, Result};
use crate::profile::{BrakingLaw, SpeedProfile, StopWindow};

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Automatic train operation settings
    pub autopilot: AutopilotConfig,
    /// Sound feedback settings
    pub sound: SoundConfig,
    /// Track simulator settings (tests and demo binary)
    pub sim: SimConfig,
}

impl Config {
    /// Set autopilot configuration
    pub fn with_autopilot(mut self, autopilot: AutopilotConfig) -> Self {
        self.autopilot = autopilot;
        self
    }

    /// Set sound configuration
    pub fn with_sound(mut self, sound: SoundConfig) -> Self {
        self.sound = sound;
        self
    }

    /// Set simulator configuration
    pub fn with_sim(mut self, sim: SimConfig) -> Self {
        self.sim = sim;
        self
    }

    /// Check every section for values the controllers cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.autopilot.validate()?;
        self.sound.validate()?;
        self.sim.validate()
    }

    /// Decode a config from JSON. Missing fields keep their defaults.
    ///
    /// ```rust
    /// use rs_metro::Config;
    ///
    /// let json = br#"{"autopilot": {"door_open_time_ms": 3000}}"#;
    /// let config = Config::from_json(json).unwrap();
    /// assert_eq!(config.autopilot.door_open_time_ms, 3000);
    /// assert_eq!(config.autopilot.door_open_delay_ms, 1000);
    /// ```
    #[cfg(feature = "serde-json-core")]
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let (config, _) =
            serde_json_core::from_slice::<Config>(json).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<()> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

// ============================================================================
// Autopilot Config
// ============================================================================

/// Automatic train operation configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AutopilotConfig {
    /// Acceleration commanded when accelerating (km/h per tick)
    pub max_acceleration: f32,
    /// Deceleration magnitude commanded when braking (km/h per tick)
    pub max_deceleration: f32,
    /// Deceleration magnitude used to trim overspeed while cruising
    pub cruise_correction: f32,
    /// Dead band around the target speed while cruising (km/h)
    pub cruise_margin: f32,
    /// Stopping-distance law
    pub braking: BrakingLaw,
    /// Target speed by distance to the next station
    pub profile: SpeedProfile,
    /// Acceptable stopping positions around the platform mark
    pub stop_window: StopWindow,
    /// Speed below which the vehicle counts as at rest in a station (km/h)
    pub at_rest_speed: f32,
    /// Delay between coming to rest and opening the doors
    pub door_open_delay_ms: u64,
    /// How long the doors stay open
    pub door_open_time_ms: u64,
    /// Delay between doors closed and departure
    pub door_close_delay_ms: u64,
    /// Delay between a missed stop and the hand-off to manual
    pub handoff_delay_ms: u64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            max_acceleration: 5.0,
            max_deceleration: 5.0,
            cruise_correction: 2.0,
            cruise_margin: 2.0,
            braking: BrakingLaw::default(),
            profile: SpeedProfile::default(),
            stop_window: StopWindow::default(),
            at_rest_speed: 0.1,
            door_open_delay_ms: 1000,
            door_open_time_ms: 5000,
            door_close_delay_ms: 2000,
            handoff_delay_ms: 500,
        }
    }
}

impl AutopilotConfig {
    /// Set the acceleration used when accelerating
    pub fn with_max_acceleration(mut self, accel: f32) -> Self {
        self.max_acceleration = accel;
        self
    }

    /// Set the braking deceleration magnitude
    pub fn with_max_deceleration(mut self, decel: f32) -> Self {
        self.max_deceleration = decel.abs();
        self
    }

    /// Set the stopping-distance law
    pub fn with_braking(mut self, braking: BrakingLaw) -> Self {
        self.braking = braking;
        self
    }

    /// Set the stop acceptance window
    pub fn with_stop_window(mut self, window: StopWindow) -> Self {
        self.stop_window = window;
        self
    }

    /// Set the door open delay
    pub fn with_door_open_delay_ms(mut self, ms: u64) -> Self {
        self.door_open_delay_ms = ms;
        self
    }

    /// Set how long the doors stay open
    pub fn with_door_open_time_ms(mut self, ms: u64) -> Self {
        self.door_open_time_ms = ms;
        self
    }

    /// Set the pre-departure wait
    pub fn with_door_close_delay_ms(mut self, ms: u64) -> Self {
        self.door_close_delay_ms = ms;
        self
    }

    /// Set the missed-stop hand-off delay
    pub fn with_handoff_delay_ms(mut self, ms: u64) -> Self {
        self.handoff_delay_ms = ms;
        self
    }

    /// Check the values the state machine depends on.
    pub fn validate(&self) -> Result<()> {
        positive("max_acceleration", self.max_acceleration)?;
        positive("max_deceleration", self.max_deceleration)?;
        positive("cruise_correction", self.cruise_correction)?;
        non_negative("cruise_margin", self.cruise_margin)?;
        non_negative("at_rest_speed", self.at_rest_speed)?;
        positive("braking.base_distance_m", self.braking.base_distance_m)?;
        positive("braking.base_speed", self.braking.base_speed)?;
        if !self.profile.is_ordered() {
            return Err(ConfigError::UnorderedProfile);
        }
        ordered(
            "stop_window",
            self.stop_window.min_acceptable(),
            self.stop_window.max_acceptable(),
        )
    }
}

// ============================================================================
// Sound Config
// ============================================================================

/// Sound feedback configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SoundConfig {
    /// Speed at and above which the max-speed loop plays (km/h)
    pub max_speed: f32,
    /// Speed change that counts as "changed" between ticks (km/h)
    pub speed_change_threshold: f32,
    /// Acceleration change that counts as "changed" between ticks
    pub accel_change_threshold: f32,
    /// Below this acceleration magnitude the controller is in neutral
    pub neutral_threshold: f32,
    /// Acceleration magnitude that must be exceeded to start the engine or
    /// braking cue
    pub traction_threshold: f32,
    /// Speed that must be exceeded, from rest, to play the start cue (km/h)
    pub start_speed: f32,
    /// Acceleration magnitude that maps to playback rate 1.0
    pub rate_scale: f32,
    /// Minimum traction/braking playback rate
    pub min_rate: f32,
    /// Maximum traction/braking playback rate
    pub max_rate: f32,
    /// Deceleration assumed for the emergency braking estimate (km/h per tick)
    pub emergency_deceleration: f32,
    /// Tick length assumed for the emergency braking estimate (s)
    pub emergency_tick_s: f32,
    /// Minimum emergency braking playback rate
    pub emergency_min_rate: f32,
    /// Maximum emergency braking playback rate
    pub emergency_max_rate: f32,
    /// Seeks stay at least this far before the end of an asset (s)
    pub seek_end_margin_s: f32,
    /// Durations and loop flags of every cue
    pub catalog: AssetCatalog,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            max_speed: 80.0,
            speed_change_threshold: 0.5,
            accel_change_threshold: 0.1,
            neutral_threshold: 0.2,
            traction_threshold: 0.2,
            start_speed: 1.0,
            rate_scale: 5.0,
            min_rate: 0.1,
            max_rate: 1.0,
            emergency_deceleration: 7.0,
            emergency_tick_s: 0.05,
            emergency_min_rate: 0.5,
            emergency_max_rate: 3.0,
            seek_end_margin_s: 0.01,
            catalog: AssetCatalog::default(),
        }
    }
}

impl SoundConfig {
    /// Set the max-speed threshold
    pub fn with_max_speed(mut self, speed: f32) -> Self {
        self.max_speed = speed;
        self
    }

    /// Set the change-detection thresholds
    pub fn with_change_thresholds(mut self, speed: f32, accel: f32) -> Self {
        self.speed_change_threshold = speed;
        self.accel_change_threshold = accel;
        self
    }

    /// Set the neutral and traction acceleration thresholds
    pub fn with_traction_thresholds(mut self, neutral: f32, traction: f32) -> Self {
        self.neutral_threshold = neutral;
        self.traction_threshold = traction;
        self
    }

    /// Set the asset catalog
    pub fn with_catalog(mut self, catalog: AssetCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Clamp a traction or braking playback rate.
    pub fn traction_rate(&self, acceleration: f32) -> f32 {
        (acceleration.abs() / self.rate_scale).clamp(self.min_rate, self.max_rate)
    }

    /// Check the values the state machine depends on.
    pub fn validate(&self) -> Result<()> {
        positive("max_speed", self.max_speed)?;
        positive("rate_scale", self.rate_scale)?;
        positive("emergency_deceleration", self.emergency_deceleration)?;
        positive("emergency_tick_s", self.emergency_tick_s)?;
        non_negative("neutral_threshold", self.neutral_threshold)?;
        non_negative("traction_threshold", self.traction_threshold)?;
        for info in self.catalog.iter() {
            positive(info.asset.as_str(), info.duration_s)?;
        }
        ordered("rate", self.min_rate, self.max_rate)?;
        ordered(
            "emergency_rate",
            self.emergency_min_rate,
            self.emergency_max_rate,
        )
    }
}

// ============================================================================
// Simulator Config
// ============================================================================

/// Track simulator configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Simulation tick length in milliseconds
    pub tick_ms: u64,
    /// Position of the first platform mark (m)
    pub first_station_m: f32,
    /// Distance between consecutive platform marks (m)
    pub station_spacing_m: f32,
    /// Duration of a door open or close animation
    pub door_animation_ms: u64,
    /// Speed change per second for each unit of commanded acceleration (km/h/s)
    pub accel_gain: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            first_station_m: 900.0,
            station_spacing_m: 1200.0,
            door_animation_ms: 1500,
            // -5 stops from 80 km/h in 250 m
            accel_gain: 0.711_111,
        }
    }
}

impl SimConfig {
    /// Set the tick length
    pub fn with_tick_ms(mut self, ms: u64) -> Self {
        self.tick_ms = ms;
        self
    }

    /// Set the station layout
    pub fn with_stations(mut self, first_m: f32, spacing_m: f32) -> Self {
        self.first_station_m = first_m;
        self.station_spacing_m = spacing_m;
        self
    }

    /// Set the door animation duration
    pub fn with_door_animation_ms(mut self, ms: u64) -> Self {
        self.door_animation_ms = ms;
        self
    }

    /// Check the values the simulator depends on.
    pub fn validate(&self) -> Result<()> {
        positive("tick_ms", self.tick_ms as f32)?;
        positive("station_spacing_m", self.station_spacing_m)?;
        positive("accel_gain", self.accel_gain)
    }
}

// ============================================================================
// Tests
// ============================================================================
