//! # rs-metro
//!
//! The decision core of a simulated metro driver: automatic train operation
//! from platform to platform, and synchronized sound feedback for the
//! vehicle's mechanical state.
//!
//! ## Features
//!
//! - **Automatic operation**: accelerate, cruise, brake at exactly the
//!   stopping distance, stop inside the platform window, run the dwell, depart
//! - **Sound feedback**: one cue per tick, seeked and rate-adjusted so it
//!   tracks the motion
//! - **Injected time**: dwell timers run against a [`Clock`], never sleep
//! - **`no_std` + `alloc`**: the controllers only need the collaborator traits
//!
//! ## Architecture
//!
//! - `traits` - Vehicle, audio, and clock abstractions
//! - `profile` - Braking law, speed profile, stop window
//! - `catalog` - Audio cues and their durations
//! - `autopilot` - [`MotionController`], the journey state machine
//! - `sound` - [`SoundFeedbackController`], the audio state machine
//! - `hal` - Mocks, the kinematic [`TrackSim`](hal::TrackSim), `StdClock`
//!
//! The two controllers never call each other. The driving loop samples
//! telemetry once per tick and feeds both.
//!
//! ## Example
//!
//! ```rust
//! use rs_metro::{
//!     config::SimConfig,
//!     hal::{MockAudio, TrackSim},
//!     traits::{Clock, Vehicle},
//!     JourneyEvent, MotionController, SoundFeedbackController,
//! };
//!
//! let mut autopilot = MotionController::new(TrackSim::new(SimConfig::default()));
//! let mut sound = SoundFeedbackController::new(MockAudio::new());
//!
//! autopilot.activate(0).unwrap();
//! for _ in 0..500 {
//!     autopilot.vehicle_mut().step(20);
//!     let now = autopilot.vehicle().now_ms();
//!
//!     let event = autopilot.update(now).unwrap();
//!     let sample = autopilot.vehicle().telemetry();
//!     if let Some(JourneyEvent::StationMissed { .. }) = event {
//!         sound.emergency_braking(sample.speed);
//!     }
//!     sound.update(sample.speed, sample.acceleration);
//! }
//! assert!(autopilot.vehicle().telemetry().speed > 0.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Automatic train operation state machine.
pub mod autopilot;
/// Audio cues, their durations, and cue sets.
pub mod catalog;
/// Shared configuration for the controllers and the simulator.
pub mod config;
/// Crate-level error types.
pub mod error;
/// Collaborator implementations: mocks, track simulator, clocks.
pub mod hal;
/// Braking law, speed profile, and stop window.
pub mod profile;
/// Sound feedback state machine.
pub mod sound;
/// Collaborator traits for the vehicle, the audio backend, and time.
pub mod traits;

// Re-exports for convenience
pub use autopilot::{
    AutopilotState, ClosePhase, JourneyEvent, JourneyState, MotionController, StatusMessage,
    StopPhase,
};
pub use catalog::{AssetCatalog, AssetInfo, AudioAsset, CueSet};
pub use config::{AutopilotConfig, Config, SimConfig, SoundConfig};
pub use error::ConfigError;
pub use profile::{BrakingLaw, SpeedProfile, SpeedStep, StopWindow};
pub use sound::{SoundFeedbackController, SoundSnapshot, SoundState, SpeedBand, TickClass};
pub use traits::{AudioEvent, AudioOutput, Clock, DoorStatus, Telemetry, Vehicle};
